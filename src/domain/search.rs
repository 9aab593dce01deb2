//! Search domain types

use serde::{Deserialize, Serialize};

use super::profiles::{BudgetRange, ExperienceLevel, Profile, Role, StudioAccess};

/// Sparse search filters. A missing field means no constraint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchFilters {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub specialties: Option<Vec<String>>,
    #[serde(default)]
    pub travel_availability: Option<bool>,
    #[serde(default)]
    pub studio_access: Option<StudioAccess>,
    #[serde(default)]
    pub budget_range: Option<BudgetRange>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Recent,
    Name,
    Score,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort options for a search
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct SearchOptions {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl SearchOptions {
    /// Effective direction: recent defaults to newest first, name to A-Z.
    /// Relevance and score have no ranking of their own and always mean
    /// most recently updated first.
    pub fn ascending(&self) -> bool {
        match self.sort_by {
            SortBy::Recent => matches!(self.sort_order, Some(SortOrder::Asc)),
            SortBy::Name => !matches!(self.sort_order, Some(SortOrder::Desc)),
            SortBy::Relevance | SortBy::Score => false,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub profiles: Vec<Profile>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Profile,
    Location,
    Specialty,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
}

/// Query params for suggestions
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionQuery {
    pub q: String,
    #[serde(default, rename = "type")]
    pub kind: Option<SuggestionKind>,
    #[serde(default)]
    pub limit: Option<u32>,
}
