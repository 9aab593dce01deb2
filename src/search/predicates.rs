//! Filter predicates
//!
//! Each predicate knows how to test a profile in memory and how to render
//! itself as a SQL condition over the `profiles` table (aliased `p`), so the
//! two paths cannot drift apart.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::profiles::{
    BudgetRange, ExperienceLevel, Profile, Role, RoleSpecificData, StudioAccess,
};
use crate::domain::search::SearchFilters;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Role(Role),
    /// Case-insensitive substring of location
    Location(String),
    /// Case-insensitive substring of full_name, bio or username
    Text(String),
    ExperienceLevel(ExperienceLevel),
    /// Any of these in the profile's specialty list
    Specialties(Vec<String>),
    TravelAvailability(bool),
    StudioAccess(StudioAccess),
    BudgetRange(BudgetRange),
}

/// Trimmed, non-empty text filter
fn text_filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Translate filters into predicates; absent or empty filters add nothing
pub fn build_predicates(filters: &SearchFilters) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(role) = filters.role {
        predicates.push(Predicate::Role(role));
    }
    if let Some(location) = text_filter(&filters.location) {
        predicates.push(Predicate::Location(location));
    }
    if let Some(query) = text_filter(&filters.query) {
        predicates.push(Predicate::Text(query));
    }
    if let Some(level) = filters.experience_level {
        predicates.push(Predicate::ExperienceLevel(level));
    }
    if let Some(specialties) = &filters.specialties {
        let specialties: Vec<String> = specialties
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !specialties.is_empty() {
            predicates.push(Predicate::Specialties(specialties));
        }
    }
    if let Some(travel) = filters.travel_availability {
        predicates.push(Predicate::TravelAvailability(travel));
    }
    if let Some(studio) = filters.studio_access {
        predicates.push(Predicate::StudioAccess(studio));
    }
    if let Some(budget) = filters.budget_range {
        predicates.push(Predicate::BudgetRange(budget));
    }

    predicates
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// ILIKE pattern matching `value` literally anywhere in the column
pub fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Roles whose payload carries `travel_availability`
fn travel_roles() -> Vec<String> {
    Role::ALL
        .iter()
        .filter(|role| RoleSpecificData::empty(**role).travel_availability().is_some())
        .map(|role| role.as_str().to_string())
        .collect()
}

impl Predicate {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn matches(&self, profile: &Profile) -> bool {
        let data = &profile.role_data;
        match self {
            Self::Role(role) => profile.role() == *role,
            Self::Location(location) => contains_ci(&profile.location, &location.to_lowercase()),
            Self::Text(query) => {
                let needle = query.to_lowercase();
                contains_ci(&profile.full_name, &needle)
                    || contains_ci(&profile.bio, &needle)
                    || contains_ci(&profile.username, &needle)
            }
            Self::ExperienceLevel(level) => data.experience_level() == Some(*level),
            Self::Specialties(wanted) => data
                .specialty_list()
                .iter()
                .any(|have| wanted.iter().any(|w| w == have)),
            Self::TravelAvailability(travel) => data.travel_availability() == Some(*travel),
            Self::StudioAccess(studio) => data.studio_access() == Some(*studio),
            Self::BudgetRange(budget) => data.budget_range() == Some(*budget),
        }
    }

    /// Append this predicate as ` AND (...)`
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (");
        match self {
            Self::Role(role) => {
                qb.push("p.role = ").push_bind(role.as_str());
            }
            Self::Location(location) => {
                qb.push("p.location ILIKE ")
                    .push_bind(like_pattern(location))
                    .push(" ESCAPE '\\'");
            }
            Self::Text(query) => {
                let pattern = like_pattern(query);
                qb.push("p.full_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR p.bio ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR p.username ILIKE ")
                    .push_bind(pattern)
                    .push(" ESCAPE '\\'");
            }
            Self::ExperienceLevel(level) => {
                qb.push("p.role_specific_data->>'experience_level' = ")
                    .push_bind(level.as_str());
            }
            Self::Specialties(wanted) => {
                qb.push(
                    "COALESCE(p.role_specific_data -> \
                     (CASE WHEN p.role = 'model' THEN 'model_type' ELSE 'specialties' END), \
                     '[]'::jsonb) ?| ",
                )
                .push_bind(wanted.clone());
            }
            Self::TravelAvailability(travel) => {
                qb.push("p.role = ANY(")
                    .push_bind(travel_roles())
                    .push(") AND COALESCE((p.role_specific_data->>'travel_availability')::boolean, false) = ")
                    .push_bind(*travel);
            }
            Self::StudioAccess(studio) => {
                qb.push("p.role = 'photographer' AND p.role_specific_data->>'studio_access' = ")
                    .push_bind(studio.as_str());
            }
            Self::BudgetRange(budget) => {
                qb.push("p.role = 'producer' AND p.role_specific_data->>'budget_range' = ")
                    .push_bind(budget.as_str());
            }
        }
        qb.push(")");
    }
}

/// All predicates hold (AND)
#[cfg_attr(not(test), allow(dead_code))]
pub fn matches_all(predicates: &[Predicate], profile: &Profile) -> bool {
    predicates.iter().all(|p| p.matches(profile))
}

/// Append `WHERE TRUE` followed by every predicate
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    qb.push(" WHERE TRUE");
    for predicate in predicates {
        predicate.push_sql(qb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profiles::{PhotographerData, ProducerData};
    use crate::search::test_support::profile;

    #[test]
    fn empty_filters_build_nothing() {
        assert!(build_predicates(&SearchFilters::default()).is_empty());

        let blanks = SearchFilters {
            location: Some("   ".into()),
            query: Some("".into()),
            specialties: Some(vec![" ".into()]),
            ..Default::default()
        };
        assert!(build_predicates(&blanks).is_empty());
    }

    #[test]
    fn text_matches_any_of_three_fields() {
        let p = profile(Role::Photographer, "Ana Torres", "ana_foto", "Madrid", 0);
        let pred = Predicate::Text("TORRES".into());
        assert!(pred.matches(&p));
        assert!(Predicate::Text("ana_f".into()).matches(&p));
        assert!(Predicate::Text("biography".into()).matches(&p));
        assert!(!Predicate::Text("lisboa".into()).matches(&p));
    }

    #[test]
    fn location_is_case_insensitive_substring() {
        let p = profile(Role::Model, "Lu", "lu", "Barcelona, Spain", 0);
        assert!(Predicate::Location("barcelona".into()).matches(&p));
        assert!(Predicate::Location("SPAIN".into()).matches(&p));
        assert!(!Predicate::Location("Madrid".into()).matches(&p));
    }

    #[test]
    fn role_only_fields_never_match_other_roles() {
        let stylist = profile(Role::Stylist, "Sol", "sol", "Lima", 0);
        assert!(!Predicate::StudioAccess(StudioAccess::OwnStudio).matches(&stylist));
        assert!(!Predicate::BudgetRange(BudgetRange::Low).matches(&stylist));
        assert!(Predicate::TravelAvailability(false).matches(&stylist));

        let producer = profile(Role::Producer, "Pia", "pia", "Lima", 0);
        assert!(!Predicate::TravelAvailability(false).matches(&producer));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("madrid"), "%madrid%");
    }

    #[test]
    fn travel_roles_excludes_producer() {
        let roles = travel_roles();
        assert_eq!(roles.len(), 4);
        assert!(!roles.contains(&"producer".to_string()));
    }

    #[test]
    fn sql_rendering_binds_every_value() {
        let filters = SearchFilters {
            role: Some(Role::Photographer),
            query: Some("ana".into()),
            specialties: Some(vec!["retrato".into()]),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM profiles p");
        push_where(&mut qb, &build_predicates(&filters));
        let sql = qb.sql();

        assert!(sql.contains("p.role = $1"));
        assert!(sql.contains("p.full_name ILIKE $2"));
        assert!(sql.contains("p.username ILIKE $4"));
        assert!(sql.contains("?| $5"));
    }

    #[test]
    fn experience_level_is_exact() {
        let mut p = profile(Role::Photographer, "Ana Torres", "ana_foto", "Madrid", 0);
        p.role_data = RoleSpecificData::Photographer(PhotographerData {
            experience_level: Some(ExperienceLevel::Advanced),
            ..Default::default()
        });

        assert!(Predicate::ExperienceLevel(ExperienceLevel::Advanced).matches(&p));
        assert!(!Predicate::ExperienceLevel(ExperienceLevel::Beginner).matches(&p));
        assert!(!Predicate::ExperienceLevel(ExperienceLevel::Professional).matches(&p));
    }

    #[test]
    fn studio_and_budget_match_their_roles() {
        let mut photographer = profile(Role::Photographer, "Ana", "ana", "Madrid", 0);
        photographer.role_data = RoleSpecificData::Photographer(PhotographerData {
            studio_access: Some(StudioAccess::OwnStudio),
            ..Default::default()
        });
        assert!(Predicate::StudioAccess(StudioAccess::OwnStudio).matches(&photographer));
        assert!(!Predicate::StudioAccess(StudioAccess::NoStudio).matches(&photographer));

        let mut producer = profile(Role::Producer, "Pia", "pia", "Lima", 0);
        producer.role_data = RoleSpecificData::Producer(ProducerData {
            budget_range: Some(BudgetRange::High),
            ..Default::default()
        });
        assert!(Predicate::BudgetRange(BudgetRange::High).matches(&producer));
        assert!(!Predicate::BudgetRange(BudgetRange::Low).matches(&producer));
    }

    #[test]
    fn sql_rendering_of_role_data_filters() {
        let filters = SearchFilters {
            experience_level: Some(ExperienceLevel::Advanced),
            studio_access: Some(StudioAccess::OwnStudio),
            budget_range: Some(BudgetRange::High),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM profiles p");
        push_where(&mut qb, &build_predicates(&filters));
        let sql = qb.sql();

        assert!(sql.contains("p.role_specific_data->>'experience_level' = $1"));
        assert!(sql.contains("p.role = 'photographer' AND p.role_specific_data->>'studio_access' = $2"));
        assert!(sql.contains("p.role = 'producer' AND p.role_specific_data->>'budget_range' = $3"));
    }
}
