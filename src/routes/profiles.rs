//! Profile routes
//!
//! Public directory reads (search, suggestions, lookups) and the signed-in
//! user's own profile.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::portfolio::read_single_file;
use crate::api::{DataResponse, PageRequest};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::profiles::{
    BudgetRange, ExperienceLevel, ImageKind, Role, StudioAccess, UpdateProfileRequest,
};
use crate::domain::search::{SearchFilters, SearchOptions, SortBy, SortOrder, SuggestionQuery};
use crate::error::ApiError;

/// Header carrying a per-tab client id used to fence stale searches
pub const X_CLIENT_ID: &str = "x-client-id";

const DEFAULT_SUGGESTIONS: u32 = 8;
const MAX_SUGGESTIONS: u32 = 20;

/// Flat query string for `/profiles/search`.
///
/// `specialties` is comma separated.
#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    pub role: Option<Role>,
    pub location: Option<String>,
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub specialties: Option<String>,
    pub travel_availability: Option<bool>,
    pub studio_access: Option<StudioAccess>,
    pub budget_range: Option<BudgetRange>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    /// Client-side sequence number of this search
    pub seq: Option<u64>,
}

impl SearchParams {
    fn split(self) -> (SearchFilters, PageRequest, SearchOptions) {
        let specialties = self.specialties.map(|s| {
            s.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        });

        (
            SearchFilters {
                role: self.role,
                location: self.location,
                query: self.query,
                experience_level: self.experience_level,
                specialties,
                travel_availability: self.travel_availability,
                studio_access: self.studio_access,
                budget_range: self.budget_range,
            },
            PageRequest {
                page: self.page,
                limit: self.limit,
            },
            SearchOptions {
                sort_by: self.sort_by.unwrap_or_default(),
                sort_order: self.sort_order,
            },
        )
    }
}

fn client_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(X_CLIENT_ID)?
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// GET /profiles/search
///
/// A search from a client that has since started a newer one is answered
/// with SUPERSEDED instead of its results.
pub async fn search_profiles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = client_id(&headers).map(|client| state.search_fence.begin(client, params.seq));
    let (filters, page, options) = params.split();

    let results = state.profiles.search(&filters, page, options).await?;

    if let Some(ticket) = ticket {
        if !state.search_fence.is_current(&ticket) {
            tracing::debug!(client = %ticket.client, seq = ticket.seq, "Dropping superseded search");
            return Err(ApiError::Superseded);
        }
    }

    Ok(DataResponse::new(results))
}

/// GET /profiles/suggestions
pub async fn get_suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SUGGESTIONS)
        .clamp(1, MAX_SUGGESTIONS) as usize;

    let suggestions = state.profiles.suggestions(&query.q, query.kind, limit).await?;
    Ok(DataResponse::new(suggestions))
}

/// GET /profiles/by-username/:username
pub async fn get_profile_by_username(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.get_by_username(&username).await?;
    Ok(DataResponse::new(profile))
}

/// GET /profiles/:id
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.get_by_id(id).await?;
    Ok(DataResponse::new(profile))
}

/// GET /profiles/me
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.get_by_id(auth.user_id).await?;
    Ok(DataResponse::new(profile))
}

/// PATCH /profiles/me
///
/// Partial update. `role_specific_data` keys are merged into the stored
/// payload before validation.
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.update_profile(auth.user_id, req).await?;
    Ok(DataResponse::new(profile))
}

/// POST /profiles/me/images/:kind
///
/// Replace the avatar or cover image with the uploaded `file`.
pub async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Path(kind): Path<ImageKind>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = read_single_file(multipart).await?;
    let profile = state
        .profiles
        .set_profile_image(state.storage.as_ref(), auth.user_id, kind, file)
        .await?;
    Ok(DataResponse::new(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> SearchParams {
        Query::<SearchParams>::try_from_uri(&uri.parse().unwrap()).unwrap().0
    }

    #[test]
    fn search_params_split_into_filters_page_and_sort() {
        let params = parse(
            "/profiles/search?role=photographer&q=berlin&specialties=fashion,%20editorial,,&page=2&limit=10&sort_by=name&sort_order=desc&seq=7",
        );
        assert_eq!(params.seq, Some(7));

        let (filters, page, options) = params.split();
        assert_eq!(filters.role, Some(Role::Photographer));
        assert_eq!(filters.query.as_deref(), Some("berlin"));
        assert_eq!(
            filters.specialties,
            Some(vec!["fashion".to_string(), "editorial".to_string()])
        );
        assert_eq!(page.offset(), 10);
        assert_eq!(options.sort_by, SortBy::Name);
        assert!(!options.ascending());
    }

    #[test]
    fn empty_query_means_no_constraints() {
        let params = parse("/profiles/search");
        let (filters, page, options) = params.split();
        assert!(crate::search::build_predicates(&filters).is_empty());
        assert_eq!(page.page(), 1);
        assert_eq!(options.sort_by, SortBy::Relevance);
    }

    #[test]
    fn client_id_header_is_optional() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_id(&headers), None);

        let id = Uuid::new_v4();
        headers.insert(X_CLIENT_ID, id.to_string().parse().unwrap());
        assert_eq!(client_id(&headers), Some(id));
    }
}
