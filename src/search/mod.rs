//! Profile search: filter predicates, ordering, pagination, suggestions
//! and stale-response fencing.

pub mod fence;
pub mod predicates;
pub mod suggestions;

use std::cmp::Ordering;

use sqlx::{Postgres, QueryBuilder};

use crate::api::PageRequest;
use crate::domain::profiles::Profile;
use crate::domain::search::{SearchFilters, SearchOptions, SearchResults, SortBy};

pub use fence::SearchFence;
pub use predicates::{build_predicates, push_where};
use predicates::matches_all;
pub use suggestions::rank_suggestions;

/// Compare two profiles under `options`; ties fall back to id.
///
/// Names compare lowercased, byte by byte, like `LOWER(..) COLLATE "C"`.
#[cfg_attr(not(test), allow(dead_code))]
pub fn compare_profiles(a: &Profile, b: &Profile, options: &SearchOptions) -> Ordering {
    let primary = match options.sort_by {
        SortBy::Name => a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()),
        SortBy::Recent | SortBy::Relevance | SortBy::Score => a.updated_at.cmp(&b.updated_at),
    };
    let primary = if options.ascending() { primary } else { primary.reverse() };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Append the ORDER BY clause matching [`compare_profiles`]
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, options: &SearchOptions) {
    let column = match options.sort_by {
        SortBy::Name => "LOWER(p.full_name) COLLATE \"C\"",
        SortBy::Recent | SortBy::Relevance | SortBy::Score => "p.updated_at",
    };
    let direction = if options.ascending() { "ASC" } else { "DESC" };
    qb.push(format!(" ORDER BY {} {}, p.id ASC", column, direction));
}

/// Run a search over an in-memory profile collection with the same
/// semantics as the SQL built by [`push_where`] and [`push_order_by`]
#[cfg_attr(not(test), allow(dead_code))]
pub fn search_profiles(
    profiles: &[Profile],
    filters: &SearchFilters,
    page: PageRequest,
    options: SearchOptions,
) -> SearchResults {
    let predicates = build_predicates(filters);

    let mut matched: Vec<&Profile> = profiles
        .iter()
        .filter(|p| matches_all(&predicates, p))
        .collect();
    matched.sort_by(|a, b| compare_profiles(a, b, &options));

    let total = matched.len() as u64;
    let window = matched
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();

    SearchResults {
        profiles: window,
        total,
        page: page.page(),
        limit: page.limit(),
        has_more: page.has_more(total),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::domain::profiles::{Profile, Role, RoleSpecificData, SubscriptionTier};

    /// Profile updated `age_days` before a fixed reference instant
    pub fn profile(role: Role, full_name: &str, username: &str, location: &str, age_days: i64) -> Profile {
        let reference = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let updated_at = reference - Duration::days(age_days);
        Profile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            bio: format!("A short biography of {}", full_name),
            location: location.to_string(),
            avatar_url: None,
            cover_url: None,
            subscription_tier: SubscriptionTier::Free,
            role_data: RoleSpecificData::empty(role),
            portfolio: Vec::new(),
            created_at: updated_at - Duration::days(30),
            updated_at,
        }
    }
}
