//! Portfolio image domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Portfolio image owned by a profile.
///
/// `sort_order` values of one profile form the gapless range `0..n`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PortfolioImage {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Metadata supplied alongside an uploaded portfolio file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NewPortfolioImage {
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Request to reorder a profile's portfolio; ids in their new order
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderPortfolioRequest {
    pub image_ids: Vec<Uuid>,
}

/// Assign `0..n` to `images` following the order of `ordered_ids`.
///
/// Returns `None` unless `ordered_ids` is exactly a permutation of the
/// image ids.
pub fn reorder(images: &[PortfolioImage], ordered_ids: &[Uuid]) -> Option<Vec<(Uuid, i32)>> {
    if images.len() != ordered_ids.len() {
        return None;
    }

    let mut seen = std::collections::HashSet::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        if !seen.insert(*id) || !images.iter().any(|img| img.id == *id) {
            return None;
        }
    }

    Some(
        ordered_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx as i32))
            .collect(),
    )
}

/// Close gaps left by a removal, keeping the current relative order
pub fn renumber(images: &mut [PortfolioImage]) {
    images.sort_by_key(|img| (img.sort_order, img.created_at));
    for (idx, img) in images.iter_mut().enumerate() {
        img.sort_order = idx as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(sort_order: i32) -> PortfolioImage {
        PortfolioImage {
            id: Uuid::new_v4(),
            profile_id: Uuid::nil(),
            image_url: format!("https://cdn.example.com/{}.jpg", sort_order),
            alt_text: None,
            sort_order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renumber_closes_gaps() {
        let mut images = vec![image(4), image(0), image(2)];
        renumber(&mut images);
        let orders: Vec<i32> = images.iter().map(|i| i.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(images[2].image_url.ends_with("4.jpg"));
    }

    #[test]
    fn reorder_requires_permutation() {
        let images = vec![image(0), image(1), image(2)];
        let ids: Vec<Uuid> = images.iter().rev().map(|i| i.id).collect();

        let assigned = reorder(&images, &ids).unwrap();
        assert_eq!(assigned[0], (images[2].id, 0));
        assert_eq!(assigned[2], (images[0].id, 2));

        // missing one id
        assert!(reorder(&images, &ids[..2]).is_none());
        // duplicate id
        assert!(reorder(&images, &[ids[0], ids[0], ids[1]]).is_none());
        // foreign id
        assert!(reorder(&images, &[ids[0], ids[1], Uuid::new_v4()]).is_none());
    }
}
