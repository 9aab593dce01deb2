//! Profile persistence, search and portfolio management over Postgres.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

use super::cache::{keys as cache_keys, RedisCache};
use super::storage::{upload_batch, upload_image, ObjectStorage, UploadFile};
use crate::api::PageRequest;
use crate::domain::portfolio::{renumber, reorder, NewPortfolioImage, PortfolioImage};
use crate::domain::profiles::{ImageKind, Profile, Role, RoleSpecificData, UpdateProfileRequest};
use crate::domain::search::{SearchFilters, SearchOptions, SearchResults, Suggestion, SuggestionKind};
use crate::error::{ApiError, ApiResult};
use crate::search::{build_predicates, push_order_by, push_where, rank_suggestions};
use crate::search::predicates::like_pattern;
use crate::search::suggestions::MIN_QUERY_CHARS;
use crate::validation::{
    sanitize_role_specific_data, sanitize_text, validate_portfolio_image, validate_profile_update,
};

/// Sanitize the text fields of a partial update, then validate what will
/// be stored
fn prepare_update(req: &mut UpdateProfileRequest, role: Role) -> ApiResult<()> {
    for field in [
        &mut req.full_name,
        &mut req.username,
        &mut req.bio,
        &mut req.location,
    ] {
        if let Some(value) = field.as_mut() {
            *value = sanitize_text(value);
        }
    }
    ApiError::check(validate_profile_update(req, role))
}

/// Files accepted in one portfolio upload request
pub const MAX_BATCH_FILES: usize = 10;

/// Candidate rows fetched per suggestion source before ranking
const SUGGESTION_CANDIDATES: i64 = 50;

const PROFILE_COLUMNS: &str = "p.id, p.username, p.full_name, p.bio, p.location, p.avatar_url, \
     p.cover_url, p.subscription_tier, p.role, p.role_specific_data, p.created_at, p.updated_at";

const IMAGE_COLUMNS: &str = "id, profile_id, image_url, alt_text, sort_order, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    full_name: String,
    bio: String,
    location: String,
    avatar_url: Option<String>,
    cover_url: Option<String>,
    subscription_tier: String,
    role: String,
    role_specific_data: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|e| anyhow!("profile {}: {}", row.id, e))?;
        let role_data = RoleSpecificData::from_parts(role, row.role_specific_data)
            .with_context(|| format!("profile {}: malformed {} data", row.id, role))?;

        Ok(Profile {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            bio: row.bio,
            location: row.location,
            avatar_url: row.avatar_url,
            cover_url: row.cover_url,
            subscription_tier: row.subscription_tier.into(),
            role_data,
            portfolio: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Overlay the top-level keys of `patch` onto `current`.
///
/// Non-object patches replace the payload outright and are left for
/// validation to reject.
pub fn merge_role_data(current: &serde_json::Value, patch: &serde_json::Value) -> serde_json::Value {
    match (current, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(changes)) => {
            let mut merged = base.clone();
            for (key, value) in changes {
                merged.insert(key.clone(), value.clone());
            }
            serde_json::Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
    cache: RedisCache,
}

impl ProfileService {
    pub fn new(db: PgPool, cache: RedisCache) -> Self {
        Self { db, cache }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> ApiResult<Profile> {
        let cache_key = cache_keys::profile(id);
        if let Some(cached) = self.cache.get::<Profile>(&cache_key).await {
            return Ok(cached);
        }

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles p WHERE p.id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

        let profile = self.hydrate(row).await?;
        self.store(&profile).await;
        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> ApiResult<Profile> {
        let cache_key = cache_keys::profile_by_username(username);
        if let Some(cached) = self.cache.get::<Profile>(&cache_key).await {
            return Ok(cached);
        }

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles p WHERE LOWER(p.username) = LOWER($1)",
            PROFILE_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

        let profile = self.hydrate(row).await?;
        self.store(&profile).await;
        Ok(profile)
    }

    pub async fn username_taken(&self, username: &str) -> ApiResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM profiles WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn hydrate(&self, row: ProfileRow) -> ApiResult<Profile> {
        let mut profile = Profile::try_from(row)?;
        profile.portfolio = self.load_portfolio(profile.id).await?;
        Ok(profile)
    }

    async fn load_portfolio(&self, profile_id: Uuid) -> ApiResult<Vec<PortfolioImage>> {
        let images = sqlx::query_as::<_, PortfolioImage>(&format!(
            "SELECT {} FROM portfolio_images WHERE profile_id = $1 ORDER BY sort_order",
            IMAGE_COLUMNS
        ))
        .bind(profile_id)
        .fetch_all(&self.db)
        .await?;
        Ok(images)
    }

    /// Portfolios for a page of profiles in one round trip
    async fn load_portfolios(&self, ids: &[Uuid]) -> ApiResult<HashMap<Uuid, Vec<PortfolioImage>>> {
        let images = sqlx::query_as::<_, PortfolioImage>(&format!(
            "SELECT {} FROM portfolio_images WHERE profile_id = ANY($1) ORDER BY profile_id, sort_order",
            IMAGE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_profile: HashMap<Uuid, Vec<PortfolioImage>> = HashMap::new();
        for image in images {
            by_profile.entry(image.profile_id).or_default().push(image);
        }
        Ok(by_profile)
    }

    // ------------------------------------------------------------------
    // Cache
    // ------------------------------------------------------------------

    async fn store(&self, profile: &Profile) {
        for key in [
            cache_keys::profile(profile.id),
            cache_keys::profile_by_username(&profile.username),
        ] {
            if let Err(e) = self.cache.set(&key, profile).await {
                tracing::warn!(profile_id = %profile.id, error = %e, "Failed to cache profile");
            }
        }
    }

    async fn invalidate(&self, id: Uuid, usernames: &[&str]) {
        let keys = std::iter::once(cache_keys::profile(id))
            .chain(usernames.iter().map(|u| cache_keys::profile_by_username(u)));
        for key in keys {
            if let Err(e) = self.cache.delete(&key).await {
                tracing::warn!(profile_id = %id, key = %key, error = %e, "Failed to invalidate cache");
            }
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert the profile row for a newly registered user; `username` and
    /// `full_name` arrive sanitized and validated
    #[instrument(skip(self))]
    pub async fn create_profile(
        &self,
        id: Uuid,
        username: &str,
        full_name: &str,
        role: Role,
    ) -> ApiResult<()> {
        let role_data = RoleSpecificData::empty(role)
            .to_value()
            .context("Failed to encode role data")?;

        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, full_name, role, role_specific_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(full_name)
        .bind(role.as_str())
        .bind(role_data)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username is already taken".into())
            } else {
                e.into()
            }
        })?;

        tracing::info!(profile_id = %id, role = %role, "Profile created");
        Ok(())
    }

    /// Apply a partial update: validate, sanitize, persist, invalidate cache
    #[instrument(skip(self, req), fields(profile_id = %id))]
    pub async fn update_profile(&self, id: Uuid, mut req: UpdateProfileRequest) -> ApiResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles p WHERE p.id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
        let current = Profile::try_from(row)?;
        let role = current.role();

        if let Some(patch) = req.role_specific_data.take() {
            let base = current.role_data.to_value().context("Failed to encode role data")?;
            req.role_specific_data = Some(merge_role_data(&base, &patch));
        }

        prepare_update(&mut req, role)?;

        let role_data = match req.role_specific_data {
            Some(value) => {
                let mut data = RoleSpecificData::from_parts(role, value)
                    .map_err(|e| ApiError::bad_request(format!("Invalid role data: {}", e)))?;
                sanitize_role_specific_data(&mut data);
                Some(data.to_value().context("Failed to encode role data")?)
            }
            None => None,
        };

        let updated = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles AS p SET
                full_name = COALESCE($2, p.full_name),
                username = COALESCE($3, p.username),
                bio = COALESCE($4, p.bio),
                location = COALESCE($5, p.location),
                role_specific_data = COALESCE($6, p.role_specific_data),
                updated_at = NOW()
            WHERE p.id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(req.full_name.as_deref())
        .bind(req.username.as_deref())
        .bind(req.bio.as_deref())
        .bind(req.location.as_deref())
        .bind(role_data)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username is already taken".into())
            } else {
                e.into()
            }
        })?;

        self.invalidate(id, &[&current.username, &updated.username]).await;
        tracing::info!(profile_id = %id, "Profile updated");

        self.hydrate(updated).await
    }

    /// Upload an avatar or cover image and point the profile at it
    #[instrument(skip(self, storage, file), fields(profile_id = %id))]
    pub async fn set_profile_image(
        &self,
        storage: &dyn ObjectStorage,
        id: Uuid,
        kind: ImageKind,
        file: UploadFile,
    ) -> ApiResult<Profile> {
        let column = match kind {
            ImageKind::Avatar => "avatar_url",
            ImageKind::Cover => "cover_url",
            ImageKind::Portfolio => {
                return Err(ApiError::bad_request("Portfolio images are uploaded in batches"))
            }
        };

        let current = self.get_by_id(id).await?;
        let stored = upload_image(storage, file, kind, id).await?;

        let result = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE profiles AS p SET {} = $2, updated_at = NOW() WHERE p.id = $1 RETURNING {}",
            column, PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(&stored.public_url)
        .fetch_one(&self.db)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                // The row never pointed at the new object
                if let Err(cleanup) = storage.delete(&stored.path).await {
                    tracing::error!(path = %stored.path, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e.into());
            }
        };

        let previous = match kind {
            ImageKind::Avatar => current.avatar_url.as_deref(),
            _ => current.cover_url.as_deref(),
        };
        if let Some(path) = previous.and_then(|url| storage.path_from_url(url)) {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(path = %path, error = %e, "Failed to delete replaced image");
            }
        }

        self.invalidate(id, &[&current.username]).await;
        self.hydrate(row).await
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Filtered, sorted, paginated profile search
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
        options: SearchOptions,
    ) -> ApiResult<SearchResults> {
        let predicates = build_predicates(filters);

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM profiles p");
        push_where(&mut count_query, &predicates);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM profiles p", PROFILE_COLUMNS));
        push_where(&mut query, &predicates);
        push_order_by(&mut query, &options);
        query
            .push(" LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<ProfileRow> = query.build_query_as().fetch_all(&self.db).await?;

        let mut profiles = rows
            .into_iter()
            .map(Profile::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let mut portfolios = self.load_portfolios(&ids).await?;
        for profile in &mut profiles {
            profile.portfolio = portfolios.remove(&profile.id).unwrap_or_default();
        }

        let total = total.max(0) as u64;
        tracing::debug!(predicates = predicates.len(), total, "Profile search");

        Ok(SearchResults {
            profiles,
            total,
            page: page.page(),
            limit: page.limit(),
            has_more: page.has_more(total),
        })
    }

    /// Autocomplete over names, usernames, locations and specialties
    #[instrument(skip(self))]
    pub async fn suggestions(
        &self,
        query: &str,
        kind: Option<SuggestionKind>,
        limit: usize,
    ) -> ApiResult<Vec<Suggestion>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            (SELECT 'profile', full_name FROM profiles WHERE full_name ILIKE $1 ESCAPE '\' LIMIT $2)
            UNION ALL
            (SELECT 'profile', username FROM profiles WHERE username ILIKE $1 ESCAPE '\' LIMIT $2)
            UNION ALL
            (SELECT DISTINCT 'location', location FROM profiles WHERE location ILIKE $1 ESCAPE '\' LIMIT $2)
            UNION ALL
            (SELECT DISTINCT 'specialty', s.value
             FROM profiles p,
                  jsonb_array_elements_text(COALESCE(
                      p.role_specific_data -> (CASE WHEN p.role = 'model' THEN 'model_type' ELSE 'specialties' END),
                      '[]'::jsonb)) AS s(value)
             WHERE s.value ILIKE $1 ESCAPE '\'
             LIMIT $2)
            "#,
        )
        .bind(like_pattern(trimmed))
        .bind(SUGGESTION_CANDIDATES)
        .fetch_all(&self.db)
        .await?;

        let candidates = rows.into_iter().filter_map(|(source, text)| {
            let kind = match source.as_str() {
                "profile" => SuggestionKind::Profile,
                "location" => SuggestionKind::Location,
                "specialty" => SuggestionKind::Specialty,
                _ => return None,
            };
            Some(Suggestion { kind, text })
        });

        Ok(rank_suggestions(trimmed, candidates, kind, limit))
    }

    // ------------------------------------------------------------------
    // Portfolio
    // ------------------------------------------------------------------

    /// Upload a batch of portfolio images and append them.
    ///
    /// Storage uploads are all-or-nothing; if the rows cannot be written
    /// the uploaded objects are removed again.
    #[instrument(skip(self, storage, files), fields(profile_id = %id, count = files.len()))]
    pub async fn add_portfolio_images(
        &self,
        storage: &dyn ObjectStorage,
        id: Uuid,
        files: Vec<(UploadFile, NewPortfolioImage)>,
    ) -> ApiResult<Vec<PortfolioImage>> {
        if files.is_empty() {
            return Err(ApiError::bad_request("No images provided"));
        }
        if files.len() > MAX_BATCH_FILES {
            return Err(ApiError::bad_request(format!(
                "At most {} images can be uploaded at once",
                MAX_BATCH_FILES
            )));
        }
        for (_, meta) in &files {
            ApiError::check(validate_portfolio_image(
                meta.alt_text.as_deref(),
                meta.sort_order.unwrap_or(0),
            ))?;
        }
        let current = self.get_by_id(id).await?;

        let (uploads, metas): (Vec<UploadFile>, Vec<NewPortfolioImage>) = files.into_iter().unzip();
        let stored = upload_batch(storage, uploads, ImageKind::Portfolio, id).await?;

        match self.insert_portfolio_rows(id, &stored, metas).await {
            Ok(images) => {
                self.invalidate(id, &[&current.username]).await;
                Ok(images)
            }
            Err(e) => {
                for object in &stored {
                    if let Err(cleanup) = storage.delete(&object.path).await {
                        tracing::error!(path = %object.path, error = %cleanup, "Failed to remove orphaned upload");
                    }
                }
                Err(e)
            }
        }
    }

    async fn insert_portfolio_rows(
        &self,
        id: Uuid,
        stored: &[super::storage::StoredObject],
        metas: Vec<NewPortfolioImage>,
    ) -> ApiResult<Vec<PortfolioImage>> {
        let mut tx = self.db.begin().await?;
        let mut images = lock_portfolio(&mut tx, id).await?;
        let existing = images.len() as i32;

        let now = Utc::now();
        let mut added = Vec::with_capacity(stored.len());
        for (idx, (object, meta)) in stored.iter().zip(metas).enumerate() {
            let image = PortfolioImage {
                id: Uuid::new_v4(),
                profile_id: id,
                image_url: object.public_url.clone(),
                alt_text: meta.alt_text.as_deref().map(sanitize_text).filter(|s| !s.is_empty()),
                // A requested position lands just after the image holding it
                sort_order: meta.sort_order.unwrap_or(existing + idx as i32),
                created_at: now,
            };
            added.push(image.id);
            images.push(image);
        }
        renumber(&mut images);

        for image in images.iter().filter(|img| added.contains(&img.id)) {
            sqlx::query(
                r#"
                INSERT INTO portfolio_images (id, profile_id, image_url, alt_text, sort_order, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(image.id)
            .bind(image.profile_id)
            .bind(&image.image_url)
            .bind(&image.alt_text)
            .bind(image.sort_order)
            .bind(image.created_at)
            .execute(&mut *tx)
            .await?;
        }
        write_sort_orders(&mut tx, id, &images).await?;
        touch_profile(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(profile_id = %id, added = added.len(), "Portfolio images added");
        Ok(images.into_iter().filter(|img| added.contains(&img.id)).collect())
    }

    /// Remove one image and close the gap it leaves
    #[instrument(skip(self, storage))]
    pub async fn delete_portfolio_image(
        &self,
        storage: &dyn ObjectStorage,
        id: Uuid,
        image_id: Uuid,
    ) -> ApiResult<()> {
        let current = self.get_by_id(id).await?;

        let mut tx = self.db.begin().await?;
        let mut images = lock_portfolio(&mut tx, id).await?;
        let position = images
            .iter()
            .position(|img| img.id == image_id)
            .ok_or_else(|| ApiError::not_found("Portfolio image not found"))?;
        let removed = images.remove(position);

        sqlx::query("DELETE FROM portfolio_images WHERE id = $1 AND profile_id = $2")
            .bind(image_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        renumber(&mut images);
        write_sort_orders(&mut tx, id, &images).await?;
        touch_profile(&mut tx, id).await?;
        tx.commit().await?;

        if let Some(path) = storage.path_from_url(&removed.image_url) {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(path = %path, error = %e, "Failed to delete portfolio object");
            }
        }

        self.invalidate(id, &[&current.username]).await;
        tracing::info!(profile_id = %id, image_id = %image_id, "Portfolio image deleted");
        Ok(())
    }

    /// Reorder the portfolio; `image_ids` must name every image exactly once
    #[instrument(skip(self, image_ids))]
    pub async fn reorder_portfolio_images(
        &self,
        id: Uuid,
        image_ids: &[Uuid],
    ) -> ApiResult<Vec<PortfolioImage>> {
        let current = self.get_by_id(id).await?;

        let mut tx = self.db.begin().await?;
        let mut images = lock_portfolio(&mut tx, id).await?;
        let positions = reorder(&images, image_ids).ok_or_else(|| {
            ApiError::bad_request("image_ids must list every portfolio image exactly once")
        })?;

        let order: HashMap<Uuid, i32> = positions.into_iter().collect();
        for image in &mut images {
            if let Some(sort_order) = order.get(&image.id) {
                image.sort_order = *sort_order;
            }
        }
        images.sort_by_key(|img| img.sort_order);

        write_sort_orders(&mut tx, id, &images).await?;
        touch_profile(&mut tx, id).await?;
        tx.commit().await?;

        self.invalidate(id, &[&current.username]).await;
        Ok(images)
    }
}

/// Current portfolio rows, locked for the rest of the transaction
async fn lock_portfolio(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Uuid,
) -> ApiResult<Vec<PortfolioImage>> {
    let images = sqlx::query_as::<_, PortfolioImage>(&format!(
        "SELECT {} FROM portfolio_images WHERE profile_id = $1 ORDER BY sort_order FOR UPDATE",
        IMAGE_COLUMNS
    ))
    .bind(profile_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(images)
}

async fn write_sort_orders(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Uuid,
    images: &[PortfolioImage],
) -> ApiResult<()> {
    let ids: Vec<Uuid> = images.iter().map(|img| img.id).collect();
    let orders: Vec<i32> = images.iter().map(|img| img.sort_order).collect();

    sqlx::query(
        r#"
        UPDATE portfolio_images AS pi
        SET sort_order = v.sort_order
        FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, sort_order)
        WHERE pi.id = v.id AND pi.profile_id = $3
        "#,
    )
    .bind(&ids)
    .bind(&orders)
    .bind(profile_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn touch_profile(tx: &mut Transaction<'_, Postgres>, profile_id: Uuid) -> ApiResult<()> {
    sqlx::query("UPDATE profiles SET updated_at = NOW() WHERE id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
