// QR code management for the owner's dashboard

use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::app_config::AppConfig;
use crate::db::DieselPool;
use crate::models::content::{is_known_type, QrContent};
use crate::models::{
    BulkAction, BulkActionRequest, BulkActionResponse, CreateQrCodeRequest, ListQrCodesParams,
    NewQrCode, QrCode, QrCodeListResponse, QrCodeResponse, UpdateQrCode, UpdateQrCodeRequest,
};
use crate::schema::{folders, qr_codes};
use crate::services::slug::{generate_slug, is_slug_collision, MAX_SLUG_ATTEMPTS};
use crate::utils::password::hash_access_password;
use crate::utils::service_error::{ServiceError, ServiceResult};
use crate::utils::validation::{trim_and_validate_field, trim_optional_field};

/// Reject content that cannot be interpreted through its type
pub fn validate_content(qr_type: &str, content: &serde_json::Value) -> ServiceResult<()> {
    if !content.is_object() {
        return Err(ServiceError::ValidationError(
            "Content must be a JSON object".to_string(),
        ));
    }

    if !is_known_type(qr_type) {
        return Ok(());
    }

    let typed = QrContent::from_parts(qr_type, content);
    if typed.is_opaque() {
        return Err(ServiceError::ValidationError(format!(
            "Content does not match QR type '{}'",
            qr_type
        )));
    }

    let is_url_type = crate::models::content::URL_QR_TYPES.contains(&typed.qr_type());
    if is_url_type && typed.redirect_url().is_none() {
        return Err(ServiceError::ValidationError(
            "URL must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(())
}

/// Owner-scoped listing query with the optional filters applied
fn owner_query(user_id: Uuid, params: &ListQrCodesParams) -> qr_codes::BoxedQuery<'static, Pg> {
    let mut query = qr_codes::table
        .filter(qr_codes::user_id.eq(user_id))
        .into_boxed();

    if let Some(folder_id) = params.folder_id {
        query = query.filter(qr_codes::folder_id.eq(folder_id));
    } else if params.unfiled {
        query = query.filter(qr_codes::folder_id.is_null());
    }

    if let Some(search) = trim_optional_field(params.search.as_deref()) {
        let pattern = format!("%{}%", search);
        query = query.filter(
            qr_codes::name
                .ilike(pattern.clone())
                .or(qr_codes::slug.ilike(pattern)),
        );
    }

    if let Some(favorite) = params.favorite {
        query = query.filter(qr_codes::is_favorite.eq(favorite));
    }

    if let Some(active) = params.active {
        query = query.filter(qr_codes::is_active.eq(active));
    }

    query
}

async fn hash_password_blocking(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_access_password(&password))
        .await
        .map_err(|e| ServiceError::DatabaseError(format!("Hashing task failed: {}", e)))?
        .map_err(Into::into)
}

#[derive(Clone)]
pub struct QrCodeService {
    pool: DieselPool,
    config: Arc<AppConfig>,
}

impl QrCodeService {
    pub fn new(pool: DieselPool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    fn base_url(&self) -> &str {
        &self.config.redirect.public_base_url
    }

    async fn ensure_folder_owned(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        folder_id: Uuid,
    ) -> ServiceResult<()> {
        let owned: i64 = folders::table
            .filter(folders::id.eq(folder_id))
            .filter(folders::user_id.eq(user_id))
            .count()
            .get_result(conn)
            .await?;

        if owned == 0 {
            return Err(ServiceError::ValidationError(
                "Folder does not exist".to_string(),
            ));
        }
        Ok(())
    }

    async fn load_owned(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        id: Uuid,
    ) -> ServiceResult<QrCode> {
        qr_codes::table
            .filter(qr_codes::id.eq(id))
            .filter(qr_codes::user_id.eq(user_id))
            .select(QrCode::as_select())
            .first(conn)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateQrCodeRequest,
    ) -> ServiceResult<QrCodeResponse> {
        request.validate()?;

        let name = trim_and_validate_field(&request.name, true)
            .map_err(|e| ServiceError::ValidationError(format!("name: {}", e)))?;
        let qr_type = request.qr_type.trim().to_lowercase();
        validate_content(&qr_type, &request.content)?;

        let access_password = match request.access_password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };

        let mut conn = self.pool.get().await?;

        if let Some(folder_id) = request.folder_id {
            Self::ensure_folder_owned(&mut conn, user_id, folder_id).await?;
        }

        let now = Utc::now();
        let mut new_code = NewQrCode {
            id: Uuid::new_v4(),
            user_id,
            folder_id: request.folder_id,
            name,
            slug: generate_slug(),
            qr_type,
            content: request.content,
            design: request.design.unwrap_or_else(|| json!({})),
            is_dynamic: request.is_dynamic,
            is_active: true,
            is_favorite: false,
            access_password,
            scan_limit: request.scan_limit,
            scan_count: 0,
            qrfy_id: trim_optional_field(request.qrfy_id.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let mut attempts = 0;
        let created = loop {
            attempts += 1;
            match diesel::insert_into(qr_codes::table)
                .values(&new_code)
                .returning(QrCode::as_returning())
                .get_result(&mut conn)
                .await
            {
                Ok(code) => break code,
                Err(e) if is_slug_collision(&e) && attempts < MAX_SLUG_ATTEMPTS => {
                    tracing::warn!("Slug collision on {}, retrying", new_code.slug);
                    new_code.slug = generate_slug();
                },
                Err(e) => return Err(e.into()),
            }
        };

        info!("Created QR code {} ({}) for user {}", created.id, created.slug, user_id);
        Ok(created.to_response(self.base_url()))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        params: ListQrCodesParams,
    ) -> ServiceResult<QrCodeListResponse> {
        let mut conn = self.pool.get().await?;

        let total: i64 = owner_query(user_id, &params).count().get_result(&mut conn).await?;

        let codes: Vec<QrCode> = owner_query(user_id, &params)
            .select(QrCode::as_select())
            .order((qr_codes::is_favorite.desc(), qr_codes::created_at.desc()))
            .limit(params.per_page() as i64)
            .offset(params.offset())
            .load(&mut conn)
            .await?;

        let per_page = params.per_page();
        Ok(QrCodeListResponse {
            items: codes
                .iter()
                .map(|code| code.to_response(self.base_url()))
                .collect(),
            total,
            page: params.page(),
            per_page,
            total_pages: ((total as f64) / (per_page as f64)).ceil() as u32,
        })
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ServiceResult<QrCodeResponse> {
        let mut conn = self.pool.get().await?;
        let code = Self::load_owned(&mut conn, user_id, id).await?;
        Ok(code.to_response(self.base_url()))
    }

    /// Owner-scoped lookup returning the full record
    pub async fn find_owned(&self, user_id: Uuid, id: Uuid) -> ServiceResult<QrCode> {
        let mut conn = self.pool.get().await?;
        Self::load_owned(&mut conn, user_id, id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateQrCodeRequest,
    ) -> ServiceResult<QrCodeResponse> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let existing = Self::load_owned(&mut conn, user_id, id).await?;

        let changes_payload = request.content.is_some() || request.qr_type.is_some();
        if changes_payload && !existing.is_dynamic {
            return Err(ServiceError::ValidationError(
                "Static QR codes cannot change their content".to_string(),
            ));
        }

        let qr_type = request.qr_type.as_deref().map(|t| t.trim().to_lowercase());
        if changes_payload {
            let effective_type = qr_type.as_deref().unwrap_or(&existing.qr_type);
            let effective_content = request.content.as_ref().unwrap_or(&existing.content);
            validate_content(effective_type, effective_content)?;
        }

        if let Some(Some(folder_id)) = request.folder_id {
            Self::ensure_folder_owned(&mut conn, user_id, folder_id).await?;
        }

        let access_password = match request.access_password {
            Some(Some(password)) => {
                if !(4..=128).contains(&password.chars().count()) {
                    return Err(ServiceError::ValidationError(
                        "Password must be 4-128 characters".to_string(),
                    ));
                }
                Some(Some(hash_password_blocking(password).await?))
            },
            Some(None) => Some(None),
            None => None,
        };

        if let Some(Some(limit)) = request.scan_limit {
            if limit < 0 {
                return Err(ServiceError::ValidationError(
                    "Scan limit cannot be negative".to_string(),
                ));
            }
        }

        let name = match request.name {
            Some(name) => Some(
                trim_and_validate_field(&name, true)
                    .map_err(|e| ServiceError::ValidationError(format!("name: {}", e)))?,
            ),
            None => None,
        };

        let changes = UpdateQrCode {
            name,
            qr_type,
            content: request.content,
            design: request.design,
            folder_id: request.folder_id,
            is_active: request.is_active,
            is_favorite: request.is_favorite,
            access_password,
            scan_limit: request.scan_limit,
            updated_at: Some(Utc::now()),
        };

        let updated: QrCode = diesel::update(qr_codes::table.find(existing.id))
            .set(&changes)
            .returning(QrCode::as_returning())
            .get_result(&mut conn)
            .await?;

        info!("Updated QR code {} for user {}", updated.id, user_id);
        Ok(updated.to_response(self.base_url()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(
            qr_codes::table
                .filter(qr_codes::id.eq(id))
                .filter(qr_codes::user_id.eq(user_id)),
        )
        .execute(&mut conn)
        .await?;

        if deleted == 0 {
            return Err(ServiceError::NotFound);
        }

        info!("Deleted QR code {} for user {}", id, user_id);
        Ok(())
    }

    pub async fn toggle_status(&self, user_id: Uuid, id: Uuid) -> ServiceResult<QrCodeResponse> {
        let mut conn = self.pool.get().await?;

        let updated: QrCode = diesel::update(
            qr_codes::table
                .filter(qr_codes::id.eq(id))
                .filter(qr_codes::user_id.eq(user_id)),
        )
        .set((
            qr_codes::is_active.eq(diesel::dsl::not(qr_codes::is_active)),
            qr_codes::updated_at.eq(Utc::now()),
        ))
        .returning(QrCode::as_returning())
        .get_result(&mut conn)
        .await?;

        info!("QR code {} is_active={}", updated.id, updated.is_active);
        Ok(updated.to_response(self.base_url()))
    }

    pub async fn toggle_favorite(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> ServiceResult<QrCodeResponse> {
        let mut conn = self.pool.get().await?;

        let updated: QrCode = diesel::update(
            qr_codes::table
                .filter(qr_codes::id.eq(id))
                .filter(qr_codes::user_id.eq(user_id)),
        )
        .set((
            qr_codes::is_favorite.eq(diesel::dsl::not(qr_codes::is_favorite)),
            qr_codes::updated_at.eq(Utc::now()),
        ))
        .returning(QrCode::as_returning())
        .get_result(&mut conn)
        .await?;

        Ok(updated.to_response(self.base_url()))
    }

    /// Apply one action to many codes; ids the caller does not own are ignored
    #[instrument(skip(self, request), fields(action = ?request.action, count = request.ids.len()))]
    pub async fn bulk_action(
        &self,
        user_id: Uuid,
        request: BulkActionRequest,
    ) -> ServiceResult<BulkActionResponse> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let owned = qr_codes::table
            .filter(qr_codes::id.eq_any(&request.ids))
            .filter(qr_codes::user_id.eq(user_id));
        let now = Utc::now();

        let affected = match request.action {
            BulkAction::Delete => diesel::delete(owned).execute(&mut conn).await?,
            BulkAction::Activate | BulkAction::Deactivate => {
                diesel::update(owned)
                    .set((
                        qr_codes::is_active.eq(request.action == BulkAction::Activate),
                        qr_codes::updated_at.eq(now),
                    ))
                    .execute(&mut conn)
                    .await?
            },
            BulkAction::Favorite | BulkAction::Unfavorite => {
                diesel::update(owned)
                    .set((
                        qr_codes::is_favorite.eq(request.action == BulkAction::Favorite),
                        qr_codes::updated_at.eq(now),
                    ))
                    .execute(&mut conn)
                    .await?
            },
            BulkAction::Move => {
                if let Some(folder_id) = request.folder_id {
                    Self::ensure_folder_owned(&mut conn, user_id, folder_id).await?;
                }
                diesel::update(owned)
                    .set((
                        qr_codes::folder_id.eq(request.folder_id),
                        qr_codes::updated_at.eq(now),
                    ))
                    .execute(&mut conn)
                    .await?
            },
        };

        info!(
            "Bulk {:?} affected {} QR codes for user {}",
            request.action, affected, user_id
        );

        Ok(BulkActionResponse {
            action: request.action,
            affected,
        })
    }
}
