// Platform-wide views for administrators

use chrono::{Duration, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app_config::AppConfig;
use crate::db::DieselPool;
use crate::models::{
    AdminListParams, AdminStats, AdminUserSummary, BreakdownEntry, QrCode, QrCodeListResponse,
    QrCodeResponse, SubscriptionStatus, User,
};
use crate::schema::{qr_codes, scans, users};
use crate::utils::service_error::ServiceResult;
use crate::utils::validation::trim_optional_field;

fn user_query(params: &AdminListParams) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table.into_boxed();
    if let Some(search) = trim_optional_field(params.search.as_deref()) {
        let pattern = format!("%{}%", search);
        query = query.filter(users::email.ilike(pattern.clone()).or(users::name.ilike(pattern)));
    }
    query
}

fn qr_query(params: &AdminListParams) -> qr_codes::BoxedQuery<'static, Pg> {
    let mut query = qr_codes::table.into_boxed();
    if let Some(search) = trim_optional_field(params.search.as_deref()) {
        let pattern = format!("%{}%", search);
        query = query.filter(qr_codes::name.ilike(pattern.clone()).or(qr_codes::slug.ilike(pattern)));
    }
    query
}

#[derive(Clone)]
pub struct AdminService {
    pool: DieselPool,
    config: Arc<AppConfig>,
}

impl AdminService {
    pub fn new(pool: DieselPool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> ServiceResult<AdminStats> {
        let mut conn = self.pool.get().await?;

        let total_users: i64 = users::table.count().get_result(&mut conn).await?;

        let status_counts: HashMap<String, i64> = users::table
            .group_by(users::subscription_status)
            .select((users::subscription_status, diesel::dsl::count_star()))
            .load::<(String, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect();

        // Every known status is reported, zero or not
        let users_by_status = SubscriptionStatus::ALL
            .iter()
            .map(|status| BreakdownEntry {
                label: status.as_str().to_string(),
                count: status_counts.get(status.as_str()).copied().unwrap_or(0),
            })
            .collect();

        let total_qr_codes: i64 = qr_codes::table.count().get_result(&mut conn).await?;
        let active_qr_codes: i64 = qr_codes::table
            .filter(qr_codes::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await?;

        let total_scans: i64 = scans::table.count().get_result(&mut conn).await?;
        let scans_last_30_days: i64 = scans::table
            .filter(scans::scanned_at.ge(Utc::now() - Duration::days(30)))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(AdminStats {
            total_users,
            users_by_status,
            total_qr_codes,
            active_qr_codes,
            total_scans,
            scans_last_30_days,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, params: AdminListParams) -> ServiceResult<Vec<AdminUserSummary>> {
        let mut conn = self.pool.get().await?;

        let page: Vec<User> = user_query(&params)
            .select(User::as_select())
            .order(users::created_at.desc())
            .limit(params.per_page() as i64)
            .offset(params.offset())
            .load(&mut conn)
            .await?;

        let ids: Vec<Uuid> = page.iter().map(|u| u.id).collect();
        let counts: HashMap<Uuid, i64> = qr_codes::table
            .filter(qr_codes::user_id.eq_any(&ids))
            .group_by(qr_codes::user_id)
            .select((qr_codes::user_id, diesel::dsl::count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect();

        Ok(page
            .into_iter()
            .map(|user| {
                let qr_count = counts.get(&user.id).copied().unwrap_or(0);
                AdminUserSummary { user, qr_count }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_qr_codes(&self, params: AdminListParams) -> ServiceResult<QrCodeListResponse> {
        let mut conn = self.pool.get().await?;

        let total: i64 = qr_query(&params).count().get_result(&mut conn).await?;
        let codes: Vec<QrCode> = qr_query(&params)
            .select(QrCode::as_select())
            .order(qr_codes::created_at.desc())
            .limit(params.per_page() as i64)
            .offset(params.offset())
            .load(&mut conn)
            .await?;

        let base_url = &self.config.redirect.public_base_url;
        let per_page = params.per_page();
        Ok(QrCodeListResponse {
            items: codes.iter().map(|code| code.to_response(base_url)).collect(),
            total,
            page: params.page(),
            per_page,
            total_pages: ((total as f64) / (per_page as f64)).ceil() as u32,
        })
    }

    /// Enable or disable any code regardless of owner
    #[instrument(skip(self))]
    pub async fn force_toggle(
        &self,
        qr_code_id: Uuid,
        is_active: Option<bool>,
    ) -> ServiceResult<QrCodeResponse> {
        let mut conn = self.pool.get().await?;
        let target = qr_codes::table.find(qr_code_id);
        let now = Utc::now();

        let updated: QrCode = match is_active {
            Some(value) => {
                diesel::update(target)
                    .set((qr_codes::is_active.eq(value), qr_codes::updated_at.eq(now)))
                    .returning(QrCode::as_returning())
                    .get_result(&mut conn)
                    .await?
            },
            None => {
                diesel::update(target)
                    .set((
                        qr_codes::is_active.eq(diesel::dsl::not(qr_codes::is_active)),
                        qr_codes::updated_at.eq(now),
                    ))
                    .returning(QrCode::as_returning())
                    .get_result(&mut conn)
                    .await?
            },
        };

        info!(
            "Admin set QR code {} is_active={}",
            updated.id, updated.is_active
        );
        Ok(updated.to_response(&self.config.redirect.public_base_url))
    }
}
