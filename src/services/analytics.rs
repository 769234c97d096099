// Scan analytics aggregated from the scans table

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Timestamptz, Uuid as SqlUuid};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{
    AnalyticsOverview, AnalyticsQuery, BreakdownEntry, DailyCount, QrAnalytics, QrCode,
    ScanBreakdowns, TopQrCode,
};
use crate::schema::{qr_codes, scans};
use crate::utils::service_error::{ServiceError, ServiceResult};

/// Buckets kept per breakdown
const TOP_N: i64 = 10;

/// Scan columns that can be broken down
#[derive(Debug, Clone, Copy)]
enum Dimension {
    Device,
    Browser,
    Os,
    Country,
    City,
}

impl Dimension {
    fn column(self) -> &'static str {
        match self {
            Dimension::Device => "device_type",
            Dimension::Browser => "browser",
            Dimension::Os => "os",
            Dimension::Country => "country",
            Dimension::City => "city",
        }
    }
}

/// Which scans an aggregate covers
#[derive(Debug, Clone, Copy)]
struct ScanScope {
    user_id: Uuid,
    qr_code_id: Option<Uuid>,
    since: DateTime<Utc>,
}

async fn breakdown(
    conn: &mut AsyncPgConnection,
    scope: ScanScope,
    dimension: Dimension,
) -> Result<Vec<BreakdownEntry>, diesel::result::Error> {
    // Column names come from a closed enum, never from input
    let query = format!(
        "SELECT {col} AS label, COUNT(*) AS count FROM scans \
         WHERE user_id = $1 AND scanned_at >= $2 AND ($3::uuid IS NULL OR qr_code_id = $3) \
         GROUP BY {col} ORDER BY count DESC, label ASC LIMIT $4",
        col = dimension.column()
    );

    diesel::sql_query(query)
        .bind::<SqlUuid, _>(scope.user_id)
        .bind::<Timestamptz, _>(scope.since)
        .bind::<Nullable<SqlUuid>, _>(scope.qr_code_id)
        .bind::<BigInt, _>(TOP_N)
        .load(conn)
        .await
}

async fn breakdowns(
    conn: &mut AsyncPgConnection,
    scope: ScanScope,
) -> Result<ScanBreakdowns, diesel::result::Error> {
    Ok(ScanBreakdowns {
        by_device: breakdown(conn, scope, Dimension::Device).await?,
        by_browser: breakdown(conn, scope, Dimension::Browser).await?,
        by_os: breakdown(conn, scope, Dimension::Os).await?,
        by_country: breakdown(conn, scope, Dimension::Country).await?,
        by_city: breakdown(conn, scope, Dimension::City).await?,
    })
}

async fn daily_series(
    conn: &mut AsyncPgConnection,
    scope: ScanScope,
) -> Result<Vec<DailyCount>, diesel::result::Error> {
    diesel::sql_query(
        "SELECT (scanned_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count FROM scans \
         WHERE user_id = $1 AND scanned_at >= $2 AND ($3::uuid IS NULL OR qr_code_id = $3) \
         GROUP BY day ORDER BY day ASC",
    )
    .bind::<SqlUuid, _>(scope.user_id)
    .bind::<Timestamptz, _>(scope.since)
    .bind::<Nullable<SqlUuid>, _>(scope.qr_code_id)
    .load(conn)
    .await
}

async fn scans_in_period(
    conn: &mut AsyncPgConnection,
    scope: ScanScope,
) -> Result<i64, diesel::result::Error> {
    let mut query = scans::table
        .filter(scans::user_id.eq(scope.user_id))
        .filter(scans::scanned_at.ge(scope.since))
        .into_boxed();

    if let Some(qr_code_id) = scope.qr_code_id {
        query = query.filter(scans::qr_code_id.eq(qr_code_id));
    }

    query.count().get_result(conn).await
}

#[derive(Clone)]
pub struct AnalyticsService {
    pool: DieselPool,
}

impl AnalyticsService {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    /// Analytics for one of the caller's codes
    #[instrument(skip(self))]
    pub async fn qr_analytics(
        &self,
        user_id: Uuid,
        qr_code_id: Uuid,
        query: AnalyticsQuery,
    ) -> ServiceResult<QrAnalytics> {
        let mut conn = self.pool.get().await?;

        let code: QrCode = qr_codes::table
            .filter(qr_codes::id.eq(qr_code_id))
            .filter(qr_codes::user_id.eq(user_id))
            .select(QrCode::as_select())
            .first(&mut conn)
            .await
            .map_err(ServiceError::from)?;

        let days = query.days();
        let scope = ScanScope {
            user_id,
            qr_code_id: Some(code.id),
            since: Utc::now() - Duration::days(i64::from(days)),
        };

        Ok(QrAnalytics {
            qr_code_id: code.id,
            scan_count: code.scan_count,
            scans_in_period: scans_in_period(&mut conn, scope).await?,
            period_days: days,
            vendor_tracked: code.is_vendor_tracked(),
            breakdowns: breakdowns(&mut conn, scope).await?,
            daily: daily_series(&mut conn, scope).await?,
        })
    }

    /// Analytics across every code the caller owns
    #[instrument(skip(self))]
    pub async fn overview(
        &self,
        user_id: Uuid,
        query: AnalyticsQuery,
    ) -> ServiceResult<AnalyticsOverview> {
        let mut conn = self.pool.get().await?;

        let days = query.days();
        let scope = ScanScope {
            user_id,
            qr_code_id: None,
            since: Utc::now() - Duration::days(i64::from(days)),
        };

        let total_qr_codes: i64 = qr_codes::table
            .filter(qr_codes::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await?;

        let active_qr_codes: i64 = qr_codes::table
            .filter(qr_codes::user_id.eq(user_id))
            .filter(qr_codes::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await?;

        let total_scans: i64 = scans::table
            .filter(scans::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await?;

        let top_qr_codes = qr_codes::table
            .filter(qr_codes::user_id.eq(user_id))
            .order(qr_codes::scan_count.desc())
            .limit(5)
            .select((qr_codes::id, qr_codes::name, qr_codes::slug, qr_codes::scan_count))
            .load::<(Uuid, String, String, i32)>(&mut conn)
            .await?
            .into_iter()
            .map(|(id, name, slug, scan_count)| TopQrCode {
                id,
                name,
                slug,
                scan_count,
            })
            .collect();

        Ok(AnalyticsOverview {
            total_qr_codes,
            active_qr_codes,
            total_scans,
            scans_in_period: scans_in_period(&mut conn, scope).await?,
            period_days: days,
            breakdowns: breakdowns(&mut conn, scope).await?,
            daily: daily_series(&mut conn, scope).await?,
            top_qr_codes,
        })
    }
}
