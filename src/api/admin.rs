//! Dashboard and maintenance routes for administrators.

use super::auth::CustomSecurityScheme;
use super::schema::{ApiTags, ErrorResponse, GetRecordResponse};
use crate::model::stats::{AdminStats, CleanupReport, HealthReport, DEFAULT_CLEANUP_DAYS};
use crate::model::util::UploadStore;
use crate::require_admin;
use poem::web::Data;
use poem_openapi::{param::Query, OpenApi};
use std::sync::Arc;

pub struct AdminApi;

#[OpenApi]
impl AdminApi {
    /// Call `/api/v1/admin/stats` to fetch counts for the dashboard.
    #[oai(
        path = "/api/v1/admin/stats",
        method = "get",
        tag = "ApiTags::Admin",
        operation_id = "fetchAdminStats"
    )]
    async fn fetch_admin_stats(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<AdminStats> {
        require_admin!(token, GetRecordResponse<AdminStats>);
        let pool_arc = pool.clone();

        match AdminStats::collect(&pool_arc).await {
            Ok(stats) => GetRecordResponse::ok(stats),
            Err(e) => GetRecordResponse::from_error("Failed to fetch statistics", e),
        }
    }

    /// Call `/api/v1/admin/health` to check the database, key tables and upload directories.
    /// A failing check is reported in the body with `status = unhealthy`.
    #[oai(
        path = "/api/v1/admin/health",
        method = "get",
        tag = "ApiTags::Admin",
        operation_id = "fetchAdminHealth"
    )]
    async fn fetch_admin_health(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<HealthReport> {
        require_admin!(token, GetRecordResponse<HealthReport>);
        let pool_arc = pool.clone();

        GetRecordResponse::ok(HealthReport::check(&pool_arc, &store).await)
    }

    /// Call `/api/v1/admin/cleanup?days_old=7` to delete unreferenced processed images.
    #[oai(
        path = "/api/v1/admin/cleanup",
        method = "post",
        tag = "ApiTags::Admin",
        operation_id = "cleanupUploads"
    )]
    async fn cleanup_uploads(
        &self,
        pool: Data<&Arc<sqlx::PgPool>>,
        store: Data<&UploadStore>,
        days_old: Query<Option<i64>>,
        token: CustomSecurityScheme,
    ) -> GetRecordResponse<CleanupReport> {
        require_admin!(token, GetRecordResponse<CleanupReport>);
        let pool_arc = pool.clone();
        let days_old = days_old.0.unwrap_or(DEFAULT_CLEANUP_DAYS);

        match CleanupReport::run(&pool_arc, &store, days_old).await {
            Ok(report) => GetRecordResponse::ok(report),
            Err(e) => GetRecordResponse::from_error("Failed to clean up uploads", e),
        }
    }
}
