//! Repository for the `limit_configs` table.

use sqlx::PgPool;

use crate::models::limit_config::{CreateLimitConfig, LimitConfigRow};

const COLUMNS: &str = "id, \
    x_sigma2_lower, x_sigma2_upper, x_sigma3_lower, x_sigma3_upper, \
    y_sigma2_lower, y_sigma2_upper, y_sigma3_lower, y_sigma3_upper, \
    z_sigma2_lower, z_sigma2_upper, z_sigma3_lower, z_sigma3_upper, \
    created_at";

/// Provides access to the active limit configuration.
pub struct LimitConfigRepo;

impl LimitConfigRepo {
    /// The newest configuration row, if any.
    pub async fn find_active(pool: &PgPool) -> Result<Option<LimitConfigRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM limit_configs
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, LimitConfigRow>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Append a configuration row; it becomes the active one.
    pub async fn insert(
        pool: &PgPool,
        body: &CreateLimitConfig,
    ) -> Result<LimitConfigRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO limit_configs (
                x_sigma2_lower, x_sigma2_upper, x_sigma3_lower, x_sigma3_upper,
                y_sigma2_lower, y_sigma2_upper, y_sigma3_lower, y_sigma3_upper,
                z_sigma2_lower, z_sigma2_upper, z_sigma3_lower, z_sigma3_upper)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let mut q = sqlx::query_as::<_, LimitConfigRow>(&query);
        for value in body.bounds.iter().flatten() {
            q = q.bind(*value);
        }
        q.fetch_one(pool).await
    }
}
