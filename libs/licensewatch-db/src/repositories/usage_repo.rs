use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::usage_record::{NewUsageRecord, UsageRecord};
use crate::store::UsageStore;

// PostgreSQL caps a statement at 65535 bind parameters; 8 per row.
const INSERT_CHUNK_ROWS: usize = 1000;

/// One multi-row INSERT for `chunk`, eight binds per row.
fn insert_batch(chunk: &[NewUsageRecord]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "INSERT INTO license_usage_log (vni_asset_number, license_id, project_name, \
         domain_name, team_name, current_user_id, duration_days, duration_hours) ",
    );
    builder.push_values(chunk, |mut b, row| {
        b.push_bind(row.vni_asset_number.clone())
            .push_bind(row.license_id.clone())
            .push_bind(row.project_name.clone())
            .push_bind(row.domain_name.clone())
            .push_bind(row.team_name.clone())
            .push_bind(row.current_user_id.clone())
            .push_bind(row.duration_days)
            .push_bind(row.duration_hours);
    });
    builder
}

#[derive(Clone, Debug)]
pub struct UsageRepository {
    pool: PgPool,
}

impl UsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM license_usage_log")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Connection)
    }
}

#[async_trait]
impl UsageStore for UsageRepository {
    async fn load_all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let recs = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT id, vni_asset_number, license_id, project_name, domain_name, team_name,
                   current_user_id, duration_days, duration_hours, uploaded_at
            FROM license_usage_log
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Connection)?;

        debug!("Loaded {} usage rows", recs.len());
        Ok(recs)
    }

    async fn append(&self, rows: &[NewUsageRecord]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Insert)?;
        let mut inserted = 0u64;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = insert_batch(chunk);
            let res = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::Insert)?;
            inserted += res.rows_affected();
        }

        tx.commit().await.map_err(StoreError::Insert)?;

        info!("Appended {} rows to license_usage_log", inserted);
        Ok(inserted)
    }

    async fn ping(&self) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Connection)
    }

    async fn server_version(&self) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Connection)
    }
}
