use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::error;

use crate::domain::SchoolBus;
use crate::gateways::{RepoError, SchoolBusGateway};

pub struct SchoolBusRepo {
    pool: PgPool,
}

impl SchoolBusRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize school_buses table. One bus per observed user.
    pub async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS school_buses (
                id TEXT PRIMARY KEY,
                license_plate TEXT NOT NULL,
                model TEXT NOT NULL,
                brand TEXT NOT NULL,
                license TEXT NOT NULL,
                observed_user_id BIGINT NOT NULL
                    CONSTRAINT school_buses_observed_user_id_key UNIQUE
                    CONSTRAINT school_buses_observed_user_id_fkey
                    REFERENCES users(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch<'e>(
        executor: impl PgExecutor<'e>,
        id: &str,
    ) -> Result<Option<SchoolBus>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, license_plate, model, brand, license, observed_user_id
             FROM school_buses
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.as_ref().map(school_bus_from_row))
    }
}

pub(crate) fn school_bus_from_row(row: &PgRow) -> SchoolBus {
    SchoolBus {
        id: row.get("id"),
        license_plate: row.get("license_plate"),
        model: row.get("model"),
        brand: row.get("brand"),
        license: row.get("license"),
        observed_user_id: row.get("observed_user_id"),
    }
}

#[async_trait]
impl SchoolBusGateway for SchoolBusRepo {
    async fn get(&self, id: &str) -> Result<Option<SchoolBus>, RepoError> {
        Self::fetch(&self.pool, id).await.map_err(|e| {
            error!("Failed to get school bus {}: {:?}", id, e);
            RepoError::from(e)
        })
    }

    async fn save(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO school_buses (id, license_plate, model, brand, license, observed_user_id)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&bus.id)
        .bind(&bus.license_plate)
        .bind(&bus.model)
        .bind(&bus.brand)
        .bind(&bus.license)
        .bind(bus.observed_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert school bus {}: {:?}", bus.id, e);
            e
        })?;

        let saved = Self::fetch(&mut *tx, &bus.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn update(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE school_buses
             SET license_plate = $2, model = $3, brand = $4, license = $5,
                 observed_user_id = $6, updated_at = now()
             WHERE id = $1",
        )
        .bind(&bus.id)
        .bind(&bus.license_plate)
        .bind(&bus.model)
        .bind(&bus.brand)
        .bind(&bus.license)
        .bind(bus.observed_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to update school bus {}: {:?}", bus.id, e);
            e
        })?;

        let updated = Self::fetch(&mut *tx, &bus.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM school_buses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete school bus {}: {:?}", id, e);
                e
            })?;

        Ok(())
    }
}
