use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::error;

use crate::domain::Child;
use crate::gateways::{ChildGateway, RepoError};

pub struct ChildRepo {
    pool: PgPool,
}

impl ChildRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize children table. Requires the users table.
    pub async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS children (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                school_name TEXT NOT NULL,
                school_start_time TIME NOT NULL,
                school_end_time TIME NOT NULL,
                observer_user_id BIGINT NOT NULL
                    CONSTRAINT children_observer_user_id_fkey
                    REFERENCES users(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_children_observer_user_id
             ON children(observer_user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch<'e>(executor: impl PgExecutor<'e>, id: i64) -> Result<Option<Child>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, name, last_name, school_name, school_start_time, school_end_time,
                    observer_user_id
             FROM children
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.as_ref().map(child_from_row))
    }
}

pub(crate) fn child_from_row(row: &PgRow) -> Child {
    Child {
        id: row.get("id"),
        name: row.get("name"),
        last_name: row.get("last_name"),
        school_name: row.get("school_name"),
        school_start_time: row.get("school_start_time"),
        school_end_time: row.get("school_end_time"),
        observer_user_id: row.get("observer_user_id"),
    }
}

#[async_trait]
impl ChildGateway for ChildRepo {
    async fn get(&self, id: i64) -> Result<Option<Child>, RepoError> {
        Self::fetch(&self.pool, id).await.map_err(|e| {
            error!("Failed to get child {}: {:?}", id, e);
            RepoError::from(e)
        })
    }

    async fn save(&self, child: &Child) -> Result<Child, RepoError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO children (name, last_name, school_name, school_start_time,
                school_end_time, observer_user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&child.name)
        .bind(&child.last_name)
        .bind(&child.school_name)
        .bind(child.school_start_time)
        .bind(child.school_end_time)
        .bind(child.observer_user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert child: {:?}", e);
            e
        })?;

        let id: i64 = row.get("id");
        let saved = Self::fetch(&mut *tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn update(&self, child: &Child) -> Result<Child, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE children
             SET name = $2, last_name = $3, school_name = $4, school_start_time = $5,
                 school_end_time = $6, observer_user_id = $7, updated_at = now()
             WHERE id = $1",
        )
        .bind(child.id)
        .bind(&child.name)
        .bind(&child.last_name)
        .bind(&child.school_name)
        .bind(child.school_start_time)
        .bind(child.school_end_time)
        .bind(child.observer_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to update child {}: {:?}", child.id, e);
            e
        })?;

        let updated = Self::fetch(&mut *tx, child.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM children WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete child {}: {:?}", id, e);
                e
            })?;

        Ok(())
    }
}
