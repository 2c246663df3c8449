use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::error;

use crate::domain::Address;
use crate::gateways::{AddressGateway, RepoError};

const SELECT_ADDRESS: &str = "SELECT id, name, street, number, floor, apartment, postal_code,
        city, province, country, latitude, longitude, observer_user_id
     FROM addresses
     WHERE id = $1";

pub struct AddressRepo {
    pool: PgPool,
}

impl AddressRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize addresses table. Requires the users table.
    pub async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS addresses (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                street TEXT NOT NULL,
                number TEXT NOT NULL,
                floor TEXT,
                apartment TEXT,
                postal_code TEXT NOT NULL,
                city TEXT NOT NULL,
                province TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude TEXT NOT NULL,
                longitude TEXT NOT NULL,
                observer_user_id BIGINT NOT NULL
                    CONSTRAINT addresses_observer_user_id_fkey
                    REFERENCES users(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_addresses_observer_user_id
             ON addresses(observer_user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch<'e>(executor: impl PgExecutor<'e>, id: i64) -> Result<Option<Address>, sqlx::Error> {
        let row = sqlx::query(SELECT_ADDRESS)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.as_ref().map(address_from_row))
    }
}

fn address_from_row(row: &PgRow) -> Address {
    Address {
        id: row.get("id"),
        name: row.get("name"),
        street: row.get("street"),
        number: row.get("number"),
        floor: row.get("floor"),
        apartment: row.get("apartment"),
        postal_code: row.get("postal_code"),
        city: row.get("city"),
        province: row.get("province"),
        country: row.get("country"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        observer_user_id: row.get("observer_user_id"),
    }
}

#[async_trait]
impl AddressGateway for AddressRepo {
    async fn get(&self, id: i64) -> Result<Option<Address>, RepoError> {
        Self::fetch(&self.pool, id).await.map_err(|e| {
            error!("Failed to get address {}: {:?}", id, e);
            RepoError::from(e)
        })
    }

    async fn save(&self, address: &Address) -> Result<Address, RepoError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO addresses (name, street, number, floor, apartment, postal_code,
                city, province, country, latitude, longitude, observer_user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.floor)
        .bind(&address.apartment)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.province)
        .bind(&address.country)
        .bind(&address.latitude)
        .bind(&address.longitude)
        .bind(address.observer_user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert address: {:?}", e);
            e
        })?;

        let id: i64 = row.get("id");
        let saved = Self::fetch(&mut *tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn update(&self, address: &Address) -> Result<Address, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE addresses
             SET name = $2, street = $3, number = $4, floor = $5, apartment = $6,
                 postal_code = $7, city = $8, province = $9, country = $10,
                 latitude = $11, longitude = $12, observer_user_id = $13,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(address.id)
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.floor)
        .bind(&address.apartment)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.province)
        .bind(&address.country)
        .bind(&address.latitude)
        .bind(&address.longitude)
        .bind(address.observer_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to update address {}: {:?}", address.id, e);
            e
        })?;

        let updated = Self::fetch(&mut *tx, address.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete address {}: {:?}", id, e);
                e
            })?;

        Ok(())
    }
}
