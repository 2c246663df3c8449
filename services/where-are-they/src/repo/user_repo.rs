use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::error;

use crate::domain::{NewUserAccount, ObservedUser, ObserverUser, User, UserAccount, UserKind};
use crate::gateways::{RepoError, UserGateway};
use crate::repo::child_repo::child_from_row;
use crate::repo::school_bus_repo::school_bus_from_row;

const SELECT_USER_BY_ID: &str = "SELECT id, kind, name, last_name, id_number, username, password,
        email, privacy_key, company_name
     FROM users
     WHERE id = $1";

const SELECT_USER_BY_USERNAME: &str = "SELECT id, kind, name, last_name, id_number, username,
        password, email, privacy_key, company_name
     FROM users
     WHERE username = $1";

const SELECT_OBSERVED_BY_PRIVACY_KEY: &str = "SELECT id, kind, name, last_name, id_number,
        username, password, email, privacy_key, company_name
     FROM users
     WHERE privacy_key = $1 AND kind = 'observed'";

const SELECT_OBSERVED_OF_OBSERVER: &str = "SELECT u.id, u.kind, u.name, u.last_name, u.id_number,
        u.username, u.password, u.email, u.privacy_key, u.company_name
     FROM users u
     JOIN observed_user_observer_user o ON o.observed_user_id = u.id
     WHERE o.observer_user_id = $1
     ORDER BY o.created_at, u.id";

pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize users and observation tables. Must run before the other
    /// repositories create their foreign keys.
    pub async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('observed', 'observer')),
                name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                id_number TEXT NOT NULL,
                username TEXT NOT NULL CONSTRAINT users_username_key UNIQUE,
                password TEXT NOT NULL,
                email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
                privacy_key TEXT CONSTRAINT users_privacy_key_key UNIQUE,
                company_name TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS observed_user_observer_user (
                observed_user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                observer_user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT observed_user_observer_user_pkey
                    PRIMARY KEY (observed_user_id, observer_user_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        last_name: row.get("last_name"),
        id_number: row.get("id_number"),
        username: row.get("username"),
        password: row.get("password"),
        email: row.get("email"),
    }
}

async fn observed_from_row(
    conn: &mut PgConnection,
    row: &PgRow,
) -> Result<ObservedUser, sqlx::Error> {
    let user = user_from_row(row);
    let bus = sqlx::query(
        "SELECT id, license_plate, model, brand, license, observed_user_id
         FROM school_buses
         WHERE observed_user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(ObservedUser {
        user,
        privacy_key: row.get::<Option<String>, _>("privacy_key").unwrap_or_default(),
        company_name: row.get::<Option<String>, _>("company_name").unwrap_or_default(),
        school_bus: bus.as_ref().map(school_bus_from_row),
    })
}

async fn observer_from_row(
    conn: &mut PgConnection,
    row: &PgRow,
) -> Result<ObserverUser, sqlx::Error> {
    let user = user_from_row(row);

    let children = sqlx::query(
        "SELECT id, name, last_name, school_name, school_start_time, school_end_time,
                observer_user_id
         FROM children
         WHERE observer_user_id = $1
         ORDER BY id",
    )
    .bind(user.id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(child_from_row)
    .collect();

    let observed_rows = sqlx::query(SELECT_OBSERVED_OF_OBSERVER)
        .bind(user.id)
        .fetch_all(&mut *conn)
        .await?;
    let mut observed_users = Vec::with_capacity(observed_rows.len());
    for observed in &observed_rows {
        observed_users.push(observed_from_row(&mut *conn, observed).await?);
    }

    Ok(ObserverUser {
        user,
        children,
        observed_users,
    })
}

async fn account_from_row(conn: &mut PgConnection, row: &PgRow) -> Result<UserAccount, sqlx::Error> {
    let kind: String = row.get("kind");
    match kind.parse::<UserKind>().map_err(|e| sqlx::Error::Decode(e.into()))? {
        UserKind::Observed => Ok(UserAccount::Observed(observed_from_row(conn, row).await?)),
        UserKind::Observer => Ok(UserAccount::Observer(observer_from_row(conn, row).await?)),
    }
}

async fn load_account(conn: &mut PgConnection, id: i64) -> Result<Option<UserAccount>, sqlx::Error> {
    let row = sqlx::query(SELECT_USER_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(account_from_row(conn, &row).await?)),
        None => Ok(None),
    }
}

#[async_trait]
impl UserGateway for UserRepo {
    async fn get(&self, id: i64) -> Result<Option<UserAccount>, RepoError> {
        let mut conn = self.pool.acquire().await?;
        load_account(&mut conn, id).await.map_err(|e| {
            error!("Failed to get user {}: {:?}", id, e);
            RepoError::from(e)
        })
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepoError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(SELECT_USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(account_from_row(&mut conn, &row).await?)),
            None => Ok(None),
        }
    }

    async fn get_observed_by_privacy_key(
        &self,
        privacy_key: &str,
    ) -> Result<Option<ObservedUser>, RepoError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(SELECT_OBSERVED_BY_PRIVACY_KEY)
            .bind(privacy_key)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(observed_from_row(&mut conn, &row).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, account: &NewUserAccount) -> Result<UserAccount, RepoError> {
        let identity = account.identity();
        let (privacy_key, company_name) = match account {
            NewUserAccount::Observed {
                privacy_key,
                company_name,
                ..
            } => (Some(privacy_key.as_str()), Some(company_name.as_str())),
            NewUserAccount::Observer { .. } => (None, None),
        };

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO users (kind, name, last_name, id_number, username, password, email,
                privacy_key, company_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(account.kind().as_str())
        .bind(&identity.name)
        .bind(&identity.last_name)
        .bind(&identity.id_number)
        .bind(&identity.username)
        .bind(&identity.password)
        .bind(&identity.email)
        .bind(privacy_key)
        .bind(company_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert {} user {}: {:?}", account.kind(), identity.username, e);
            e
        })?;

        let id: i64 = row.get("id");
        let saved = load_account(&mut tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn observation_exists(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<bool, RepoError> {
        let row = sqlx::query(
            "SELECT EXISTS (
                SELECT 1 FROM observed_user_observer_user
                WHERE observed_user_id = $1 AND observer_user_id = $2
             ) AS present",
        )
        .bind(observed_user_id)
        .bind(observer_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("present"))
    }

    async fn add_observation(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO observed_user_observer_user (observed_user_id, observer_user_id)
             VALUES ($1, $2)",
        )
        .bind(observed_user_id)
        .bind(observer_user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to link observed user {} to observer user {}: {:?}",
                observed_user_id, observer_user_id, e
            );
            e
        })?;

        Ok(())
    }
}
