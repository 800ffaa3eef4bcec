//! Postgres-backed user and house store.
//!
//! Every query goes through the shared `PgPool`. Uniqueness (email, house
//! name) and the house/character relation are enforced by the schema; this
//! module only translates the resulting SQLSTATEs into [`StoreError`]s.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use westeros_auth::{NewUser, SecretHash, User};
use westeros_core::{CharacterId, HouseId, UserId};
use westeros_houses::{Character, CharacterData, House, HouseData};

use super::r#trait::{HouseStore, Page, StoreError, UserStore};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        scopes TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS houses (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        words TEXT,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        titles TEXT,
        description TEXT,
        house_id BIGINT NOT NULL REFERENCES houses(id) ON DELETE CASCADE
    )
    "#,
];

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they are missing. Safe to run on every start.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        tracing::info!("database schema ready");
        Ok(())
    }

    async fn members_of(&self, house_ids: &[i64]) -> Result<HashMap<i64, Vec<Character>>, StoreError> {
        if house_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, name, titles, description, house_id
            FROM characters
            WHERE house_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(house_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_members", e))?;

        let mut members: HashMap<i64, Vec<Character>> = HashMap::new();
        for row in &rows {
            let character = character_from_row(row).map_err(|e| map_sqlx_error("decode_character", e))?;
            members
                .entry(character.house_id.get())
                .or_default()
                .push(character);
        }
        Ok(members)
    }

    async fn with_members(&self, rows: Vec<PgRow>) -> Result<Vec<House>, StoreError> {
        let mut houses = rows
            .iter()
            .map(house_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_house", e))?;

        let ids: Vec<i64> = houses.iter().map(|h| h.id.get()).collect();
        let mut members = self.members_of(&ids).await?;
        for house in &mut houses {
            house.members = members.remove(&house.id.get()).unwrap_or_default();
        }
        Ok(houses)
    }

    async fn one_with_members(&self, row: Option<PgRow>) -> Result<Option<House>, StoreError> {
        match row {
            Some(row) => Ok(self.with_members(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, hashed_password, is_active, scopes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, hashed_password, is_active, scopes
            "#,
        )
        .bind(&user.email)
        .bind(user.hashed_password.as_str())
        .bind(user.is_active)
        .bind(user.scopes.to_string())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        user_from_row(&row).map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, hashed_password, is_active, scopes FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, hashed_password, is_active, scopes FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user_by_email", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self))]
    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, hashed_password, is_active, scopes
            FROM users
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl HouseStore for PostgresStore {
    #[instrument(skip(self, house), fields(name = %house.name))]
    async fn create(&self, house: HouseData) -> Result<House, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO houses (name, words, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, words, description
            "#,
        )
        .bind(&house.name)
        .bind(&house.words)
        .bind(&house.description)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_house", e))?;

        house_from_row(&row).map_err(|e| map_sqlx_error("decode_house", e))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: HouseId) -> Result<Option<House>, StoreError> {
        let row = sqlx::query("SELECT id, name, words, description FROM houses WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_house", e))?;

        self.one_with_members(row).await
    }

    #[instrument(skip(self))]
    async fn get_by_name(&self, name: &str) -> Result<Option<House>, StoreError> {
        let row = sqlx::query("SELECT id, name, words, description FROM houses WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_house_by_name", e))?;

        self.one_with_members(row).await
    }

    #[instrument(skip(self))]
    async fn list(&self, page: Page) -> Result<Vec<House>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, words, description
            FROM houses
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_houses", e))?;

        self.with_members(rows).await
    }

    #[instrument(skip(self, house), fields(name = %house.name))]
    async fn update(&self, id: HouseId, house: HouseData) -> Result<Option<House>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE houses
            SET name = $2, words = $3, description = $4
            WHERE id = $1
            RETURNING id, name, words, description
            "#,
        )
        .bind(id.get())
        .bind(&house.name)
        .bind(&house.words)
        .bind(&house.description)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_house", e))?;

        self.one_with_members(row).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: HouseId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM houses WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_house", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, character), fields(name = %character.name))]
    async fn add_member(&self, house_id: HouseId, character: CharacterData) -> Result<Character, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO characters (name, titles, description, house_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, titles, description, house_id
            "#,
        )
        .bind(&character.name)
        .bind(&character.titles)
        .bind(&character.description)
        .bind(house_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_member", e))?;

        character_from_row(&row).map_err(|e| map_sqlx_error("decode_character", e))
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        hashed_password: SecretHash::new(row.try_get::<String, _>("hashed_password")?),
        is_active: row.try_get("is_active")?,
        scopes: row.try_get("scopes")?,
    })
}

fn house_from_row(row: &PgRow) -> Result<House, sqlx::Error> {
    Ok(House {
        id: HouseId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        words: row.try_get("words")?,
        description: row.try_get("description")?,
        members: Vec::new(),
    })
}

fn character_from_row(row: &PgRow) -> Result<Character, sqlx::Error> {
    Ok(Character {
        id: CharacterId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        titles: row.try_get("titles")?,
        description: row.try_get("description")?,
        house_id: HouseId::new(row.try_get("house_id")?),
    })
}

/// Map sqlx errors to store errors by SQLSTATE.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::Conflict(msg),
                // foreign_key_violation: the parent row is gone
                Some("23503") => StoreError::NotFound,
                _ => {
                    tracing::error!(operation, error = %msg, "database error");
                    StoreError::Backend(msg)
                }
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => {
            tracing::error!(operation, error = %err, "sqlx error");
            StoreError::Backend(format!("sqlx error in {}: {}", operation, err))
        }
    }
}
