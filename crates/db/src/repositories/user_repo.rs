//! Repository for the `users` table.

use sqlx::{PgConnection, PgPool};
use unilib_core::roles::{Role, ROLE_ADMIN, ROLE_LIBRARIAN};
use unilib_core::types::DbId;

use crate::models::user::{CreateUser, UpdateUser, User, UserContact};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, first_name, last_name, university_id, phone, \
                        address, password_hash, role, is_active, created_at, updated_at";

/// Display name expression: "First Last", or the username when both are blank.
const FULL_NAME: &str =
    "COALESCE(NULLIF(TRIM(first_name || ' ' || last_name), ''), username) AS full_name";

/// Provides CRUD and contact lookups for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (username, email, first_name, last_name, university_id, phone, address,
                 password_hash, role)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, ''), COALESCE($7, ''), $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.username.trim())
            .bind(input.email.trim())
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.university_id)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username or email, case-insensitively.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(login.trim())
            .fetch_optional(pool)
            .await
    }

    /// List users, optionally filtered by a search term over username,
    /// email, names and university ID. Newest first.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL
                    OR username ILIKE '%' || $1 || '%'
                    OR email ILIKE '%' || $1 || '%'
                    OR first_name ILIKE '%' || $1 || '%'
                    OR last_name ILIKE '%' || $1 || '%'
                    OR university_id ILIKE '%' || $1 || '%')
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                university_id = COALESCE($5, university_id),
                phone = COALESCE($6, phone),
                address = COALESCE($7, address),
                role = COALESCE($8, role),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.email.as_deref().map(str::trim))
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.university_id)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.role.map(Role::as_str))
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's password hash. Returns `true` if the row exists.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Contact details of one user, read inside the caller's transaction.
    pub async fn contact_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<UserContact>, sqlx::Error> {
        let query = format!("SELECT id, email, {FULL_NAME}, role FROM users WHERE id = $1");
        sqlx::query_as::<_, UserContact>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Contact details of every active ADMIN and LIBRARIAN.
    pub async fn staff_contacts(pool: &PgPool) -> Result<Vec<UserContact>, sqlx::Error> {
        let query = format!(
            "SELECT id, email, {FULL_NAME}, role FROM users
             WHERE is_active AND role IN ($1, $2)
             ORDER BY id"
        );
        sqlx::query_as::<_, UserContact>(&query)
            .bind(ROLE_ADMIN)
            .bind(ROLE_LIBRARIAN)
            .fetch_all(pool)
            .await
    }
}
