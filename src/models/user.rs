//! # User Records
//!
//! The only table the gateway touches. Each row links an internal user to
//! the identifiers the consent manager knows them by.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct User {
    pub internal_id: String,
    /// Identifier of the user inside the consent manager
    pub user_identifier: Option<String>,
    pub email: String,
    /// Consent manager account id, set on first successful login
    pub consent_id: Option<String>,
}

impl User {
    #[instrument(skip(pool))]
    pub async fn find_by_internal_id(
        pool: &PgPool,
        internal_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT internal_id, user_identifier, email, consent_id
            FROM users
            WHERE internal_id = $1
            "#,
        )
        .bind(internal_id)
        .fetch_optional(pool)
        .await
    }

    #[instrument(skip(pool))]
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT internal_id, user_identifier, email, consent_id
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Stores `consent_id` for the user with `email` unless one is already set.
    ///
    /// Returns whether a row was updated.
    #[instrument(skip(pool))]
    pub async fn set_consent_id_if_absent(
        pool: &PgPool,
        email: &str,
        consent_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users SET consent_id = $2
            WHERE email = $1 AND consent_id IS NULL
            "#,
        )
        .bind(email)
        .bind(consent_id)
        .execute(pool)
        .await?;

        debug!(rows_affected = result.rows_affected(), "Consent id update");
        Ok(result.rows_affected() > 0)
    }
}
