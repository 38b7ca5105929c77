use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::identity::{EnrolledIdentity, Role};

/// Local wallet of enrolled identities.
#[derive(Clone)]
pub struct IdentityRepository {
    pool: SqlitePool,
}

impl IdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a new identity. Fails if the user id is already taken.
    pub async fn save_identity(&self, identity: &EnrolledIdentity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO identities (user_id, role, msp_id, postal_employee, enrolled_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&identity.user_id)
        .bind(identity.role.as_str())
        .bind(&identity.msp_id)
        .bind(identity.postal_employee)
        .bind(identity.enrolled_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save identity")?;
        Ok(())
    }

    /// Get an identity by user id.
    pub async fn get_identity(&self, user_id: &str) -> Result<Option<EnrolledIdentity>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, role, msp_id, postal_employee, enrolled_at
            FROM identities
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch identity")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_identity(&row)?)),
            None => Ok(None),
        }
    }

    /// List all identities ordered by user id.
    pub async fn list_identities(&self) -> Result<Vec<EnrolledIdentity>> {
        let rows = sqlx::query(
            "SELECT user_id, role, msp_id, postal_employee, enrolled_at FROM identities ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list identities")?;

        rows.iter().map(Self::row_to_identity).collect()
    }

    fn row_to_identity(row: &sqlx::sqlite::SqliteRow) -> Result<EnrolledIdentity> {
        let role_str: String = row.get("role");
        let enrolled_at_str: String = row.get("enrolled_at");

        Ok(EnrolledIdentity {
            user_id: row.get("user_id"),
            role: Role::from_str(&role_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid role: {}", role_str))?,
            msp_id: row.get("msp_id"),
            postal_employee: row.get::<i32, _>("postal_employee") != 0,
            enrolled_at: DateTime::parse_from_rfc3339(&enrolled_at_str)
                .context("Invalid enrolled_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
