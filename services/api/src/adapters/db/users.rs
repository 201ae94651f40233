//! `UserStore` on SQLite. Email uniqueness is enforced by the schema.

use std::str::FromStr;

use async_trait::async_trait;
use brightlearn_core::domain::{AccountStatus, NewUser, Role, User, UserCredentials, UserUpdate};
use brightlearn_core::ports::{PortError, PortResult, UserStore};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{corrupt, is_unique_violation, unexpected, DbAdapter};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, status, school_email, created_at";

#[derive(FromRow)]
pub(super) struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    school_email: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_credentials(self) -> PortResult<UserCredentials> {
        let hashed_password = self.password_hash.clone();
        Ok(UserCredentials {
            user: self.to_domain()?,
            hashed_password,
        })
    }

    pub(super) fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            role: Role::from_str(&self.role).map_err(corrupt)?,
            status: AccountStatus::from_str(&self.status).map_err(corrupt)?,
            school_email: self.school_email,
            created_at: self.created_at,
        })
    }
}

fn duplicate_email(e: sqlx::Error) -> PortError {
    if is_unique_violation(&e) {
        PortError::Conflict("User already exists".to_string())
    } else {
        unexpected(e)
    }
}

impl DbAdapter {
    async fn fetch_user(&self, user_id: Uuid) -> PortResult<UserRecord> {
        let mut conn = self.conn().await?;
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(unexpected)?;
        record.ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut conn = self.write_conn().await?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, status, school_email, created_at)
             VALUES (?, ?, ?, ?, ?, 'active', ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.role.as_str())
        .bind(&user.school_email)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(duplicate_email)?;
        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.fetch_user(user_id).await?.to_domain()
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let mut conn = self.conn().await?;
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(unexpected)?;
        record
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?
            .to_credentials()
    }

    async fn list_users_by_role(&self, role: Role) -> PortResult<Vec<User>> {
        let mut conn = self.conn().await?;
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY created_at, name"
        ))
        .bind(role.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;
        records
            .into_iter()
            .map(UserRecord::to_domain)
            .collect()
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> PortResult<User> {
        let mut conn = self.write_conn().await?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET
                 name = COALESCE(?, name),
                 email = COALESCE(?, email),
                 school_email = COALESCE(?, school_email),
                 password_hash = COALESCE(?, password_hash)
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(update.name)
        .bind(update.email)
        .bind(update.school_email)
        .bind(update.hashed_password)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(duplicate_email)?;
        record
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?
            .to_domain()
    }

    async fn set_user_status(&self, user_id: Uuid, status: AccountStatus) -> PortResult<User> {
        let mut conn = self.write_conn().await?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET status = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;
        record
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?
            .to_domain()
    }
}
