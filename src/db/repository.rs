//! Database repository for CRUD operations.
//!
//! Uses prepared statements; callers hash passwords before they get here.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Blog, CatalogItem, CatalogKind, CreateBlogRequest, CreateCatalogItemRequest, LogEntry,
    PermissionMatrix, Query, QueryType, SubmitQueryRequest, UpdateBlogRequest,
    UpdateCatalogItemRequest, User, DEFAULT_QUERY_STATUS, ROOT_USER_ID,
};

const USER_COLUMNS: &str = "id, username, email, permissions, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Look up a user and password hash by username or email.
    pub async fn find_credentials(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ? OR email = ?"
        ))
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((user_from_row(&row)?, row.get("password_hash")))),
            None => Ok(None),
        }
    }

    /// Create a new user. Username and email must both be unused.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        permissions: &PermissionMatrix,
    ) -> Result<User, AppError> {
        self.ensure_unique_user(username, email).await?;

        let now = Utc::now().to_rfc3339();
        let permissions_json = serde_json::to_string(permissions)?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, permissions, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(&permissions_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(unique_violation_as_conflict)?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            permissions: permissions.clone(),
            created_at: now,
        })
    }

    async fn ensure_unique_user(&self, username: &str, email: &str) -> Result<(), AppError> {
        let taken = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("duplicate username".to_string()));
        }

        let taken = sqlx::query("SELECT 1 FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("duplicate email".to_string()));
        }

        Ok(())
    }

    /// Create the root admin (id 1) if missing, and keep it fully privileged.
    pub async fn ensure_root_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let permissions_json = serde_json::to_string(&PermissionMatrix::full())?;

        if self.get_user(ROOT_USER_ID).await?.is_some() {
            sqlx::query("UPDATE users SET permissions = ? WHERE id = ?")
                .bind(&permissions_json)
                .bind(ROOT_USER_ID)
                .execute(&self.pool)
                .await?;
        } else {
            sqlx::query(
                "INSERT INTO users (id, username, email, password_hash, permissions, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(ROOT_USER_ID)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(&permissions_json)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(unique_violation_as_conflict)?;
        }

        self.get_user(ROOT_USER_ID)
            .await?
            .ok_or_else(|| AppError::Internal("Root user missing after seeding".to_string()))
    }

    /// Replace a user's password hash and drop their sessions.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    /// Replace a user's permission matrix.
    pub async fn update_permissions(
        &self,
        id: i64,
        permissions: &PermissionMatrix,
    ) -> Result<User, AppError> {
        let result = sqlx::query("UPDATE users SET permissions = ? WHERE id = ?")
            .bind(serde_json::to_string(permissions)?)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Delete a user together with their sessions.
    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== SESSION OPERATIONS ====================

    /// Open a session for a user and return its token.
    pub async fn create_session(
        &self,
        user_id: i64,
        ttl: std::time::Duration,
    ) -> Result<String, AppError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(now)
            .bind(now.saturating_add(ttl_secs))
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    /// Resolve a session token to its user. Expired sessions resolve to `None`.
    pub async fn session_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.permissions, u.created_at
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.id = ? AND s.expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_user_sessions(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove expired sessions, returning how many were dropped.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== PRODUCT / SERVICE OPERATIONS ====================

    /// List all products or services.
    pub async fn list_items(&self, kind: CatalogKind) -> Result<Vec<CatalogItem>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, title, description, main_image, created_at, updated_at FROM {} ORDER BY id",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(item_from_row).collect())
    }

    /// Get a product or service by ID.
    pub async fn get_item(
        &self,
        kind: CatalogKind,
        id: i64,
    ) -> Result<Option<CatalogItem>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT id, title, description, main_image, created_at, updated_at FROM {} WHERE id = ?",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(item_from_row))
    }

    /// Create a new product or service.
    pub async fn create_item(
        &self,
        kind: CatalogKind,
        request: &CreateCatalogItemRequest,
    ) -> Result<CatalogItem, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(&format!(
            "INSERT INTO {} (title, description, main_image, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            kind.table()
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.main_image)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(CatalogItem {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            description: request.description.clone(),
            main_image: request.main_image.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a product or service, keeping fields the request leaves out.
    pub async fn update_item(
        &self,
        kind: CatalogKind,
        id: i64,
        request: &UpdateCatalogItemRequest,
    ) -> Result<CatalogItem, AppError> {
        let existing = self
            .get_item(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), id)))?;

        let now = Utc::now().to_rfc3339();
        let title = request.title.clone().unwrap_or(existing.title);
        let description = request.description.clone().unwrap_or(existing.description);
        let main_image = request.main_image.clone().unwrap_or(existing.main_image);

        sqlx::query(&format!(
            "UPDATE {} SET title = ?, description = ?, main_image = ?, updated_at = ? WHERE id = ?",
            kind.table()
        ))
        .bind(&title)
        .bind(&description)
        .bind(&main_image)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(CatalogItem {
            id,
            title,
            description,
            main_image,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a product or service.
    pub async fn delete_item(&self, kind: CatalogKind, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                kind.label(),
                id
            )));
        }

        Ok(())
    }

    // ==================== BLOG OPERATIONS ====================

    /// List all blog posts, newest first.
    pub async fn list_blogs(&self) -> Result<Vec<Blog>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, image, body_content, created_at, updated_at FROM blogs ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(blog_from_row).collect())
    }

    /// Get a blog post by ID.
    pub async fn get_blog(&self, id: i64) -> Result<Option<Blog>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, image, body_content, created_at, updated_at FROM blogs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(blog_from_row))
    }

    /// Create a new blog post.
    pub async fn create_blog(&self, request: &CreateBlogRequest) -> Result<Blog, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO blogs (title, image, body_content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.image)
        .bind(&request.body_content)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Blog {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            image: request.image.clone(),
            body_content: request.body_content.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a blog post, keeping fields the request leaves out.
    pub async fn update_blog(&self, id: i64, request: &UpdateBlogRequest) -> Result<Blog, AppError> {
        let existing = self
            .get_blog(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let title = request.title.clone().unwrap_or(existing.title);
        let image = request.image.clone().unwrap_or(existing.image);
        let body_content = request.body_content.clone().unwrap_or(existing.body_content);

        sqlx::query(
            "UPDATE blogs SET title = ?, image = ?, body_content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&image)
        .bind(&body_content)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Blog {
            id,
            title,
            image,
            body_content,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a blog post.
    pub async fn delete_blog(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Blog {} not found", id)));
        }

        Ok(())
    }

    // ==================== QUERY OPERATIONS ====================

    /// List all customer queries, newest first.
    pub async fn list_queries(&self) -> Result<Vec<Query>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, query_type, status, data, created_at FROM queries ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(query_from_row).collect()
    }

    /// Get a customer query by ID.
    pub async fn get_query(&self, id: &str) -> Result<Option<Query>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, query_type, status, data, created_at FROM queries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(query_from_row).transpose()
    }

    /// Store a submitted customer query with the default status.
    pub async fn create_query(
        &self,
        query_type: QueryType,
        request: &SubmitQueryRequest,
    ) -> Result<Query, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_string();
        let phone = request.phone.trim().to_string();

        sqlx::query(
            "INSERT INTO queries (id, name, email, phone, query_type, status, data, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(query_type.as_str())
        .bind(DEFAULT_QUERY_STATUS)
        .bind(serde_json::to_string(&request.data)?)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Query {
            id,
            name,
            email,
            phone,
            query_type,
            status: DEFAULT_QUERY_STATUS.to_string(),
            data: request.data.clone(),
            created_at: now,
        })
    }

    /// Set the workflow status of a query.
    pub async fn update_query_status(&self, id: &str, status: &str) -> Result<Query, AppError> {
        let result = sqlx::query("UPDATE queries SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Query {} not found", id)));
        }

        self.get_query(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {} not found", id)))
    }

    /// Delete a customer query.
    pub async fn delete_query(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM queries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Query {} not found", id)));
        }

        Ok(())
    }

    // ==================== LOG OPERATIONS ====================

    /// List the audit trail, newest first.
    pub async fn list_logs(&self) -> Result<Vec<LogEntry>, AppError> {
        let rows =
            sqlx::query("SELECT id, username, change, created_at FROM logs ORDER BY id DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(log_from_row).collect())
    }

    /// Append one entry to the audit trail.
    pub async fn append_log(&self, username: &str, change: &str) -> Result<LogEntry, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query("INSERT INTO logs (username, change, created_at) VALUES (?, ?, ?)")
            .bind(username)
            .bind(change)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(LogEntry {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            change: change.to_string(),
            created_at: now,
        })
    }

    /// Delete an audit entry.
    pub async fn delete_log(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Log {} not found", id)));
        }

        Ok(())
    }
}

// Helper functions for row conversion

fn unique_violation_as_conflict(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("duplicate username or email".to_string())
        }
        _ => err.into(),
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    let permissions: String = row.get("permissions");
    let permissions: PermissionMatrix = serde_json::from_str(&permissions).map_err(|e| {
        AppError::Internal(format!("Stored permissions are unreadable: {}", e))
    })?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        permissions,
        created_at: row.get("created_at"),
    })
}

fn item_from_row(row: &SqliteRow) -> CatalogItem {
    CatalogItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        main_image: row.get("main_image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn blog_from_row(row: &SqliteRow) -> Blog {
    Blog {
        id: row.get("id"),
        title: row.get("title"),
        image: row.get("image"),
        body_content: row.get("body_content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn query_from_row(row: &SqliteRow) -> Result<Query, AppError> {
    let query_type: String = row.get("query_type");
    let data: String = row.get("data");
    let data: Map<String, Value> = serde_json::from_str(&data).map_err(|e| {
        AppError::Internal(format!("Stored query data is unreadable: {}", e))
    })?;

    Ok(Query {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        query_type: QueryType::from_str(&query_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown stored query type '{}'", query_type))
        })?,
        status: row.get("status"),
        data,
        created_at: row.get("created_at"),
    })
}

fn log_from_row(row: &SqliteRow) -> LogEntry {
    LogEntry {
        id: row.get("id"),
        username: row.get("username"),
        change: row.get("change"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::Flag;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("repo.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let (repo, _dir) = repo().await;
        let perms = PermissionMatrix::empty();
        repo.create_user("ops", "ops@example.com", "hash", &perms)
            .await
            .unwrap();

        let err = repo
            .create_user("ops", "other@example.com", "hash", &perms)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "duplicate username");

        let err = repo
            .create_user("ops2", "ops@example.com", "hash", &perms)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "duplicate email");
    }

    #[tokio::test]
    async fn test_root_user_is_seeded_with_full_permissions() {
        let (repo, _dir) = repo().await;
        let root = repo
            .ensure_root_user("admin", "admin@example.com", "hash")
            .await
            .unwrap();
        assert_eq!(root.id, ROOT_USER_ID);
        assert_eq!(root.permissions, PermissionMatrix::full());

        // Seeding again keeps the same row.
        let again = repo
            .ensure_root_user("admin", "admin@example.com", "hash")
            .await
            .unwrap();
        assert_eq!(again.created_at, root.created_at);
    }

    #[tokio::test]
    async fn test_permissions_round_trip_through_storage() {
        let (repo, _dir) = repo().await;
        let user = repo
            .create_user("ed", "ed@example.com", "hash", &PermissionMatrix::empty())
            .await
            .unwrap();
        let perms =
            PermissionMatrix::from_flags(&[Flag::ReadBlog, Flag::AddBlog, Flag::ReadQuery])
                .unwrap();

        repo.update_permissions(user.id, &perms).await.unwrap();
        let stored = repo.get_user(user.id).await.unwrap().unwrap();

        assert_eq!(stored.permissions, perms);
    }

    #[tokio::test]
    async fn test_expired_session_resolves_to_none() {
        let (repo, _dir) = repo().await;
        let user = repo
            .create_user("s", "s@example.com", "hash", &PermissionMatrix::empty())
            .await
            .unwrap();

        let live = repo
            .create_session(user.id, std::time::Duration::from_secs(60))
            .await
            .unwrap();
        let dead = repo
            .create_session(user.id, std::time::Duration::from_secs(0))
            .await
            .unwrap();

        assert_eq!(repo.session_user(&live).await.unwrap().unwrap().id, user.id);
        assert!(repo.session_user(&dead).await.unwrap().is_none());
        assert_eq!(repo.purge_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_catalog_tables_are_separate() {
        let (repo, _dir) = repo().await;
        let request = CreateCatalogItemRequest {
            title: "Survey drone".into(),
            description: "Mapping".into(),
            main_image: "img-1".into(),
        };
        repo.create_item(CatalogKind::Product, &request).await.unwrap();

        assert_eq!(repo.list_items(CatalogKind::Product).await.unwrap().len(), 1);
        assert!(repo.list_items(CatalogKind::Service).await.unwrap().is_empty());

        let updated = repo
            .update_item(
                CatalogKind::Product,
                1,
                &UpdateCatalogItemRequest {
                    title: Some("Survey drone X".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Survey drone X");
        assert_eq!(updated.main_image, "img-1");
    }

    #[tokio::test]
    async fn test_unreadable_query_data_is_an_error() {
        let (repo, _dir) = repo().await;
        let request = SubmitQueryRequest {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            data: Map::new(),
        };
        let query = repo
            .create_query(QueryType::ServiceFirst, &request)
            .await
            .unwrap();

        sqlx::query("UPDATE queries SET data = 'not json' WHERE id = ?")
            .bind(&query.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = repo.get_query(&query.id).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(repo.list_queries().await.is_err());
    }
}
