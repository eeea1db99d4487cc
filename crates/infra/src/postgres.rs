//! Postgres-backed store.
//!
//! Implements every store trait over one connection pool. The schema lives in
//! `migrations/` and is applied by [`PostgresStore::migrate`].
//!
//! ## Error mapping
//!
//! | SQLx error | Code | Mapped to |
//! |------------|------|-----------|
//! | unique violation on `users.email` | `23505` | `UserStoreError::EmailTaken` |
//! | unique violation on open membership | `23505` | `CollaboratorStoreError::AlreadyMember` |
//! | unique violation on `documents(project_id, stage)` | `23505` | `VersioningError::DuplicateStage` |
//! | anything else | | `InfrastructureError::StoreUnavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use folio_auth::{
    Collaborator, CollaboratorRole, CollaboratorStatus, CollaboratorStoreError, DocumentLocator, PermissionSet,
    Project, ProjectStatus, ProjectStore, User, UserDirectory, UserStoreError,
};
use folio_core::{CollaboratorId, DocumentId, InfrastructureError, ProjectId, UserId, VersionId};
use folio_documents::{
    Document, DocumentFormat, DocumentQuery, DocumentRepository, DocumentStatus, DocumentVersion, EditFn, Stage,
    VersioningError,
};

const DOCUMENT_COLUMNS: &str = "id, project_id, stage, title, content, structured_content, format, tags, status, \
     version, approved_by, approved_at, created_at, updated_at";

const COLLABORATOR_COLUMNS: &str =
    "id, project_id, user_id, role, permissions, status, invited_by, invited_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str) -> Result<Self, InfrastructureError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), InfrastructureError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| InfrastructureError::store(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfrastructureError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, password_hash, active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose().map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfrastructureError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, password_hash, active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose().map_err(|e| map_sqlx_error("decode_user", e))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> Result<(), UserStoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, password_hash, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.active)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                UserStoreError::EmailTaken
            } else {
                map_sqlx_error("insert_user", e).into()
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, InfrastructureError> {
        let result = sqlx::query("UPDATE users SET active = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_active", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, password_hash), fields(user_id = %id), err)]
    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<bool, InfrastructureError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&password_hash)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_password", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectStore for PostgresStore {
    #[instrument(skip(self, project), fields(project_id = %project.id), err)]
    async fn insert_project(&self, project: Project) -> Result<(), InfrastructureError> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, owner_id, name, description, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(project.owner_id.as_uuid())
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_project", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, InfrastructureError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, description, status, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_project", e))?;

        row.as_ref().map(project_from_row).transpose().map_err(|e| map_sqlx_error("decode_project", e))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_projects_for(&self, user_id: UserId) -> Result<Vec<Project>, InfrastructureError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.owner_id, p.name, p.description, p.status, p.created_at
            FROM projects p
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM collaborators c
                   WHERE c.project_id = p.id AND c.user_id = $1 AND c.status = 'active'
               )
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_projects_for", e))?;

        rows.iter()
            .map(project_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_project", e))
    }

    #[instrument(skip(self), fields(project_id = %project_id, user_id = %user_id), err)]
    async fn active_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        let row = sqlx::query(&format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM collaborators \
             WHERE project_id = $1 AND user_id = $2 AND status = 'active'"
        ))
        .bind(project_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("active_collaborator", e))?;

        row.as_ref()
            .map(collaborator_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_collaborator", e))
    }

    #[instrument(skip(self), fields(project_id = %project_id, user_id = %user_id), err)]
    async fn open_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        let row = sqlx::query(&format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM collaborators \
             WHERE project_id = $1 AND user_id = $2 AND status <> 'revoked'"
        ))
        .bind(project_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("open_collaborator", e))?;

        row.as_ref()
            .map(collaborator_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_collaborator", e))
    }

    #[instrument(skip(self), fields(collaborator_id = %id), err)]
    async fn get_collaborator(&self, id: CollaboratorId) -> Result<Option<Collaborator>, InfrastructureError> {
        let row = sqlx::query(&format!("SELECT {COLLABORATOR_COLUMNS} FROM collaborators WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_collaborator", e))?;

        row.as_ref()
            .map(collaborator_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_collaborator", e))
    }

    #[instrument(skip(self), fields(project_id = %project_id), err)]
    async fn list_collaborators(&self, project_id: ProjectId) -> Result<Vec<Collaborator>, InfrastructureError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM collaborators \
             WHERE project_id = $1 AND status <> 'revoked' ORDER BY invited_at ASC"
        ))
        .bind(project_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_collaborators", e))?;

        rows.iter()
            .map(collaborator_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_collaborator", e))
    }

    #[instrument(
        skip(self, collaborator),
        fields(project_id = %collaborator.project_id, collaborator_id = %collaborator.id),
        err
    )]
    async fn insert_collaborator(&self, collaborator: Collaborator) -> Result<(), CollaboratorStoreError> {
        sqlx::query(
            r#"
            INSERT INTO collaborators (id, project_id, user_id, role, permissions, status, invited_by, invited_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(collaborator.id.as_uuid())
        .bind(collaborator.project_id.as_uuid())
        .bind(collaborator.user_id.as_uuid())
        .bind(collaborator.role.as_str())
        .bind(Json(collaborator.permissions))
        .bind(collaborator.status.as_str())
        .bind(collaborator.invited_by.as_uuid())
        .bind(collaborator.invited_at)
        .bind(collaborator.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CollaboratorStoreError::AlreadyMember
            } else {
                map_sqlx_error("insert_collaborator", e).into()
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(collaborator_id = %id), err)]
    async fn set_collaborator_status(
        &self,
        id: CollaboratorId,
        status: CollaboratorStatus,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        let row = sqlx::query(&format!(
            "UPDATE collaborators SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {COLLABORATOR_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_collaborator_status", e))?;

        row.as_ref()
            .map(collaborator_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_collaborator", e))
    }
}

#[async_trait]
impl DocumentLocator for PostgresStore {
    #[instrument(skip(self), fields(document_id = %document_id), err)]
    async fn project_of(&self, document_id: DocumentId) -> Result<Option<ProjectId>, InfrastructureError> {
        let project: Option<Uuid> = sqlx::query_scalar("SELECT project_id FROM documents WHERE id = $1")
            .bind(document_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("project_of", e))?;
        Ok(project.map(ProjectId::from_uuid))
    }
}

#[async_trait]
impl DocumentRepository for PostgresStore {
    #[instrument(
        skip(self, document, initial),
        fields(document_id = %document.id, project_id = %document.project_id, stage = %document.stage),
        err
    )]
    async fn insert(&self, document: Document, initial: DocumentVersion) -> Result<(), VersioningError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, project_id, stage, title, content, structured_content, format, tags,
                status, version, approved_by, approved_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.project_id.as_uuid())
        .bind(document.stage.as_str())
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.structured_content)
        .bind(document.format.as_str())
        .bind(&document.tags)
        .bind(document.status.as_str())
        .bind(document.version as i32)
        .bind(document.approved_by.map(Uuid::from))
        .bind(document.approved_at)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                VersioningError::DuplicateStage(document.stage)
            } else {
                map_sqlx_error("insert_document", e).into()
            }
        })?;

        insert_version(&mut tx, &initial).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id), err)]
    async fn get(&self, id: DocumentId) -> Result<Option<Document>, InfrastructureError> {
        let row = sqlx::query(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_document", e))?;

        row.as_ref().map(document_from_row).transpose().map_err(|e| map_sqlx_error("decode_document", e))
    }

    #[instrument(skip(self, query), fields(projects = query.projects.len()), err)]
    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, InfrastructureError> {
        let project_ids: Vec<Uuid> = query.projects.iter().map(|p| *p.as_uuid()).collect();
        let search = query.search.as_deref().map(like_pattern);

        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE project_id = ANY($1) \
               AND ($2::text IS NULL OR stage = $2) \
               AND ($3::text IS NULL OR status = $3) \
               AND ($4::text IS NULL OR title ILIKE $4 OR content ILIKE $4) \
             ORDER BY updated_at DESC"
        ))
        .bind(&project_ids)
        .bind(query.stage.map(|s| s.as_str()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(search)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_documents", e))?;

        rows.iter()
            .map(document_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_document", e))
    }

    #[instrument(skip(self), fields(document_id = %id), err)]
    async fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, InfrastructureError> {
        let rows = sqlx::query(
            r#"
            SELECT id, document_id, version, content, structured_content, author_id, created_at
            FROM document_versions
            WHERE document_id = $1
            ORDER BY version DESC, created_at DESC, id DESC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_versions", e))?;

        rows.iter()
            .map(version_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_version", e))
    }

    #[instrument(skip(self), fields(document_id = %id), err)]
    async fn find_version(&self, id: DocumentId, version: u32) -> Result<Option<DocumentVersion>, InfrastructureError> {
        let row = sqlx::query(
            r#"
            SELECT id, document_id, version, content, structured_content, author_id, created_at
            FROM document_versions
            WHERE document_id = $1 AND version = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(id.as_uuid())
        .bind(version as i32)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_version", e))?;

        row.as_ref().map(version_from_row).transpose().map_err(|e| map_sqlx_error("decode_version", e))
    }

    #[instrument(skip(self, edit), fields(document_id = %id), err)]
    async fn commit_edit(&self, id: DocumentId, edit: &EditFn) -> Result<Document, VersioningError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_document", e))?
            .ok_or(VersioningError::NotFound)?;
        let mut document = document_from_row(&row).map_err(|e| map_sqlx_error("decode_document", e))?;

        // Dropping `tx` on error rolls back.
        if let Some(snapshot) = edit(&mut document)? {
            insert_version(&mut tx, &snapshot).await?;
        }

        sqlx::query(
            r#"
            UPDATE documents SET
                title = $2,
                content = $3,
                structured_content = $4,
                format = $5,
                tags = $6,
                status = $7,
                version = $8,
                approved_by = $9,
                approved_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.structured_content)
        .bind(document.format.as_str())
        .bind(&document.tags)
        .bind(document.status.as_str())
        .bind(document.version as i32)
        .bind(document.approved_by.map(Uuid::from))
        .bind(document.approved_at)
        .bind(document.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_document", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %id), err)]
    async fn delete(&self, id: DocumentId) -> Result<bool, InfrastructureError> {
        // Versions go with the document (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_document", e))?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    version: &DocumentVersion,
) -> Result<(), InfrastructureError> {
    sqlx::query(
        r#"
        INSERT INTO document_versions (id, document_id, version, content, structured_content, author_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(version.id.as_uuid())
    .bind(version.document_id.as_uuid())
    .bind(version.version as i32)
    .bind(&version.content)
    .bind(&version.structured_content)
    .bind(version.author_id.as_uuid())
    .bind(version.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_version", e))?;
    Ok(())
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Map SQLx errors to the shared infrastructure error.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> InfrastructureError {
    match err {
        sqlx::Error::Database(db_err) => InfrastructureError::store(format!(
            "database error in {}: {} (code {})",
            operation,
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none")
        )),
        sqlx::Error::PoolClosed => InfrastructureError::store(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => InfrastructureError::store(format!("connection pool timed out in {operation}")),
        other => InfrastructureError::store(format!("sqlx error in {operation}: {other}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unexpected {column} value '{value}'").into())
}

// Row decoding

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn project_from_row(row: &PgRow) -> Result<Project, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Project {
        id: ProjectId::from_uuid(row.try_get("id")?),
        owner_id: UserId::from_uuid(row.try_get("owner_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: ProjectStatus::parse(&status).ok_or_else(|| decode_error("project status", &status))?,
        created_at: row.try_get("created_at")?,
    })
}

fn collaborator_from_row(row: &PgRow) -> Result<Collaborator, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let Json(permissions): Json<PermissionSet> = row.try_get("permissions")?;
    Ok(Collaborator {
        id: CollaboratorId::from_uuid(row.try_get("id")?),
        project_id: ProjectId::from_uuid(row.try_get("project_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        role: CollaboratorRole::parse(&role).ok_or_else(|| decode_error("collaborator role", &role))?,
        permissions,
        status: CollaboratorStatus::parse(&status).ok_or_else(|| decode_error("collaborator status", &status))?,
        invited_by: UserId::from_uuid(row.try_get("invited_by")?),
        invited_at: row.try_get("invited_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn document_from_row(row: &PgRow) -> Result<Document, sqlx::Error> {
    let stage: String = row.try_get("stage")?;
    let format: String = row.try_get("format")?;
    let status: String = row.try_get("status")?;
    let version: i32 = row.try_get("version")?;
    let approved_by: Option<Uuid> = row.try_get("approved_by")?;
    let approved_at: Option<DateTime<Utc>> = row.try_get("approved_at")?;
    Ok(Document {
        id: DocumentId::from_uuid(row.try_get("id")?),
        project_id: ProjectId::from_uuid(row.try_get("project_id")?),
        stage: Stage::parse(&stage).ok_or_else(|| decode_error("stage", &stage))?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        structured_content: row.try_get("structured_content")?,
        format: DocumentFormat::parse(&format).ok_or_else(|| decode_error("format", &format))?,
        tags: row.try_get("tags")?,
        status: DocumentStatus::parse(&status).ok_or_else(|| decode_error("document status", &status))?,
        version: u32::try_from(version).map_err(|_| decode_error("version", &version.to_string()))?,
        approved_by: approved_by.map(UserId::from_uuid),
        approved_at,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn version_from_row(row: &PgRow) -> Result<DocumentVersion, sqlx::Error> {
    let version: i32 = row.try_get("version")?;
    Ok(DocumentVersion {
        id: VersionId::from_uuid(row.try_get("id")?),
        document_id: DocumentId::from_uuid(row.try_get("document_id")?),
        version: u32::try_from(version).map_err(|_| decode_error("version", &version.to_string()))?,
        content: row.try_get("content")?,
        structured_content: row.try_get("structured_content")?,
        author_id: UserId::from_uuid(row.try_get("author_id")?),
        created_at: row.try_get("created_at")?,
    })
}
