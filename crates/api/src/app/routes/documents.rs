use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use folio_auth::{Action, Target};
use folio_core::{DocumentId, ProjectId};
use folio_documents::{DocumentChanges, NewDocument};

use crate::app::dto::{self, DocumentListParams, ListResponse, RestoreRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_document).get(list_documents))
        .route("/:id", get(get_document).put(update_document).delete(delete_document))
        .route("/:id/approve", post(approve_document))
        .route("/:id/restore", post(restore_document))
        .route("/:id/versions", get(list_versions))
}

pub async fn create_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewDocument>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    authz::require(&services.access, &principal, Target::Project(body.project_id), Action::Create).await?;
    let document = services.documents.create(principal.user_id(), body).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// Documents in every project the caller can read, or in one project when
/// `project_id` is given.
pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<DocumentListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let mut query = params.to_query()?;

    query.projects = match params.project_id.as_deref() {
        Some(raw) => {
            let project: ProjectId = dto::parse_id(raw, "project")?;
            authz::require(&services.access, &principal, Target::Project(project), Action::Read).await?;
            vec![project]
        }
        None => services
            .membership
            .list_projects(principal.user_id())
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect(),
    };

    let documents = services.documents.list(&query).await?;
    Ok(Json(ListResponse::from(documents)))
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Read).await?;
    Ok(Json(services.documents.get(id).await?))
}

pub async fn update_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<DocumentChanges>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    let Json(changes) = payload?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Edit).await?;
    Ok(Json(services.documents.update(id, principal.user_id(), changes).await?))
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Delete).await?;
    services.documents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Edit).await?;
    Ok(Json(services.documents.approve(id, principal.user_id()).await?))
}

pub async fn restore_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<RestoreRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    let Json(body) = payload?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Edit).await?;
    Ok(Json(services.documents.restore(id, body.version).await?))
}

pub async fn list_versions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DocumentId = dto::parse_id(&id, "document")?;
    authz::require(&services.access, &principal, Target::Document(id), Action::Read).await?;
    Ok(Json(ListResponse::from(services.documents.versions(id).await?)))
}
