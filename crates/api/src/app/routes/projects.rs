use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use folio_auth::{Invitation, NewProject};
use folio_core::{CollaboratorId, ProjectId};

use crate::app::dto::{self, CollaboratorView, ListResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:id", get(get_project))
        .route("/:id/collaborators", get(list_collaborators).post(invite_collaborator))
        .route("/:id/collaborators/accept", post(accept_invitation))
        .route("/:id/collaborators/:collaborator_id", delete(revoke_collaborator))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let project = services.membership.create_project(principal.user_id(), body).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = services.membership.list_projects(principal.user_id()).await?;
    Ok(Json(ListResponse::from(projects)))
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ProjectId = dto::parse_id(&id, "project")?;
    let project = services.membership.get_project(principal.user_id(), id).await?;
    Ok(Json(project))
}

pub async fn list_collaborators(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ProjectId = dto::parse_id(&id, "project")?;
    let items = services
        .membership
        .list_collaborators(principal.user_id(), id)
        .await?
        .into_iter()
        .map(CollaboratorView::from)
        .collect::<Vec<_>>();
    Ok(Json(ListResponse::from(items)))
}

pub async fn invite_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<Invitation>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ProjectId = dto::parse_id(&id, "project")?;
    let Json(body) = payload?;
    let collaborator = services.membership.invite(principal.user_id(), id, body).await?;
    Ok((StatusCode::CREATED, Json(CollaboratorView::from(collaborator))))
}

pub async fn accept_invitation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ProjectId = dto::parse_id(&id, "project")?;
    let collaborator = services.membership.accept(principal.user_id(), id).await?;
    Ok(Json(CollaboratorView::from(collaborator)))
}

pub async fn revoke_collaborator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, collaborator_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ProjectId = dto::parse_id(&id, "project")?;
    let collaborator_id: CollaboratorId = dto::parse_id(&collaborator_id, "collaborator")?;
    let collaborator = services
        .membership
        .revoke(principal.user_id(), id, collaborator_id)
        .await?;
    Ok(Json(CollaboratorView::from(collaborator)))
}
