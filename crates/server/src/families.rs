//! Family membership endpoints (management is owner-only).

use api_types::family::{
    FamiliesResponse, FamilyCreated, FamilyNew, FamilyView, MemberUpsert, MemberView,
    MembersResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use engine::users;

use crate::{
    ServerError,
    authz::{require_family_member, require_family_owner},
    convert::{map_role, map_role_in},
    server::ServerState,
};

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FamilyNew>,
) -> Result<(StatusCode, Json<FamilyCreated>), ServerError> {
    let id = state.engine.new_family(&payload.name, &user.username).await?;
    Ok((StatusCode::CREATED, Json(FamilyCreated { id })))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<FamiliesResponse>, ServerError> {
    let families = state
        .engine
        .list_families_for_user(&user.username)
        .await?
        .into_iter()
        .map(|family| FamilyView {
            id: family.id,
            name: family.name,
            created_by: family.created_by,
        })
        .collect();
    Ok(Json(FamiliesResponse { families }))
}

pub async fn list_members(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<MembersResponse>, ServerError> {
    require_family_member(&state, &user, family_id).await?;

    let members = state
        .engine
        .list_family_members(family_id)
        .await?
        .into_iter()
        .map(|(username, role)| MemberView {
            username,
            role: map_role(role),
        })
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn upsert_member(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(family_id): Path<Uuid>,
    Json(payload): Json<MemberUpsert>,
) -> Result<StatusCode, ServerError> {
    require_family_owner(&state, &user, family_id).await?;
    state
        .engine
        .upsert_family_member(family_id, &payload.username, map_role_in(payload.role))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((family_id, username)): Path<(Uuid, String)>,
) -> Result<StatusCode, ServerError> {
    require_family_owner(&state, &user, family_id).await?;
    state
        .engine
        .remove_family_member(family_id, &username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
