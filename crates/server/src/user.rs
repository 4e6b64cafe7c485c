//! Current-user endpoint.

use api_types::user::Me;
use axum::{Extension, Json};

use engine::users;

use crate::ServerError;

pub async fn me(Extension(user): Extension<users::Model>) -> Result<Json<Me>, ServerError> {
    Ok(Json(Me {
        username: user.username,
        role: user.role,
    }))
}
