// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{AuthenticatedUser, RequireRole, RolSuperadmin},
    models::auth::{Role, User},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "El usuario es obligatorio"))]
    #[schema(example = "admin")]
    pub username: String,

    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    pub password: String,
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token JWT emitido"),
        (status = 401, description = "Credenciales inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "token": token }))))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuario autenticado", body = User),
        (status = 401, description = "Token inválido o ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(user)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUsuarioPayload {
    #[validate(length(min = 1, message = "El usuario es obligatorio"))]
    #[schema(example = "mjuarez")]
    pub username: String,

    #[validate(length(min = 8, message = "La contraseña requiere al menos 8 caracteres"))]
    pub password: String,

    pub full_name: Option<String>,

    #[validate(email(message = "Correo inválido"))]
    pub email: Option<String>,

    pub role: Role,
}

// POST /api/usuarios
#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Auth",
    request_body = CreateUsuarioPayload,
    responses(
        (status = 201, description = "Usuario creado", body = User),
        (status = 403, description = "Requiere rol SUPERADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_usuario(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolSuperadmin>,
    Json(payload): Json<CreateUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .register_user(
            &payload.username,
            &payload.password,
            payload.full_name.as_deref(),
            payload.email.as_deref(),
            payload.role,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
