// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Tipo de error único de la aplicación, con `thiserror` para mejor ergonomía.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permisos insuficientes: se requiere rol {0}")]
    Forbidden(&'static str),

    #[error("Cliente no encontrado")]
    ClienteNotFound,

    #[error("El cliente no tiene suscripción")]
    SuscripcionNotFound,

    #[error("Pago no encontrado")]
    PagoNotFound,

    #[error("Transacción bancaria no encontrada")]
    TransaccionNotFound,

    #[error("Paquete de precio no encontrado")]
    PaqueteNotFound,

    #[error("Usuario no encontrado")]
    UserNotFound,

    /// Entrada mal formada que se rechaza antes de escribir nada
    /// (fecha o monto no parseable, campo requerido ausente).
    #[error("Datos inválidos: {0}")]
    BadRequest(String),

    // Errores de base de datos (sqlx)
    #[error("Error de base de datos")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para cualquier otro error inesperado.
    #[error("Error interno del servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Devolvemos todos los detalles de la validación, campo por campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Usuario o contraseña inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticación inválido o ausente.".to_string(),
            ),
            AppError::Forbidden(rol) => (
                StatusCode::FORBIDDEN,
                format!("Acceso denegado: se requiere rol {rol}."),
            ),
            AppError::ClienteNotFound
            | AppError::SuscripcionNotFound
            | AppError::PagoNotFound
            | AppError::TransaccionNotFound
            | AppError::PaqueteNotFound
            | AppError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),

            // Todo lo demás (DatabaseError, InternalServerError...) es 500.
            // `tracing` deja registrada la causa detallada.
            ref e => {
                tracing::error!("Error interno del servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocurrió un error inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
