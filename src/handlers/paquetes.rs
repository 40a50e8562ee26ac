// src/handlers/paquetes.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{RequireRole, RolModificacion},
    models::paquetes::PaquetePrecio,
    services::reporting::precio_cotizado,
};

#[derive(Debug, Deserialize)]
pub struct PaquetesQuery {
    pub pais: String,
}

// GET /api/paquetes
#[utoipa::path(
    get,
    path = "/api/paquetes",
    tag = "Paquetes",
    params(("pais" = String, Query, description = "MÉXICO | COLOMBIA | LATAM")),
    responses((status = 200, description = "Catálogo vigente del país", body = Vec<PaquetePrecio>)),
    security(("api_jwt" = []))
)]
pub async fn list_paquetes(
    State(app_state): State<AppState>,
    Query(q): Query<PaquetesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pais = q.pais.to_uppercase();

    // MÉXICO se consulta por moneda: evita perder filas con acentos
    // capturados de forma distinta.
    let paquetes = if pais == "MÉXICO" || pais == "MEXICO" {
        app_state
            .paquete_repo
            .list_activos_por_moneda(&app_state.db_pool, "MXN")
            .await?
    } else {
        app_state
            .paquete_repo
            .list_activos_por_pais(&app_state.db_pool, &pais)
            .await?
    };

    Ok((StatusCode::OK, Json(paquetes)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaquetePayload {
    #[validate(length(min = 1, message = "El país es obligatorio"))]
    #[schema(example = "MÉXICO")]
    pub pais: String,

    #[validate(length(min = 1, message = "El paquete es obligatorio"))]
    #[schema(example = "Iguana")]
    pub paquete: String,

    #[validate(length(min = 1, message = "La vigencia es obligatoria"))]
    #[schema(example = "MENSUAL")]
    pub vigencia: String,

    #[schema(value_type = f64, example = 650.00)]
    pub precio: Decimal,

    #[validate(length(min = 3, max = 3, message = "Moneda de 3 letras"))]
    #[schema(example = "MXN")]
    pub moneda: String,

    /// Fecha desde la que rige este precio; si falta, hoy.
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_vigencia: Option<NaiveDate>,
}

// POST /api/paquetes
#[utoipa::path(
    post,
    path = "/api/paquetes",
    tag = "Paquetes",
    request_body = CreatePaquetePayload,
    responses(
        (status = 201, description = "Precio agregado al catálogo", body = PaquetePrecio),
        (status = 400, description = "Datos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_paquete(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Json(payload): Json<CreatePaquetePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let fecha_vigencia = payload.fecha_vigencia.unwrap_or_else(|| Utc::now().date_naive());
    let pp = app_state
        .paquete_repo
        .create(
            &app_state.db_pool,
            &payload.pais.to_uppercase(),
            &payload.paquete,
            &payload.vigencia.to_uppercase(),
            payload.precio,
            &payload.moneda.to_uppercase(),
            fecha_vigencia,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(pp)))
}

#[derive(Debug, Deserialize)]
pub struct PrecioQuery {
    pub pais: String,
    pub paquete: String,
    pub vigencia: String,
    #[serde(default)]
    pub es_sucursal: bool,
}

// GET /api/paquetes/precio
#[utoipa::path(
    get,
    path = "/api/paquetes/precio",
    tag = "Paquetes",
    params(
        ("pais" = String, Query, description = "País del catálogo"),
        ("paquete" = String, Query, description = "Nombre del paquete"),
        ("vigencia" = String, Query, description = "Código de vigencia"),
        ("es_sucursal" = Option<bool>, Query, description = "Aplica 20% de descuento de sucursal")
    ),
    responses(
        (status = 200, description = "Precio vigente, redondeado a decena"),
        (status = 404, description = "No se encontró el precio")
    ),
    security(("api_jwt" = []))
)]
pub async fn precio_paquete(
    State(app_state): State<AppState>,
    Query(q): Query<PrecioQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pp = app_state
        .paquete_repo
        .vigente(
            &app_state.db_pool,
            &q.pais.to_uppercase(),
            &q.paquete,
            &q.vigencia.to_uppercase(),
        )
        .await?
        .ok_or(AppError::PaqueteNotFound)?;

    let precio = precio_cotizado(pp.precio, q.es_sucursal);

    Ok((StatusCode::OK, Json(json!({ "precio": precio, "moneda": pp.moneda }))))
}
