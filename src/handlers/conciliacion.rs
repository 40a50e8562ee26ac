// src/handlers/conciliacion.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
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
    handlers::clientes::leer_archivo_csv,
    middleware::{RequireRole, RolConciliacion, RolSuperadmin},
    models::{conciliacion::TransaccionListado, pagos::Pago},
    services::{conciliacion_service::ConciliarTransaccion, import_service::ImportResult},
};

#[derive(Debug, Deserialize)]
pub struct ListarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// GET /api/conciliacion/transacciones
#[utoipa::path(
    get,
    path = "/api/conciliacion/transacciones",
    tag = "Conciliación",
    params(
        ("year" = Option<i32>, Query, description = "Filtra por año"),
        ("month" = Option<u32>, Query, description = "Filtra por mes (1-12)")
    ),
    responses((status = 200, description = "Transacciones con su pago y cliente vinculados", body = Vec<TransaccionListado>)),
    security(("api_jwt" = []))
)]
pub async fn list_transacciones(
    State(app_state): State<AppState>,
    Query(q): Query<ListarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transacciones = app_state.conciliacion_service.listar(q.year, q.month).await?;
    Ok((StatusCode::OK, Json(transacciones)))
}

// POST /api/conciliacion/importar
#[utoipa::path(
    post,
    path = "/api/conciliacion/importar",
    tag = "Conciliación",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado de la importación del estado de cuenta", body = ImportResult),
        (status = 400, description = "Archivo ausente o columnas faltantes")
    ),
    security(("api_jwt" = []))
)]
pub async fn importar_transacciones(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolConciliacion>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let csv_bytes = leer_archivo_csv(multipart).await?;
    let resultado = app_state.import_service.importar_transacciones(&csv_bytes).await?;
    Ok((StatusCode::OK, Json(resultado)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConciliarPayload {
    pub cliente_id: i64,
    pub paquete_precio_id: i64,

    #[schema(value_type = String, format = Date, example = "2025-01-10")]
    pub fecha_pago: NaiveDate,

    #[schema(value_type = f64, example = 650.00)]
    pub monto: Decimal,

    pub numero_factura: Option<String>,
}

// POST /api/conciliacion/{id}/conciliar
#[utoipa::path(
    post,
    path = "/api/conciliacion/{id}/conciliar",
    tag = "Conciliación",
    params(("id" = i64, Path, description = "Id de la transacción bancaria")),
    request_body = ConciliarPayload,
    responses(
        (status = 200, description = "Transacción conciliada; pago creado o reescrito", body = Pago),
        (status = 404, description = "Transacción, cliente o paquete no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn conciliar(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolConciliacion>,
    Path(id): Path<i64>,
    Json(payload): Json<ConciliarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hoy = Utc::now().date_naive();
    let pago = app_state
        .conciliacion_service
        .conciliar_transaccion(
            id,
            ConciliarTransaccion {
                cliente_id: payload.cliente_id,
                paquete_precio_id: payload.paquete_precio_id,
                fecha_pago: payload.fecha_pago,
                monto: payload.monto,
                numero_factura: payload.numero_factura,
            },
            hoy,
        )
        .await?;

    Ok((StatusCode::OK, Json(pago)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreconciliarPayload {
    /// Lista libre de negocios cubiertos por el movimiento.
    #[validate(length(min = 1, message = "Se requiere la lista de negocios"))]
    #[schema(example = "Tacos Paco Centro, Tacos Paco Norte")]
    pub negocios: String,

    pub numero_factura: Option<String>,
}

// POST /api/conciliacion/{id}/preconciliar
#[utoipa::path(
    post,
    path = "/api/conciliacion/{id}/preconciliar",
    tag = "Conciliación",
    params(("id" = i64, Path, description = "Id de la transacción bancaria")),
    request_body = PreconciliarPayload,
    responses(
        (status = 200, description = "Transacción pre-conciliada para sucursales"),
        (status = 404, description = "Transacción no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn preconciliar(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolConciliacion>,
    Path(id): Path<i64>,
    Json(payload): Json<PreconciliarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hoy = Utc::now().date_naive();
    app_state
        .conciliacion_service
        .preconciliar_sucursal(id, &payload.negocios, payload.numero_factura.as_deref(), hoy)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}

// DELETE /api/conciliacion/{id}
#[utoipa::path(
    delete,
    path = "/api/conciliacion/{id}",
    tag = "Conciliación",
    params(("id" = i64, Path, description = "Id de la transacción bancaria")),
    responses(
        (status = 200, description = "Transacción eliminada; pago vinculado borrado y vigencia recalculada"),
        (status = 404, description = "Transacción no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn eliminar_transaccion(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolSuperadmin>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let hoy = Utc::now().date_naive();
    app_state.conciliacion_service.eliminar_transaccion(id, hoy).await?;
    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}
