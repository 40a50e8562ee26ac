// src/handlers/pagos.rs

use axum::{
    Json,
    extract::{Path, State},
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
    models::pagos::Pago,
    services::pago_service::{EditarPago, RegistrarPago},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePagoPayload {
    pub cliente_id: i64,

    #[schema(value_type = String, format = Date, example = "2025-01-10")]
    pub fecha_pago: NaiveDate,

    #[schema(value_type = f64, example = 650.00)]
    pub monto: Decimal,

    #[schema(example = "Transferencia")]
    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,

    #[serde(default)]
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
    pub motivo_descuento: Option<String>,

    /// Paquete del catálogo a snapshotear. Sin él, se arrastra el plan de
    /// la suscripción.
    pub paquete_precio_id: Option<i64>,
}

// POST /api/pagos
#[utoipa::path(
    post,
    path = "/api/pagos",
    tag = "Pagos",
    request_body = CreatePagoPayload,
    responses(
        (status = 201, description = "Pago registrado y vigencia actualizada", body = Pago),
        (status = 404, description = "Cliente o paquete no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_pago(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Json(payload): Json<CreatePagoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hoy = Utc::now().date_naive();
    let pago = app_state
        .pago_service
        .registrar_pago(
            RegistrarPago {
                cliente_id: payload.cliente_id,
                fecha_pago: payload.fecha_pago,
                monto: payload.monto,
                metodo_pago: payload.metodo_pago,
                otro_metodo_pago: payload.otro_metodo_pago,
                factura_pago: payload.factura_pago,
                numero_factura: payload.numero_factura,
                motivo_descuento: payload.motivo_descuento,
                paquete_precio_id: payload.paquete_precio_id,
                bank_transaction_id: None,
            },
            hoy,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(pago)))
}

// POST /api/pagos/{id}/cancelar
#[utoipa::path(
    post,
    path = "/api/pagos/{id}/cancelar",
    tag = "Pagos",
    params(("id" = i64, Path, description = "Id del pago")),
    responses(
        (status = 200, description = "Pago cancelado y vigencia recalculada"),
        (status = 404, description = "Pago no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancelar_pago(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let hoy = Utc::now().date_naive();
    app_state.pago_service.cancelar_pago(id, hoy).await?;
    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePagoPayload {
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_pago: Option<NaiveDate>,

    #[schema(value_type = f64, example = 650.00)]
    pub monto: Decimal,

    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,

    #[serde(default)]
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
    pub motivo_descuento: Option<String>,
    pub paquete_precio_id: Option<i64>,
}

// PUT /api/pagos/{id}
#[utoipa::path(
    put,
    path = "/api/pagos/{id}",
    tag = "Pagos",
    params(("id" = i64, Path, description = "Id del pago")),
    request_body = UpdatePagoPayload,
    responses(
        (status = 200, description = "Pago corregido (sin recálculo de vigencia)", body = Pago),
        (status = 404, description = "Pago no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_pago(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePagoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let pago = app_state
        .pago_service
        .editar_pago(
            id,
            EditarPago {
                fecha_pago: payload.fecha_pago,
                monto: payload.monto,
                metodo_pago: payload.metodo_pago,
                otro_metodo_pago: payload.otro_metodo_pago,
                factura_pago: payload.factura_pago,
                numero_factura: payload.numero_factura,
                motivo_descuento: payload.motivo_descuento,
                paquete_precio_id: payload.paquete_precio_id,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(pago)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacturaPayload {
    pub numero_factura: Option<String>,
}

// POST /api/pagos/{id}/factura
#[utoipa::path(
    post,
    path = "/api/pagos/{id}/factura",
    tag = "Pagos",
    params(("id" = i64, Path, description = "Id del pago")),
    request_body = FacturaPayload,
    responses(
        (status = 200, description = "Número de factura actualizado"),
        (status = 404, description = "Pago no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn actualizar_factura(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
    Json(payload): Json<FacturaPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .pago_service
        .actualizar_factura(id, payload.numero_factura.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}
