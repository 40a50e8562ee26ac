// src/handlers/clientes.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{RequireRole, RolConciliacion, RolModificacion},
    models::clientes::{Cliente, ClienteDetalle, NuevoCliente, SuscripcionStatus},
    models::pagos::Pago,
    services::{
        cliente_service::AltaSuscripcion,
        import_service::ImportResult,
        vigencia::calcular_fechas_vigencia,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientePayload {
    #[validate(length(min = 1, message = "El negocio es obligatorio"))]
    #[schema(example = "Taquería El Güero")]
    pub negocio: String,

    #[validate(length(min = 1, message = "El contacto es obligatorio"))]
    #[schema(example = "María López")]
    pub nombre_contacto: String,

    #[validate(email(message = "Correo inválido"))]
    #[schema(example = "maria@elguero.mx")]
    pub mail: String,

    #[validate(length(min = 1, message = "El teléfono es obligatorio"))]
    pub telefono: String,
    pub telefono_secundario_1: Option<String>,
    pub telefono_secundario_2: Option<String>,

    #[validate(length(min = 1, message = "El país es obligatorio"))]
    #[schema(example = "MÉXICO")]
    pub pais: String,
    pub localidad: Option<String>,

    // Datos fiscales (opcionales)
    pub razon_social: Option<String>,
    pub rfc: Option<String>,
    pub codigo_postal: Option<String>,
    pub regimen_fiscal: Option<String>,
    pub uso_cfdi: Option<String>,
    pub mail_facturas: Option<String>,

    // --- Suscripción ---
    pub id_gumi: Option<String>,
    pub status: SuscripcionStatus,

    #[validate(length(min = 1, message = "El server es obligatorio"))]
    #[schema(example = "server-mx-01")]
    pub server: String,

    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub fecha_inicio: NaiveDate,

    #[validate(length(min = 1, message = "El paquete es obligatorio"))]
    #[schema(example = "Iguana")]
    pub paquete: String,

    #[validate(length(min = 1, message = "La vigencia es obligatoria"))]
    #[schema(example = "MENSUAL")]
    pub vigencia: String,

    #[serde(default)]
    pub es_sucursal: bool,
    pub matriz_negocio: Option<String>,
    pub observaciones: Option<String>,

    // Override administrativo del alta; si falta se calcula.
    #[schema(value_type = Option<String>, format = Date)]
    pub vence_en: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub proximo_pago: Option<NaiveDate>,
}

impl CreateClientePayload {
    fn separar(self) -> (NuevoCliente, AltaSuscripcion) {
        let requiere_factura = self.razon_social.is_some() && self.rfc.is_some();

        let cliente = NuevoCliente {
            negocio: self.negocio,
            nombre_contacto: self.nombre_contacto,
            mail: self.mail,
            telefono: self.telefono,
            telefono_secundario_1: self.telefono_secundario_1,
            telefono_secundario_2: self.telefono_secundario_2,
            pais: self.pais.to_uppercase(),
            localidad: self.localidad,
            status_cliente: "ACTIVO".to_string(),
            requiere_factura,
            razon_social: self.razon_social,
            rfc: self.rfc,
            codigo_postal: self.codigo_postal,
            regimen_fiscal: self.regimen_fiscal,
            uso_cfdi: self.uso_cfdi,
            mail_facturas: self.mail_facturas,
        };

        let suscripcion = AltaSuscripcion {
            id_gumi: self.id_gumi,
            status: self.status,
            server: self.server,
            fecha_inicio: self.fecha_inicio,
            paquete: self.paquete,
            vigencia: self.vigencia.to_uppercase(),
            es_sucursal: self.es_sucursal,
            matriz_negocio: self.matriz_negocio,
            observaciones: self.observaciones,
            vence_en: self.vence_en,
            proximo_pago: self.proximo_pago,
        };

        (cliente, suscripcion)
    }
}

// POST /api/clientes
#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = CreateClientePayload,
    responses(
        (status = 201, description = "Cliente y suscripción creados"),
        (status = 400, description = "Datos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cliente(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Json(payload): Json<CreateClientePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (nuevo, suscripcion) = payload.separar();
    let (cliente, sus) = app_state.cliente_service.alta_cliente(nuevo, suscripcion).await?;

    Ok((StatusCode::CREATED, Json(json!({ "cliente": cliente, "suscripcion": sus }))))
}

// GET /api/clientes
#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Clientes",
    responses((status = 200, description = "Lista de clientes", body = Vec<Cliente>)),
    security(("api_jwt" = []))
)]
pub async fn list_clientes(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let clientes = app_state.cliente_service.listar().await?;
    Ok((StatusCode::OK, Json(clientes)))
}

// GET /api/clientes/{id}
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = i64, Path, description = "Id del cliente")),
    responses(
        (status = 200, description = "Detalle del cliente", body = ClienteDetalle),
        (status = 404, description = "Cliente no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cliente(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let hoy = Utc::now().date_naive();
    let detalle = app_state.cliente_service.detalle(id, hoy).await?;
    Ok((StatusCode::OK, Json(detalle)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CambiarStatusPayload {
    pub status: SuscripcionStatus,
}

// POST /api/clientes/{id}/status
#[utoipa::path(
    post,
    path = "/api/clientes/{id}/status",
    tag = "Clientes",
    params(("id" = i64, Path, description = "Id del cliente")),
    request_body = CambiarStatusPayload,
    responses(
        (status = 200, description = "Status actualizado"),
        (status = 404, description = "El cliente no tiene suscripción")
    ),
    security(("api_jwt" = []))
)]
pub async fn cambiar_status(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
    Json(payload): Json<CambiarStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state.cliente_service.cambiar_status(id, payload.status).await?;
    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSuscripcionPayload {
    pub id_gumi: Option<String>,
    pub status: SuscripcionStatus,

    #[validate(length(min = 1, message = "El server es obligatorio"))]
    pub server: String,

    #[schema(value_type = String, format = Date)]
    pub fecha_inicio: NaiveDate,

    #[validate(length(min = 1, message = "El paquete es obligatorio"))]
    pub paquete: String,

    #[validate(length(min = 1, message = "La vigencia es obligatoria"))]
    pub vigencia: String,

    #[serde(default)]
    pub es_sucursal: bool,
    pub matriz_negocio: Option<String>,
    pub observaciones: Option<String>,

    #[schema(value_type = Option<String>, format = Date)]
    pub vence_en: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub proximo_pago: Option<NaiveDate>,
}

// PUT /api/clientes/{id}/suscripcion
#[utoipa::path(
    put,
    path = "/api/clientes/{id}/suscripcion",
    tag = "Clientes",
    params(("id" = i64, Path, description = "Id del cliente")),
    request_body = UpdateSuscripcionPayload,
    responses(
        (status = 200, description = "Suscripción guardada"),
        (status = 404, description = "Cliente no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_suscripcion(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSuscripcionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sus = app_state
        .cliente_service
        .actualizar_suscripcion(
            id,
            AltaSuscripcion {
                id_gumi: payload.id_gumi,
                status: payload.status,
                server: payload.server,
                fecha_inicio: payload.fecha_inicio,
                paquete: payload.paquete,
                vigencia: payload.vigencia.to_uppercase(),
                es_sucursal: payload.es_sucursal,
                matriz_negocio: payload.matriz_negocio,
                observaciones: payload.observaciones,
                vence_en: payload.vence_en,
                proximo_pago: payload.proximo_pago,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(sus)))
}

// POST /api/clientes/{id}/recalcular
#[utoipa::path(
    post,
    path = "/api/clientes/{id}/recalcular",
    tag = "Clientes",
    params(("id" = i64, Path, description = "Id del cliente")),
    responses((status = 200, description = "Vigencia recalculada desde el historial de pagos")),
    security(("api_jwt" = []))
)]
pub async fn recalcular_cliente(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolModificacion>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let hoy = Utc::now().date_naive();
    let recalculado = app_state.suscripcion_service.recalcular(id, hoy).await?;
    Ok((StatusCode::OK, Json(json!({ "recalculado": recalculado }))))
}

// GET /api/clientes/{id}/pagos
#[utoipa::path(
    get,
    path = "/api/clientes/{id}/pagos",
    tag = "Clientes",
    params(("id" = i64, Path, description = "Id del cliente")),
    responses((status = 200, description = "Historial de pagos del cliente", body = Vec<Pago>)),
    security(("api_jwt" = []))
)]
pub async fn pagos_de_cliente(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pagos = app_state.pago_service.pagos_de_cliente(id).await?;
    Ok((StatusCode::OK, Json(pagos)))
}

// POST /api/clientes/importar
#[utoipa::path(
    post,
    path = "/api/clientes/importar",
    tag = "Clientes",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado de la carga masiva", body = ImportResult),
        (status = 400, description = "Archivo ausente o columnas faltantes")
    ),
    security(("api_jwt" = []))
)]
pub async fn importar_clientes(
    State(app_state): State<AppState>,
    _rol: RequireRole<RolConciliacion>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let csv_bytes = leer_archivo_csv(multipart).await?;
    let resultado = app_state.import_service.importar_clientes(&csv_bytes).await?;
    Ok((StatusCode::OK, Json(resultado)))
}

#[derive(Debug, Deserialize)]
pub struct VigenciaQuery {
    pub fecha_inicio: NaiveDate,
    pub vigencia: String,
}

// GET /api/vigencia/calcular
#[utoipa::path(
    get,
    path = "/api/vigencia/calcular",
    tag = "Clientes",
    params(
        ("fecha_inicio" = String, Query, description = "Fecha de inicio (YYYY-MM-DD)"),
        ("vigencia" = String, Query, description = "DEMO | MENSUAL | TRIMESTRAL | SEMESTRAL | ANUAL")
    ),
    responses((status = 200, description = "Fechas de vencimiento y próximo pago")),
    security(("api_jwt" = []))
)]
pub async fn calcular_vigencia(
    Query(q): Query<VigenciaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (vence_en, proximo_pago) = calcular_fechas_vigencia(q.fecha_inicio, &q.vigencia);
    Ok((StatusCode::OK, Json(json!({ "venceEn": vence_en, "proximoPago": proximo_pago }))))
}

/// Saca los bytes del campo `archivo_csv` de un formulario multipart.
pub(crate) async fn leer_archivo_csv(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Formulario multipart inválido: {e}")))?
    {
        if field.name() == Some("archivo_csv") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("No se pudo leer el archivo: {e}")))?;
            if bytes.is_empty() {
                return Err(AppError::BadRequest("El archivo está vacío".to_string()));
            }
            return Ok(bytes.to_vec());
        }
    }

    Err(AppError::BadRequest("No se encontró el archivo en la petición".to_string()))
}
