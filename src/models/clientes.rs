// src/models/clientes.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Enums (mapeando Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "suscripcion_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuscripcionStatus {
    Activo,
    Suspendido,
    Eliminado,
    EnPrueba, // Demo / sin pagos activos
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: i64,

    /// Nombre comercial. Es la llave estable para vincular sucursales
    /// con su matriz.
    #[schema(example = "Taquería El Güero")]
    pub negocio: String,

    #[schema(example = "María López")]
    pub nombre_contacto: String,

    #[schema(example = "maria@elguero.mx")]
    pub mail: String,

    pub telefono: String,
    pub telefono_secundario_1: Option<String>,
    pub telefono_secundario_2: Option<String>,

    /// MÉXICO | COLOMBIA | LATAM
    #[schema(example = "MÉXICO")]
    pub pais: String,
    pub localidad: Option<String>,
    pub status_cliente: String,

    // Datos fiscales
    pub requiere_factura: bool,
    pub razon_social: Option<String>,
    pub rfc: Option<String>,
    pub codigo_postal: Option<String>,
    pub regimen_fiscal: Option<String>,
    pub uso_cfdi: Option<String>,
    pub mail_facturas: Option<String>,

    // Conveniencia: datos del último pago registrado
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_pago: Option<NaiveDate>,
    pub metodo_pago: Option<String>,
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suscripcion {
    pub id: i64,
    pub cliente_id: i64,
    pub id_gumi: Option<String>,
    pub status: SuscripcionStatus,

    #[schema(example = "server-mx-01")]
    pub server: String,

    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub fecha_inicio: NaiveDate,

    #[schema(example = "Iguana")]
    pub paquete: String,

    /// Código de duración: DEMO | MENSUAL | TRIMESTRAL | SEMESTRAL | ANUAL
    #[schema(example = "MENSUAL")]
    pub vigencia: String,

    /// Derivado del historial de pagos activos. Nunca se edita a mano
    /// salvo en el alta administrativa inicial.
    #[schema(value_type = Option<String>, format = Date)]
    pub vence_en: Option<NaiveDate>,

    #[schema(value_type = Option<String>, format = Date)]
    pub proximo_pago: Option<NaiveDate>,

    // Matriz / sucursal
    pub es_sucursal: bool,
    pub matriz_id: Option<i64>,

    pub observaciones: Option<String>,
}

/// Respuesta de detalle: el cliente con su suscripción y el estado de
/// cobro derivado contra la fecha de hoy.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClienteDetalle {
    pub cliente: Cliente,
    pub suscripcion: Option<Suscripcion>,
    pub status_pago: crate::services::vigencia::StatusPago,
}

#[derive(Debug, Clone, Default)]
pub struct NuevoCliente {
    pub negocio: String,
    pub nombre_contacto: String,
    pub mail: String,
    pub telefono: String,
    pub telefono_secundario_1: Option<String>,
    pub telefono_secundario_2: Option<String>,
    pub pais: String,
    pub localidad: Option<String>,
    pub status_cliente: String,
    pub requiere_factura: bool,
    pub razon_social: Option<String>,
    pub rfc: Option<String>,
    pub codigo_postal: Option<String>,
    pub regimen_fiscal: Option<String>,
    pub uso_cfdi: Option<String>,
    pub mail_facturas: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NuevaSuscripcion {
    pub cliente_id: i64,
    pub id_gumi: Option<String>,
    pub status: SuscripcionStatus,
    pub server: String,
    pub fecha_inicio: NaiveDate,
    pub paquete: String,
    pub vigencia: String,
    pub vence_en: Option<NaiveDate>,
    pub proximo_pago: Option<NaiveDate>,
    pub es_sucursal: bool,
    pub matriz_id: Option<i64>,
    pub observaciones: Option<String>,
}
