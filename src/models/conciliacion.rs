// src/models/conciliacion.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaccion_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransaccionStatus {
    Pendiente,
    /// Vinculada 1:1 a un Pago.
    Conciliado,
    /// Marcada con nombres de negocios y factura compartida; los pagos de
    /// cada sucursal se registran a mano después.
    PreConciliadoSucursal,
}

/// Línea importada del estado de cuenta. Vive independiente del Pago.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: i64,

    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,

    #[schema(example = "SPEI RECIBIDO TAQUERIA EL GUERO")]
    pub concept: String,

    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub total_balance: Option<Decimal>,

    pub status: TransaccionStatus,

    // Datos de auditoría guardados en la propia transacción al conciliar,
    // independientes del Pago vinculado.
    pub negocio_conciliado: Option<String>,
    pub num_factura_conciliado: Option<String>,
}

/// Fila del listado de conciliación: transacción + pago/cliente vinculados
/// (si existen).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransaccionListado {
    pub id: i64,

    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub concept: String,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub total_balance: Option<Decimal>,
    pub status: TransaccionStatus,
    pub negocio_conciliado: Option<String>,
    pub num_factura_conciliado: Option<String>,

    pub pago_id: Option<i64>,
    pub pago_numero_factura: Option<String>,
    pub cliente_negocio: Option<String>,
    pub cliente_rfc: Option<String>,
}
