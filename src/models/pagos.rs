// src/models/pagos.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "pago_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PagoStatus {
    Activo,
    /// Cancelado lógicamente: se excluye de todo recálculo y reporte,
    /// pero se conserva para auditoría.
    Cancelado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pago {
    pub id: i64,
    pub cliente_id: i64,

    // Copia del contacto al momento del pago
    pub nombre: String,
    pub correo: String,

    #[schema(example = "650.00")]
    pub monto: Decimal,

    #[schema(value_type = String, format = Date, example = "2025-01-10")]
    pub fecha_pago: NaiveDate,

    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,
    pub factura_pago: bool,
    pub numero_factura: Option<String>,

    // Snapshot del paquete al momento del pago. Un cambio posterior del
    // catálogo no altera pagos históricos.
    pub paquete: Option<String>,
    pub vigencia: Option<String>,
    pub motivo_descuento: Option<String>,
    pub moneda: Option<String>,

    pub status: PagoStatus,
    pub paquete_precio_id: Option<i64>,

    /// Positivo: movimiento bancario real (único). Negativo: id sintético
    /// de pago manual, estrictamente decreciente.
    pub bank_transaction_id: Option<i64>,
}

/// Datos para insertar un pago. El snapshot de paquete/vigencia/moneda ya
/// viene resuelto por el servicio.
#[derive(Debug, Clone)]
pub struct NuevoPago {
    pub cliente_id: i64,
    pub nombre: String,
    pub correo: String,
    pub monto: Decimal,
    pub fecha_pago: NaiveDate,
    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
    pub paquete: Option<String>,
    pub vigencia: Option<String>,
    pub motivo_descuento: Option<String>,
    pub moneda: Option<String>,
    pub paquete_precio_id: Option<i64>,
    pub bank_transaction_id: i64,
}
