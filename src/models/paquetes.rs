// src/models/paquetes.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Entrada del catálogo de precios. Puede haber varias filas por
/// (pais, paquete, vigencia); la vigente es la de `fecha_vigencia` máxima.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaquetePrecio {
    pub id: i64,

    #[schema(example = "MÉXICO")]
    pub pais: String,

    #[schema(example = "Iguana")]
    pub paquete: String,

    #[schema(example = "MENSUAL")]
    pub vigencia: String,

    #[schema(example = "650.00")]
    pub precio: Decimal,

    #[schema(example = "MXN")]
    pub moneda: String,

    #[schema(value_type = String, format = Date)]
    pub fecha_vigencia: NaiveDate,

    pub is_active: bool,
}
