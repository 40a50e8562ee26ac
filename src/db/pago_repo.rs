// src/db/pago_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::pagos::{NuevoPago, Pago, PagoStatus},
};

/// Llave del advisory lock que serializa la asignación de ids sintéticos
/// de pagos manuales.
const LOCK_IDS_MANUALES: i64 = 0x4755_4D49; // "GUMI"

#[derive(Clone)]
pub struct PagoRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl PagoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_pago<'e, E>(&self, executor: E, id: i64) -> Result<Option<Pago>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, Pago>("SELECT * FROM pagos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pago)
    }

    /// Historial completo del cliente, más reciente primero (para listados).
    pub async fn list_pagos<'e, E>(&self, executor: E, cliente_id: i64) -> Result<Vec<Pago>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pagos = sqlx::query_as::<_, Pago>(
            "SELECT * FROM pagos WHERE cliente_id = $1 ORDER BY fecha_pago DESC, id DESC",
        )
        .bind(cliente_id)
        .fetch_all(executor)
        .await?;

        Ok(pagos)
    }

    /// Pagos que cuentan para la vigencia: sin cancelados, en orden
    /// cronológico ascendente (el orden que consume el replay).
    pub async fn list_pagos_activos<'e, E>(
        &self,
        executor: E,
        cliente_id: i64,
    ) -> Result<Vec<Pago>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pagos = sqlx::query_as::<_, Pago>(
            r#"
            SELECT * FROM pagos
            WHERE cliente_id = $1 AND status <> $2
            ORDER BY fecha_pago ASC, id ASC
            "#,
        )
        .bind(cliente_id)
        .bind(PagoStatus::Cancelado)
        .fetch_all(executor)
        .await?;

        Ok(pagos)
    }

    pub async fn find_por_bank_transaction<'e, E>(
        &self,
        executor: E,
        bank_transaction_id: i64,
    ) -> Result<Option<Pago>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, Pago>("SELECT * FROM pagos WHERE bank_transaction_id = $1")
            .bind(bank_transaction_id)
            .fetch_optional(executor)
            .await?;

        Ok(pago)
    }

    pub async fn insert_pago<'e, E>(&self, executor: E, nuevo: &NuevoPago) -> Result<Pago, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, Pago>(
            r#"
            INSERT INTO pagos (
                cliente_id, nombre, correo, monto, fecha_pago,
                metodo_pago, otro_metodo_pago, factura_pago, numero_factura,
                paquete, vigencia, motivo_descuento, moneda,
                paquete_precio_id, bank_transaction_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(nuevo.cliente_id)
        .bind(&nuevo.nombre)
        .bind(&nuevo.correo)
        .bind(nuevo.monto)
        .bind(nuevo.fecha_pago)
        .bind(&nuevo.metodo_pago)
        .bind(&nuevo.otro_metodo_pago)
        .bind(nuevo.factura_pago)
        .bind(&nuevo.numero_factura)
        .bind(&nuevo.paquete)
        .bind(&nuevo.vigencia)
        .bind(&nuevo.motivo_descuento)
        .bind(&nuevo.moneda)
        .bind(nuevo.paquete_precio_id)
        .bind(nuevo.bank_transaction_id)
        .fetch_one(executor)
        .await?;

        Ok(pago)
    }

    /// Asigna el siguiente id sintético (negativo, estrictamente
    /// decreciente) para un pago manual sin movimiento bancario real.
    ///
    /// El `MIN(...)` y el INSERT posterior corren bajo un advisory lock de
    /// transacción: dos altas manuales concurrentes se serializan y no
    /// pueden leer el mismo mínimo. El lock se libera solo al hacer commit.
    pub async fn allocate_manual_id(&self, conn: &mut PgConnection) -> Result<i64, AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LOCK_IDS_MANUALES)
            .execute(&mut *conn)
            .await?;

        let min_actual: Option<i64> = sqlx::query_scalar(
            "SELECT MIN(bank_transaction_id) FROM pagos WHERE bank_transaction_id < 0",
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(siguiente_id_manual(min_actual))
    }

    /// Edición cosmética de un pago histórico. No toca el snapshot de
    /// suscripción: eso es política, no omisión.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_pago<'e, E>(
        &self,
        executor: E,
        id: i64,
        fecha_pago: NaiveDate,
        monto: Decimal,
        metodo_pago: Option<&str>,
        otro_metodo_pago: Option<&str>,
        factura_pago: bool,
        numero_factura: Option<&str>,
        motivo_descuento: Option<&str>,
        paquete: Option<&str>,
        vigencia: Option<&str>,
    ) -> Result<Pago, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, Pago>(
            r#"
            UPDATE pagos
            SET fecha_pago = $2, monto = $3, metodo_pago = $4, otro_metodo_pago = $5,
                factura_pago = $6, numero_factura = $7, motivo_descuento = $8,
                paquete = COALESCE($9, paquete),
                vigencia = COALESCE($10, vigencia)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fecha_pago)
        .bind(monto)
        .bind(metodo_pago)
        .bind(otro_metodo_pago)
        .bind(factura_pago)
        .bind(numero_factura)
        .bind(motivo_descuento)
        .bind(paquete)
        .bind(vigencia)
        .fetch_one(executor)
        .await?;

        Ok(pago)
    }

    /// Re-conciliación: reescribe el pago ya vinculado a una transacción
    /// bancaria (puede cambiar hasta de cliente) y lo reactiva. La fila es
    /// siempre la misma: el vínculo transacción↔pago es 1:1.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_conciliacion<'e, E>(
        &self,
        executor: E,
        id: i64,
        cliente_id: i64,
        nombre: &str,
        correo: &str,
        monto: Decimal,
        fecha_pago: NaiveDate,
        numero_factura: Option<&str>,
        paquete: Option<&str>,
        vigencia: Option<&str>,
        moneda: Option<&str>,
        paquete_precio_id: Option<i64>,
    ) -> Result<Pago, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, Pago>(
            r#"
            UPDATE pagos
            SET cliente_id = $2, nombre = $3, correo = $4, monto = $5, fecha_pago = $6,
                numero_factura = $7, factura_pago = ($7 IS NOT NULL),
                paquete = $8, vigencia = $9, moneda = $10, paquete_precio_id = $11,
                metodo_pago = 'Transferencia', status = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(cliente_id)
        .bind(nombre)
        .bind(correo)
        .bind(monto)
        .bind(fecha_pago)
        .bind(numero_factura)
        .bind(paquete)
        .bind(vigencia)
        .bind(moneda)
        .bind(paquete_precio_id)
        .bind(PagoStatus::Activo)
        .fetch_one(executor)
        .await?;

        Ok(pago)
    }

    /// Soft delete: el pago queda CANCELADO pero se conserva para auditoría.
    pub async fn cancelar<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE pagos SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(PagoStatus::Cancelado)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn update_numero_factura<'e, E>(
        &self,
        executor: E,
        id: i64,
        numero_factura: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE pagos SET numero_factura = $2 WHERE id = $1")
            .bind(id)
            .bind(numero_factura)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Borra el pago vinculado a una transacción bancaria (borrado físico:
    /// solo ocurre al eliminar la transacción). Devuelve el cliente dueño.
    pub async fn delete_por_bank_transaction<'e, E>(
        &self,
        executor: E,
        bank_transaction_id: i64,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente_id: Option<i64> = sqlx::query_scalar(
            "DELETE FROM pagos WHERE bank_transaction_id = $1 RETURNING cliente_id",
        )
        .bind(bank_transaction_id)
        .fetch_optional(executor)
        .await?;

        Ok(cliente_id)
    }
}

/// Regla pura de asignación: el mínimo existente menos uno, o −1 si aún no
/// hay ids manuales.
pub fn siguiente_id_manual(min_actual: Option<i64>) -> i64 {
    match min_actual {
        Some(min) => min - 1,
        None => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::siguiente_id_manual;

    #[test]
    fn primer_id_manual_es_menos_uno() {
        assert_eq!(siguiente_id_manual(None), -1);
    }

    #[test]
    fn ids_manuales_estrictamente_decrecientes() {
        // Simula N asignaciones secuenciales partiendo de un historial vacío.
        let mut min: Option<i64> = None;
        let mut asignados = Vec::new();
        for _ in 0..10 {
            let id = siguiente_id_manual(min);
            asignados.push(id);
            min = Some(id);
        }

        assert_eq!(asignados.first(), Some(&-1));
        for par in asignados.windows(2) {
            assert!(par[1] < par[0]);
        }
        // Nunca colisionan con ids bancarios reales (positivos).
        assert!(asignados.iter().all(|id| *id < 0));
    }

    #[test]
    fn ignora_el_signo_de_ids_positivos() {
        // El MIN de la consulta solo ve negativos; si existe -5, sigue -6
        // aunque haya transacciones bancarias con ids positivos enormes.
        assert_eq!(siguiente_id_manual(Some(-5)), -6);
    }
}
