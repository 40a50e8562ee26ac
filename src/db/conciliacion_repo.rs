// src/db/conciliacion_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::conciliacion::{BankTransaction, TransaccionListado, TransaccionStatus},
};

#[derive(Clone)]
pub struct ConciliacionRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl ConciliacionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_transaccion<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<Option<BankTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trans =
            sqlx::query_as::<_, BankTransaction>("SELECT * FROM bank_transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(trans)
    }

    pub async fn insert_transaccion<'e, E>(
        &self,
        executor: E,
        date: NaiveDate,
        concept: &str,
        debit: Decimal,
        credit: Decimal,
        total_balance: Decimal,
    ) -> Result<BankTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trans = sqlx::query_as::<_, BankTransaction>(
            r#"
            INSERT INTO bank_transactions (date, concept, debit, credit, total_balance)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(date)
        .bind(concept)
        .bind(debit)
        .bind(credit)
        .bind(total_balance)
        .fetch_one(executor)
        .await?;

        Ok(trans)
    }

    /// Listado para la pantalla de conciliación: cada transacción con su
    /// Pago y Cliente vinculados (si los hay), filtrable por año y mes.
    pub async fn listar<'e, E>(
        &self,
        executor: E,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<TransaccionListado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let filas = sqlx::query_as::<_, TransaccionListado>(
            r#"
            SELECT
                t.id, t.date, t.concept, t.debit, t.credit, t.total_balance,
                t.status, t.negocio_conciliado, t.num_factura_conciliado,
                p.id AS pago_id,
                p.numero_factura AS pago_numero_factura,
                c.negocio AS cliente_negocio,
                c.rfc AS cliente_rfc
            FROM bank_transactions t
            LEFT JOIN pagos p ON p.bank_transaction_id = t.id
            LEFT JOIN clientes c ON c.id = p.cliente_id
            WHERE ($1::INT IS NULL OR EXTRACT(YEAR FROM t.date) = $1)
              AND ($2::INT IS NULL OR EXTRACT(MONTH FROM t.date) = $2)
            ORDER BY t.date DESC, t.id DESC
            "#,
        )
        .bind(year)
        .bind(month.map(|m| m as i32))
        .fetch_all(executor)
        .await?;

        Ok(filas)
    }

    /// Marca la transacción como conciliada, guardando el negocio y la
    /// factura en la propia transacción para auditoría.
    pub async fn marcar_conciliada<'e, E>(
        &self,
        executor: E,
        id: i64,
        negocio: &str,
        numero_factura: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE bank_transactions
            SET status = $2, negocio_conciliado = $3, num_factura_conciliado = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(TransaccionStatus::Conciliado)
        .bind(negocio)
        .bind(numero_factura)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Pre-conciliación de sucursal: la transacción guarda la lista libre
    /// de negocios y la factura compartida, sin Pago vinculado todavía.
    pub async fn marcar_preconciliada<'e, E>(
        &self,
        executor: E,
        id: i64,
        negocios_nombres: &str,
        numero_factura: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE bank_transactions
            SET status = $2, negocio_conciliado = $3, num_factura_conciliado = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(TransaccionStatus::PreConciliadoSucursal)
        .bind(negocios_nombres)
        .bind(numero_factura)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn delete_transaccion<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM bank_transactions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
