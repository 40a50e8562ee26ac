// src/db/paquete_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::paquetes::PaquetePrecio};

#[derive(Clone)]
pub struct PaqueteRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl PaqueteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Option<PaquetePrecio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pp = sqlx::query_as::<_, PaquetePrecio>("SELECT * FROM paquete_precios WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pp)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        pais: &str,
        paquete: &str,
        vigencia: &str,
        precio: Decimal,
        moneda: &str,
        fecha_vigencia: NaiveDate,
    ) -> Result<PaquetePrecio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pp = sqlx::query_as::<_, PaquetePrecio>(
            r#"
            INSERT INTO paquete_precios (pais, paquete, vigencia, precio, moneda, fecha_vigencia)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(pais)
        .bind(paquete)
        .bind(vigencia)
        .bind(precio)
        .bind(moneda)
        .bind(fecha_vigencia)
        .fetch_one(executor)
        .await?;

        Ok(pp)
    }

    /// Precio vigente de un grupo (pais, paquete, vigencia): gana la fila
    /// con la fecha_vigencia más reciente.
    pub async fn vigente<'e, E>(
        &self,
        executor: E,
        pais: &str,
        paquete: &str,
        vigencia: &str,
    ) -> Result<Option<PaquetePrecio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pp = sqlx::query_as::<_, PaquetePrecio>(
            r#"
            SELECT * FROM paquete_precios
            WHERE pais = $1 AND paquete = $2 AND vigencia = $3 AND is_active
            ORDER BY fecha_vigencia DESC
            LIMIT 1
            "#,
        )
        .bind(pais)
        .bind(paquete)
        .bind(vigencia)
        .fetch_optional(executor)
        .await?;

        Ok(pp)
    }

    /// Catálogo activo de un país, una fila por grupo (la vigente).
    pub async fn list_activos_por_pais<'e, E>(
        &self,
        executor: E,
        pais: &str,
    ) -> Result<Vec<PaquetePrecio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let paquetes = sqlx::query_as::<_, PaquetePrecio>(
            r#"
            SELECT DISTINCT ON (pais, paquete, vigencia) *
            FROM paquete_precios
            WHERE pais = $1 AND is_active
            ORDER BY pais, paquete, vigencia, fecha_vigencia DESC
            "#,
        )
        .bind(pais)
        .fetch_all(executor)
        .await?;

        Ok(paquetes)
    }

    /// Variante por moneda (MÉXICO se consulta por MXN).
    pub async fn list_activos_por_moneda<'e, E>(
        &self,
        executor: E,
        moneda: &str,
    ) -> Result<Vec<PaquetePrecio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let paquetes = sqlx::query_as::<_, PaquetePrecio>(
            r#"
            SELECT DISTINCT ON (pais, paquete, vigencia) *
            FROM paquete_precios
            WHERE moneda = $1 AND is_active
            ORDER BY pais, paquete, vigencia, fecha_vigencia DESC
            "#,
        )
        .bind(moneda)
        .fetch_all(executor)
        .await?;

        Ok(paquetes)
    }
}
