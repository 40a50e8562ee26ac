// src/db/cliente_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::clientes::{Cliente, NuevaSuscripcion, NuevoCliente, Suscripcion, SuscripcionStatus},
};

#[derive(Clone)]
pub struct ClienteRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl ClienteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn get_cliente<'e, E>(&self, executor: E, id: i64) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(cliente)
    }

    pub async fn list_clientes<'e, E>(&self, executor: E) -> Result<Vec<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let clientes = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes ORDER BY negocio ASC")
            .fetch_all(executor)
            .await?;

        Ok(clientes)
    }

    pub async fn create_cliente<'e, E>(
        &self,
        executor: E,
        nuevo: &NuevoCliente,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>(
            r#"
            INSERT INTO clientes (
                negocio, nombre_contacto, mail, telefono,
                telefono_secundario_1, telefono_secundario_2,
                pais, localidad, status_cliente,
                requiere_factura, razon_social, rfc, codigo_postal,
                regimen_fiscal, uso_cfdi, mail_facturas
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(&nuevo.negocio)
        .bind(&nuevo.nombre_contacto)
        .bind(&nuevo.mail)
        .bind(&nuevo.telefono)
        .bind(&nuevo.telefono_secundario_1)
        .bind(&nuevo.telefono_secundario_2)
        .bind(&nuevo.pais)
        .bind(&nuevo.localidad)
        .bind(&nuevo.status_cliente)
        .bind(nuevo.requiere_factura)
        .bind(&nuevo.razon_social)
        .bind(&nuevo.rfc)
        .bind(&nuevo.codigo_postal)
        .bind(&nuevo.regimen_fiscal)
        .bind(&nuevo.uso_cfdi)
        .bind(&nuevo.mail_facturas)
        .fetch_one(executor)
        .await?;

        Ok(cliente)
    }

    /// Busca la matriz de una sucursal por nombre de negocio. Solo los
    /// clientes que no son sucursal pueden ser matriz.
    pub async fn find_matriz_por_negocio<'e, E>(
        &self,
        executor: E,
        negocio: &str,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT c.* FROM clientes c
            JOIN suscripciones s ON s.cliente_id = c.id
            WHERE c.negocio = $1 AND s.es_sucursal = FALSE
            "#,
        )
        .bind(negocio)
        .fetch_optional(executor)
        .await?;

        Ok(cliente)
    }

    /// Actualiza los campos de conveniencia de "último pago" del cliente.
    pub async fn update_ultimo_pago<'e, E>(
        &self,
        executor: E,
        cliente_id: i64,
        fecha_pago: Option<NaiveDate>,
        metodo_pago: Option<&str>,
        factura_pago: bool,
        numero_factura: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE clientes
            SET fecha_pago = $2, metodo_pago = $3, factura_pago = $4, numero_factura = $5
            WHERE id = $1
            "#,
        )
        .bind(cliente_id)
        .bind(fecha_pago)
        .bind(metodo_pago)
        .bind(factura_pago)
        .bind(numero_factura)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Limpia la fecha de último pago (reset total de la vigencia).
    pub async fn clear_fecha_pago<'e, E>(&self, executor: E, cliente_id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE clientes SET fecha_pago = NULL WHERE id = $1")
            .bind(cliente_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  SUSCRIPCIONES
    // =========================================================================

    pub async fn get_suscripcion<'e, E>(
        &self,
        executor: E,
        cliente_id: i64,
    ) -> Result<Option<Suscripcion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sus = sqlx::query_as::<_, Suscripcion>(
            "SELECT * FROM suscripciones WHERE cliente_id = $1",
        )
        .bind(cliente_id)
        .fetch_optional(executor)
        .await?;

        Ok(sus)
    }

    /// Crea o reemplaza la suscripción del cliente (alta administrativa:
    /// el override manual inicial de fechas está permitido aquí).
    pub async fn upsert_suscripcion<'e, E>(
        &self,
        executor: E,
        nueva: &NuevaSuscripcion,
    ) -> Result<Suscripcion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sus = sqlx::query_as::<_, Suscripcion>(
            r#"
            INSERT INTO suscripciones (
                cliente_id, id_gumi, status, server, fecha_inicio,
                paquete, vigencia, vence_en, proximo_pago,
                es_sucursal, matriz_id, observaciones
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (cliente_id) DO UPDATE SET
                id_gumi = EXCLUDED.id_gumi,
                status = EXCLUDED.status,
                server = EXCLUDED.server,
                fecha_inicio = EXCLUDED.fecha_inicio,
                paquete = EXCLUDED.paquete,
                vigencia = EXCLUDED.vigencia,
                vence_en = EXCLUDED.vence_en,
                proximo_pago = EXCLUDED.proximo_pago,
                es_sucursal = EXCLUDED.es_sucursal,
                matriz_id = EXCLUDED.matriz_id,
                observaciones = EXCLUDED.observaciones
            RETURNING *
            "#,
        )
        .bind(nueva.cliente_id)
        .bind(&nueva.id_gumi)
        .bind(nueva.status)
        .bind(&nueva.server)
        .bind(nueva.fecha_inicio)
        .bind(&nueva.paquete)
        .bind(&nueva.vigencia)
        .bind(nueva.vence_en)
        .bind(nueva.proximo_pago)
        .bind(nueva.es_sucursal)
        .bind(nueva.matriz_id)
        .bind(&nueva.observaciones)
        .fetch_one(executor)
        .await?;

        Ok(sus)
    }

    /// Escribe el resultado de un recálculo de vigencia. `paquete` y
    /// `vigencia` solo se tocan cuando el recálculo determinó unos nuevos.
    pub async fn update_vigencia<'e, E>(
        &self,
        executor: E,
        cliente_id: i64,
        vence_en: Option<NaiveDate>,
        proximo_pago: Option<NaiveDate>,
        status: SuscripcionStatus,
        paquete: Option<&str>,
        vigencia: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE suscripciones
            SET vence_en = $2,
                proximo_pago = $3,
                status = $4,
                paquete = COALESCE($5, paquete),
                vigencia = COALESCE($6, vigencia)
            WHERE cliente_id = $1
            "#,
        )
        .bind(cliente_id)
        .bind(vence_en)
        .bind(proximo_pago)
        .bind(status)
        .bind(paquete)
        .bind(vigencia)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        cliente_id: i64,
        status: SuscripcionStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE suscripciones SET status = $2 WHERE cliente_id = $1")
            .bind(cliente_id)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }
}
