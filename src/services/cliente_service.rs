// src/services/cliente_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::ClienteRepository,
    models::clientes::{
        Cliente, ClienteDetalle, NuevaSuscripcion, NuevoCliente, Suscripcion, SuscripcionStatus,
    },
    services::vigencia::{calcular_fechas_vigencia, calcular_status_pago},
};

/// Datos de suscripción del alta o edición administrativa. `vence_en` y
/// `proximo_pago` permiten el override manual inicial; si faltan, se
/// calculan desde `fecha_inicio`.
#[derive(Debug, Clone)]
pub struct AltaSuscripcion {
    pub id_gumi: Option<String>,
    pub status: SuscripcionStatus,
    pub server: String,
    pub fecha_inicio: NaiveDate,
    pub paquete: String,
    pub vigencia: String,
    pub es_sucursal: bool,
    pub matriz_negocio: Option<String>,
    pub observaciones: Option<String>,
    pub vence_en: Option<NaiveDate>,
    pub proximo_pago: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct ClienteService {
    cliente_repo: ClienteRepository,
    pool: PgPool,
}

impl ClienteService {
    pub fn new(cliente_repo: ClienteRepository, pool: PgPool) -> Self {
        Self { cliente_repo, pool }
    }

    /// Alta completa: cliente y suscripción nacen juntos en una sola
    /// transacción. La vigencia inicial sale del cálculo de calendario
    /// salvo override administrativo explícito.
    pub async fn alta_cliente(
        &self,
        nuevo: NuevoCliente,
        suscripcion: AltaSuscripcion,
    ) -> Result<(Cliente, Suscripcion), AppError> {
        let mut tx = self.pool.begin().await?;

        let cliente = self.cliente_repo.create_cliente(&mut *tx, &nuevo).await?;
        let sus = self
            .guardar_suscripcion(&mut tx, cliente.id, suscripcion)
            .await?;

        tx.commit().await?;

        tracing::info!(cliente_id = cliente.id, negocio = %cliente.negocio, "cliente dado de alta");
        Ok((cliente, sus))
    }

    /// Edición administrativa de la suscripción de un cliente existente.
    pub async fn actualizar_suscripcion(
        &self,
        cliente_id: i64,
        suscripcion: AltaSuscripcion,
    ) -> Result<Suscripcion, AppError> {
        let mut tx = self.pool.begin().await?;

        self.cliente_repo
            .get_cliente(&mut *tx, cliente_id)
            .await?
            .ok_or(AppError::ClienteNotFound)?;

        let sus = self
            .guardar_suscripcion(&mut tx, cliente_id, suscripcion)
            .await?;

        tx.commit().await?;
        Ok(sus)
    }

    async fn guardar_suscripcion(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        cliente_id: i64,
        datos: AltaSuscripcion,
    ) -> Result<Suscripcion, AppError> {
        // La matriz se resuelve por nombre de negocio; solo un cliente que
        // no es sucursal puede serlo.
        let matriz_id = match (datos.es_sucursal, &datos.matriz_negocio) {
            (true, Some(negocio)) => self
                .cliente_repo
                .find_matriz_por_negocio(&mut **tx, negocio)
                .await?
                .map(|matriz| matriz.id),
            _ => None,
        };

        let (vence_calc, proximo_calc) =
            calcular_fechas_vigencia(datos.fecha_inicio, &datos.vigencia);

        self.cliente_repo
            .upsert_suscripcion(
                &mut **tx,
                &NuevaSuscripcion {
                    cliente_id,
                    id_gumi: datos.id_gumi,
                    status: datos.status,
                    server: datos.server,
                    fecha_inicio: datos.fecha_inicio,
                    paquete: datos.paquete,
                    vigencia: datos.vigencia,
                    vence_en: Some(datos.vence_en.unwrap_or(vence_calc)),
                    proximo_pago: Some(datos.proximo_pago.unwrap_or(proximo_calc)),
                    es_sucursal: datos.es_sucursal,
                    matriz_id,
                    observaciones: datos.observaciones,
                },
            )
            .await
    }

    pub async fn cambiar_status(
        &self,
        cliente_id: i64,
        status: SuscripcionStatus,
    ) -> Result<(), AppError> {
        self.cliente_repo
            .get_suscripcion(&self.pool, cliente_id)
            .await?
            .ok_or(AppError::SuscripcionNotFound)?;

        self.cliente_repo.update_status(&self.pool, cliente_id, status).await?;

        tracing::info!(cliente_id, ?status, "status de suscripción cambiado");
        Ok(())
    }

    pub async fn listar(&self) -> Result<Vec<Cliente>, AppError> {
        self.cliente_repo.list_clientes(&self.pool).await
    }

    pub async fn detalle(&self, cliente_id: i64, hoy: NaiveDate) -> Result<ClienteDetalle, AppError> {
        let cliente = self
            .cliente_repo
            .get_cliente(&self.pool, cliente_id)
            .await?
            .ok_or(AppError::ClienteNotFound)?;

        let suscripcion = self.cliente_repo.get_suscripcion(&self.pool, cliente_id).await?;
        let status_pago =
            calcular_status_pago(suscripcion.as_ref().and_then(|s| s.proximo_pago), hoy);

        Ok(ClienteDetalle { cliente, suscripcion, status_pago })
    }
}
