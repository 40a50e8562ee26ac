// src/services/conciliacion_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ClienteRepository, ConciliacionRepository, PagoRepository, PaqueteRepository},
    models::{
        conciliacion::TransaccionListado,
        pagos::{NuevoPago, Pago},
    },
    services::suscripcion_service::SuscripcionService,
};

/// Datos para conciliar una transacción bancaria contra un cliente.
#[derive(Debug, Clone)]
pub struct ConciliarTransaccion {
    pub cliente_id: i64,
    pub paquete_precio_id: i64,
    pub fecha_pago: NaiveDate,
    pub monto: Decimal,
    pub numero_factura: Option<String>,
}

#[derive(Clone)]
pub struct ConciliacionService {
    conciliacion_repo: ConciliacionRepository,
    pago_repo: PagoRepository,
    cliente_repo: ClienteRepository,
    paquete_repo: PaqueteRepository,
    suscripcion_service: SuscripcionService,
    pool: PgPool,
}

impl ConciliacionService {
    pub fn new(
        conciliacion_repo: ConciliacionRepository,
        pago_repo: PagoRepository,
        cliente_repo: ClienteRepository,
        paquete_repo: PaqueteRepository,
        suscripcion_service: SuscripcionService,
        pool: PgPool,
    ) -> Self {
        Self {
            conciliacion_repo,
            pago_repo,
            cliente_repo,
            paquete_repo,
            suscripcion_service,
            pool,
        }
    }

    pub async fn listar(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<TransaccionListado>, AppError> {
        self.conciliacion_repo.listar(&self.pool, year, month).await
    }

    /// Concilia una transacción bancaria contra un cliente. Si la
    /// transacción ya tenía un Pago vinculado lo reescribe en su lugar
    /// (re-conciliación): el vínculo 1:1 nunca se duplica.
    ///
    /// Siempre corre el replay completo: una conciliación puede llegar
    /// fuera de orden cronológico respecto a los demás pagos del cliente,
    /// así que la actualización incremental no alcanza.
    pub async fn conciliar_transaccion(
        &self,
        transaccion_id: i64,
        datos: ConciliarTransaccion,
        hoy: NaiveDate,
    ) -> Result<Pago, AppError> {
        let mut tx = self.pool.begin().await?;

        self.conciliacion_repo
            .get_transaccion(&mut *tx, transaccion_id)
            .await?
            .ok_or(AppError::TransaccionNotFound)?;

        let cliente = self
            .cliente_repo
            .get_cliente(&mut *tx, datos.cliente_id)
            .await?
            .ok_or(AppError::ClienteNotFound)?;

        // Snapshot del catálogo actual (no histórico).
        let pp = self
            .paquete_repo
            .get(&mut *tx, datos.paquete_precio_id)
            .await?
            .ok_or(AppError::PaqueteNotFound)?;

        let anterior = self
            .pago_repo
            .find_por_bank_transaction(&mut *tx, transaccion_id)
            .await?;

        let pago = match &anterior {
            Some(previo) => {
                self.pago_repo
                    .update_conciliacion(
                        &mut *tx,
                        previo.id,
                        cliente.id,
                        &cliente.nombre_contacto,
                        &cliente.mail,
                        datos.monto,
                        datos.fecha_pago,
                        datos.numero_factura.as_deref(),
                        Some(&pp.paquete),
                        Some(&pp.vigencia),
                        Some(&pp.moneda),
                        Some(pp.id),
                    )
                    .await?
            }
            None => {
                self.pago_repo
                    .insert_pago(
                        &mut *tx,
                        &NuevoPago {
                            cliente_id: cliente.id,
                            nombre: cliente.nombre_contacto.clone(),
                            correo: cliente.mail.clone(),
                            monto: datos.monto,
                            fecha_pago: datos.fecha_pago,
                            metodo_pago: Some("Transferencia".to_string()),
                            otro_metodo_pago: None,
                            factura_pago: datos.numero_factura.is_some(),
                            numero_factura: datos.numero_factura.clone(),
                            paquete: Some(pp.paquete.clone()),
                            vigencia: Some(pp.vigencia.clone()),
                            motivo_descuento: None,
                            moneda: Some(pp.moneda.clone()),
                            paquete_precio_id: Some(pp.id),
                            bank_transaction_id: transaccion_id,
                        },
                    )
                    .await?
            }
        };

        // La transacción guarda negocio y factura para auditoría, aunque
        // el Pago cambie después.
        self.conciliacion_repo
            .marcar_conciliada(
                &mut *tx,
                transaccion_id,
                &cliente.negocio,
                datos.numero_factura.as_deref(),
            )
            .await?;

        self.suscripcion_service
            .recalcular_en_conexion(&mut tx, cliente.id, hoy)
            .await?;

        // Si la re-conciliación movió el pago a otro cliente, el anterior
        // también cambió de historial.
        if let Some(previo) = &anterior {
            if previo.cliente_id != cliente.id {
                self.suscripcion_service
                    .recalcular_en_conexion(&mut tx, previo.cliente_id, hoy)
                    .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            transaccion_id,
            pago_id = pago.id,
            cliente_id = cliente.id,
            "transacción conciliada"
        );
        Ok(pago)
    }

    /// Pre-conciliación de sucursal: un solo movimiento bancario cubre a
    /// varios negocios. La transacción queda etiquetada con la lista libre
    /// de negocios y la factura compartida; los pagos por cliente se
    /// capturan después, a mano.
    pub async fn preconciliar_sucursal(
        &self,
        transaccion_id: i64,
        negocios_nombres: &str,
        numero_factura: Option<&str>,
        hoy: NaiveDate,
    ) -> Result<(), AppError> {
        if negocios_nombres.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Se requiere la lista de negocios de la sucursal".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.conciliacion_repo
            .get_transaccion(&mut *tx, transaccion_id)
            .await?
            .ok_or(AppError::TransaccionNotFound)?;

        // Si había un Pago vinculado de una conciliación previa, se borra:
        // el movimiento deja de pertenecer a un solo cliente.
        if let Some(cliente_id) = self
            .pago_repo
            .delete_por_bank_transaction(&mut *tx, transaccion_id)
            .await?
        {
            self.suscripcion_service
                .recalcular_en_conexion(&mut tx, cliente_id, hoy)
                .await?;
        }

        self.conciliacion_repo
            .marcar_preconciliada(&mut *tx, transaccion_id, negocios_nombres, numero_factura)
            .await?;

        tx.commit().await?;

        tracing::info!(transaccion_id, "transacción pre-conciliada para sucursal");
        Ok(())
    }

    /// Elimina una transacción bancaria. El orden importa: primero cae el
    /// Pago vinculado, luego el replay del cliente ya lo ve ausente, y al
    /// final cae la transacción. Todo dentro de la misma transacción SQL.
    pub async fn eliminar_transaccion(
        &self,
        transaccion_id: i64,
        hoy: NaiveDate,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.conciliacion_repo
            .get_transaccion(&mut *tx, transaccion_id)
            .await?
            .ok_or(AppError::TransaccionNotFound)?;

        let cliente_afectado = self
            .pago_repo
            .delete_por_bank_transaction(&mut *tx, transaccion_id)
            .await?;

        if let Some(cliente_id) = cliente_afectado {
            self.suscripcion_service
                .recalcular_en_conexion(&mut tx, cliente_id, hoy)
                .await?;
        }

        self.conciliacion_repo.delete_transaccion(&mut *tx, transaccion_id).await?;

        tx.commit().await?;

        tracing::info!(
            transaccion_id,
            cliente_id = cliente_afectado,
            "transacción bancaria eliminada"
        );
        Ok(())
    }
}
