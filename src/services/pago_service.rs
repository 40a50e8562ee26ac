// src/services/pago_service.rs

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ClienteRepository, PagoRepository, PaqueteRepository},
    models::pagos::{NuevoPago, Pago},
    services::{
        suscripcion_service::{SuscripcionService, inicio_periodo, status_por_vencimiento},
        vigencia::calcular_fechas_vigencia,
    },
};

/// Acepta montos tipo "MXN 1,234.50" o "$1,234" y regresa un Decimal
/// seguro (cero si no hay nada parseable).
pub fn parse_monto(m: &str) -> Decimal {
    // Deja solo dígitos, puntos y comas
    let s: String = m
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    // Si usa coma como decimal (y sin punto), normaliza a punto;
    // si no, las comas son separadores de miles.
    let s = if s.matches(',').count() == 1 && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };

    Decimal::from_str(&s).unwrap_or(Decimal::ZERO)
}

/// Datos de entrada para registrar un pago (ya validados por el handler).
#[derive(Debug, Clone)]
pub struct RegistrarPago {
    pub cliente_id: i64,
    pub fecha_pago: NaiveDate,
    pub monto: Decimal,
    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
    pub motivo_descuento: Option<String>,
    pub paquete_precio_id: Option<i64>,
    /// Solo viene informado cuando el pago nace de una conciliación.
    pub bank_transaction_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct EditarPago {
    pub fecha_pago: Option<NaiveDate>,
    pub monto: Decimal,
    pub metodo_pago: Option<String>,
    pub otro_metodo_pago: Option<String>,
    pub factura_pago: bool,
    pub numero_factura: Option<String>,
    pub motivo_descuento: Option<String>,
    pub paquete_precio_id: Option<i64>,
}

#[derive(Clone)]
pub struct PagoService {
    pago_repo: PagoRepository,
    cliente_repo: ClienteRepository,
    paquete_repo: PaqueteRepository,
    suscripcion_service: SuscripcionService,
    pool: PgPool,
}

impl PagoService {
    pub fn new(
        pago_repo: PagoRepository,
        cliente_repo: ClienteRepository,
        paquete_repo: PaqueteRepository,
        suscripcion_service: SuscripcionService,
        pool: PgPool,
    ) -> Self {
        Self { pago_repo, cliente_repo, paquete_repo, suscripcion_service, pool }
    }

    /// Asigna un id sintético de pago manual fuera del alta (expuesto para
    /// herramientas administrativas). Negativo y estrictamente decreciente.
    pub async fn allocate_manual_payment_id(&self) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;
        let id = self.pago_repo.allocate_manual_id(&mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Registra un pago (manual o de conciliación) y aplica la
    /// actualización incremental de la suscripción. Todo o nada: el pago,
    /// los campos de conveniencia del cliente y la vigencia se confirman
    /// juntos.
    pub async fn registrar_pago(&self, datos: RegistrarPago, hoy: NaiveDate) -> Result<Pago, AppError> {
        let mut tx = self.pool.begin().await?;

        let cliente = self
            .cliente_repo
            .get_cliente(&mut *tx, datos.cliente_id)
            .await?
            .ok_or(AppError::ClienteNotFound)?;

        // Pago manual: id sintético negativo bajo el lock de asignación.
        let bank_transaction_id = match datos.bank_transaction_id {
            Some(id) => id,
            None => self.pago_repo.allocate_manual_id(&mut tx).await?,
        };

        let suscripcion = self.cliente_repo.get_suscripcion(&mut *tx, datos.cliente_id).await?;

        // Snapshot del paquete: del catálogo si se eligió uno; si no, se
        // arrastra el plan vigente de la suscripción (sin moneda).
        let (paquete, vigencia, moneda) = match datos.paquete_precio_id {
            Some(pp_id) => {
                let pp = self
                    .paquete_repo
                    .get(&mut *tx, pp_id)
                    .await?
                    .ok_or(AppError::PaqueteNotFound)?;
                (Some(pp.paquete), Some(pp.vigencia), Some(pp.moneda))
            }
            None => match &suscripcion {
                Some(sus) => (Some(sus.paquete.clone()), Some(sus.vigencia.clone()), None),
                None => (None, None, None),
            },
        };

        let pago = self
            .pago_repo
            .insert_pago(
                &mut *tx,
                &NuevoPago {
                    cliente_id: cliente.id,
                    nombre: cliente.nombre_contacto.clone(),
                    correo: cliente.mail.clone(),
                    monto: datos.monto,
                    fecha_pago: datos.fecha_pago,
                    metodo_pago: datos.metodo_pago.clone(),
                    otro_metodo_pago: datos.otro_metodo_pago.clone(),
                    factura_pago: datos.factura_pago,
                    numero_factura: datos.numero_factura.clone(),
                    paquete: paquete.clone(),
                    vigencia: vigencia.clone(),
                    motivo_descuento: datos.motivo_descuento.clone(),
                    moneda,
                    paquete_precio_id: datos.paquete_precio_id,
                    bank_transaction_id,
                },
            )
            .await?;

        // Conveniencia de "último pago" en el cliente.
        self.cliente_repo
            .update_ultimo_pago(
                &mut *tx,
                cliente.id,
                Some(datos.fecha_pago),
                datos.metodo_pago.as_deref(),
                datos.factura_pago,
                datos.numero_factura.as_deref(),
            )
            .await?;

        // Actualización incremental: misma regla de inicio de periodo que
        // el replay completo, aplicada solo al pago nuevo.
        if let (Some(sus), Some(vig)) = (&suscripcion, &vigencia) {
            let inicio = inicio_periodo(sus.vence_en, datos.fecha_pago);
            let (vence_en, proximo_pago) = calcular_fechas_vigencia(inicio, vig);
            let status = status_por_vencimiento(Some(vence_en), hoy);

            self.cliente_repo
                .update_vigencia(
                    &mut *tx,
                    cliente.id,
                    Some(vence_en),
                    Some(proximo_pago),
                    status,
                    paquete.as_deref(),
                    Some(vig),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            pago_id = pago.id,
            cliente_id = cliente.id,
            bank_transaction_id,
            "pago registrado"
        );
        Ok(pago)
    }

    /// Cancelación lógica. Es el único camino que re-deriva el historial
    /// completo: un pago cancelado a mitad de la historia puede mover
    /// todos los límites de periodo posteriores.
    pub async fn cancelar_pago(&self, pago_id: i64, hoy: NaiveDate) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let pago = self
            .pago_repo
            .get_pago(&mut *tx, pago_id)
            .await?
            .ok_or(AppError::PagoNotFound)?;

        self.pago_repo.cancelar(&mut *tx, pago_id).await?;

        // El replay corre sobre la misma transacción: ya ve el pago como
        // cancelado, y si algo falla se revierte también la cancelación.
        self.suscripcion_service
            .recalcular_en_conexion(&mut tx, pago.cliente_id, hoy)
            .await?;

        tx.commit().await?;

        tracing::info!(pago_id, cliente_id = pago.cliente_id, "pago cancelado y vigencia recalculada");
        Ok(())
    }

    /// Edición cosmética de un registro histórico. Por política NO
    /// recalcula la suscripción: solo la cancelación y el alta de pagos
    /// mutan el estado derivado.
    pub async fn editar_pago(&self, pago_id: i64, datos: EditarPago) -> Result<Pago, AppError> {
        let mut tx = self.pool.begin().await?;

        let actual = self
            .pago_repo
            .get_pago(&mut *tx, pago_id)
            .await?
            .ok_or(AppError::PagoNotFound)?;

        // Si cambió el paquete, se re-snapshotean nombre y vigencia.
        let (paquete, vigencia) = match datos.paquete_precio_id {
            Some(pp_id) => match self.paquete_repo.get(&mut *tx, pp_id).await? {
                Some(pp) => (Some(pp.paquete), Some(pp.vigencia)),
                None => (None, None),
            },
            None => (None, None),
        };

        let pago = self
            .pago_repo
            .update_pago(
                &mut *tx,
                pago_id,
                datos.fecha_pago.unwrap_or(actual.fecha_pago),
                datos.monto,
                datos.metodo_pago.as_deref(),
                datos.otro_metodo_pago.as_deref(),
                datos.factura_pago,
                datos.numero_factura.as_deref(),
                datos.motivo_descuento.as_deref(),
                paquete.as_deref(),
                vigencia.as_deref(),
            )
            .await?;

        tx.commit().await?;
        Ok(pago)
    }

    /// Actualización inline del número de factura de un pago.
    pub async fn actualizar_factura(
        &self,
        pago_id: i64,
        numero_factura: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.pago_repo
            .get_pago(&mut *tx, pago_id)
            .await?
            .ok_or(AppError::PagoNotFound)?;
        self.pago_repo.update_numero_factura(&mut *tx, pago_id, numero_factura).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn pagos_de_cliente(&self, cliente_id: i64) -> Result<Vec<Pago>, AppError> {
        self.cliente_repo
            .get_cliente(&self.pool, cliente_id)
            .await?
            .ok_or(AppError::ClienteNotFound)?;

        self.pago_repo.list_pagos(&self.pool, cliente_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::parse_monto;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn monto_con_prefijo_de_moneda_y_miles() {
        assert_eq!(parse_monto("MXN 1,234.50"), dec("1234.50"));
        assert_eq!(parse_monto("$1,234"), dec("1234"));
    }

    #[test]
    fn coma_decimal_sin_punto() {
        assert_eq!(parse_monto("650,50"), dec("650.50"));
    }

    #[test]
    fn entrada_vacia_o_basura_es_cero() {
        assert_eq!(parse_monto(""), Decimal::ZERO);
        assert_eq!(parse_monto("n/a"), Decimal::ZERO);
    }

    #[test]
    fn numero_simple() {
        assert_eq!(parse_monto("830"), dec("830"));
        assert_eq!(parse_monto("17.5"), dec("17.5"));
    }
}
