// src/services/suscripcion_service.rs
//
// Motor de recálculo de vigencias. La regla canónica es una sola: el
// replay cronológico de pagos activos con alineación a fin de mes
// (`replay_pagos`). El camino incremental del alta de pago usa la misma
// regla de inicio de periodo (`inicio_periodo`) y por construcción produce
// el mismo resultado que re-ejecutar el replay completo.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::{ClienteRepository, PagoRepository},
    models::{clientes::SuscripcionStatus, pagos::Pago},
    services::vigencia::calcular_fechas_vigencia,
};

/// Proyección mínima de un pago para el replay. Los pagos cancelados ya
/// vienen filtrados por el repositorio.
#[derive(Debug, Clone)]
pub struct PagoReplay {
    pub fecha_pago: NaiveDate,
    pub paquete: Option<String>,
    pub vigencia: Option<String>,
}

impl From<&Pago> for PagoReplay {
    fn from(p: &Pago) -> Self {
        Self {
            fecha_pago: p.fecha_pago,
            paquete: p.paquete.clone(),
            vigencia: p.vigencia.clone(),
        }
    }
}

/// Estado derivado del historial completo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultadoReplay {
    pub vence_en: Option<NaiveDate>,
    pub proximo_pago: Option<NaiveDate>,
    pub ultimo_paquete: Option<String>,
    pub ultima_vigencia: Option<String>,
}

/// Regla de inicio de periodo (continuidad vs hueco):
/// - sin vigencia acumulada, el periodo arranca en la fecha del pago;
/// - pago posterior al vencimiento: hubo hueco, el periodo arranca fresco
///   en la fecha del pago (el tiempo no usado se pierde);
/// - pago antes o el mismo día del vencimiento: el periodo se apila sobre
///   el vencimiento acumulado (no se pierde ni se duplica tiempo).
pub fn inicio_periodo(vence_acumulado: Option<NaiveDate>, fecha_pago: NaiveDate) -> NaiveDate {
    match vence_acumulado {
        Some(vence) if fecha_pago <= vence => vence,
        _ => fecha_pago,
    }
}

/// Replay cronológico: reconstruye (vence_en, proximo_pago) desde cero a
/// partir de los pagos activos en orden ascendente. Devuelve `None` si la
/// lista está vacía (el llamador aplica el reset total).
pub fn replay_pagos(pagos: &[PagoReplay]) -> Option<ResultadoReplay> {
    if pagos.is_empty() {
        return None;
    }

    let mut acumulado: ResultadoReplay = ResultadoReplay {
        vence_en: None,
        proximo_pago: None,
        ultimo_paquete: None,
        ultima_vigencia: None,
    };

    for pago in pagos {
        // Un pago sin vigencia no aporta periodo: el acumulado se conserva
        // tal cual (no debería ocurrir, pero no debe tirar el replay).
        if let Some(vig) = &pago.vigencia {
            let inicio = inicio_periodo(acumulado.vence_en, pago.fecha_pago);
            let (vence, proximo) = calcular_fechas_vigencia(inicio, vig);
            acumulado.vence_en = Some(vence);
            acumulado.proximo_pago = Some(proximo);
        }

        // Datos informativos del último pago procesado.
        acumulado.ultimo_paquete = pago.paquete.clone();
        acumulado.ultima_vigencia = pago.vigencia.clone();
    }

    Some(acumulado)
}

/// Status derivado: activa mientras el vencimiento no haya pasado.
pub fn status_por_vencimiento(vence_en: Option<NaiveDate>, hoy: NaiveDate) -> SuscripcionStatus {
    match vence_en {
        Some(vence) if vence >= hoy => SuscripcionStatus::Activo,
        _ => SuscripcionStatus::Suspendido,
    }
}

#[derive(Clone)]
pub struct SuscripcionService {
    cliente_repo: ClienteRepository,
    pago_repo: PagoRepository,
    pool: PgPool,
}

impl SuscripcionService {
    pub fn new(cliente_repo: ClienteRepository, pago_repo: PagoRepository, pool: PgPool) -> Self {
        Self { cliente_repo, pago_repo, pool }
    }

    /// Reconstruye la vigencia del cliente desde su historial de pagos,
    /// en una transacción propia. Devuelve `false` si el cliente o su
    /// suscripción no existen.
    pub async fn recalcular(&self, cliente_id: i64, hoy: NaiveDate) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let resultado = self.recalcular_en_conexion(&mut tx, cliente_id, hoy).await?;
        tx.commit().await?;
        Ok(resultado)
    }

    /// Variante para llamadores que ya tienen una transacción abierta
    /// (cancelación de pago, conciliación, borrado de transacción): el
    /// recálculo ve los cambios no confirmados de esa misma transacción y
    /// se confirma o revierte junto con ellos.
    pub async fn recalcular_en_conexion(
        &self,
        conn: &mut PgConnection,
        cliente_id: i64,
        hoy: NaiveDate,
    ) -> Result<bool, AppError> {
        let suscripcion = self.cliente_repo.get_suscripcion(&mut *conn, cliente_id).await?;
        let cliente = self.cliente_repo.get_cliente(&mut *conn, cliente_id).await?;
        if suscripcion.is_none() || cliente.is_none() {
            return Ok(false);
        }

        let pagos = self.pago_repo.list_pagos_activos(&mut *conn, cliente_id).await?;
        let proyeccion: Vec<PagoReplay> = pagos.iter().map(PagoReplay::from).collect();

        match replay_pagos(&proyeccion) {
            None => {
                // Reset total: sin pagos activos el cliente vuelve a la
                // semántica de prueba.
                self.cliente_repo
                    .update_vigencia(
                        &mut *conn,
                        cliente_id,
                        None,
                        None,
                        SuscripcionStatus::EnPrueba,
                        None,
                        None,
                    )
                    .await?;
                self.cliente_repo.clear_fecha_pago(&mut *conn, cliente_id).await?;
            }
            Some(resultado) => {
                let status = status_por_vencimiento(resultado.vence_en, hoy);
                self.cliente_repo
                    .update_vigencia(
                        &mut *conn,
                        cliente_id,
                        resultado.vence_en,
                        resultado.proximo_pago,
                        status,
                        resultado.ultimo_paquete.as_deref(),
                        resultado.ultima_vigencia.as_deref(),
                    )
                    .await?;
            }
        }

        tracing::info!(cliente_id, "vigencia recalculada desde historial");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, dia).unwrap()
    }

    fn pago(fecha: NaiveDate, vigencia: &str) -> PagoReplay {
        PagoReplay {
            fecha_pago: fecha,
            paquete: Some("Iguana".to_string()),
            vigencia: Some(vigencia.to_string()),
        }
    }

    #[test]
    fn historial_vacio_pide_reset() {
        assert_eq!(replay_pagos(&[]), None);
    }

    #[test]
    fn un_solo_pago_mensual() {
        let r = replay_pagos(&[pago(d(2025, 1, 10), "MENSUAL")]).unwrap();
        assert_eq!(r.vence_en, Some(d(2025, 1, 31)));
        assert_eq!(r.proximo_pago, Some(d(2025, 2, 1)));
        assert_eq!(r.ultima_vigencia.as_deref(), Some("MENSUAL"));
    }

    #[test]
    fn pago_antes_del_vencimiento_se_apila() {
        // P2 llega antes de que venza P1: el periodo arranca en el
        // vencimiento acumulado, no en la fecha de P2.
        let r = replay_pagos(&[
            pago(d(2025, 1, 10), "MENSUAL"),
            pago(d(2025, 1, 20), "MENSUAL"),
        ])
        .unwrap();

        let (esperado, _) = calcular_fechas_vigencia(d(2025, 1, 31), "MENSUAL");
        assert_eq!(r.vence_en, Some(esperado));
    }

    #[test]
    fn pago_despues_del_vencimiento_arranca_fresco() {
        // Hueco: P1 venció el 31 de enero y P2 llega el 1 de marzo. El
        // nuevo periodo parte del 1 de marzo, no del 31 de enero.
        let r = replay_pagos(&[
            pago(d(2025, 1, 10), "MENSUAL"),
            pago(d(2025, 3, 1), "MENSUAL"),
        ])
        .unwrap();

        assert_eq!(r.vence_en, Some(d(2025, 3, 31)));
        assert_eq!(r.proximo_pago, Some(d(2025, 4, 1)));
    }

    #[test]
    fn pago_sin_vigencia_no_aporta_periodo() {
        let sin_vigencia = PagoReplay {
            fecha_pago: d(2025, 2, 5),
            paquete: None,
            vigencia: None,
        };
        let r = replay_pagos(&[pago(d(2025, 1, 10), "MENSUAL"), sin_vigencia]).unwrap();

        // El acumulado se conserva; los datos informativos sí son del
        // último pago.
        assert_eq!(r.vence_en, Some(d(2025, 1, 31)));
        assert_eq!(r.ultima_vigencia, None);
    }

    #[test]
    fn replay_es_idempotente() {
        let historial = vec![
            pago(d(2025, 1, 1), "MENSUAL"),
            pago(d(2025, 2, 1), "TRIMESTRAL"),
            pago(d(2025, 6, 10), "DEMO"),
        ];
        assert_eq!(replay_pagos(&historial), replay_pagos(&historial));
    }

    #[test]
    fn escenario_completo_mensual_luego_trimestral() {
        // Cliente con primer pago el 1 de enero: vence el 31, próximo el
        // 1 de febrero. Segundo pago TRIMESTRAL ese 1 de febrero: arranca
        // del propio pago (un día después del vencimiento) y cubre hasta
        // fin de abril.
        let r1 = replay_pagos(&[pago(d(2025, 1, 1), "MENSUAL")]).unwrap();
        assert_eq!(r1.vence_en, Some(d(2025, 1, 31)));
        assert_eq!(r1.proximo_pago, Some(d(2025, 2, 1)));

        let r2 = replay_pagos(&[
            pago(d(2025, 1, 1), "MENSUAL"),
            pago(d(2025, 2, 1), "TRIMESTRAL"),
        ])
        .unwrap();
        assert_eq!(r2.vence_en, Some(d(2025, 4, 30)));
        assert_eq!(r2.proximo_pago, Some(d(2025, 5, 1)));
        assert_eq!(r2.ultima_vigencia.as_deref(), Some("TRIMESTRAL"));
    }

    #[test]
    fn status_derivado_del_vencimiento() {
        let hoy = d(2025, 1, 15);
        assert_eq!(status_por_vencimiento(Some(d(2025, 1, 31)), hoy), SuscripcionStatus::Activo);
        assert_eq!(status_por_vencimiento(Some(d(2025, 1, 15)), hoy), SuscripcionStatus::Activo);
        assert_eq!(
            status_por_vencimiento(Some(d(2025, 1, 14)), hoy),
            SuscripcionStatus::Suspendido
        );
        assert_eq!(status_por_vencimiento(None, hoy), SuscripcionStatus::Suspendido);
    }

    #[test]
    fn incremental_equivale_al_replay_completo() {
        // El alta de un pago nuevo (cronológicamente último) aplica
        // `inicio_periodo` sobre el vencimiento vigente. Debe coincidir
        // con volver a correr el replay con el pago añadido.
        let historiales: Vec<Vec<PagoReplay>> = vec![
            vec![],
            vec![pago(d(2025, 1, 1), "MENSUAL")],
            vec![pago(d(2025, 1, 1), "MENSUAL"), pago(d(2025, 2, 1), "TRIMESTRAL")],
            vec![pago(d(2025, 3, 15), "DEMO")],
            vec![pago(d(2024, 11, 2), "SEMESTRAL")],
        ];
        let nuevos = [
            pago(d(2025, 5, 10), "MENSUAL"),
            pago(d(2025, 6, 1), "ANUAL"),
            pago(d(2025, 5, 2), "DEMO"),
            // Dentro de la vigencia acumulada del historial largo: apila.
            pago(d(2025, 4, 20), "MENSUAL"),
        ];

        for historial in &historiales {
            for nuevo in &nuevos {
                // Solo aplica cuando el nuevo pago es el último del
                // historial; los retro-datados van por replay completo.
                if historial.iter().any(|p| p.fecha_pago > nuevo.fecha_pago) {
                    continue;
                }

                let previo = replay_pagos(historial);
                let vence_previo = previo.as_ref().and_then(|r| r.vence_en);

                // Camino incremental
                let inicio = inicio_periodo(vence_previo, nuevo.fecha_pago);
                let (vence_inc, proximo_inc) =
                    calcular_fechas_vigencia(inicio, nuevo.vigencia.as_deref().unwrap());

                // Replay completo con el pago añadido
                let mut completo = historial.clone();
                completo.push(nuevo.clone());
                let r = replay_pagos(&completo).unwrap();

                assert_eq!(r.vence_en, Some(vence_inc));
                assert_eq!(r.proximo_pago, Some(proximo_inc));
            }
        }
    }
}
