// src/services/vigencia.rs
//
// Matemática de calendario y cálculo de vigencias. Todo es puro y
// determinista: sin acceso a base de datos ni a la hora del sistema.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

/// Último día calendario del mes de `d`.
pub fn ultimo_dia_mes(d: NaiveDate) -> NaiveDate {
    fin_de_mes(d.year(), d.month())
}

fn fin_de_mes(anio: i32, mes: u32) -> NaiveDate {
    let (sig_anio, sig_mes) = if mes == 12 { (anio + 1, 1) } else { (anio, mes + 1) };
    NaiveDate::from_ymd_opt(sig_anio, sig_mes, 1)
        .and_then(|primero| primero.pred_opt())
        // Inalcanzable con fechas reales; mantiene la función total.
        .unwrap_or(NaiveDate::MIN)
}

/// Meses que cubre un código de vigencia. Un código desconocido vale
/// 1 mes: es el fallback documentado, no un error.
fn meses_de_vigencia(vig: &str) -> u32 {
    match vig {
        "MENSUAL" => 1,
        "TRIMESTRAL" => 3,
        "SEMESTRAL" => 6,
        "ANUAL" => 12,
        otro => {
            tracing::debug!(vigencia = otro, "vigencia no reconocida, se asume MENSUAL");
            1
        }
    }
}

/// Calcula `(vence_en, proximo_pago)` respetando las dos reglas de negocio:
///
/// 1. DEMO: 15 días naturales exactos, pago al día siguiente. Si el código
///    contiene "DEMO" (sin importar mayúsculas) esta regla tiene prioridad
///    absoluta.
/// 2. Periodos mensuales: alineados a FIN DE MES calendario. El mes objetivo
///    es `fecha_inicio + (duración − 1)` meses y el vencimiento cae en su
///    último día, de modo que las renovaciones convergen a fin de mes sin
///    importar el día del primer pago.
pub fn calcular_fechas_vigencia(fecha_inicio: NaiveDate, vigencia: &str) -> (NaiveDate, NaiveDate) {
    let vig = vigencia.trim().to_uppercase();

    // --- CASO 1: DEMO (15 días naturales) ---
    if vig.contains("DEMO") {
        let vence_en = fecha_inicio + Days::new(15);
        let proximo_pago = vence_en + Days::new(1);
        return (vence_en, proximo_pago);
    }

    // --- CASO 2: periodos alineados a fin de mes ---
    let duracion = meses_de_vigencia(&vig);

    // Mes inicio + (duración − 1), en aritmética de meses absolutos.
    let meses0 = fecha_inicio.year() * 12 + fecha_inicio.month0() as i32 + duracion as i32 - 1;
    let (anio_objetivo, mes_objetivo) = (meses0.div_euclid(12), meses0.rem_euclid(12) as u32 + 1);

    let vence_en = fin_de_mes(anio_objetivo, mes_objetivo);
    let proximo_pago = vence_en + Days::new(1);

    (vence_en, proximo_pago)
}

/// Estado de cobro de una suscripción frente a `hoy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusPago {
    Vigente,
    Vencida,
    SinPago,
}

/// Indica si la suscripción está VIGENTE, VENCIDA o SIN PAGO.
pub fn calcular_status_pago(proximo_pago: Option<NaiveDate>, hoy: NaiveDate) -> StatusPago {
    match proximo_pago {
        None => StatusPago::SinPago,
        // Vence hoy o después
        Some(p) if p >= hoy => StatusPago::Vigente,
        Some(_) => StatusPago::Vencida,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, dia).unwrap()
    }

    #[test]
    fn ultimo_dia_de_cada_mes() {
        assert_eq!(ultimo_dia_mes(d(2025, 1, 10)), d(2025, 1, 31));
        assert_eq!(ultimo_dia_mes(d(2025, 2, 1)), d(2025, 2, 28));
        assert_eq!(ultimo_dia_mes(d(2024, 2, 15)), d(2024, 2, 29)); // bisiesto
        assert_eq!(ultimo_dia_mes(d(2025, 4, 30)), d(2025, 4, 30));
        assert_eq!(ultimo_dia_mes(d(2025, 12, 5)), d(2025, 12, 31));
    }

    #[test]
    fn demo_son_15_dias_exactos() {
        let (vence, proximo) = calcular_fechas_vigencia(d(2025, 1, 10), "DEMO");
        assert_eq!(vence, d(2025, 1, 25));
        assert_eq!(proximo, d(2025, 1, 26));

        // La regla no alinea a fin de mes, sin importar el día de inicio.
        let (vence, proximo) = calcular_fechas_vigencia(d(2025, 1, 31), "demo");
        assert_eq!(vence, d(2025, 2, 15));
        assert_eq!(proximo, d(2025, 2, 16));
    }

    #[test]
    fn demo_tiene_prioridad_sobre_otros_codigos() {
        // Aunque mencione otro periodo, "DEMO" manda.
        let (vence, _) = calcular_fechas_vigencia(d(2025, 3, 1), "DEMO MENSUAL");
        assert_eq!(vence, d(2025, 3, 16));
    }

    #[test]
    fn mensual_alinea_a_fin_del_mismo_mes() {
        let (vence, proximo) = calcular_fechas_vigencia(d(2025, 1, 10), "MENSUAL");
        assert_eq!(vence, d(2025, 1, 31));
        assert_eq!(proximo, d(2025, 2, 1));
    }

    #[test]
    fn trimestral_y_semestral_y_anual() {
        let (vence, _) = calcular_fechas_vigencia(d(2025, 1, 10), "TRIMESTRAL");
        assert_eq!(vence, d(2025, 3, 31));

        let (vence, _) = calcular_fechas_vigencia(d(2025, 1, 10), "SEMESTRAL");
        assert_eq!(vence, d(2025, 6, 30));

        let (vence, proximo) = calcular_fechas_vigencia(d(2025, 2, 15), "ANUAL");
        assert_eq!(vence, d(2026, 1, 31));
        assert_eq!(proximo, d(2026, 2, 1));
    }

    #[test]
    fn anual_cruza_el_fin_de_anio() {
        let (vence, proximo) = calcular_fechas_vigencia(d(2025, 7, 20), "SEMESTRAL");
        assert_eq!(vence, d(2025, 12, 31));
        assert_eq!(proximo, d(2026, 1, 1));
    }

    #[test]
    fn codigo_desconocido_cae_en_mensual() {
        let (vence, _) = calcular_fechas_vigencia(d(2025, 5, 3), "QUINCENAL");
        assert_eq!(vence, d(2025, 5, 31));
    }

    #[test]
    fn vencimientos_no_demo_caen_en_fin_de_mes() {
        // Propiedad: para todo código no-DEMO el vencimiento es fin de mes
        // y el próximo pago es el día siguiente.
        for codigo in ["MENSUAL", "TRIMESTRAL", "SEMESTRAL", "ANUAL", "OTRO"] {
            for dia in [1, 5, 15, 28] {
                let inicio = d(2025, 1, dia);
                let (vence, proximo) = calcular_fechas_vigencia(inicio, codigo);
                assert_eq!(vence, ultimo_dia_mes(vence), "codigo={codigo} dia={dia}");
                assert_eq!(proximo, vence + Days::new(1));
            }
        }
    }

    #[test]
    fn status_de_pago() {
        let hoy = d(2025, 6, 15);
        assert_eq!(calcular_status_pago(None, hoy), StatusPago::SinPago);
        assert_eq!(calcular_status_pago(Some(d(2025, 6, 15)), hoy), StatusPago::Vigente);
        assert_eq!(calcular_status_pago(Some(d(2025, 7, 1)), hoy), StatusPago::Vigente);
        assert_eq!(calcular_status_pago(Some(d(2025, 6, 14)), hoy), StatusPago::Vencida);
    }
}
