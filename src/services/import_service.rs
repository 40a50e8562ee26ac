// src/services/import_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Acquire, PgPool};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::{ClienteRepository, ConciliacionRepository, PagoRepository},
    models::{
        clientes::{NuevaSuscripcion, NuevoCliente, SuscripcionStatus},
        pagos::NuevoPago,
    },
    services::{pago_service::parse_monto, vigencia::calcular_fechas_vigencia},
};

/// Columnas obligatorias de la carga masiva de clientes.
const COLUMNAS_CLIENTES: &[&str] = &[
    "NEGOCIO",
    "CONTACTO",
    "MAIL",
    "TELEFONO_PRINCIPAL",
    "PAIS",
    "STATUS",
    "SERVER",
    "PAQUETE",
    "VIGENCIA",
    "FECHA_INICIO_SUSCRIPCION",
];

/// Columnas obligatorias del estado de cuenta bancario.
const COLUMNAS_TRANSACCIONES: &[&str] = &["FECHA", "CONCEPTO", "EGRESO", "INGRESO", "TOTAL"];

/// Resultado de una carga masiva: cuenta de éxitos más la lista de errores
/// por fila. Las filas buenas quedan confirmadas aunque otras fallen.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResult {
    pub total: usize,
    pub exitosos: usize,
    pub errores: Vec<String>,
}

/// Índice columna → posición, con encabezados normalizados a mayúsculas.
fn indice_columnas(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_uppercase(), i))
        .collect()
}

fn columnas_faltantes(indice: &HashMap<String, usize>, requeridas: &[&str]) -> Vec<String> {
    requeridas
        .iter()
        .filter(|c| !indice.contains_key(**c))
        .map(|c| c.to_string())
        .collect()
}

/// Celda limpia: recortada, y vacía/"NAN" cuenta como ausente.
fn celda<'r>(record: &'r csv::StringRecord, indice: &HashMap<String, usize>, col: &str) -> Option<&'r str> {
    let valor = record.get(*indice.get(col)?)?.trim();
    if valor.is_empty() || valor.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(valor)
    }
}

/// Fechas como llegan de los bancos y de las hojas de cálculo:
/// ISO, dd-mm-aaaa o dd/mm/aaaa.
fn parse_fecha_flexible(s: &str) -> Option<NaiveDate> {
    for formato in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(fecha) = NaiveDate::parse_from_str(s, formato) {
            return Some(fecha);
        }
    }
    None
}

fn parse_status(s: &str) -> Option<SuscripcionStatus> {
    match s.trim().to_uppercase().as_str() {
        "ACTIVO" => Some(SuscripcionStatus::Activo),
        "SUSPENDIDO" => Some(SuscripcionStatus::Suspendido),
        "ELIMINADO" => Some(SuscripcionStatus::Eliminado),
        "EN_PRUEBA" | "EN PRUEBA" | "DEMO" => Some(SuscripcionStatus::EnPrueba),
        _ => None,
    }
}

/// Fila de cliente ya parseada y validada, lista para insertarse.
struct FilaCliente {
    cliente: NuevoCliente,
    id_gumi: Option<String>,
    status: SuscripcionStatus,
    server: String,
    fecha_inicio: NaiveDate,
    paquete: String,
    vigencia: String,
    fecha_ultimo_pago: Option<NaiveDate>,
    monto_pago: Decimal,
    moneda_pago: String,
}

fn parsear_fila_cliente(
    record: &csv::StringRecord,
    indice: &HashMap<String, usize>,
) -> Result<FilaCliente, String> {
    let requerida = |col: &str| -> Result<String, String> {
        celda(record, indice, col)
            .map(str::to_string)
            .ok_or_else(|| format!("{col} es obligatoria y no puede estar vacía"))
    };

    let negocio = requerida("NEGOCIO")?;
    let contacto = requerida("CONTACTO")?;
    let mail = requerida("MAIL")?;
    let telefono = requerida("TELEFONO_PRINCIPAL")?;
    let pais = requerida("PAIS")?.to_uppercase();
    let status_str = requerida("STATUS")?.to_uppercase();
    let server = requerida("SERVER")?;
    let paquete = requerida("PAQUETE")?;
    let vigencia = requerida("VIGENCIA")?.to_uppercase();

    let fecha_inicio_str = requerida("FECHA_INICIO_SUSCRIPCION")?;
    let fecha_inicio = parse_fecha_flexible(&fecha_inicio_str)
        .ok_or_else(|| format!("FECHA_INICIO_SUSCRIPCION inválida: '{fecha_inicio_str}'"))?;

    let status =
        parse_status(&status_str).ok_or_else(|| format!("STATUS desconocido: '{status_str}'"))?;

    // Un cliente ACTIVO entra con su último pago; sin él no hay vigencia.
    let fecha_ultimo_pago = match status {
        SuscripcionStatus::Activo => {
            let fecha_str = celda(record, indice, "FECHA_ULTIMO_PAGO")
                .ok_or("Falta FECHA_ULTIMO_PAGO para cliente ACTIVO")?;
            Some(
                parse_fecha_flexible(fecha_str)
                    .ok_or_else(|| format!("FECHA_ULTIMO_PAGO inválida: '{fecha_str}'"))?,
            )
        }
        _ => None,
    };

    let monto_pago = celda(record, indice, "MONTO_PAGO").map(parse_monto).unwrap_or(Decimal::ZERO);
    let moneda_pago = match celda(record, indice, "MONEDA") {
        Some(m) if ["MXN", "COP", "USD"].contains(&m.to_uppercase().as_str()) => m.to_uppercase(),
        _ => "MXN".to_string(),
    };

    let opcional = |col: &str| celda(record, indice, col).map(str::to_string);

    let razon_social = opcional("RAZON_SOCIAL");
    let rfc = opcional("RFC_NIT");
    let requiere_factura = razon_social.is_some() && rfc.is_some();

    Ok(FilaCliente {
        cliente: NuevoCliente {
            negocio,
            nombre_contacto: contacto,
            mail,
            telefono,
            telefono_secundario_1: opcional("TELEFONO_SECUNDARIO"),
            telefono_secundario_2: opcional("TELEFONO_TERCIARIO"),
            pais,
            localidad: opcional("LOCALIDAD"),
            status_cliente: status_str,
            requiere_factura,
            razon_social,
            rfc,
            codigo_postal: opcional("CODIGO_POSTAL"),
            regimen_fiscal: opcional("REGIMEN_FISCAL"),
            uso_cfdi: opcional("USO_CFDI"),
            mail_facturas: opcional("MAIL_FACTURAS"),
        },
        id_gumi: opcional("ID_GUMI"),
        status,
        server,
        fecha_inicio,
        paquete,
        vigencia,
        fecha_ultimo_pago,
        monto_pago,
        moneda_pago,
    })
}

#[derive(Clone)]
pub struct ImportService {
    cliente_repo: ClienteRepository,
    pago_repo: PagoRepository,
    conciliacion_repo: ConciliacionRepository,
    pool: PgPool,
}

impl ImportService {
    pub fn new(
        cliente_repo: ClienteRepository,
        pago_repo: PagoRepository,
        conciliacion_repo: ConciliacionRepository,
        pool: PgPool,
    ) -> Self {
        Self { cliente_repo, pago_repo, conciliacion_repo, pool }
    }

    /// Carga masiva de clientes. Cada fila corre bajo su propio savepoint:
    /// una fila mala se revierte y se reporta con su número, las demás
    /// quedan confirmadas al final.
    pub async fn importar_clientes(
        &self,
        csv_bytes: &[u8],
    ) -> Result<ImportResult, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_bytes);

        let indice = indice_columnas(
            reader
                .headers()
                .map_err(|e| AppError::BadRequest(format!("CSV ilegible: {e}")))?,
        );
        let faltantes = columnas_faltantes(&indice, COLUMNAS_CLIENTES);
        if !faltantes.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Faltan columnas requeridas en el CSV: {}",
                faltantes.join(", ")
            )));
        }

        let registros: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .map_err(|e| AppError::BadRequest(format!("CSV ilegible: {e}")))?;

        let mut exitosos = 0usize;
        let mut errores = Vec::new();

        let mut tx = self.pool.begin().await?;

        for (i, record) in registros.iter().enumerate() {
            // La fila 1 es el encabezado.
            let num_fila = i + 2;

            let fila = match parsear_fila_cliente(record, &indice) {
                Ok(fila) => fila,
                Err(e) => {
                    errores.push(format!("Fila {num_fila}: {e}"));
                    continue;
                }
            };

            let mut sp = tx.begin().await?;
            match self.insertar_fila_cliente(&mut sp, fila).await {
                Ok(()) => {
                    sp.commit().await?;
                    exitosos += 1;
                }
                Err(e) => {
                    sp.rollback().await?;
                    tracing::warn!(num_fila, error = %e, "fila de cliente rechazada");
                    errores.push(format!("Fila {num_fila}: {e}"));
                }
            }
        }

        tx.commit().await?;

        tracing::info!(total = registros.len(), exitosos, errores = errores.len(), "carga masiva de clientes");
        Ok(ImportResult { total: registros.len(), exitosos, errores })
    }

    async fn insertar_fila_cliente(
        &self,
        sp: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        fila: FilaCliente,
    ) -> Result<(), AppError> {
        let cliente = self.cliente_repo.create_cliente(&mut **sp, &fila.cliente).await?;

        let (vence_en, proximo_pago) = calcular_fechas_vigencia(fila.fecha_inicio, &fila.vigencia);

        self.cliente_repo
            .upsert_suscripcion(
                &mut **sp,
                &NuevaSuscripcion {
                    cliente_id: cliente.id,
                    id_gumi: fila.id_gumi,
                    status: fila.status,
                    server: fila.server,
                    fecha_inicio: fila.fecha_inicio,
                    paquete: fila.paquete.clone(),
                    vigencia: fila.vigencia.clone(),
                    vence_en: Some(vence_en),
                    proximo_pago: Some(proximo_pago),
                    es_sucursal: false,
                    matriz_id: None,
                    observaciones: None,
                },
            )
            .await?;

        if let Some(fecha_pago) = fila.fecha_ultimo_pago {
            let bank_transaction_id = self.pago_repo.allocate_manual_id(&mut *sp).await?;

            self.pago_repo
                .insert_pago(
                    &mut **sp,
                    &NuevoPago {
                        cliente_id: cliente.id,
                        nombre: cliente.nombre_contacto.clone(),
                        correo: cliente.mail.clone(),
                        monto: fila.monto_pago,
                        fecha_pago,
                        metodo_pago: Some("Carga Masiva".to_string()),
                        otro_metodo_pago: None,
                        factura_pago: false,
                        numero_factura: None,
                        paquete: Some(fila.paquete),
                        vigencia: Some(fila.vigencia),
                        motivo_descuento: None,
                        moneda: Some(fila.moneda_pago),
                        paquete_precio_id: None,
                        bank_transaction_id,
                    },
                )
                .await?;

            self.cliente_repo
                .update_ultimo_pago(
                    &mut **sp,
                    cliente.id,
                    Some(fecha_pago),
                    Some("Carga Masiva"),
                    false,
                    None,
                )
                .await?;
        }

        Ok(())
    }

    /// Importa un estado de cuenta bancario. Las filas sin movimiento
    /// (egreso, ingreso y total en cero) se descartan en silencio.
    pub async fn importar_transacciones(
        &self,
        csv_bytes: &[u8],
    ) -> Result<ImportResult, AppError> {
        // Los bancos mexicanos exportan en latin1 con alegría.
        let texto = String::from_utf8_lossy(csv_bytes);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(texto.as_bytes());

        let indice = indice_columnas(
            reader
                .headers()
                .map_err(|e| AppError::BadRequest(format!("CSV ilegible: {e}")))?,
        );
        let faltantes = columnas_faltantes(&indice, COLUMNAS_TRANSACCIONES);
        if !faltantes.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Faltan columnas requeridas: {}. Debe tener: {}",
                faltantes.join(", "),
                COLUMNAS_TRANSACCIONES.join(", ")
            )));
        }

        let registros: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .map_err(|e| AppError::BadRequest(format!("CSV ilegible: {e}")))?;

        let mut exitosos = 0usize;
        let mut errores = Vec::new();

        let mut tx = self.pool.begin().await?;

        for (i, record) in registros.iter().enumerate() {
            let num_fila = i + 2;

            let fecha_str = match celda(record, &indice, "FECHA") {
                Some(f) => f,
                None => {
                    errores.push(format!("Fila {num_fila}: FECHA vacía"));
                    continue;
                }
            };
            let fecha = match parse_fecha_flexible(fecha_str) {
                Some(f) => f,
                None => {
                    errores.push(format!("Fila {num_fila}: FECHA inválida: '{fecha_str}'"));
                    continue;
                }
            };

            let concepto = celda(record, &indice, "CONCEPTO").unwrap_or("");
            let egreso = celda(record, &indice, "EGRESO").map(parse_monto).unwrap_or(Decimal::ZERO);
            let ingreso = celda(record, &indice, "INGRESO").map(parse_monto).unwrap_or(Decimal::ZERO);
            let total = celda(record, &indice, "TOTAL").map(parse_monto).unwrap_or(Decimal::ZERO);

            if egreso.is_zero() && ingreso.is_zero() && total.is_zero() {
                continue;
            }

            let mut sp = tx.begin().await?;
            let resultado = self
                .conciliacion_repo
                .insert_transaccion(&mut *sp, fecha, concepto, egreso, ingreso, total)
                .await;
            match resultado {
                Ok(_) => {
                    sp.commit().await?;
                    exitosos += 1;
                }
                Err(e) => {
                    sp.rollback().await?;
                    tracing::warn!(num_fila, error = %e, "fila de transacción rechazada");
                    errores.push(format!("Fila {num_fila}: {e}"));
                }
            }
        }

        tx.commit().await?;

        tracing::info!(total = registros.len(), exitosos, errores = errores.len(), "importación de estado de cuenta");
        Ok(ImportResult { total: registros.len(), exitosos, errores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(a: i32, m: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(a, m, dia).unwrap()
    }

    #[test]
    fn fechas_en_los_tres_formatos() {
        assert_eq!(parse_fecha_flexible("2025-03-01"), Some(d(2025, 3, 1)));
        assert_eq!(parse_fecha_flexible("01-03-2025"), Some(d(2025, 3, 1)));
        assert_eq!(parse_fecha_flexible("01/03/2025"), Some(d(2025, 3, 1)));
        assert_eq!(parse_fecha_flexible("marzo 1"), None);
    }

    #[test]
    fn status_reconocidos() {
        assert_eq!(parse_status("activo"), Some(SuscripcionStatus::Activo));
        assert_eq!(parse_status(" SUSPENDIDO "), Some(SuscripcionStatus::Suspendido));
        assert_eq!(parse_status("DEMO"), Some(SuscripcionStatus::EnPrueba));
        assert_eq!(parse_status("VIP"), None);
    }

    #[test]
    fn detecta_columnas_faltantes() {
        let headers = csv::StringRecord::from(vec!["fecha", "CONCEPTO", "EGRESO"]);
        let indice = indice_columnas(&headers);

        let faltantes = columnas_faltantes(&indice, COLUMNAS_TRANSACCIONES);
        assert_eq!(faltantes, vec!["INGRESO".to_string(), "TOTAL".to_string()]);
    }

    #[test]
    fn celda_trata_nan_como_vacio() {
        let headers = csv::StringRecord::from(vec!["NEGOCIO", "RFC_NIT"]);
        let indice = indice_columnas(&headers);
        let record = csv::StringRecord::from(vec!["Tacos Paco", "NaN"]);

        assert_eq!(celda(&record, &indice, "NEGOCIO"), Some("Tacos Paco"));
        assert_eq!(celda(&record, &indice, "RFC_NIT"), None);
        assert_eq!(celda(&record, &indice, "MONEDA"), None);
    }

    #[test]
    fn fila_activa_sin_ultimo_pago_es_error() {
        let headers = csv::StringRecord::from(vec![
            "NEGOCIO",
            "CONTACTO",
            "MAIL",
            "TELEFONO_PRINCIPAL",
            "PAIS",
            "STATUS",
            "SERVER",
            "PAQUETE",
            "VIGENCIA",
            "FECHA_INICIO_SUSCRIPCION",
        ]);
        let indice = indice_columnas(&headers);
        let record = csv::StringRecord::from(vec![
            "Tacos Paco",
            "Paco Pérez",
            "paco@tacos.mx",
            "5511223344",
            "MÉXICO",
            "ACTIVO",
            "server-mx-01",
            "Iguana",
            "MENSUAL",
            "2025-01-01",
        ]);

        let err = parsear_fila_cliente(&record, &indice).err().unwrap();
        assert!(err.contains("FECHA_ULTIMO_PAGO"));
    }

    #[test]
    fn fila_suspendida_no_exige_ultimo_pago() {
        let headers = csv::StringRecord::from(vec![
            "NEGOCIO",
            "CONTACTO",
            "MAIL",
            "TELEFONO_PRINCIPAL",
            "PAIS",
            "STATUS",
            "SERVER",
            "PAQUETE",
            "VIGENCIA",
            "FECHA_INICIO_SUSCRIPCION",
        ]);
        let indice = indice_columnas(&headers);
        let record = csv::StringRecord::from(vec![
            "Tacos Paco",
            "Paco Pérez",
            "paco@tacos.mx",
            "5511223344",
            "méxico",
            "SUSPENDIDO",
            "server-mx-01",
            "Iguana",
            "mensual",
            "2025-01-01",
        ]);

        let fila = parsear_fila_cliente(&record, &indice).unwrap();
        assert_eq!(fila.status, SuscripcionStatus::Suspendido);
        assert_eq!(fila.fecha_ultimo_pago, None);
        assert_eq!(fila.vigencia, "MENSUAL");
        assert_eq!(fila.cliente.pais, "MÉXICO");
        assert!(!fila.cliente.requiere_factura);
    }
}
