// src/services/reporting.rs
//
// Reglas de dinero compartidas: conversión a MXN para reportes y el
// precio final que se cotiza en el alta.

use rust_decimal::Decimal;

/// Tasas fijas de conversión a MXN. Vienen de la configuración
/// (TASA_USD_MXN / TASA_COP_MXN), no son constantes del módulo.
#[derive(Debug, Clone, Copy)]
pub struct TasasConversion {
    pub usd_mxn: Decimal,
    pub cop_mxn: Decimal,
}

impl Default for TasasConversion {
    fn default() -> Self {
        Self {
            usd_mxn: Decimal::new(18, 0),   // 18.0
            cop_mxn: Decimal::new(45, 4),   // 0.0045
        }
    }
}

impl TasasConversion {
    /// Unifica un monto a MXN. Moneda desconocida o ausente se trata como
    /// MXN: un reporte nunca debe fallar por una moneda mal capturada.
    pub fn convertir_a_mxn(&self, monto: Decimal, moneda: Option<&str>) -> Decimal {
        match moneda.map(|m| m.trim().to_uppercase()).as_deref() {
            Some("USD") => monto * self.usd_mxn,
            Some("COP") => monto * self.cop_mxn,
            _ => monto,
        }
    }
}

/// Precio que se cotiza en el alta: 20% de descuento para sucursales y
/// redondeo a la decena más cercana (siempre, con o sin descuento).
pub fn precio_cotizado(precio_lista: Decimal, es_sucursal: bool) -> Decimal {
    let diez = Decimal::new(10, 0);

    let precio = if es_sucursal {
        precio_lista * Decimal::new(8, 1) // 0.8
    } else {
        precio_lista
    };

    (precio / diez).round() * diez
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn mxn_pasa_sin_tocar() {
        let tasas = TasasConversion::default();
        assert_eq!(tasas.convertir_a_mxn(dec("650"), Some("MXN")), dec("650"));
        assert_eq!(tasas.convertir_a_mxn(dec("650"), None), dec("650"));
        assert_eq!(tasas.convertir_a_mxn(dec("650"), Some("GTQ")), dec("650"));
    }

    #[test]
    fn usd_y_cop_usan_las_tasas() {
        let tasas = TasasConversion::default();
        assert_eq!(tasas.convertir_a_mxn(dec("100"), Some("USD")), dec("1800"));
        assert_eq!(tasas.convertir_a_mxn(dec("100000"), Some("cop")), dec("450.0"));
    }

    #[test]
    fn tasas_inyectadas_distintas_del_default() {
        let tasas = TasasConversion { usd_mxn: dec("20"), cop_mxn: dec("0.005") };
        assert_eq!(tasas.convertir_a_mxn(dec("10"), Some("USD")), dec("200"));
    }

    #[test]
    fn precio_normal_redondeado_a_decena() {
        assert_eq!(precio_cotizado(dec("653"), false), dec("650"));
        assert_eq!(precio_cotizado(dec("657"), false), dec("660"));
    }

    #[test]
    fn precio_sucursal_con_descuento() {
        // 650 * 0.8 = 520, ya es múltiplo de diez.
        assert_eq!(precio_cotizado(dec("650"), true), dec("520"));
        // 830 * 0.8 = 664 → 660.
        assert_eq!(precio_cotizado(dec("830"), true), dec("660"));
    }
}
