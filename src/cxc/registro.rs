use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{DashboardError, DashboardResult, Tabla};

use super::overdue::{estimar_dias_overdue, MetodoOverdue};

pub const DEUDOR_SIN_NOMBRE: &str = "SIN NOMBRE";

/// Factura por cobrar con sus días de atraso ya derivados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroCxc {
    pub deudor: String,
    pub saldo_adeudado: f64,
    pub dias_overdue: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estatus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linea_negocio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendedor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factura: Option<String>,
}

impl RegistroCxc {
    pub fn new(deudor: impl Into<String>, saldo_adeudado: f64, dias_overdue: i64) -> Self {
        RegistroCxc {
            deudor: deudor.into(),
            saldo_adeudado,
            dias_overdue,
            estatus: None,
            linea_negocio: None,
            vendedor: None,
            factura: None,
        }
    }

    pub fn with_estatus(mut self, estatus: impl Into<String>) -> Self {
        self.estatus = Some(estatus.into());
        self
    }

    pub fn with_linea(mut self, linea: impl Into<String>) -> Self {
        self.linea_negocio = Some(linea.into());
        self
    }

    pub fn with_vendedor(mut self, vendedor: impl Into<String>) -> Self {
        self.vendedor = Some(vendedor.into());
        self
    }

    /// Un estatus que contiene "pagado" (sin importar mayúsculas) sale de
    /// todos los agregados de saldo pendiente.
    pub fn esta_pagado(&self) -> bool {
        self.estatus
            .as_deref()
            .map(|s| s.to_lowercase().contains("pagado"))
            .unwrap_or(false)
    }

    pub fn esta_vencido(&self) -> bool {
        self.dias_overdue > 0
    }
}

/// Registros de CxC más la forma en que se obtuvieron los días de atraso.
#[derive(Debug, Clone, Serialize)]
pub struct CarteraCxc {
    pub registros: Vec<RegistroCxc>,
    pub metodo_overdue: MetodoOverdue,
    pub fecha_corte: NaiveDate,
}

/// Etiquetas que las exportaciones usan en la primera palabra de una fila resumen.
const ETIQUETAS_TOTAL: &[&str] = &["TOTAL", "TOTALES", "SUBTOTAL"];

fn es_fila_total(deudor: Option<&str>) -> bool {
    let Some(deudor) = deudor else {
        return false;
    };
    let mayusculas = deudor.trim().to_uppercase();
    let mut palabras = mayusculas.split(|c: char| c.is_whitespace() || c == ':');
    match palabras.next() {
        // "Gran total" sí, "Gran Bretaña Importaciones" no
        Some("GRAN") => palabras.find(|p| !p.is_empty()) == Some("TOTAL"),
        Some(primera) => ETIQUETAS_TOTAL.contains(&primera),
        None => false,
    }
}

/// Construye los registros a partir de una tabla ya normalizada.
///
/// Requiere `saldo_adeudado`. Las filas completamente vacías y las filas de
/// totales que algunas exportaciones agregan al final se descartan.
pub fn construir_cartera(tabla: &Tabla, hoy: NaiveDate) -> DashboardResult<CarteraCxc> {
    let saldos = tabla.numeros("saldo_adeudado").ok_or_else(|| {
        DashboardError::ColumnaFaltante(
            "saldo_adeudado (saldo, saldo_usd, adeudo, …)".to_string(),
        )
    })?;

    let (metodo_overdue, dias) = estimar_dias_overdue(tabla, hoy);
    let deudores = tabla.textos("deudor");
    let estatus = tabla.textos("estatus");
    let lineas = tabla.textos("linea_negocio");
    let vendedores = tabla.textos("vendedor");
    let facturas = tabla.textos("factura");

    let texto = |columna: &Option<Vec<Option<String>>>, idx: usize| -> Option<String> {
        columna.as_ref().and_then(|valores| valores[idx].clone())
    };

    let mut registros = Vec::with_capacity(tabla.len());
    for (idx, fila) in tabla.filas().iter().enumerate() {
        if fila.iter().all(|c| c.es_vacia()) {
            continue;
        }
        let deudor = texto(&deudores, idx);
        if es_fila_total(deudor.as_deref()) {
            tracing::debug!("Fila {} descartada: parece una fila de totales", idx);
            continue;
        }

        registros.push(RegistroCxc {
            deudor: deudor.unwrap_or_else(|| DEUDOR_SIN_NOMBRE.to_string()),
            saldo_adeudado: saldos[idx].unwrap_or(0.0),
            dias_overdue: dias[idx],
            estatus: texto(&estatus, idx),
            linea_negocio: texto(&lineas, idx),
            vendedor: texto(&vendedores, idx),
            factura: texto(&facturas, idx),
        });
    }

    tracing::info!(
        registros = registros.len(),
        metodo = ?metodo_overdue,
        "Cartera de CxC construida"
    );

    Ok(CarteraCxc {
        registros,
        metodo_overdue,
        fecha_corte: hoy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Celda;

    #[test]
    fn paid_status_is_case_insensitive() {
        let registro = RegistroCxc::new("ACME", 100.0, 5).with_estatus("PAGADO");
        assert!(registro.esta_pagado());
        let registro = RegistroCxc::new("ACME", 100.0, 5).with_estatus("Pagado parcial");
        assert!(registro.esta_pagado());
        let registro = RegistroCxc::new("ACME", 100.0, 5).with_estatus("Pendiente");
        assert!(!registro.esta_pagado());
        assert!(!RegistroCxc::new("ACME", 100.0, 5).esta_pagado());
    }

    #[test]
    fn missing_balance_column_is_reported() {
        let tabla = Tabla::new(vec!["deudor".into()]);
        let hoy = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            construir_cartera(&tabla, hoy),
            Err(DashboardError::ColumnaFaltante(_))
        ));
    }

    #[test]
    fn builds_records_and_skips_blank_and_total_rows() {
        let tabla = Tabla::con_filas(
            vec!["deudor".into(), "saldo_adeudado".into(), "dias_vencido".into()],
            vec![
                vec!["ACME".into(), "$1,500.00".into(), 12.0.into()],
                vec![Celda::Vacia, Celda::Vacia, Celda::Vacia],
                vec![Celda::Vacia, "oops".into(), 3.0.into()],
                vec!["TOTAL GENERAL".into(), 1500.0.into(), Celda::Vacia],
            ],
        );
        let hoy = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cartera = construir_cartera(&tabla, hoy).unwrap();

        assert_eq!(cartera.metodo_overdue, MetodoOverdue::DiasVencido);
        assert_eq!(cartera.registros.len(), 2);
        assert_eq!(cartera.registros[0].saldo_adeudado, 1500.0);
        assert_eq!(cartera.registros[0].dias_overdue, 12);
        assert_eq!(cartera.registros[1].deudor, DEUDOR_SIN_NOMBRE);
        assert_eq!(cartera.registros[1].saldo_adeudado, 0.0);
    }

    #[test]
    fn debtors_starting_with_total_are_kept() {
        assert!(es_fila_total(Some("TOTAL")));
        assert!(es_fila_total(Some("  Total general ")));
        assert!(es_fila_total(Some("Totales:")));
        assert!(es_fila_total(Some("Gran Total")));
        assert!(!es_fila_total(Some("Totalplay Telecomunicaciones")));
        assert!(!es_fila_total(Some("Gran Bretaña Importaciones")));
        assert!(!es_fila_total(None));

        let tabla = Tabla::con_filas(
            vec!["deudor".into(), "saldo_adeudado".into()],
            vec![
                vec!["ACME".into(), 100.0.into()],
                vec!["Totalplay Telecomunicaciones".into(), 5000.0.into()],
                vec!["Total".into(), 5100.0.into()],
            ],
        );
        let hoy = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cartera = construir_cartera(&tabla, hoy).unwrap();
        let deudores: Vec<&str> = cartera.registros.iter().map(|r| r.deudor.as_str()).collect();
        assert_eq!(deudores, vec!["ACME", "Totalplay Telecomunicaciones"]);
    }
}
