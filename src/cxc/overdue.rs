//! Estimación de días de atraso por factura.
//!
//! Las hojas de CxC llegan con formas distintas: a veces traen los días
//! vencidos, a veces sólo la fecha de vencimiento, los días restantes o la
//! fecha de la factura. Las estrategias se evalúan en orden y gana la primera
//! que aplica. Cualquier valor no numérico o faltante cuenta como 0.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::Tabla;

/// Plazo de crédito asumido cuando sólo hay fecha de transacción.
pub const PLAZO_CREDITO_ESTANDAR: i64 = 30;

/// Magnitud máxima aceptada en columnas de días; lo que la excede es un error de captura y cuenta como 0.
pub const LIMITE_DIAS: i64 = 1_000_000;

pub const COLUMNAS_DIAS_VENCIDO: &[&str] = &["dias_vencido", "dias_vencidos"];
pub const COLUMNAS_VENCIMIENTO: &[&str] = &["vencimiento", "fecha_vencimiento", "vencimient"];
pub const COLUMNAS_DIAS_RESTANTES: &[&str] = &["dias_restante", "dias_restantes"];
pub const COLUMNAS_FECHA_PAGO: &[&str] = &["fecha_pago", "fecha_de_pago"];
pub const COLUMNAS_DIAS_CREDITO: &[&str] = &["dias_credito", "dias_de_credito", "credito"];
pub const COLUMNAS_FECHA: &[&str] = &["fecha", "fecha_factura", "fecha_emision"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetodoOverdue {
    DiasVencido,
    FechaVencimiento,
    DiasRestantes,
    FechaPagoMasCredito,
    FechaTransaccion,
    SinDatos,
}

impl MetodoOverdue {
    pub fn descripcion(&self) -> &'static str {
        match self {
            MetodoOverdue::DiasVencido => "columna de días vencidos",
            MetodoOverdue::FechaVencimiento => "hoy menos fecha de vencimiento",
            MetodoOverdue::DiasRestantes => "días restantes con signo invertido",
            MetodoOverdue::FechaPagoMasCredito => "hoy menos (fecha de pago + días de crédito)",
            MetodoOverdue::FechaTransaccion => "hoy menos (fecha + 30 días de crédito estándar)",
            MetodoOverdue::SinDatos => "sin columnas de fecha; todo se considera vigente",
        }
    }
}

struct Estrategia {
    metodo: MetodoOverdue,
    aplica: fn(&Tabla) -> bool,
    calcular: fn(&Tabla, NaiveDate) -> Vec<i64>,
}

/// Orden de prioridad; la primera estrategia aplicable gana.
const ESTRATEGIAS: &[Estrategia] = &[
    Estrategia {
        metodo: MetodoOverdue::DiasVencido,
        aplica: tiene_dias_vencido,
        calcular: desde_dias_vencido,
    },
    Estrategia {
        metodo: MetodoOverdue::FechaVencimiento,
        aplica: tiene_vencimiento,
        calcular: desde_vencimiento,
    },
    Estrategia {
        metodo: MetodoOverdue::DiasRestantes,
        aplica: tiene_dias_restantes,
        calcular: desde_dias_restantes,
    },
    Estrategia {
        metodo: MetodoOverdue::FechaPagoMasCredito,
        aplica: tiene_fecha_pago_y_credito,
        calcular: desde_fecha_pago_y_credito,
    },
    Estrategia {
        metodo: MetodoOverdue::FechaTransaccion,
        aplica: tiene_fecha_transaccion,
        calcular: desde_fecha_transaccion,
    },
    Estrategia {
        metodo: MetodoOverdue::SinDatos,
        aplica: siempre,
        calcular: todo_vigente,
    },
];

/// Qué estrategia se usaría para esta tabla.
pub fn metodo_dias_overdue(tabla: &Tabla) -> MetodoOverdue {
    estrategia_para(tabla).metodo
}

/// Días de atraso por fila (positivo = vencido, cero o negativo = vigente).
pub fn calcular_dias_overdue(tabla: &Tabla, hoy: NaiveDate) -> Vec<i64> {
    estimar_dias_overdue(tabla, hoy).1
}

pub fn estimar_dias_overdue(tabla: &Tabla, hoy: NaiveDate) -> (MetodoOverdue, Vec<i64>) {
    let estrategia = estrategia_para(tabla);
    tracing::debug!(
        metodo = ?estrategia.metodo,
        filas = tabla.len(),
        "Calculando días de atraso: {}",
        estrategia.metodo.descripcion()
    );
    (estrategia.metodo, (estrategia.calcular)(tabla, hoy))
}

fn estrategia_para(tabla: &Tabla) -> &'static Estrategia {
    ESTRATEGIAS
        .iter()
        .find(|e| (e.aplica)(tabla))
        .unwrap_or(&ESTRATEGIAS[ESTRATEGIAS.len() - 1])
}

fn a_dias(valor: Option<f64>) -> i64 {
    valor
        .filter(|v| v.is_finite() && v.abs() <= LIMITE_DIAS as f64)
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}

fn enteros(tabla: &Tabla, candidatos: &[&str]) -> Option<Vec<i64>> {
    let columna = tabla.primera_columna(candidatos)?;
    tabla
        .numeros(columna)
        .map(|valores| valores.into_iter().map(a_dias).collect())
}

fn fechas(tabla: &Tabla, candidatos: &[&str]) -> Option<Vec<Option<NaiveDate>>> {
    let columna = tabla.primera_columna(candidatos)?;
    tabla.fechas(columna)
}

fn dias_desde(hoy: NaiveDate, fecha: Option<NaiveDate>, plazo: i64) -> i64 {
    fecha
        .and_then(|f| f.checked_add_signed(Duration::try_days(plazo)?))
        .map(|limite| (hoy - limite).num_days())
        .unwrap_or(0)
}

fn tiene_dias_vencido(tabla: &Tabla) -> bool {
    enteros(tabla, COLUMNAS_DIAS_VENCIDO)
        .map(|dias| dias.iter().any(|d| *d != 0))
        .unwrap_or(false)
}

fn desde_dias_vencido(tabla: &Tabla, _hoy: NaiveDate) -> Vec<i64> {
    enteros(tabla, COLUMNAS_DIAS_VENCIDO).unwrap_or_else(|| vec![0; tabla.len()])
}

fn tiene_vencimiento(tabla: &Tabla) -> bool {
    tabla.primera_columna(COLUMNAS_VENCIMIENTO).is_some()
}

fn desde_vencimiento(tabla: &Tabla, hoy: NaiveDate) -> Vec<i64> {
    match fechas(tabla, COLUMNAS_VENCIMIENTO) {
        Some(vencimientos) => vencimientos
            .into_iter()
            .map(|v| dias_desde(hoy, v, 0))
            .collect(),
        None => vec![0; tabla.len()],
    }
}

fn tiene_dias_restantes(tabla: &Tabla) -> bool {
    tabla.primera_columna(COLUMNAS_DIAS_RESTANTES).is_some()
}

fn desde_dias_restantes(tabla: &Tabla, _hoy: NaiveDate) -> Vec<i64> {
    enteros(tabla, COLUMNAS_DIAS_RESTANTES)
        .map(|dias| dias.into_iter().map(|d| d.checked_neg().unwrap_or(0)).collect())
        .unwrap_or_else(|| vec![0; tabla.len()])
}

fn tiene_fecha_pago_y_credito(tabla: &Tabla) -> bool {
    tabla.primera_columna(COLUMNAS_FECHA_PAGO).is_some()
        && tabla.primera_columna(COLUMNAS_DIAS_CREDITO).is_some()
}

fn desde_fecha_pago_y_credito(tabla: &Tabla, hoy: NaiveDate) -> Vec<i64> {
    let (Some(pagos), Some(creditos)) = (
        fechas(tabla, COLUMNAS_FECHA_PAGO),
        enteros(tabla, COLUMNAS_DIAS_CREDITO),
    ) else {
        return vec![0; tabla.len()];
    };

    pagos
        .into_iter()
        .zip(creditos)
        .map(|(pago, credito)| dias_desde(hoy, pago, credito))
        .collect()
}

fn tiene_fecha_transaccion(tabla: &Tabla) -> bool {
    tabla.primera_columna(COLUMNAS_FECHA).is_some()
}

fn desde_fecha_transaccion(tabla: &Tabla, hoy: NaiveDate) -> Vec<i64> {
    match fechas(tabla, COLUMNAS_FECHA) {
        Some(fechas) => fechas
            .into_iter()
            .map(|f| dias_desde(hoy, f, PLAZO_CREDITO_ESTANDAR))
            .collect(),
        None => vec![0; tabla.len()],
    }
}

fn siempre(_tabla: &Tabla) -> bool {
    true
}

fn todo_vigente(tabla: &Tabla, _hoy: NaiveDate) -> Vec<i64> {
    vec![0; tabla.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Celda;

    fn hoy() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn columna(nombre: &str, valores: Vec<Celda>) -> Tabla {
        Tabla::con_filas(
            vec![nombre.to_string()],
            valores.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn numeros(valores: &[f64]) -> Vec<Celda> {
        valores.iter().map(|v| Celda::Numero(*v)).collect()
    }

    #[test]
    fn dias_vencido_is_used_unchanged() {
        let tabla = columna("dias_vencido", numeros(&[10.0, 20.0, -5.0, 0.0]));
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::DiasVencido);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![10, 20, -5, 0]);
    }

    #[test]
    fn dias_restante_is_negated() {
        let tabla = columna("dias_restante", numeros(&[10.0, -20.0, 0.0]));
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::DiasRestantes);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![-10, 20, 0]);
    }

    #[test]
    fn all_zero_dias_vencido_falls_through_to_due_date() {
        let tabla = Tabla::con_filas(
            vec!["dias_vencido".into(), "vencimiento".into()],
            vec![
                vec![0.0.into(), "2024-06-20".into()],
                vec![0.0.into(), "2024-07-10".into()],
            ],
        );
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::FechaVencimiento);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![10, -10]);
    }

    #[test]
    fn due_date_beats_remaining_days() {
        let tabla = Tabla::con_filas(
            vec!["fecha_vencimiento".into(), "dias_restantes".into()],
            vec![vec!["2024-06-01".into(), 99.0.into()]],
        );
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![29]);
    }

    #[test]
    fn payment_date_plus_credit_days() {
        let tabla = Tabla::con_filas(
            vec!["fecha_pago".into(), "dias_credito".into()],
            vec![
                vec!["2024-05-01".into(), 15.0.into()],
                vec!["2024-06-25".into(), 30.0.into()],
                vec![Celda::Vacia, 30.0.into()],
            ],
        );
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::FechaPagoMasCredito);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![45, -25, 0]);
    }

    #[test]
    fn payment_date_without_credit_uses_standard_term_on_transaction_date() {
        let tabla = Tabla::con_filas(
            vec!["fecha".into(), "fecha_pago".into()],
            vec![vec!["2024-05-01".into(), "2024-05-01".into()]],
        );
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::FechaTransaccion);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![30]);
    }

    #[test]
    fn no_usable_column_means_everything_is_current() {
        let tabla = columna("deudor", vec!["ACME".into(), "Globex".into()]);
        assert_eq!(metodo_dias_overdue(&tabla), MetodoOverdue::SinDatos);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![0, 0]);
    }

    #[test]
    fn garbage_values_coerce_to_zero() {
        let tabla = columna(
            "dias_vencido",
            vec![15.0.into(), "n/a".into(), Celda::Vacia, "7".into()],
        );
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![15, 0, 0, 7]);

        let tabla = columna("vencimiento", vec!["sin fecha".into(), Celda::Vacia]);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![0, 0]);
    }

    #[test]
    fn huge_credit_days_do_not_overflow() {
        let tabla = Tabla::con_filas(
            vec!["fecha_pago".into(), "dias_credito".into()],
            vec![
                vec!["2024-05-01".into(), 1e15.into()],
                vec!["2024-05-01".into(), (-1e15).into()],
                vec!["2024-05-01".into(), 15.0.into()],
            ],
        );
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![60, 60, 45]);
    }

    #[test]
    fn out_of_range_remaining_days_count_as_zero() {
        let tabla = columna("dias_restante", numeros(&[-1e30, 1e30, f64::NAN, 5.0]));
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![0, 0, 0, -5]);
    }

    #[test]
    fn due_date_far_from_cutoff_still_computes() {
        let tabla = columna("vencimiento", vec!["1900-01-01".into()]);
        assert_eq!(calcular_dias_overdue(&tabla, hoy()), vec![45_471]);
    }
}
