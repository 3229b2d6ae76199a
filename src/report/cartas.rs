use serde::Serialize;

use crate::core::DashboardResult;
use crate::cxc::{antiguedad_por_deudor, filtrar_no_pagados, CarteraCxc};

use super::plantillas::{MotorPlantillas, PLANTILLA_CARTA_COBRANZA};

const ANCHO_SEPARADOR: usize = 72;

#[derive(Debug, Serialize)]
struct DocumentoVencido<'a> {
    factura: &'a str,
    saldo: f64,
    dias: i64,
}

#[derive(Debug, Serialize)]
struct ContextoCarta<'a> {
    empresa: &'a str,
    fecha_corte: String,
    deudor: &'a str,
    vencido: f64,
    total: f64,
    max_dias: i64,
    facturas: Vec<DocumentoVencido<'a>>,
}

/// Una carta de cobranza por deudor con saldo vencido, del mayor saldo al menor.
pub fn generar_cartas(motor: &MotorPlantillas, empresa: &str, cartera: &CarteraCxc) -> DashboardResult<Vec<String>> {
    let matriz = antiguedad_por_deudor(&cartera.registros);
    let pendientes = filtrar_no_pagados(&cartera.registros);
    let fecha_corte = cartera.fecha_corte.format("%Y-%m-%d").to_string();

    let mut cartas = Vec::new();
    for fila in matriz.filas.iter().filter(|f| f.vencido > 0.0) {
        let facturas = pendientes
            .iter()
            .filter(|r| r.deudor == fila.nombre && r.esta_vencido())
            .filter_map(|r| {
                r.factura.as_deref().map(|factura| DocumentoVencido {
                    factura,
                    saldo: r.saldo_adeudado,
                    dias: r.dias_overdue,
                })
            })
            .collect();

        let contexto = ContextoCarta {
            empresa,
            fecha_corte: fecha_corte.clone(),
            deudor: &fila.nombre,
            vencido: fila.vencido,
            total: fila.total,
            max_dias: fila.max_dias_overdue,
            facturas,
        };
        cartas.push(motor.render(PLANTILLA_CARTA_COBRANZA, &contexto)?);
    }

    tracing::info!(cartas = cartas.len(), "Cartas de cobranza generadas");
    Ok(cartas)
}

/// Todas las cartas en un solo `.txt`, separadas por una línea de `=`.
pub fn generar_cartas_txt(motor: &MotorPlantillas, empresa: &str, cartera: &CarteraCxc) -> DashboardResult<String> {
    let separador = format!("\n{}\n\n", "=".repeat(ANCHO_SEPARADOR));
    Ok(generar_cartas(motor, empresa, cartera)?.join(&separador))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cxc::{MetodoOverdue, RegistroCxc};
    use chrono::NaiveDate;

    fn cartera() -> CarteraCxc {
        let mut con_factura = RegistroCxc::new("Globex", 700.0, 65);
        con_factura.factura = Some("F-101".to_string());
        CarteraCxc {
            registros: vec![
                RegistroCxc::new("ACME", 1000.0, -5),
                con_factura,
                RegistroCxc::new("Globex", 300.0, 12),
                RegistroCxc::new("Initech", 900.0, 40).with_estatus("Pagado"),
            ],
            metodo_overdue: MetodoOverdue::DiasVencido,
            fecha_corte: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    #[test]
    fn one_letter_per_overdue_debtor() {
        let motor = MotorPlantillas::new().unwrap();
        let cartas = generar_cartas(&motor, "Fradma", &cartera()).unwrap();
        assert_eq!(cartas.len(), 1);

        let carta = &cartas[0];
        assert!(carta.contains("Estimado(a) Globex:"));
        assert!(carta.contains("$1,000.00"));
        assert!(carta.contains("65 días"));
        assert!(carta.contains("F-101: $700.00"));
        assert!(carta.contains("30/06/2024"));
    }

    #[test]
    fn joined_output_uses_separator() {
        let motor = MotorPlantillas::new().unwrap();
        let mut cartera = cartera();
        cartera.registros.push(RegistroCxc::new("ACME", 50.0, 3));

        let txt = generar_cartas_txt(&motor, "Fradma", &cartera).unwrap();
        assert_eq!(txt.matches(&"=".repeat(ANCHO_SEPARADOR)).count(), 1);
        assert!(txt.contains("Estimado(a) ACME:"));
    }

    #[test]
    fn no_overdue_no_letters() {
        let motor = MotorPlantillas::new().unwrap();
        let cartera = CarteraCxc {
            registros: vec![RegistroCxc::new("ACME", 10.0, 0)],
            metodo_overdue: MetodoOverdue::SinDatos,
            fecha_corte: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        assert_eq!(generar_cartas_txt(&motor, "Fradma", &cartera).unwrap(), "");
    }
}
