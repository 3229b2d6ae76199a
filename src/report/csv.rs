use csv::WriterBuilder;

use crate::core::{DashboardError, DashboardResult};
use crate::cxc::{CarteraCxc, RangoAntiguedad};

const ENCABEZADOS: [&str; 8] = [
    "deudor",
    "factura",
    "linea_negocio",
    "vendedor",
    "estatus",
    "saldo_adeudado",
    "dias_overdue",
    "rango",
];

/// Detalle de CxC con los días de atraso calculados y su rango de antigüedad.
pub fn generar_csv_cxc(cartera: &CarteraCxc) -> DashboardResult<Vec<u8>> {
    let exportacion = |e: csv::Error| DashboardError::Exportacion(e.to_string());
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(ENCABEZADOS).map_err(exportacion)?;

    for r in &cartera.registros {
        let saldo = format!("{:.2}", r.saldo_adeudado);
        let dias = r.dias_overdue.to_string();
        writer.write_record([
            r.deudor.as_str(),
            r.factura.as_deref().unwrap_or(""),
            r.linea_negocio.as_deref().unwrap_or(""),
            r.vendedor.as_deref().unwrap_or(""),
            r.estatus.as_deref().unwrap_or(""),
            saldo.as_str(),
            dias.as_str(),
            RangoAntiguedad::para_dias(r.dias_overdue).etiqueta(),
        ])
        .map_err(exportacion)?;
    }

    writer
        .into_inner()
        .map_err(|e| DashboardError::Exportacion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cxc::{MetodoOverdue, RegistroCxc};
    use chrono::NaiveDate;

    #[test]
    fn writes_detail_with_bucket() {
        let cartera = CarteraCxc {
            registros: vec![
                RegistroCxc::new("ACME, S.A.", 1000.0, -5),
                RegistroCxc::new("Globex", 250.5, 45).with_vendedor("Ana"),
            ],
            metodo_overdue: MetodoOverdue::DiasVencido,
            fecha_corte: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };

        let bytes = generar_csv_cxc(&cartera).unwrap();
        let texto = String::from_utf8(bytes).unwrap();
        let lineas: Vec<&str> = texto.lines().collect();

        assert_eq!(lineas.len(), 3);
        assert_eq!(lineas[0], "deudor,factura,linea_negocio,vendedor,estatus,saldo_adeudado,dias_overdue,rango");
        assert_eq!(lineas[1], "\"ACME, S.A.\",,,,,1000.00,-5,Vigente");
        assert_eq!(lineas[2], "Globex,,,Ana,,250.50,45,31-60");
    }
}
