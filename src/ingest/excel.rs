use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::core::{fecha_desde_serial_excel, parsear_fecha, Celda, DashboardError, DashboardResult, Tabla};

use super::TipoDatos;

pub const HOJA_CXC_VIGENTES: &str = "CXC VIGENTES";
pub const HOJA_CXC_VENCIDAS: &str = "CXC VENCIDAS";

/// Hojas a leer para cartera: vigentes y vencidas juntas si ambas existen,
/// si no la primera que mencione cxc/cuenta, si no la primera del libro.
pub fn seleccionar_hojas_cxc(hojas: &[String]) -> Vec<String> {
    let buscar = |objetivo: &str| {
        hojas
            .iter()
            .find(|h| h.trim().eq_ignore_ascii_case(objetivo))
            .cloned()
    };

    if let (Some(vigentes), Some(vencidas)) = (buscar(HOJA_CXC_VIGENTES), buscar(HOJA_CXC_VENCIDAS)) {
        return vec![vigentes, vencidas];
    }

    hojas
        .iter()
        .find(|h| {
            let nombre = h.to_lowercase();
            nombre.contains("cxc") || nombre.contains("cuenta")
        })
        .or_else(|| hojas.first())
        .map(|h| vec![h.clone()])
        .unwrap_or_default()
}

pub fn seleccionar_hoja_ventas(hojas: &[String]) -> Option<String> {
    hojas
        .iter()
        .find(|h| h.to_lowercase().contains("venta"))
        .or_else(|| hojas.first())
        .cloned()
}

pub fn dato_a_celda(dato: &Data) -> Celda {
    match dato {
        Data::Empty | Data::Error(_) => Celda::Vacia,
        Data::Int(i) => Celda::Numero(*i as f64),
        Data::Float(f) if f.is_finite() => Celda::Numero(*f),
        Data::Float(_) => Celda::Vacia,
        Data::Bool(b) => Celda::Booleano(*b),
        Data::String(s) => Celda::from(s.trim()),
        Data::DateTime(dt) => fecha_desde_serial_excel(dt.as_f64())
            .map(Celda::Fecha)
            .unwrap_or(Celda::Numero(dt.as_f64())),
        Data::DateTimeIso(s) => parsear_fecha(s)
            .map(Celda::Fecha)
            .unwrap_or_else(|| Celda::from(s.as_str())),
        Data::DurationIso(s) => Celda::from(s.as_str()),
    }
}

/// Convierte un rango en tabla; la primera fila no vacía es el encabezado.
pub fn rango_a_tabla(rango: &Range<Data>) -> Tabla {
    let mut filas = rango
        .rows()
        .map(|fila| fila.iter().map(dato_a_celda).collect::<Vec<_>>())
        .filter(|fila| !fila.iter().all(Celda::es_vacia));

    let encabezado = match filas.next() {
        Some(fila) => fila,
        None => return Tabla::default(),
    };
    let columnas = encabezado
        .iter()
        .map(|c| c.a_texto().unwrap_or_default())
        .collect();

    let mut tabla = Tabla::new(columnas);
    for fila in filas {
        tabla.agregar_fila(fila);
    }
    tabla
}

/// Lee las hojas relevantes de un libro en memoria.
///
/// Devuelve una tabla por hoja, sin normalizar, junto con el nombre de la hoja.
pub fn leer_libro(bytes: Vec<u8>, tipo: TipoDatos) -> DashboardResult<Vec<(String, Tabla)>> {
    let mut libro = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let hojas = libro.sheet_names().to_owned();

    let seleccionadas = match tipo {
        TipoDatos::Cxc => seleccionar_hojas_cxc(&hojas),
        TipoDatos::Ventas => seleccionar_hoja_ventas(&hojas).into_iter().collect(),
    };
    if seleccionadas.is_empty() {
        return Err(DashboardError::SinDatos("el libro no tiene hojas".to_string()));
    }

    let mut tablas = Vec::with_capacity(seleccionadas.len());
    for hoja in seleccionadas {
        let rango = libro.worksheet_range(&hoja)?;
        let tabla = rango_a_tabla(&rango);
        tracing::debug!(hoja = %hoja, filas = tabla.len(), columnas = tabla.columnas().len(), "Hoja leída");
        tablas.push((hoja, tabla));
    }
    Ok(tablas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nombres(hojas: &[&str]) -> Vec<String> {
        hojas.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn picks_both_cxc_sheets_when_present() {
        let hojas = nombres(&["Resumen", "CXC VENCIDAS", "CXC VIGENTES"]);
        assert_eq!(
            seleccionar_hojas_cxc(&hojas),
            vec!["CXC VIGENTES".to_string(), "CXC VENCIDAS".to_string()]
        );
    }

    #[test]
    fn falls_back_to_named_or_first_sheet() {
        assert_eq!(seleccionar_hojas_cxc(&nombres(&["Hoja1", "Cuentas por cobrar"])), vec!["Cuentas por cobrar"]);
        assert_eq!(seleccionar_hojas_cxc(&nombres(&["Hoja1", "CXC VIGENTES"])), vec!["CXC VIGENTES"]);
        assert_eq!(seleccionar_hojas_cxc(&nombres(&["Datos"])), vec!["Datos"]);
        assert!(seleccionar_hojas_cxc(&[]).is_empty());
    }

    #[test]
    fn sales_sheet_selection() {
        assert_eq!(seleccionar_hoja_ventas(&nombres(&["Resumen", "Ventas 2024"])).as_deref(), Some("Ventas 2024"));
        assert_eq!(seleccionar_hoja_ventas(&nombres(&["Hoja1"])).as_deref(), Some("Hoja1"));
        assert_eq!(seleccionar_hoja_ventas(&[]), None);
    }

    #[test]
    fn converts_calamine_values() {
        assert_eq!(dato_a_celda(&Data::Int(3)), Celda::Numero(3.0));
        assert_eq!(dato_a_celda(&Data::String("  ".into())), Celda::Vacia);
        assert_eq!(dato_a_celda(&Data::String(" ACME ".into())), Celda::Texto("ACME".into()));
        assert_eq!(
            dato_a_celda(&Data::DateTimeIso("2024-03-01".into())),
            Celda::Fecha(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(dato_a_celda(&Data::Empty), Celda::Vacia);
    }

    #[test]
    fn header_is_first_non_empty_row() {
        let mut rango: Range<Data> = Range::new((0, 0), (3, 1));
        rango.set_value((1, 0), Data::String("Cliente".into()));
        rango.set_value((1, 1), Data::String("Saldo".into()));
        rango.set_value((2, 0), Data::String("ACME".into()));
        rango.set_value((2, 1), Data::Float(100.0));

        let tabla = rango_a_tabla(&rango);
        assert_eq!(tabla.columnas(), &["Cliente".to_string(), "Saldo".to_string()]);
        assert_eq!(tabla.len(), 1);
        assert_eq!(tabla.valor(0, "Saldo"), &Celda::Numero(100.0));
    }
}
