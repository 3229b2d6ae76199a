use csv::ReaderBuilder;

use crate::core::{Celda, DashboardResult, Tabla};

const BOM: char = '\u{feff}';

/// Punto y coma cuando la primera línea con contenido tiene más `;` que `,`.
pub fn detectar_delimitador(contenido: &str) -> u8 {
    let primera = contenido
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");
    let comas = primera.matches(',').count();
    let puntos_y_coma = primera.matches(';').count();
    if puntos_y_coma > comas {
        b';'
    } else {
        b','
    }
}

/// Lee un CSV a `Tabla`; todas las celdas quedan como texto y se coercionan después.
pub fn leer_csv(bytes: &[u8]) -> DashboardResult<Tabla> {
    let contenido = String::from_utf8_lossy(bytes);
    let contenido = contenido.trim_start_matches(BOM);
    let delimitador = detectar_delimitador(contenido);

    let mut lector = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimitador)
        .from_reader(contenido.as_bytes());

    let mut tabla: Option<Tabla> = None;
    for registro in lector.records() {
        let registro = registro?;
        let fila: Vec<Celda> = registro.iter().map(|campo| Celda::from(campo.trim())).collect();
        if fila.iter().all(Celda::es_vacia) {
            continue;
        }
        match tabla.as_mut() {
            Some(t) => t.agregar_fila(fila),
            None => {
                let columnas = registro.iter().map(|c| c.trim().to_string()).collect();
                tabla = Some(Tabla::new(columnas));
            }
        }
    }

    let tabla = tabla.unwrap_or_default();
    tracing::debug!(filas = tabla.len(), delimitador = %(delimitador as char), "CSV leído");
    Ok(tabla)
}
