//! Lectura de archivos de Excel y CSV a `Tabla`.

pub mod csv;
pub mod excel;

use serde::{Deserialize, Serialize};

use crate::core::{Celda, DashboardError, DashboardResult, Tabla};
use crate::normalize::{normalizar_cxc, normalizar_ventas};

use self::csv::leer_csv;
use self::excel::leer_libro;

pub const COLUMNA_ORIGEN: &str = "origen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoDatos {
    Cxc,
    Ventas,
}

impl TipoDatos {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoDatos::Cxc => "cxc",
            TipoDatos::Ventas => "ventas",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatoArchivo {
    Excel,
    Csv,
}

pub fn detectar_formato(nombre: &str) -> DashboardResult<FormatoArchivo> {
    let extension = nombre
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(FormatoArchivo::Excel),
        "csv" | "txt" => Ok(FormatoArchivo::Csv),
        _ => Err(DashboardError::FormatoNoSoportado(nombre.to_string())),
    }
}

fn normalizar(tabla: &Tabla, tipo: TipoDatos) -> Tabla {
    match tipo {
        TipoDatos::Cxc => normalizar_cxc(tabla),
        TipoDatos::Ventas => normalizar_ventas(tabla),
    }
}

/// Lee un archivo subido y devuelve la tabla con columnas normalizadas.
///
/// Cuando se leen varias hojas (CXC VIGENTES + CXC VENCIDAS) se normaliza
/// cada una por separado, se concatenan y se agrega la columna `origen`.
pub fn cargar_tabla(bytes: Vec<u8>, nombre: &str, tipo: TipoDatos) -> DashboardResult<Tabla> {
    let formato = detectar_formato(nombre)?;

    let tabla = match formato {
        FormatoArchivo::Csv => normalizar(&leer_csv(&bytes)?, tipo),
        FormatoArchivo::Excel => {
            let hojas = leer_libro(bytes, tipo)?;
            if hojas.len() == 1 {
                hojas
                    .into_iter()
                    .next()
                    .map(|(_, tabla)| normalizar(&tabla, tipo))
                    .unwrap_or_default()
            } else {
                let mut unida: Option<Tabla> = None;
                for (hoja, tabla) in &hojas {
                    let mut tabla = normalizar(tabla, tipo);
                    let origen = vec![Celda::from(hoja.as_str()); tabla.len()];
                    tabla.agregar_columna(COLUMNA_ORIGEN, origen);
                    unida = Some(match unida {
                        Some(previa) => previa.concatenar(&tabla),
                        None => tabla,
                    });
                }
                unida.unwrap_or_default()
            }
        }
    };

    if tabla.columnas().is_empty() {
        return Err(DashboardError::SinDatos(format!("{} no contiene encabezados", nombre)));
    }

    tracing::info!(
        archivo = %nombre,
        tipo = tipo.as_str(),
        filas = tabla.len(),
        columnas = tabla.columnas().len(),
        "Archivo cargado"
    );
    Ok(tabla)
}
