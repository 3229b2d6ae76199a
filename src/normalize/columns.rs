use std::collections::HashSet;

use crate::core::Tabla;

/// Nombre usado cuando un encabezado no tiene ningún carácter útil.
pub const COLUMNA_SIN_NOMBRE: &str = "columna";

fn plegar_acento(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' | 'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' | 'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        'ý' | 'ÿ' | 'Ý' => 'y',
        otro => otro,
    }
}

/// Convierte un encabezado a minúsculas ASCII separadas por `_`.
///
/// `"  Saldo Adeudado (USD) "` queda como `saldo_adeudado_usd`.
pub fn normalizar_nombre(nombre: &str) -> String {
    let mut salida = String::with_capacity(nombre.len());
    let mut separador_pendiente = false;

    for ch in nombre.chars().flat_map(char::to_lowercase) {
        let ch = plegar_acento(ch);
        if ch.is_ascii_alphanumeric() {
            if separador_pendiente && !salida.is_empty() {
                salida.push('_');
            }
            separador_pendiente = false;
            salida.push(ch);
        } else {
            separador_pendiente = true;
        }
    }

    if salida.is_empty() {
        COLUMNA_SIN_NOMBRE.to_string()
    } else {
        salida
    }
}

/// Normaliza una lista de encabezados y resuelve colisiones con `_2`, `_3`, …
/// en orden de aparición.
pub fn nombres_unicos<S: AsRef<str>>(nombres: &[S]) -> Vec<String> {
    let mut usados: HashSet<String> = HashSet::with_capacity(nombres.len());
    let mut salida = Vec::with_capacity(nombres.len());

    for nombre in nombres {
        let base = normalizar_nombre(nombre.as_ref());
        let mut candidato = base.clone();
        let mut sufijo = 2;
        while usados.contains(&candidato) {
            candidato = format!("{}_{}", base, sufijo);
            sufijo += 1;
        }
        usados.insert(candidato.clone());
        salida.push(candidato);
    }

    salida
}

/// Copia de la tabla con encabezados normalizados y sin duplicados.
pub fn normalizar_columnas(tabla: &Tabla) -> Tabla {
    let columnas = nombres_unicos(tabla.columnas());
    tabla.clone().con_columnas(columnas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Celda;

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(normalizar_nombre("Días Vencido"), "dias_vencido");
        assert_eq!(normalizar_nombre("  Saldo   Adeudado "), "saldo_adeudado");
        assert_eq!(normalizar_nombre("LÍNEA DE NEGOCIO"), "linea_de_negocio");
        assert_eq!(normalizar_nombre("Año"), "ano");
        assert_eq!(normalizar_nombre("Saldo (USD)"), "saldo_usd");
    }

    #[test]
    fn empty_header_gets_placeholder() {
        assert_eq!(normalizar_nombre(""), "columna");
        assert_eq!(normalizar_nombre("---"), "columna");
    }

    #[test]
    fn collisions_get_numbered_suffixes_in_order() {
        let nombres = ["Saldo", "saldo", "SALDO ", "Cliente"];
        assert_eq!(
            nombres_unicos(&nombres),
            vec!["saldo", "saldo_2", "saldo_3", "cliente"]
        );
    }

    #[test]
    fn generated_suffix_that_is_taken_keeps_incrementing() {
        let nombres = ["a", "a_2", "A"];
        assert_eq!(nombres_unicos(&nombres), vec!["a", "a_2", "a_3"]);
    }

    #[test]
    fn normalizar_columnas_keeps_every_column_and_value() {
        let tabla = Tabla::con_filas(
            vec!["Cliente".into(), "Cliente".into(), "Fecha".into()],
            vec![vec!["A".into(), "B".into(), "2024-01-01".into()]],
        );
        let normalizada = normalizar_columnas(&tabla);
        assert_eq!(normalizada.columnas(), &["cliente", "cliente_2", "fecha"]);
        assert_eq!(normalizada.valor(0, "cliente_2"), &Celda::Texto("B".into()));
        // la original no cambia
        assert_eq!(tabla.columnas()[0], "Cliente");
    }
}
