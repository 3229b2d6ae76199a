//! Filtros de minijinja para las plantillas de reportes.

use chrono::NaiveDate;

use crate::format::{formato_compacto, formato_moneda, formato_numero, formato_porcentaje};

pub fn moneda_filter(valor: f64) -> String {
    formato_moneda(valor)
}

pub fn compacto_filter(valor: f64) -> String {
    formato_compacto(valor)
}

/// Recibe porcentajes en escala 0-100.
pub fn porcentaje_filter(valor: f64) -> String {
    formato_porcentaje(valor)
}

pub fn numero_filter(valor: f64, decimales: Option<u32>) -> String {
    formato_numero(valor, decimales.unwrap_or(0) as usize)
}

/// `2024-03-01` → `01/03/2024`; lo que no es fecha se deja igual.
pub fn fecha_filter(valor: String) -> String {
    match NaiveDate::parse_from_str(&valor, "%Y-%m-%d") {
        Ok(fecha) => fecha.format("%d/%m/%Y").to_string(),
        Err(_) => valor,
    }
}

pub fn capitalize_filter(valor: String) -> String {
    valor
        .chars()
        .take(1)
        .flat_map(char::to_uppercase)
        .chain(valor.chars().skip(1).flat_map(char::to_lowercase))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_filter_reformats_iso() {
        assert_eq!(fecha_filter("2024-03-01".into()), "01/03/2024");
        assert_eq!(fecha_filter("sin fecha".into()), "sin fecha");
    }

    #[test]
    fn capitalize_lowercases_tail() {
        assert_eq!(capitalize_filter("EXCELENTE".into()), "Excelente");
        assert_eq!(capitalize_filter(String::new()), "");
    }

    #[test]
    fn number_filter_defaults_to_integer() {
        assert_eq!(numero_filter(1234.6, None), "1,235");
        assert_eq!(numero_filter(1234.56, Some(1)), "1,234.6");
    }
}
