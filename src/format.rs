//! Formatos de presentación para montos y porcentajes.

/// Formatea un número con separadores de miles.
pub fn formato_numero(num: f64, decimales: usize) -> String {
    let formatted = format!("{:.decimales$}", num.abs(), decimales = decimales);
    let (entero, decimal) = match formatted.split_once('.') {
        Some((e, d)) => (e, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut invertido = String::with_capacity(entero.len() + entero.len() / 3);
    for (i, c) in entero.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            invertido.push(',');
        }
        invertido.push(c);
    }
    let entero: String = invertido.chars().rev().collect();

    let signo = if num < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match decimal {
        Some(d) => format!("{}{}.{}", signo, entero, d),
        None => format!("{}{}", signo, entero),
    }
}

/// `1234.56` → `"$1,234.56"`; negativos como `"-$1,234.56"`.
pub fn formato_moneda(monto: f64) -> String {
    formato_moneda_con_simbolo(monto, "$")
}

pub fn formato_moneda_con_simbolo(monto: f64, simbolo: &str) -> String {
    let monto = if monto.is_finite() { monto } else { 0.0 };
    let numero = formato_numero(monto, 2);
    match numero.strip_prefix('-') {
        Some(positivo) => format!("-{}{}", simbolo, positivo),
        None => format!("{}{}", simbolo, numero),
    }
}

const ESCALAS_COMPACTAS: [(f64, &str); 3] = [(1_000.0, "K"), (1_000_000.0, "M"), (1_000_000_000.0, "B")];

fn redondear_un_decimal(valor: f64) -> f64 {
    (valor * 10.0).round() / 10.0
}

/// Versión corta para tarjetas de KPI: `2_500_000.0` → `"2.5M"`.
///
/// La unidad se elige después de redondear: `999_950.0` es `"1.0M"`, no `"1000.0K"`.
pub fn formato_compacto(valor: f64) -> String {
    let valor = if valor.is_finite() { valor } else { 0.0 };
    let absoluto = valor.abs();
    let signo = if valor < 0.0 { "-" } else { "" };

    if absoluto.round() < 1_000.0 {
        return format!("{}{:.0}", signo, absoluto);
    }

    let mut escala = ESCALAS_COMPACTAS[0];
    for siguiente in &ESCALAS_COMPACTAS[1..] {
        if redondear_un_decimal(absoluto / escala.0) < 1_000.0 {
            break;
        }
        escala = *siguiente;
    }
    format!("{}{:.1}{}", signo, absoluto / escala.0, escala.1)
}

/// Porcentaje ya expresado en 0-100: `12.345` → `"12.3%"`.
pub fn formato_porcentaje(valor: f64) -> String {
    let valor = if valor.is_finite() { valor } else { 0.0 };
    format!("{:.1}%", valor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_format() {
        assert_eq!(formato_moneda(1234.56), "$1,234.56");
        assert_eq!(formato_moneda(0.0), "$0.00");
        assert_eq!(formato_moneda(1_000_000.0), "$1,000,000.00");
        assert_eq!(formato_moneda(-950.5), "-$950.50");
        assert_eq!(formato_moneda(f64::NAN), "$0.00");
        assert_eq!(formato_moneda_con_simbolo(10.0, "RD$"), "RD$10.00");
    }

    #[test]
    fn tiny_negative_rounds_to_unsigned_zero() {
        assert_eq!(formato_moneda(-0.001), "$0.00");
    }

    #[test]
    fn compact_format() {
        assert_eq!(formato_compacto(2_500_000.0), "2.5M");
        assert_eq!(formato_compacto(3_000_000.0), "3.0M");
        assert_eq!(formato_compacto(12_300.0), "12.3K");
        assert_eq!(formato_compacto(1_200_000_000.0), "1.2B");
        assert_eq!(formato_compacto(999.0), "999");
        assert_eq!(formato_compacto(-4_500.0), "-4.5K");
        assert_eq!(formato_compacto(999_950.0), "1.0M");
        assert_eq!(formato_compacto(999_940.0), "999.9K");
        assert_eq!(formato_compacto(999.6), "1.0K");
        assert_eq!(formato_compacto(999_960_000.0), "1.0B");
    }

    #[test]
    fn number_and_percentage() {
        assert_eq!(formato_numero(1234567.891, 0), "1,234,568");
        assert_eq!(formato_numero(12.5, 1), "12.5");
        assert_eq!(formato_porcentaje(12.345), "12.3%");
    }
}
