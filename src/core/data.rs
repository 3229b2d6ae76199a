use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Valor de una celda tal como sale de la hoja de cálculo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Celda {
    Vacia,
    Numero(f64),
    Texto(String),
    Fecha(NaiveDate),
    Booleano(bool),
}

impl Default for Celda {
    fn default() -> Self {
        Celda::Vacia
    }
}

impl From<&str> for Celda {
    fn from(texto: &str) -> Self {
        if texto.trim().is_empty() {
            Celda::Vacia
        } else {
            Celda::Texto(texto.to_string())
        }
    }
}

impl From<f64> for Celda {
    fn from(numero: f64) -> Self {
        Celda::Numero(numero)
    }
}

impl From<NaiveDate> for Celda {
    fn from(fecha: NaiveDate) -> Self {
        Celda::Fecha(fecha)
    }
}

const FORMATOS_FECHA: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];
const FORMATOS_FECHA_HORA: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Rango de seriales que Excel puede representar (1900-01-01 .. 9999-12-31)
const SERIAL_EXCEL_MIN: f64 = 1.0;
const SERIAL_EXCEL_MAX: f64 = 2_958_465.0;

impl Celda {
    pub fn es_vacia(&self) -> bool {
        match self {
            Celda::Vacia => true,
            Celda::Texto(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Interpreta la celda como número; `None` si no es convertible.
    pub fn a_numero(&self) -> Option<f64> {
        match self {
            Celda::Numero(n) if n.is_finite() => Some(*n),
            Celda::Booleano(b) => Some(if *b { 1.0 } else { 0.0 }),
            Celda::Texto(s) => parsear_numero(s),
            _ => None,
        }
    }

    pub fn a_fecha(&self) -> Option<NaiveDate> {
        match self {
            Celda::Fecha(fecha) => Some(*fecha),
            Celda::Numero(n) => fecha_desde_serial_excel(*n),
            Celda::Texto(s) => parsear_fecha(s),
            _ => None,
        }
    }

    pub fn a_texto(&self) -> Option<String> {
        match self {
            Celda::Vacia => None,
            Celda::Texto(s) => {
                let limpio = s.trim();
                if limpio.is_empty() {
                    None
                } else {
                    Some(limpio.to_string())
                }
            }
            Celda::Numero(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Celda::Fecha(fecha) => Some(fecha.format("%Y-%m-%d").to_string()),
            Celda::Booleano(b) => Some(b.to_string()),
        }
    }
}

/// Convierte textos como "$1,234.50", " 1200 " o "(300.00)" a número.
pub fn parsear_numero(texto: &str) -> Option<f64> {
    let mut limpio = texto.trim().to_string();
    if limpio.is_empty() {
        return None;
    }

    let mut negativo = false;
    if limpio.starts_with('(') && limpio.ends_with(')') {
        negativo = true;
        limpio = limpio[1..limpio.len() - 1].to_string();
    }

    let limpio: String = limpio
        .replace("USD", "")
        .replace("MXN", "")
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();

    let numero = limpio.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(if negativo { -numero } else { numero })
}

pub fn parsear_fecha(texto: &str) -> Option<NaiveDate> {
    let limpio = texto.trim();
    if limpio.is_empty() {
        return None;
    }

    for formato in FORMATOS_FECHA {
        if let Ok(fecha) = NaiveDate::parse_from_str(limpio, formato) {
            return Some(fecha);
        }
    }

    for formato in FORMATOS_FECHA_HORA {
        if let Ok(fecha_hora) = NaiveDateTime::parse_from_str(limpio, formato) {
            return Some(fecha_hora.date());
        }
    }

    if let Ok(fecha_hora) = chrono::DateTime::parse_from_rfc3339(limpio) {
        return Some(fecha_hora.date_naive());
    }

    // Un número en texto también puede ser un serial de Excel
    parsear_numero(limpio).and_then(fecha_desde_serial_excel)
}

pub fn fecha_desde_serial_excel(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(SERIAL_EXCEL_MIN..=SERIAL_EXCEL_MAX).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

static CELDA_VACIA: Celda = Celda::Vacia;

/// Tabla en memoria con columnas nombradas; reemplaza al dataframe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabla {
    columnas: Vec<String>,
    filas: Vec<Vec<Celda>>,
}

impl Tabla {
    pub fn new(columnas: Vec<String>) -> Self {
        Tabla {
            columnas,
            filas: Vec::new(),
        }
    }

    pub fn con_filas(columnas: Vec<String>, filas: Vec<Vec<Celda>>) -> Self {
        let mut tabla = Tabla::new(columnas);
        for fila in filas {
            tabla.agregar_fila(fila);
        }
        tabla
    }

    pub fn columnas(&self) -> &[String] {
        &self.columnas
    }

    pub fn filas(&self) -> &[Vec<Celda>] {
        &self.filas
    }

    pub fn len(&self) -> usize {
        self.filas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filas.is_empty()
    }

    /// Agrega una fila ajustándola al número de columnas.
    pub fn agregar_fila(&mut self, mut fila: Vec<Celda>) {
        fila.resize(self.columnas.len(), Celda::Vacia);
        self.filas.push(fila);
    }

    pub fn indice(&self, nombre: &str) -> Option<usize> {
        self.columnas.iter().position(|c| c == nombre)
    }

    pub fn tiene_columna(&self, nombre: &str) -> bool {
        self.indice(nombre).is_some()
    }

    /// Primer candidato que existe como columna.
    pub fn primera_columna<'a>(&self, candidatos: &[&'a str]) -> Option<&'a str> {
        candidatos.iter().copied().find(|c| self.tiene_columna(c))
    }

    pub fn celda(&self, fila: usize, columna: usize) -> &Celda {
        self.filas
            .get(fila)
            .and_then(|f| f.get(columna))
            .unwrap_or(&CELDA_VACIA)
    }

    pub fn valor(&self, fila: usize, columna: &str) -> &Celda {
        match self.indice(columna) {
            Some(idx) => self.celda(fila, idx),
            None => &CELDA_VACIA,
        }
    }

    pub fn numeros(&self, nombre: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.indice(nombre)?;
        Some(self.filas.iter().map(|f| f[idx].a_numero()).collect())
    }

    pub fn fechas(&self, nombre: &str) -> Option<Vec<Option<NaiveDate>>> {
        let idx = self.indice(nombre)?;
        Some(self.filas.iter().map(|f| f[idx].a_fecha()).collect())
    }

    pub fn textos(&self, nombre: &str) -> Option<Vec<Option<String>>> {
        let idx = self.indice(nombre)?;
        Some(self.filas.iter().map(|f| f[idx].a_texto()).collect())
    }

    /// Reemplaza los encabezados; la cantidad debe coincidir.
    pub fn con_columnas(mut self, columnas: Vec<String>) -> Self {
        debug_assert_eq!(columnas.len(), self.columnas.len());
        self.columnas = columnas;
        self
    }

    pub fn renombrar_columna(&mut self, actual: &str, nuevo: &str) -> bool {
        match self.indice(actual) {
            Some(idx) => {
                self.columnas[idx] = nuevo.to_string();
                true
            }
            None => false,
        }
    }

    pub fn agregar_columna(&mut self, nombre: &str, valores: Vec<Celda>) {
        self.columnas.push(nombre.to_string());
        let mut valores = valores.into_iter();
        for fila in self.filas.iter_mut() {
            fila.push(valores.next().unwrap_or(Celda::Vacia));
        }
    }

    /// Une dos tablas por nombre de columna; las faltantes quedan vacías.
    pub fn concatenar(&self, otra: &Tabla) -> Tabla {
        let mut columnas = self.columnas.clone();
        for columna in &otra.columnas {
            if !columnas.contains(columna) {
                columnas.push(columna.clone());
            }
        }

        let mut resultado = Tabla::new(columnas.clone());
        for origen in [self, otra] {
            let mapa: Vec<Option<usize>> = columnas.iter().map(|c| origen.indice(c)).collect();
            for fila in &origen.filas {
                let nueva = mapa
                    .iter()
                    .map(|idx| idx.map(|i| fila[i].clone()).unwrap_or(Celda::Vacia))
                    .collect();
                resultado.filas.push(nueva);
            }
        }
        resultado
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_money_like_text() {
        assert_eq!(parsear_numero("$1,234.50"), Some(1234.5));
        assert_eq!(parsear_numero(" 1200 "), Some(1200.0));
        assert_eq!(parsear_numero("(300.00)"), Some(-300.0));
        assert_eq!(parsear_numero("USD 15"), Some(15.0));
        assert_eq!(parsear_numero("n/a"), None);
        assert_eq!(parsear_numero("NaN"), None);
        assert_eq!(parsear_numero(""), None);
    }

    #[test]
    fn parses_common_date_layouts() {
        let esperada = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parsear_fecha("2024-03-15"), Some(esperada));
        assert_eq!(parsear_fecha("15/03/2024"), Some(esperada));
        assert_eq!(parsear_fecha("2024-03-15 10:30:00"), Some(esperada));
        assert_eq!(parsear_fecha("45366"), Some(esperada));
        assert_eq!(parsear_fecha("mañana"), None);
    }

    #[test]
    fn excel_serial_outside_range_is_rejected() {
        assert_eq!(fecha_desde_serial_excel(0.0), None);
        assert_eq!(fecha_desde_serial_excel(f64::NAN), None);
        assert_eq!(
            fecha_desde_serial_excel(45366.75),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn numeric_cells_render_without_trailing_zero() {
        assert_eq!(Celda::Numero(1001.0).a_texto(), Some("1001".to_string()));
        assert_eq!(Celda::Texto("  ".into()).a_texto(), None);
    }

    #[test]
    fn concatenar_aligns_columns_by_name() {
        let a = Tabla::con_filas(
            vec!["deudor".into(), "saldo".into()],
            vec![vec!["ACME".into(), 10.0.into()]],
        );
        let b = Tabla::con_filas(
            vec!["saldo".into(), "vencimiento".into()],
            vec![vec![5.0.into(), "2024-01-01".into()]],
        );

        let unida = a.concatenar(&b);
        assert_eq!(unida.columnas(), &["deudor", "saldo", "vencimiento"]);
        assert_eq!(unida.len(), 2);
        assert_eq!(unida.valor(1, "deudor"), &Celda::Vacia);
        assert_eq!(unida.valor(1, "saldo"), &Celda::Numero(5.0));
    }

    #[test]
    fn short_rows_are_padded() {
        let mut tabla = Tabla::new(vec!["a".into(), "b".into()]);
        tabla.agregar_fila(vec![1.0.into()]);
        assert_eq!(tabla.filas()[0].len(), 2);
    }
}
