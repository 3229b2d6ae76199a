use std::collections::HashMap;

use serde::Serialize;

use super::metrics::{filtrar_no_pagados, porcentaje};
use super::registro::RegistroCxc;

pub const LINEA_SIN_ASIGNAR: &str = "Sin línea";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RangoAntiguedad {
    Vigente,
    #[serde(rename = "1-30")]
    Dias1a30,
    #[serde(rename = "31-60")]
    Dias31a60,
    #[serde(rename = "61-90")]
    Dias61a90,
    #[serde(rename = ">90")]
    Mas90,
}

impl RangoAntiguedad {
    pub const TODOS: [RangoAntiguedad; 5] = [
        RangoAntiguedad::Vigente,
        RangoAntiguedad::Dias1a30,
        RangoAntiguedad::Dias31a60,
        RangoAntiguedad::Dias61a90,
        RangoAntiguedad::Mas90,
    ];

    pub fn para_dias(dias: i64) -> Self {
        match dias {
            i64::MIN..=0 => RangoAntiguedad::Vigente,
            1..=30 => RangoAntiguedad::Dias1a30,
            31..=60 => RangoAntiguedad::Dias31a60,
            61..=90 => RangoAntiguedad::Dias61a90,
            _ => RangoAntiguedad::Mas90,
        }
    }

    pub fn etiqueta(&self) -> &'static str {
        match self {
            RangoAntiguedad::Vigente => "Vigente",
            RangoAntiguedad::Dias1a30 => "1-30",
            RangoAntiguedad::Dias31a60 => "31-60",
            RangoAntiguedad::Dias61a90 => "61-90",
            RangoAntiguedad::Mas90 => ">90",
        }
    }
}

/// Una fila del mapa de calor: saldo por rango de antigüedad.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilaAntiguedad {
    pub nombre: String,
    pub vigente: f64,
    pub dias_1_30: f64,
    pub dias_31_60: f64,
    pub dias_61_90: f64,
    pub mas_90: f64,
    pub total: f64,
    pub vencido: f64,
    pub pct_vencido: f64,
    pub max_dias_overdue: i64,
    pub facturas: usize,
}

impl FilaAntiguedad {
    fn nueva(nombre: &str) -> Self {
        FilaAntiguedad {
            nombre: nombre.to_string(),
            ..Default::default()
        }
    }

    fn acumular(&mut self, registro: &RegistroCxc) {
        let saldo = registro.saldo_adeudado;
        match RangoAntiguedad::para_dias(registro.dias_overdue) {
            RangoAntiguedad::Vigente => self.vigente += saldo,
            RangoAntiguedad::Dias1a30 => self.dias_1_30 += saldo,
            RangoAntiguedad::Dias31a60 => self.dias_31_60 += saldo,
            RangoAntiguedad::Dias61a90 => self.dias_61_90 += saldo,
            RangoAntiguedad::Mas90 => self.mas_90 += saldo,
        }
        if self.facturas == 0 || registro.dias_overdue > self.max_dias_overdue {
            self.max_dias_overdue = registro.dias_overdue;
        }
        self.total += saldo;
        self.facturas += 1;
    }

    fn cerrar(&mut self) {
        self.vencido = self.dias_1_30 + self.dias_31_60 + self.dias_61_90 + self.mas_90;
        self.pct_vencido = porcentaje(self.vencido, self.total);
    }

    pub fn saldo_en(&self, rango: RangoAntiguedad) -> f64 {
        match rango {
            RangoAntiguedad::Vigente => self.vigente,
            RangoAntiguedad::Dias1a30 => self.dias_1_30,
            RangoAntiguedad::Dias31a60 => self.dias_31_60,
            RangoAntiguedad::Dias61a90 => self.dias_61_90,
            RangoAntiguedad::Mas90 => self.mas_90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrizAntiguedad {
    pub rangos: Vec<&'static str>,
    pub filas: Vec<FilaAntiguedad>,
    pub totales: FilaAntiguedad,
}

impl MatrizAntiguedad {
    pub fn top(&self, n: usize) -> &[FilaAntiguedad] {
        &self.filas[..n.min(self.filas.len())]
    }
}

fn agrupar<F>(registros: &[RegistroCxc], clave: F) -> MatrizAntiguedad
where
    F: Fn(&RegistroCxc) -> String,
{
    let mut grupos: HashMap<String, FilaAntiguedad> = HashMap::new();
    let mut totales = FilaAntiguedad::nueva("Total");

    for registro in filtrar_no_pagados(registros) {
        let nombre = clave(registro);
        grupos
            .entry(nombre.clone())
            .or_insert_with(|| FilaAntiguedad::nueva(&nombre))
            .acumular(registro);
        totales.acumular(registro);
    }

    let mut filas: Vec<FilaAntiguedad> = grupos.into_values().collect();
    for fila in filas.iter_mut() {
        fila.cerrar();
    }
    totales.cerrar();

    filas.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.nombre.cmp(&b.nombre))
    });

    MatrizAntiguedad {
        rangos: RangoAntiguedad::TODOS.iter().map(|r| r.etiqueta()).collect(),
        filas,
        totales,
    }
}

/// Saldo pendiente por deudor y rango, de mayor a menor saldo.
pub fn antiguedad_por_deudor(registros: &[RegistroCxc]) -> MatrizAntiguedad {
    agrupar(registros, |r| r.deudor.clone())
}

pub fn antiguedad_por_linea(registros: &[RegistroCxc]) -> MatrizAntiguedad {
    agrupar(registros, |r| {
        r.linea_negocio
            .clone()
            .unwrap_or_else(|| LINEA_SIN_ASIGNAR.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registros() -> Vec<RegistroCxc> {
        vec![
            RegistroCxc::new("ACME", 1000.0, -5).with_linea("Químicos"),
            RegistroCxc::new("ACME", 500.0, 40).with_linea("Químicos"),
            RegistroCxc::new("Globex", 3000.0, 95),
            RegistroCxc::new("Initech", 200.0, 10).with_estatus("pagado"),
        ]
    }

    #[test]
    fn ranges_match_day_bands() {
        assert_eq!(RangoAntiguedad::para_dias(-3), RangoAntiguedad::Vigente);
        assert_eq!(RangoAntiguedad::para_dias(0), RangoAntiguedad::Vigente);
        assert_eq!(RangoAntiguedad::para_dias(30), RangoAntiguedad::Dias1a30);
        assert_eq!(RangoAntiguedad::para_dias(31), RangoAntiguedad::Dias31a60);
        assert_eq!(RangoAntiguedad::para_dias(90), RangoAntiguedad::Dias61a90);
        assert_eq!(RangoAntiguedad::para_dias(91), RangoAntiguedad::Mas90);
    }

    #[test]
    fn debtor_matrix_sorted_by_total() {
        let matriz = antiguedad_por_deudor(&registros());
        let nombres: Vec<&str> = matriz.filas.iter().map(|f| f.nombre.as_str()).collect();
        assert_eq!(nombres, vec!["Globex", "ACME"]);

        let acme = &matriz.filas[1];
        assert_eq!(acme.vigente, 1000.0);
        assert_eq!(acme.dias_31_60, 500.0);
        assert_eq!(acme.total, 1500.0);
        assert_eq!(acme.max_dias_overdue, 40);
        assert_eq!(acme.facturas, 2);

        assert_eq!(matriz.totales.total, 4500.0);
        assert_eq!(matriz.totales.mas_90, 3000.0);
        assert_eq!(matriz.rangos.len(), 5);
    }

    #[test]
    fn line_matrix_groups_missing_line() {
        let matriz = antiguedad_por_linea(&registros());
        assert_eq!(matriz.filas[0].nombre, LINEA_SIN_ASIGNAR);
        assert_eq!(matriz.filas[1].nombre, "Químicos");
        assert!((matriz.filas[1].pct_vencido - 100.0 / 3.0).abs() < 1e-9);
    }
}
