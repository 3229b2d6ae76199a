use std::collections::HashSet;

use serde::Serialize;

use super::registro::RegistroCxc;

/// Días a partir de los cuales la cartera se considera crítica en el tablero de KPIs.
pub const UMBRAL_CRITICO_KPI: i64 = 30;
/// Más de 90 días: alto riesgo.
pub const UMBRAL_ALTO_RIESGO: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClasificacionSalud {
    Excelente,
    Bueno,
    Regular,
    Malo,
    #[serde(rename = "Crítico")]
    Critico,
}

impl ClasificacionSalud {
    pub fn etiqueta(&self) -> &'static str {
        match self {
            ClasificacionSalud::Excelente => "Excelente",
            ClasificacionSalud::Bueno => "Bueno",
            ClasificacionSalud::Regular => "Regular",
            ClasificacionSalud::Malo => "Malo",
            ClasificacionSalud::Critico => "Crítico",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ClasificacionSalud::Excelente => "#2e7d32",
            ClasificacionSalud::Bueno => "#7cb342",
            ClasificacionSalud::Regular => "#f9a825",
            ClasificacionSalud::Malo => "#ef6c00",
            ClasificacionSalud::Critico => "#c62828",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricasCxc {
    pub total_adeudado: f64,
    pub vigente: f64,
    pub vencida: f64,
    pub vencida_0_30: f64,
    pub vencida_31_60: f64,
    pub vencida_61_90: f64,
    pub alto_riesgo: f64,
    pub critica: f64,
    pub umbral_critico_dias: i64,
    pub pct_vigente: f64,
    pub pct_vencida: f64,
    pub pct_critica: f64,
    pub pct_alto_riesgo: f64,
    pub score_salud: f64,
    pub clasificacion_salud: ClasificacionSalud,
    pub color_salud: &'static str,
    pub num_registros: usize,
    pub num_deudores: usize,
}

/// Registros cuyo estatus no indica que ya se pagaron.
pub fn filtrar_no_pagados(registros: &[RegistroCxc]) -> Vec<&RegistroCxc> {
    registros.iter().filter(|r| !r.esta_pagado()).collect()
}

/// Porcentaje protegido contra división entre cero.
pub fn porcentaje(parte: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        0.0
    } else {
        parte / total * 100.0
    }
}

/// `pct_vigente * 0.7 + max(0, 100 - pct_critica * 2) * 0.3`, acotado a [0, 100].
pub fn calcular_score_salud(pct_vigente: f64, pct_critica: f64) -> f64 {
    let componente_critico = (100.0 - pct_critica * 2.0).max(0.0);
    let score = pct_vigente * 0.7 + componente_critico * 0.3;
    score.clamp(0.0, 100.0)
}

pub fn clasificar_score_salud(score: f64) -> ClasificacionSalud {
    if score >= 80.0 {
        ClasificacionSalud::Excelente
    } else if score >= 60.0 {
        ClasificacionSalud::Bueno
    } else if score >= 40.0 {
        ClasificacionSalud::Regular
    } else if score >= 20.0 {
        ClasificacionSalud::Malo
    } else {
        ClasificacionSalud::Critico
    }
}

pub fn calcular_metricas_basicas(registros: &[RegistroCxc]) -> MetricasCxc {
    calcular_metricas_con_umbral(registros, UMBRAL_CRITICO_KPI)
}

/// Igual que [`calcular_metricas_basicas`] pero con el umbral de cartera
/// crítica propio de cada reporte.
pub fn calcular_metricas_con_umbral(registros: &[RegistroCxc], umbral_critico: i64) -> MetricasCxc {
    let pendientes = filtrar_no_pagados(registros);

    let mut total = 0.0;
    let mut vigente = 0.0;
    let mut vencida = 0.0;
    let mut vencida_0_30 = 0.0;
    let mut vencida_31_60 = 0.0;
    let mut vencida_61_90 = 0.0;
    let mut alto_riesgo = 0.0;
    let mut critica = 0.0;

    for registro in &pendientes {
        let saldo = registro.saldo_adeudado;
        let dias = registro.dias_overdue;
        total += saldo;

        if dias <= 0 {
            vigente += saldo;
        } else {
            vencida += saldo;
            match dias {
                1..=30 => vencida_0_30 += saldo,
                31..=60 => vencida_31_60 += saldo,
                61..=90 => vencida_61_90 += saldo,
                _ => alto_riesgo += saldo,
            }
        }

        if dias > umbral_critico {
            critica += saldo;
        }
    }

    let pct_vigente = porcentaje(vigente, total);
    let pct_critica = porcentaje(critica, total);
    let score_salud = calcular_score_salud(pct_vigente, pct_critica);
    let clasificacion_salud = clasificar_score_salud(score_salud);

    let num_deudores = pendientes
        .iter()
        .map(|r| r.deudor.as_str())
        .collect::<HashSet<_>>()
        .len();

    MetricasCxc {
        total_adeudado: total,
        vigente,
        vencida,
        vencida_0_30,
        vencida_31_60,
        vencida_61_90,
        alto_riesgo,
        critica,
        umbral_critico_dias: umbral_critico,
        pct_vigente,
        pct_vencida: porcentaje(vencida, total),
        pct_critica,
        pct_alto_riesgo: porcentaje(alto_riesgo, total),
        score_salud,
        clasificacion_salud,
        color_salud: clasificacion_salud.color(),
        num_registros: pendientes.len(),
        num_deudores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cartera(saldos: &[f64], dias: &[i64]) -> Vec<RegistroCxc> {
        saldos
            .iter()
            .zip(dias)
            .enumerate()
            .map(|(i, (s, d))| RegistroCxc::new(format!("Deudor {}", i), *s, *d))
            .collect()
    }

    #[test]
    fn basic_metrics_bucket_balances() {
        let registros = cartera(&[1000.0, 2000.0, 3000.0, 4000.0], &[-10, 15, 45, 120]);
        let m = calcular_metricas_basicas(&registros);

        assert_eq!(m.total_adeudado, 10_000.0);
        assert_eq!(m.vigente, 1000.0);
        assert_eq!(m.vencida, 9000.0);
        assert_eq!(m.critica, 7000.0);
        assert_eq!(m.alto_riesgo, 4000.0);
        assert_eq!(m.vencida_0_30, 2000.0);
        assert_eq!(m.vencida_31_60, 3000.0);
        assert_eq!(m.vencida_61_90, 0.0);
        assert!((m.pct_vigente + m.pct_vencida - 100.0).abs() < 1e-9);
        assert_eq!(m.num_deudores, 4);
    }

    #[test]
    fn paid_rows_are_excluded() {
        let mut registros = cartera(&[1000.0, 5000.0], &[0, 200]);
        registros[1].estatus = Some("Pagado".to_string());
        let m = calcular_metricas_basicas(&registros);
        assert_eq!(m.total_adeudado, 1000.0);
        assert_eq!(m.alto_riesgo, 0.0);
        assert_eq!(m.num_registros, 1);
    }

    #[test]
    fn empty_portfolio_has_zero_percentages() {
        let m = calcular_metricas_basicas(&[]);
        assert_eq!(m.total_adeudado, 0.0);
        assert_eq!(m.pct_vigente, 0.0);
        assert_eq!(m.pct_vencida, 0.0);
        assert_eq!(m.pct_critica, 0.0);
    }

    #[test]
    fn custom_threshold_changes_only_critica() {
        let registros = cartera(&[1000.0, 2000.0, 3000.0, 4000.0], &[-10, 15, 45, 120]);
        let m = calcular_metricas_con_umbral(&registros, 90);
        assert_eq!(m.critica, 4000.0);
        assert_eq!(m.vencida, 9000.0);
        assert_eq!(m.umbral_critico_dias, 90);
    }

    #[test]
    fn health_score_bounds() {
        assert_eq!(calcular_score_salud(100.0, 0.0), 100.0);
        let peor = calcular_score_salud(0.0, 100.0);
        assert!((0.0..50.0).contains(&peor));
        assert_eq!(calcular_score_salud(150.0, -10.0), 100.0);
    }

    #[test]
    fn health_labels_follow_thresholds() {
        assert_eq!(clasificar_score_salud(80.0), ClasificacionSalud::Excelente);
        assert_eq!(clasificar_score_salud(79.9), ClasificacionSalud::Bueno);
        assert_eq!(clasificar_score_salud(60.0), ClasificacionSalud::Bueno);
        assert_eq!(clasificar_score_salud(40.0), ClasificacionSalud::Regular);
        assert_eq!(clasificar_score_salud(20.0), ClasificacionSalud::Malo);
        assert_eq!(clasificar_score_salud(19.99), ClasificacionSalud::Critico);
        assert_eq!(ClasificacionSalud::Critico.etiqueta(), "Crítico");
    }
}
