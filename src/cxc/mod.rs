//! Cuentas por cobrar: días de atraso, métricas de cartera y antigüedad.

pub mod aging;
pub mod metrics;
pub mod overdue;
pub mod registro;

pub use aging::{antiguedad_por_deudor, antiguedad_por_linea, FilaAntiguedad, MatrizAntiguedad, RangoAntiguedad};
pub use metrics::{
    calcular_metricas_basicas, calcular_metricas_con_umbral, calcular_score_salud,
    clasificar_score_salud, filtrar_no_pagados, ClasificacionSalud, MetricasCxc,
    UMBRAL_ALTO_RIESGO, UMBRAL_CRITICO_KPI,
};
pub use overdue::{calcular_dias_overdue, estimar_dias_overdue, metodo_dias_overdue, MetodoOverdue};
pub use registro::{construir_cartera, CarteraCxc, RegistroCxc};
