use chrono::Local;
use serde::Serialize;

use crate::ai::Narrativa;
use crate::core::DashboardResult;
use crate::cxc::metrics::porcentaje;
use crate::cxc::{antiguedad_por_deudor, calcular_metricas_con_umbral, FilaAntiguedad, MetricasCxc, RangoAntiguedad};
use crate::ventas::{calcular_kpis_ventas, ranking_vendedores, EficienciaVendedor, KpisVentas};

use super::plantillas::{MotorPlantillas, PLANTILLA_REPORTE_EJECUTIVO};
use super::DatosReporte;

/// El reporte ejecutivo marca como crítica la cartera con más de 30 días.
pub const UMBRAL_CRITICO_REPORTE: i64 = 30;
pub const TOP_DEUDORES_REPORTE: usize = 10;
pub const TOP_VENDEDORES_REPORTE: usize = 10;
const TOP_KPIS: usize = 10;

#[derive(Debug, Serialize)]
struct RangoResumen {
    etiqueta: &'static str,
    saldo: f64,
    pct: f64,
}

#[derive(Debug, Serialize)]
struct SeccionCxc {
    metricas: MetricasCxc,
    clasificacion: &'static str,
    metodo_overdue: &'static str,
    rangos: Vec<RangoResumen>,
    top_deudores: Vec<FilaAntiguedad>,
}

#[derive(Debug, Serialize)]
struct ContextoEjecutivo<'a> {
    empresa: &'a str,
    fecha_corte: String,
    generado: String,
    narrativa: Option<&'a Narrativa>,
    cxc: Option<SeccionCxc>,
    ventas: Option<KpisVentas>,
    vendedores: Vec<EficienciaVendedor>,
}

/// Genera el reporte ejecutivo como un HTML autocontenido con estilos en línea.
pub fn generar_reporte_ejecutivo(motor: &MotorPlantillas, datos: &DatosReporte<'_>) -> DashboardResult<String> {
    let cxc = datos.cartera.map(|cartera| {
        let metricas = calcular_metricas_con_umbral(&cartera.registros, UMBRAL_CRITICO_REPORTE);
        let matriz = antiguedad_por_deudor(&cartera.registros);
        let rangos = RangoAntiguedad::TODOS
            .iter()
            .map(|rango| {
                let saldo = matriz.totales.saldo_en(*rango);
                RangoResumen {
                    etiqueta: rango.etiqueta(),
                    saldo,
                    pct: porcentaje(saldo, matriz.totales.total),
                }
            })
            .collect();

        SeccionCxc {
            clasificacion: metricas.clasificacion_salud.etiqueta(),
            metodo_overdue: cartera.metodo_overdue.descripcion(),
            rangos,
            top_deudores: matriz.top(TOP_DEUDORES_REPORTE).to_vec(),
            metricas,
        }
    });

    let ventas = datos
        .ventas
        .filter(|v| !v.is_empty())
        .map(|v| calcular_kpis_ventas(v, TOP_KPIS));

    let vendedores = match datos.ventas {
        Some(ventas) if !ventas.is_empty() => {
            let cartera = datos.cartera.map(|c| c.registros.as_slice()).unwrap_or(&[]);
            let mut ranking = ranking_vendedores(ventas, cartera);
            ranking.truncate(TOP_VENDEDORES_REPORTE);
            ranking
        }
        _ => Vec::new(),
    };

    let contexto = ContextoEjecutivo {
        empresa: datos.empresa,
        fecha_corte: datos.fecha_corte.format("%Y-%m-%d").to_string(),
        generado: Local::now().format("%d/%m/%Y %H:%M").to_string(),
        narrativa: datos.narrativa,
        cxc,
        ventas,
        vendedores,
    };

    let html = motor.render(PLANTILLA_REPORTE_EJECUTIVO, &contexto)?;
    tracing::info!(bytes = html.len(), "Reporte ejecutivo generado");
    Ok(html)
}
