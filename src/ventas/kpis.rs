use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::cxc::metrics::porcentaje;

use super::registro::RegistroVenta;

pub const SIN_ASIGNAR: &str = "Sin asignar";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuntoMensual {
    pub periodo: String,
    pub anio: i32,
    pub mes: u32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participacion {
    pub nombre: String,
    pub total: f64,
    pub operaciones: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuntoYtd {
    pub mes: u32,
    pub ventas: f64,
    pub acumulado: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerieYtd {
    pub anio: i32,
    pub meses: Vec<PuntoYtd>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativoYtd {
    pub fecha_corte: NaiveDate,
    pub anio_actual: i32,
    pub anio_anterior: i32,
    pub ytd_actual: f64,
    pub ytd_anterior: f64,
    /// `None` cuando el año anterior no tiene ventas.
    pub variacion_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpisVentas {
    pub total_ventas: f64,
    pub num_transacciones: usize,
    pub ticket_promedio: f64,
    pub clientes_unicos: usize,
    pub agentes_activos: usize,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub ventas_mensuales: Vec<PuntoMensual>,
    pub por_agente: Vec<Participacion>,
    pub por_cliente: Vec<Participacion>,
    pub por_linea: Vec<Participacion>,
    pub ytd: Vec<SerieYtd>,
    pub comparativo_ytd: Option<ComparativoYtd>,
}

/// KPIs generales de ventas; `top` limita los rankings (0 = sin límite).
pub fn calcular_kpis_ventas(ventas: &[RegistroVenta], top: usize) -> KpisVentas {
    let total_ventas: f64 = ventas.iter().map(|v| v.valor_usd).sum();
    let num_transacciones = ventas.len();
    let ticket_promedio = if num_transacciones > 0 {
        total_ventas / num_transacciones as f64
    } else {
        0.0
    };

    let clientes_unicos = ventas
        .iter()
        .filter_map(|v| v.cliente.as_deref())
        .collect::<HashSet<_>>()
        .len();
    let agentes_activos = ventas
        .iter()
        .filter_map(|v| v.agente.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let fechas = ventas.iter().filter_map(|v| v.fecha);
    let fecha_inicio = fechas.clone().min();
    let fecha_fin = fechas.max();

    KpisVentas {
        total_ventas,
        num_transacciones,
        ticket_promedio,
        clientes_unicos,
        agentes_activos,
        fecha_inicio,
        fecha_fin,
        ventas_mensuales: ventas_mensuales(ventas),
        por_agente: participacion(ventas, |v| v.agente.as_deref(), top),
        por_cliente: participacion(ventas, |v| v.cliente.as_deref(), top),
        por_linea: participacion(ventas, |v| v.linea_producto.as_deref(), top),
        ytd: ventas_ytd(ventas),
        comparativo_ytd: comparativo_ytd(ventas),
    }
}

pub fn ventas_mensuales(ventas: &[RegistroVenta]) -> Vec<PuntoMensual> {
    let mut por_mes: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for venta in ventas {
        if let Some(fecha) = venta.fecha {
            *por_mes.entry((fecha.year(), fecha.month())).or_insert(0.0) += venta.valor_usd;
        }
    }

    por_mes
        .into_iter()
        .map(|((anio, mes), total)| PuntoMensual {
            periodo: format!("{:04}-{:02}", anio, mes),
            anio,
            mes,
            total,
        })
        .collect()
}

/// Total por clave, de mayor a menor, con su porcentaje del total.
pub fn participacion<'a, F>(ventas: &'a [RegistroVenta], clave: F, top: usize) -> Vec<Participacion>
where
    F: Fn(&'a RegistroVenta) -> Option<&'a str>,
{
    let total: f64 = ventas.iter().map(|v| v.valor_usd).sum();
    let mut grupos: HashMap<&str, (f64, usize)> = HashMap::new();
    for venta in ventas {
        let nombre = clave(venta).unwrap_or(SIN_ASIGNAR);
        let entrada = grupos.entry(nombre).or_insert((0.0, 0));
        entrada.0 += venta.valor_usd;
        entrada.1 += 1;
    }

    let mut resultado: Vec<Participacion> = grupos
        .into_iter()
        .map(|(nombre, (suma, operaciones))| Participacion {
            nombre: nombre.to_string(),
            total: suma,
            operaciones,
            pct: porcentaje(suma, total),
        })
        .collect();

    resultado.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.nombre.cmp(&b.nombre))
    });
    if top > 0 {
        resultado.truncate(top);
    }
    resultado
}

/// Ventas acumuladas mes a mes dentro de cada año.
pub fn ventas_ytd(ventas: &[RegistroVenta]) -> Vec<SerieYtd> {
    let mut por_anio: BTreeMap<i32, [f64; 12]> = BTreeMap::new();
    let mut ultimo_mes: HashMap<i32, u32> = HashMap::new();

    for venta in ventas {
        if let Some(fecha) = venta.fecha {
            por_anio.entry(fecha.year()).or_insert([0.0; 12])[fecha.month0() as usize] +=
                venta.valor_usd;
            let ultimo = ultimo_mes.entry(fecha.year()).or_insert(0);
            *ultimo = (*ultimo).max(fecha.month());
        }
    }

    por_anio
        .into_iter()
        .map(|(anio, meses)| {
            let hasta = ultimo_mes.get(&anio).copied().unwrap_or(12);
            let mut acumulado = 0.0;
            let puntos: Vec<PuntoYtd> = (1..=hasta)
                .map(|mes| {
                    let ventas_mes = meses[(mes - 1) as usize];
                    acumulado += ventas_mes;
                    PuntoYtd {
                        mes,
                        ventas: ventas_mes,
                        acumulado,
                    }
                })
                .collect();
            SerieYtd {
                anio,
                total: acumulado,
                meses: puntos,
            }
        })
        .collect()
}

fn mismo_dia_anio_anterior(fecha: NaiveDate) -> Option<NaiveDate> {
    let anio = fecha.year() - 1;
    NaiveDate::from_ymd_opt(anio, fecha.month(), fecha.day())
        // 29 de febrero
        .or_else(|| NaiveDate::from_ymd_opt(anio, fecha.month(), fecha.day() - 1))
}

/// YTD del último año con ventas contra el mismo periodo del año anterior.
pub fn comparativo_ytd(ventas: &[RegistroVenta]) -> Option<ComparativoYtd> {
    let fecha_corte = ventas.iter().filter_map(|v| v.fecha).max()?;
    let corte_anterior = mismo_dia_anio_anterior(fecha_corte)?;
    let anio_actual = fecha_corte.year();
    let anio_anterior = anio_actual - 1;

    let mut ytd_actual = 0.0;
    let mut ytd_anterior = 0.0;
    for venta in ventas {
        let Some(fecha) = venta.fecha else { continue };
        if fecha.year() == anio_actual && fecha <= fecha_corte {
            ytd_actual += venta.valor_usd;
        } else if fecha.year() == anio_anterior && fecha <= corte_anterior {
            ytd_anterior += venta.valor_usd;
        }
    }

    let variacion_pct = if ytd_anterior > 0.0 {
        Some((ytd_actual - ytd_anterior) / ytd_anterior * 100.0)
    } else {
        None
    };

    Some(ComparativoYtd {
        fecha_corte,
        anio_actual,
        anio_anterior,
        ytd_actual,
        ytd_anterior,
        variacion_pct,
    })
}
