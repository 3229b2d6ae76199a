use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::cxc::metrics::{filtrar_no_pagados, porcentaje};
use crate::cxc::RegistroCxc;

use super::kpis::SIN_ASIGNAR;
use super::registro::RegistroVenta;

/// En el ranking de vendedores la cartera crítica empieza después de 90 días.
pub const UMBRAL_CRITICO_VENDEDORES: i64 = 90;

const PESO_VENTAS: f64 = 0.6;
const PESO_CARTERA_SANA: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EficienciaVendedor {
    pub posicion: usize,
    pub vendedor: String,
    pub ventas: f64,
    pub operaciones: usize,
    pub ticket_promedio: f64,
    pub clientes_unicos: usize,
    pub cartera_total: f64,
    pub cartera_vencida: f64,
    pub cartera_critica: f64,
    pub pct_vencida: f64,
    pub indice_eficiencia: f64,
}

#[derive(Default)]
struct Acumulado<'a> {
    ventas: f64,
    operaciones: usize,
    clientes: HashSet<&'a str>,
    cartera_total: f64,
    cartera_vencida: f64,
    cartera_critica: f64,
}

/// Ranking de vendedores combinando ventas y la cartera que tienen asignada.
///
/// El índice de eficiencia pondera la participación relativa en ventas (60%)
/// y la proporción de cartera al corriente (40%).
pub fn ranking_vendedores(ventas: &[RegistroVenta], cartera: &[RegistroCxc]) -> Vec<EficienciaVendedor> {
    let mut por_vendedor: BTreeMap<&str, Acumulado> = BTreeMap::new();

    for venta in ventas {
        let nombre = venta.agente.as_deref().map(str::trim).unwrap_or(SIN_ASIGNAR);
        let acumulado = por_vendedor.entry(nombre).or_default();
        acumulado.ventas += venta.valor_usd;
        acumulado.operaciones += 1;
        if let Some(cliente) = venta.cliente.as_deref() {
            acumulado.clientes.insert(cliente);
        }
    }

    for registro in filtrar_no_pagados(cartera) {
        let nombre = registro.vendedor.as_deref().map(str::trim).unwrap_or(SIN_ASIGNAR);
        let acumulado = por_vendedor.entry(nombre).or_default();
        acumulado.cartera_total += registro.saldo_adeudado;
        if registro.dias_overdue > 0 {
            acumulado.cartera_vencida += registro.saldo_adeudado;
        }
        if registro.dias_overdue > UMBRAL_CRITICO_VENDEDORES {
            acumulado.cartera_critica += registro.saldo_adeudado;
        }
    }

    let max_ventas = por_vendedor
        .values()
        .map(|a| a.ventas)
        .fold(0.0_f64, f64::max);

    let mut ranking: Vec<EficienciaVendedor> = por_vendedor
        .into_iter()
        .map(|(vendedor, a)| {
            let pct_vencida = porcentaje(a.cartera_vencida, a.cartera_total);
            let participacion_ventas = porcentaje(a.ventas, max_ventas);
            EficienciaVendedor {
                posicion: 0,
                vendedor: vendedor.to_string(),
                ventas: a.ventas,
                operaciones: a.operaciones,
                ticket_promedio: if a.operaciones > 0 {
                    a.ventas / a.operaciones as f64
                } else {
                    0.0
                },
                clientes_unicos: a.clientes.len(),
                cartera_total: a.cartera_total,
                cartera_vencida: a.cartera_vencida,
                cartera_critica: a.cartera_critica,
                pct_vencida,
                indice_eficiencia: PESO_VENTAS * participacion_ventas
                    + PESO_CARTERA_SANA * (100.0 - pct_vencida),
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.indice_eficiencia
            .partial_cmp(&a.indice_eficiencia)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.ventas
                    .partial_cmp(&a.ventas)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.vendedor.cmp(&b.vendedor))
    });
    for (idx, fila) in ranking.iter_mut().enumerate() {
        fila.posicion = idx + 1;
    }
    ranking
}
