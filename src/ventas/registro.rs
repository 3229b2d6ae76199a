use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{DashboardError, DashboardResult, Tabla};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroVenta {
    pub fecha: Option<NaiveDate>,
    pub valor_usd: f64,
    pub agente: Option<String>,
    pub cliente: Option<String>,
    pub linea_producto: Option<String>,
}

impl RegistroVenta {
    pub fn new(fecha: Option<NaiveDate>, valor_usd: f64) -> Self {
        RegistroVenta {
            fecha,
            valor_usd,
            agente: None,
            cliente: None,
            linea_producto: None,
        }
    }

    pub fn with_agente(mut self, agente: impl Into<String>) -> Self {
        self.agente = Some(agente.into());
        self
    }

    pub fn with_cliente(mut self, cliente: impl Into<String>) -> Self {
        self.cliente = Some(cliente.into());
        self
    }

    pub fn with_linea(mut self, linea: impl Into<String>) -> Self {
        self.linea_producto = Some(linea.into());
        self
    }
}

/// Convierte una tabla de ventas normalizada en registros.
pub fn construir_ventas(tabla: &Tabla) -> DashboardResult<Vec<RegistroVenta>> {
    let valores = tabla.numeros("valor_usd").ok_or_else(|| {
        DashboardError::ColumnaFaltante("valor_usd (ventas_usd, importe, monto, …)".to_string())
    })?;
    let fechas = tabla.fechas("fecha");
    let agentes = tabla.textos("agente");
    let clientes = tabla.textos("cliente");
    let lineas = tabla.textos("linea_producto");

    if fechas.is_none() {
        tracing::warn!("La hoja de ventas no tiene columna de fecha; no habrá series mensuales");
    }

    let ventas = tabla
        .filas()
        .iter()
        .enumerate()
        .filter(|(_, fila)| !fila.iter().all(|c| c.es_vacia()))
        .map(|(idx, _)| RegistroVenta {
            fecha: fechas.as_ref().and_then(|f| f[idx]),
            valor_usd: valores[idx].unwrap_or(0.0),
            agente: agentes.as_ref().and_then(|a| a[idx].clone()),
            cliente: clientes.as_ref().and_then(|c| c[idx].clone()),
            linea_producto: lineas.as_ref().and_then(|l| l[idx].clone()),
        })
        .collect::<Vec<_>>();

    tracing::info!(registros = ventas.len(), "Ventas construidas");
    Ok(ventas)
}
