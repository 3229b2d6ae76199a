//! Ventas: KPIs, acumulados YTD y eficiencia por vendedor.

pub mod kpis;
pub mod registro;
pub mod vendedores;

pub use kpis::{calcular_kpis_ventas, comparativo_ytd, ventas_ytd, ComparativoYtd, KpisVentas, Participacion};
pub use registro::{construir_ventas, RegistroVenta};
pub use vendedores::{ranking_vendedores, EficienciaVendedor, UMBRAL_CRITICO_VENDEDORES};
