pub mod ai;
pub mod api;
pub mod core;
pub mod cxc;
pub mod format;
pub mod ingest;
pub mod normalize;
pub mod report;
pub mod telemetry;
pub mod ventas;

// Re-export commonly used types
pub use crate::core::{AppConfig, Celda, DashboardError, DashboardResult, Tabla};
pub use cxc::{CarteraCxc, MetricasCxc, RegistroCxc};
pub use ingest::{cargar_tabla, TipoDatos};
pub use ventas::{KpisVentas, RegistroVenta};
