//! Normalización de encabezados y alias de columnas.

pub mod aliases;
pub mod columns;

pub use aliases::{aplicar_alias, normalizar_cxc, normalizar_ventas, ALIAS_CXC, ALIAS_VENTAS};
pub use columns::{nombres_unicos, normalizar_columnas, normalizar_nombre};
