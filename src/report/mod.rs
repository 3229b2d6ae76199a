//! Reportes de salida: HTML ejecutivo, libro de Excel, CSV y cartas de cobranza.

pub mod cartas;
pub mod csv;
pub mod excel;
pub mod helpers;
pub mod html;
pub mod plantillas;

use chrono::NaiveDate;

use crate::ai::Narrativa;
use crate::cxc::CarteraCxc;
use crate::ventas::RegistroVenta;

pub use self::cartas::{generar_cartas, generar_cartas_txt};
pub use self::csv::generar_csv_cxc;
pub use self::excel::generar_excel;
pub use self::html::{generar_reporte_ejecutivo, UMBRAL_CRITICO_REPORTE};
pub use self::plantillas::MotorPlantillas;

/// Lo que una sesión tiene cargado al momento de generar un reporte.
#[derive(Debug, Clone, Copy)]
pub struct DatosReporte<'a> {
    pub empresa: &'a str,
    pub fecha_corte: NaiveDate,
    pub cartera: Option<&'a CarteraCxc>,
    pub ventas: Option<&'a [RegistroVenta]>,
    pub narrativa: Option<&'a Narrativa>,
}
