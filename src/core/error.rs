use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Error de lectura: {0}")]
    Lectura(String),

    #[error("Formato de archivo no soportado: {0}")]
    FormatoNoSoportado(String),

    #[error("Columna requerida no encontrada: {0}")]
    ColumnaFaltante(String),

    #[error("Sin datos: {0}")]
    SinDatos(String),

    #[error("Error de exportación: {0}")]
    Exportacion(String),

    #[error("Error de plantilla: {0}")]
    Plantilla(String),

    #[error("Error del servicio de IA: {0}")]
    Ia(String),

    #[error("Error de configuración: {0}")]
    Configuracion(String),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de serialización: {0}")]
    Serializacion(#[from] serde_json::Error),
}

impl From<calamine::Error> for DashboardError {
    fn from(error: calamine::Error) -> Self {
        DashboardError::Lectura(error.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(error: csv::Error) -> Self {
        DashboardError::Lectura(error.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashboardError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        DashboardError::Exportacion(error.to_string())
    }
}

impl From<minijinja::Error> for DashboardError {
    fn from(error: minijinja::Error) -> Self {
        DashboardError::Plantilla(error.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(error: reqwest::Error) -> Self {
        DashboardError::Ia(error.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
