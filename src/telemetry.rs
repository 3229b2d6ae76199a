//! Logging estructurado y contadores de Prometheus.

use once_cell::sync::OnceCell;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing_subscriber::EnvFilter;

pub struct MetricasServicio {
    pub archivos_cargados: IntCounterVec,
    pub reportes_generados: IntCounterVec,
    pub llamadas_ia: IntCounterVec,
}

fn contador(nombre: &str, ayuda: &str, etiquetas: &[&str]) -> prometheus::Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(nombre, ayuda), etiquetas)
}

impl MetricasServicio {
    fn new() -> prometheus::Result<Self> {
        Ok(MetricasServicio {
            archivos_cargados: contador(
                "dashboard_archivos_cargados_total",
                "Archivos cargados por tipo de datos y resultado",
                &["tipo", "resultado"],
            )?,
            reportes_generados: contador(
                "dashboard_reportes_generados_total",
                "Reportes generados por formato",
                &["formato"],
            )?,
            llamadas_ia: contador(
                "dashboard_llamadas_ia_total",
                "Solicitudes de narrativa al proveedor de IA por resultado",
                &["resultado"],
            )?,
        })
    }
}

/// Vacío hasta `registrar_metricas`; mientras tanto los contadores no cuentan.
static METRICAS: OnceCell<MetricasServicio> = OnceCell::new();

pub fn metricas() -> Option<&'static MetricasServicio> {
    METRICAS.get()
}

/// Registra los contadores del servicio y el colector del proceso.
pub fn registrar_metricas(registry: &Registry) -> prometheus::Result<()> {
    let metricas = match METRICAS.get() {
        Some(existentes) => existentes,
        None => {
            let nuevas = MetricasServicio::new()?;
            METRICAS.get_or_init(|| nuevas)
        }
    };
    registry.register(Box::new(metricas.archivos_cargados.clone()))?;
    registry.register(Box::new(metricas.reportes_generados.clone()))?;
    registry.register(Box::new(metricas.llamadas_ia.clone()))?;
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;
    Ok(())
}

pub fn contar_archivo(tipo: &str, resultado: &str) {
    if let Some(m) = metricas() {
        m.archivos_cargados.with_label_values(&[tipo, resultado]).inc();
    }
}

pub fn contar_reporte(formato: &str) {
    if let Some(m) = metricas() {
        m.reportes_generados.with_label_values(&[formato]).inc();
    }
}

pub fn contar_llamada_ia(resultado: &str) {
    if let Some(m) = metricas() {
        m.llamadas_ia.with_label_values(&[resultado]).inc();
    }
}

pub fn exportar_metricas() -> prometheus::Result<Vec<u8>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(buffer)
}

/// `LOG_LEVEL` tiene prioridad; si está vacío se usa `RUST_LOG` y luego `info`.
pub fn init_tracing(log_level: &str) {
    let filter = if log_level.trim().is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_exported_once_registered() {
        let registry = Registry::new();
        registrar_metricas(&registry).unwrap();
        contar_reporte("html");

        let familias = registry.gather();
        assert!(familias
            .iter()
            .any(|f| f.get_name() == "dashboard_reportes_generados_total"));
        assert!(registrar_metricas(&registry).is_err());
    }
}
