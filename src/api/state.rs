use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use moka::future::Cache;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ai::{GeneradorNarrativa, LlmClient, Narrativa};
use crate::core::{AppConfig, DashboardError, DashboardResult, Tabla};
use crate::report::MotorPlantillas;

pub type KeyedRateLimiter = Arc<RateLimiter<String, DashMapStateStore<String>, DefaultClock>>;

/// Una sesión compartida entre peticiones; el caché sólo guarda el puntero.
pub type SesionCompartida = Arc<RwLock<Sesion>>;

/// Tabla normalizada de un archivo subido.
#[derive(Debug, Clone)]
pub struct ArchivoCargado {
    pub nombre: String,
    pub tabla: Tabla,
    pub cargado: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumenArchivo {
    pub nombre: String,
    pub filas: usize,
    pub columnas: Vec<String>,
    pub cargado: DateTime<Utc>,
}

impl From<&ArchivoCargado> for ResumenArchivo {
    fn from(archivo: &ArchivoCargado) -> Self {
        ResumenArchivo {
            nombre: archivo.nombre.clone(),
            filas: archivo.tabla.len(),
            columnas: archivo.tabla.columnas().to_vec(),
            cargado: archivo.cargado,
        }
    }
}

/// Datos de un usuario mientras dura su sesión; nada se persiste.
#[derive(Debug, Clone)]
pub struct Sesion {
    pub id: Uuid,
    pub creada: DateTime<Utc>,
    pub cxc: Option<ArchivoCargado>,
    pub ventas: Option<ArchivoCargado>,
    pub narrativa: Option<Narrativa>,
}

impl Sesion {
    pub fn new() -> Self {
        Sesion {
            id: Uuid::new_v4(),
            creada: Utc::now(),
            cxc: None,
            ventas: None,
            narrativa: None,
        }
    }
}

impl Default for Sesion {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ApiState {
    /// Sesiones vivas; expiran tras `session_idle_secs` sin uso.
    pub sesiones: Cache<Uuid, SesionCompartida>,
    pub plantillas: Arc<MotorPlantillas>,
    pub narrador: Arc<dyn GeneradorNarrativa>,
    pub rate_limiter: KeyedRateLimiter,
    pub config: Arc<AppConfig>,
}

impl ApiState {
    pub fn new(config: AppConfig) -> DashboardResult<Self> {
        let narrador = Arc::new(LlmClient::from_config(&config)?);
        Self::with_narrador(config, narrador)
    }

    /// Permite inyectar otro generador de narrativa (por ejemplo en pruebas).
    pub fn with_narrador(config: AppConfig, narrador: Arc<dyn GeneradorNarrativa>) -> DashboardResult<Self> {
        let plantillas = Arc::new(MotorPlantillas::new()?);

        let por_minuto = NonZeroU32::new(config.ai_rate_limit_per_minute).ok_or_else(|| {
            DashboardError::Configuracion("AI_RATE_LIMIT_PER_MINUTE debe ser mayor que cero".to_string())
        })?;
        let rafaga = NonZeroU32::new(config.ai_rate_limit_burst).unwrap_or(por_minuto);
        let quota = Quota::per_minute(por_minuto).allow_burst(rafaga);
        let rate_limiter = Arc::new(RateLimiter::dashmap_with_clock(quota, &DefaultClock::default()));

        let sesiones = Cache::builder()
            .time_to_idle(Duration::from_secs(config.session_idle_secs))
            .max_capacity(config.max_sessions)
            .eviction_listener(|id: Arc<Uuid>, _sesion, causa| {
                tracing::debug!(sesion = %id, ?causa, "Sesión descartada");
            })
            .build();

        Ok(ApiState {
            sesiones,
            plantillas,
            narrador,
            rate_limiter,
            config: Arc::new(config),
        })
    }
}
