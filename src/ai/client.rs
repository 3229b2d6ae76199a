use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::{AppConfig, DashboardError, DashboardResult};

use super::narrativa::{parsear_narrativa, Narrativa};
use super::prompts::{construir_prompt, ContextoNarrativa, PROMPT_SISTEMA};

const TEMPERATURA: f64 = 0.3;

/// Genera la narrativa ejecutiva a partir de las métricas de una sesión.
#[async_trait]
pub trait GeneradorNarrativa: Send + Sync {
    async fn generar_narrativa(&self, contexto: &ContextoNarrativa, api_key: &str) -> DashboardResult<Narrativa>;
}

/// Cliente de chat completions compatible con la API de OpenAI. Sin reintentos.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> DashboardResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(LlmClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> DashboardResult<Self> {
        Self::new(
            &config.openai_base_url,
            &config.openai_model,
            Duration::from_secs(config.openai_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Envía una conversación en modo JSON y devuelve el contenido del primer mensaje.
    pub async fn completar_json(&self, api_key: &str, sistema: &str, prompt: &str) -> DashboardResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": sistema },
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": TEMPERATURA
        });

        let respuesta = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = respuesta.status();
        if !status.is_success() {
            let detalle = respuesta.text().await.unwrap_or_default();
            return Err(DashboardError::Ia(format!(
                "el proveedor respondió {}: {}",
                status, detalle
            )));
        }

        let cuerpo: Value = respuesta.json().await?;
        cuerpo
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| DashboardError::Ia("respuesta sin choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl GeneradorNarrativa for LlmClient {
    async fn generar_narrativa(&self, contexto: &ContextoNarrativa, api_key: &str) -> DashboardResult<Narrativa> {
        if api_key.trim().is_empty() {
            return Err(DashboardError::Configuracion(
                "no hay API key para el proveedor de IA".to_string(),
            ));
        }

        let prompt = construir_prompt(contexto);
        tracing::debug!(modelo = %self.model, caracteres = prompt.len(), "Solicitando narrativa");

        let contenido = self.completar_json(api_key, PROMPT_SISTEMA, &prompt).await?;
        parsear_narrativa(&contenido)
    }
}
