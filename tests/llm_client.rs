/// Cliente de IA contra un servidor simulado; no sale a la red.
use std::time::Duration;

use chrono::NaiveDate;
use fradma_dashboard::ai::{ContextoNarrativa, GeneradorNarrativa, LlmClient};
use fradma_dashboard::core::DashboardError;
use fradma_dashboard::cxc::{CarteraCxc, MetodoOverdue, RegistroCxc};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contexto() -> ContextoNarrativa {
    let cartera = CarteraCxc {
        registros: vec![
            RegistroCxc::new("ACME", 1000.0, 10),
            RegistroCxc::new("Globex", 500.0, 95),
        ],
        metodo_overdue: MetodoOverdue::DiasVencido,
        fecha_corte: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    };
    ContextoNarrativa::construir("Fradma", cartera.fecha_corte, Some(&cartera), None)
}

fn respuesta_chat(contenido: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": contenido },
                "finish_reason": "stop"
            }
        ]
    })
}

fn cliente(server: &MockServer) -> LlmClient {
    LlmClient::new(&server.uri(), "gpt-4o-mini", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn parses_narrative_from_chat_completion() {
    let mock_server = MockServer::start().await;

    let contenido = serde_json::json!({
        "resumen_ejecutivo": "La cartera está sana.",
        "highlights_clave": ["67% vigente"],
        "areas_atencion": ["Globex supera 90 días"],
        "insights_principales": [],
        "recomendaciones_ejecutivas": ["Llamar a Globex"]
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("sk-prueba"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(respuesta_chat(&contenido)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let narrativa = cliente(&mock_server).generar_narrativa(&contexto(), "sk-prueba").await.unwrap();
    assert_eq!(narrativa.resumen_ejecutivo, "La cartera está sana.");
    assert_eq!(narrativa.areas_atencion, vec!["Globex supera 90 días".to_string()]);
    assert!(narrativa.insights_principales.is_empty());
}

#[tokio::test]
async fn strips_markdown_fences() {
    let mock_server = MockServer::start().await;
    let contenido = "```json\n{\"resumen_ejecutivo\": \"Todo en orden\"}\n```";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(respuesta_chat(contenido)))
        .mount(&mock_server)
        .await;

    let narrativa = cliente(&mock_server).generar_narrativa(&contexto(), "sk-prueba").await.unwrap();
    assert_eq!(narrativa.resumen_ejecutivo, "Todo en orden");
    assert!(narrativa.highlights_clave.is_empty());
}

#[tokio::test]
async fn provider_error_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = cliente(&mock_server).generar_narrativa(&contexto(), "sk-prueba").await.unwrap_err();
    match error {
        DashboardError::Ia(mensaje) => {
            assert!(mensaje.contains("500"));
            assert!(mensaje.contains("upstream exploded"));
        }
        otro => panic!("error inesperado: {:?}", otro),
    }
}

#[tokio::test]
async fn empty_key_never_calls_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let resultado = cliente(&mock_server).generar_narrativa(&contexto(), "  ").await;
    assert!(matches!(resultado, Err(DashboardError::Configuracion(_))));
}
