use serde::{Deserialize, Serialize};

use crate::core::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrativa {
    #[serde(default)]
    pub resumen_ejecutivo: String,
    #[serde(default)]
    pub highlights_clave: Vec<String>,
    #[serde(default)]
    pub areas_atencion: Vec<String>,
    #[serde(default)]
    pub insights_principales: Vec<String>,
    #[serde(default)]
    pub recomendaciones_ejecutivas: Vec<String>,
}

/// Quita los bloques de código markdown que algunos modelos agregan.
pub fn limpiar_bloque_markdown(texto: &str) -> &str {
    let texto = texto.trim();
    if !texto.starts_with("```") {
        return texto;
    }
    let sin_inicio = texto
        .strip_prefix("```json")
        .or_else(|| texto.strip_prefix("```JSON"))
        .or_else(|| texto.strip_prefix("```"))
        .unwrap_or(texto);
    sin_inicio.strip_suffix("```").unwrap_or(sin_inicio).trim()
}

/// Interpreta la respuesta del modelo; las listas faltantes quedan vacías.
pub fn parsear_narrativa(texto: &str) -> DashboardResult<Narrativa> {
    let limpio = limpiar_bloque_markdown(texto);

    let narrativa: Narrativa = match serde_json::from_str(limpio) {
        Ok(n) => n,
        Err(error) => {
            // Texto alrededor del objeto JSON
            let inicio = limpio.find('{');
            let fin = limpio.rfind('}');
            match (inicio, fin) {
                (Some(i), Some(f)) if f > i => serde_json::from_str(&limpio[i..=f])
                    .map_err(|e| DashboardError::Ia(format!("respuesta no es JSON válido: {}", e)))?,
                _ => return Err(DashboardError::Ia(format!("respuesta no es JSON válido: {}", error))),
            }
        }
    };

    if narrativa.resumen_ejecutivo.trim().is_empty() {
        return Err(DashboardError::Ia(
            "la respuesta no incluye resumen_ejecutivo".to_string(),
        ));
    }
    Ok(narrativa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        let texto = "```json\n{\"resumen_ejecutivo\": \"Todo bien\", \"highlights_clave\": [\"a\"]}\n```";
        let narrativa = parsear_narrativa(texto).unwrap();
        assert_eq!(narrativa.resumen_ejecutivo, "Todo bien");
        assert_eq!(narrativa.highlights_clave, vec!["a"]);
        assert!(narrativa.areas_atencion.is_empty());
    }

    #[test]
    fn tolerates_prose_around_object() {
        let texto = "Aquí está el análisis: {\"resumen_ejecutivo\": \"Estable\"} Saludos.";
        assert_eq!(parsear_narrativa(texto).unwrap().resumen_ejecutivo, "Estable");
    }

    #[test]
    fn rejects_missing_summary_and_garbage() {
        assert!(matches!(
            parsear_narrativa("{\"highlights_clave\": []}"),
            Err(DashboardError::Ia(_))
        ));
        assert!(parsear_narrativa("no es json").is_err());
    }

    #[test]
    fn plain_text_is_left_alone() {
        assert_eq!(limpiar_bloque_markdown("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(limpiar_bloque_markdown("```\n{}\n```"), "{}");
    }
}
