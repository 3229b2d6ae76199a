use chrono::NaiveDate;
use serde::Serialize;

use crate::cxc::{antiguedad_por_deudor, calcular_metricas_basicas, CarteraCxc, MetricasCxc};
use crate::ventas::{calcular_kpis_ventas, ranking_vendedores, ComparativoYtd, Participacion, RegistroVenta};

const TOP_CONTEXTO: usize = 5;

pub const PROMPT_SISTEMA: &str = "Eres un analista financiero senior que redacta resúmenes ejecutivos \
para la dirección general. Respondes únicamente con un objeto JSON válido, en español.";

const PLANTILLA_PROMPT: &str = r#"Analiza los siguientes indicadores financieros de {empresa} con fecha de corte {fecha_corte}.

DATOS:
{datos}

Devuelve un objeto JSON con exactamente estas llaves:
{
  "resumen_ejecutivo": "párrafo de 3 a 5 oraciones con la situación general",
  "highlights_clave": ["logros o cifras positivas relevantes"],
  "areas_atencion": ["riesgos o indicadores que requieren seguimiento"],
  "insights_principales": ["observaciones que no son evidentes a simple vista"],
  "recomendaciones_ejecutivas": ["acciones concretas y priorizadas"]
}

Usa montos en dólares con separador de miles, cita porcentajes con un decimal
y no inventes cifras que no estén en los datos."#;

#[derive(Debug, Clone, Serialize)]
pub struct DeudorPrincipal {
    pub deudor: String,
    pub total: f64,
    pub vencido: f64,
    pub max_dias_overdue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendedorPrincipal {
    pub vendedor: String,
    pub ventas: f64,
    pub pct_vencida: f64,
    pub indice_eficiencia: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumenVentas {
    pub total_ventas: f64,
    pub num_transacciones: usize,
    pub ticket_promedio: f64,
    pub clientes_unicos: usize,
    pub agentes_activos: usize,
    pub comparativo_ytd: Option<ComparativoYtd>,
    pub top_clientes: Vec<Participacion>,
    pub top_lineas: Vec<Participacion>,
}

/// Cifras que se envían al modelo; nunca se mandan registros individuales.
#[derive(Debug, Clone, Serialize)]
pub struct ContextoNarrativa {
    pub empresa: String,
    pub fecha_corte: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxc: Option<MetricasCxc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_deudores: Vec<DeudorPrincipal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ventas: Option<ResumenVentas>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_vendedores: Vec<VendedorPrincipal>,
}

impl ContextoNarrativa {
    pub fn construir(
        empresa: &str,
        fecha_corte: NaiveDate,
        cartera: Option<&CarteraCxc>,
        ventas: Option<&[RegistroVenta]>,
    ) -> Self {
        let cxc = cartera.map(|c| calcular_metricas_basicas(&c.registros));
        let top_deudores = cartera
            .map(|c| {
                antiguedad_por_deudor(&c.registros)
                    .top(TOP_CONTEXTO)
                    .iter()
                    .map(|f| DeudorPrincipal {
                        deudor: f.nombre.clone(),
                        total: f.total,
                        vencido: f.vencido,
                        max_dias_overdue: f.max_dias_overdue,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ventas = ventas.filter(|v| !v.is_empty());
        let resumen_ventas = ventas.map(|v| {
            let kpis = calcular_kpis_ventas(v, TOP_CONTEXTO);
            ResumenVentas {
                total_ventas: kpis.total_ventas,
                num_transacciones: kpis.num_transacciones,
                ticket_promedio: kpis.ticket_promedio,
                clientes_unicos: kpis.clientes_unicos,
                agentes_activos: kpis.agentes_activos,
                comparativo_ytd: kpis.comparativo_ytd,
                top_clientes: kpis.por_cliente,
                top_lineas: kpis.por_linea,
            }
        });
        let top_vendedores = ventas
            .map(|v| {
                let registros = cartera.map(|c| c.registros.as_slice()).unwrap_or(&[]);
                ranking_vendedores(v, registros)
                    .into_iter()
                    .take(TOP_CONTEXTO)
                    .map(|e| VendedorPrincipal {
                        vendedor: e.vendedor,
                        ventas: e.ventas,
                        pct_vencida: e.pct_vencida,
                        indice_eficiencia: e.indice_eficiencia,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ContextoNarrativa {
            empresa: empresa.to_string(),
            fecha_corte,
            cxc,
            top_deudores,
            ventas: resumen_ventas,
            top_vendedores,
        }
    }

    pub fn tiene_datos(&self) -> bool {
        self.cxc.is_some() || self.ventas.is_some()
    }
}

/// Inserta las métricas como JSON legible dentro de la plantilla fija.
pub fn construir_prompt(contexto: &ContextoNarrativa) -> String {
    let datos = serde_json::to_string_pretty(contexto).unwrap_or_else(|e| {
        tracing::warn!("No se pudieron serializar las métricas para el prompt: {}", e);
        "{}".to_string()
    });

    PLANTILLA_PROMPT
        .replace("{empresa}", &contexto.empresa)
        .replace("{fecha_corte}", &contexto.fecha_corte.format("%d/%m/%Y").to_string())
        .replace("{datos}", &datos)
}
