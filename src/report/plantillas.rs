use minijinja::Environment;
use serde::Serialize;

use crate::core::DashboardResult;

use super::helpers;

pub const PLANTILLA_REPORTE_EJECUTIVO: &str = "reporte_ejecutivo.html";
pub const PLANTILLA_CARTA_COBRANZA: &str = "carta_cobranza.txt";

/// Entorno de minijinja con las plantillas embebidas y los filtros de formato.
///
/// Las plantillas `.html` se escapan automáticamente; las `.txt` no.
pub struct MotorPlantillas {
    env: Environment<'static>,
}

impl MotorPlantillas {
    pub fn new() -> DashboardResult<Self> {
        let mut env = Environment::new();

        env.add_filter("moneda", helpers::moneda_filter);
        env.add_filter("compacto", helpers::compacto_filter);
        env.add_filter("porcentaje", helpers::porcentaje_filter);
        env.add_filter("numero", helpers::numero_filter);
        env.add_filter("fecha", helpers::fecha_filter);
        env.add_filter("capitalize", helpers::capitalize_filter);

        env.add_template(
            PLANTILLA_REPORTE_EJECUTIVO,
            include_str!("templates/reporte_ejecutivo.html"),
        )?;
        env.add_template(
            PLANTILLA_CARTA_COBRANZA,
            include_str!("templates/carta_cobranza.txt"),
        )?;

        Ok(MotorPlantillas { env })
    }

    pub fn render<S: Serialize>(&self, plantilla: &str, contexto: S) -> DashboardResult<String> {
        let template = self.env.get_template(plantilla)?;
        Ok(template.render(contexto)?)
    }

    pub fn render_str<S: Serialize>(&self, fuente: &str, contexto: S) -> DashboardResult<String> {
        Ok(self.env.render_str(fuente, contexto)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn filters_are_registered() {
        let motor = MotorPlantillas::new().unwrap();
        let salida = motor
            .render_str(
                "{{ a|moneda }} {{ b|compacto }} {{ c|porcentaje }} {{ d|fecha }}",
                context! { a => 1234.56, b => 2_500_000.0, c => 12.34, d => "2024-01-31" },
            )
            .unwrap();
        assert_eq!(salida, "$1,234.56 2.5M 12.3% 31/01/2024");
    }

    #[test]
    fn integer_values_are_accepted_by_money_filter() {
        let motor = MotorPlantillas::new().unwrap();
        let salida = motor.render_str("{{ 1500|moneda }}", context! {}).unwrap();
        assert_eq!(salida, "$1,500.00");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let motor = MotorPlantillas::new().unwrap();
        assert!(motor.render("no_existe.html", context! {}).is_err());
    }
}
