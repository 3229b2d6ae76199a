use crate::core::Tabla;

use super::columns::normalizar_columnas;

/// Pares (columna canónica, variantes aceptadas) ya normalizados.
pub type MapaAlias = &'static [(&'static str, &'static [&'static str])];

pub const ALIAS_CXC: MapaAlias = &[
    (
        "saldo_adeudado",
        &[
            "saldo",
            "saldo_usd",
            "adeudo",
            "saldo_adeudado_usd",
            "saldo_pendiente",
            "importe",
            "monto",
        ],
    ),
    ("deudor", &["cliente", "razon_social", "nombre_cliente", "nombre"]),
    ("estatus", &["status", "estado"]),
    (
        "linea_negocio",
        &["linea", "linea_de_negocio", "unidad_de_negocio", "linea_producto"],
    ),
    ("vendedor", &["agente", "ejecutivo", "vendedor_asignado"]),
    ("factura", &["folio", "no_factura", "numero_factura", "num_factura"]),
    ("dias_vencido", &["dias_vencidos"]),
    ("dias_restante", &["dias_restantes"]),
];

pub const ALIAS_VENTAS: MapaAlias = &[
    (
        "valor_usd",
        &[
            "valor",
            "ventas_usd",
            "venta_usd",
            "monto_usd",
            "importe",
            "monto",
            "total",
        ],
    ),
    ("agente", &["vendedor", "ejecutivo"]),
    ("fecha", &["fecha_factura", "fecha_venta", "fecha_emision"]),
    ("cliente", &["razon_social", "nombre_cliente"]),
    (
        "linea_producto",
        &["linea", "linea_de_negocio", "producto", "linea_negocio"],
    ),
];

/// Renombra la primera variante encontrada a su nombre canónico, sólo si el
/// canónico no existe ya.
pub fn aplicar_alias(tabla: &Tabla, alias: MapaAlias) -> Tabla {
    let mut resultado = tabla.clone();
    for (canonico, variantes) in alias {
        if resultado.tiene_columna(canonico) {
            continue;
        }
        if let Some(variante) = resultado.primera_columna(variantes) {
            tracing::debug!("Columna '{}' renombrada a '{}'", variante, canonico);
            resultado.renombrar_columna(variante, canonico);
        }
    }
    resultado
}

pub fn normalizar_cxc(tabla: &Tabla) -> Tabla {
    aplicar_alias(&normalizar_columnas(tabla), ALIAS_CXC)
}

pub fn normalizar_ventas(tabla: &Tabla) -> Tabla {
    aplicar_alias(&normalizar_columnas(tabla), ALIAS_VENTAS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabla(columnas: &[&str]) -> Tabla {
        Tabla::new(columnas.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn saldo_variants_become_saldo_adeudado() {
        for variante in ["Saldo", "SALDO USD", "Adeudo", "saldo_adeudado"] {
            let normalizada = normalizar_cxc(&tabla(&["Cliente", variante]));
            assert!(
                normalizada.tiene_columna("saldo_adeudado"),
                "{} no se reconoció",
                variante
            );
            assert!(normalizada.tiene_columna("deudor"));
        }
    }

    #[test]
    fn existing_canonical_column_is_not_overwritten() {
        let normalizada = normalizar_cxc(&tabla(&["Deudor", "Cliente", "Saldo Adeudado", "Saldo"]));
        assert_eq!(
            normalizada.columnas(),
            &["deudor", "cliente", "saldo_adeudado", "saldo"]
        );
    }

    #[test]
    fn sales_aliases() {
        let normalizada = normalizar_ventas(&tabla(&["Fecha Factura", "Vendedor", "Ventas USD", "Producto"]));
        assert_eq!(
            normalizada.columnas(),
            &["fecha", "agente", "valor_usd", "linea_producto"]
        );
    }
}
