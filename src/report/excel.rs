use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::core::{DashboardError, DashboardResult};
use crate::cxc::{
    antiguedad_por_deudor, antiguedad_por_linea, calcular_metricas_basicas, CarteraCxc, MatrizAntiguedad,
    RangoAntiguedad,
};
use crate::ventas::{calcular_kpis_ventas, ranking_vendedores, RegistroVenta};

use super::DatosReporte;

pub const HOJA_RESUMEN: &str = "Resumen";
pub const HOJA_ANTIGUEDAD: &str = "Antiguedad";
pub const HOJA_DETALLE: &str = "Detalle CxC";
pub const HOJA_VENTAS: &str = "Ventas";
pub const HOJA_VENDEDORES: &str = "Vendedores";

const TOP_VENTAS: usize = 20;

struct Formatos {
    titulo: Format,
    encabezado: Format,
    celda: Format,
    moneda: Format,
    porcentaje: Format,
    total: Format,
    total_moneda: Format,
}

impl Formatos {
    fn new() -> Self {
        Formatos {
            titulo: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Left),
            encabezado: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0x4472C4))
                .set_font_color(Color::White)
                .set_border(FormatBorder::Thin),
            celda: Format::new().set_border(FormatBorder::Thin),
            moneda: Format::new()
                .set_num_format("$#,##0.00")
                .set_border(FormatBorder::Thin),
            porcentaje: Format::new()
                .set_num_format("0.0%")
                .set_border(FormatBorder::Thin),
            total: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xF0F0F0))
                .set_border(FormatBorder::Thin),
            total_moneda: Format::new()
                .set_bold()
                .set_num_format("$#,##0.00")
                .set_background_color(Color::RGB(0xF0F0F0))
                .set_border(FormatBorder::Thin),
        }
    }
}

/// Valor de una celda de salida con el formato que le corresponde.
enum Valor<'a> {
    Texto(&'a str),
    Entero(i64),
    Moneda(f64),
    Porcentaje(f64),
}

/// Libro en construcción: una hoja activa a la vez y un cursor de fila.
struct LibroExcel {
    workbook: Workbook,
    hoja_actual: Option<Worksheet>,
    fila: u32,
    formatos: Formatos,
}

impl LibroExcel {
    fn new() -> Self {
        LibroExcel {
            workbook: Workbook::new(),
            hoja_actual: None,
            fila: 0,
            formatos: Formatos::new(),
        }
    }

    fn nueva_hoja(&mut self, nombre: &str) -> DashboardResult<()> {
        if let Some(hoja) = self.hoja_actual.take() {
            self.workbook.push_worksheet(hoja);
        }
        let mut hoja = Worksheet::new();
        hoja.set_name(nombre)?;
        self.hoja_actual = Some(hoja);
        self.fila = 0;
        Ok(())
    }

    fn hoja(&mut self) -> DashboardResult<&mut Worksheet> {
        self.hoja_actual
            .as_mut()
            .ok_or_else(|| DashboardError::Exportacion("No hay hoja de trabajo activa".to_string()))
    }

    fn titulo(&mut self, texto: &str) -> DashboardResult<()> {
        let fila = self.fila;
        let formato = self.formatos.titulo.clone();
        self.hoja()?.write_string_with_format(fila, 0, texto, &formato)?;
        self.fila += 2;
        Ok(())
    }

    fn encabezados(&mut self, columnas: &[&str]) -> DashboardResult<()> {
        let fila = self.fila;
        let formato = self.formatos.encabezado.clone();
        let hoja = self.hoja()?;
        for (col, nombre) in columnas.iter().enumerate() {
            hoja.write_string_with_format(fila, col as u16, *nombre, &formato)?;
        }
        self.fila += 1;
        Ok(())
    }

    fn fila_valores(&mut self, valores: &[Valor<'_>], resaltar: bool) -> DashboardResult<()> {
        let fila = self.fila;
        let (texto, moneda, porcentaje) = if resaltar {
            (
                self.formatos.total.clone(),
                self.formatos.total_moneda.clone(),
                self.formatos.total.clone().set_num_format("0.0%"),
            )
        } else {
            (
                self.formatos.celda.clone(),
                self.formatos.moneda.clone(),
                self.formatos.porcentaje.clone(),
            )
        };

        let hoja = self.hoja()?;
        for (col, valor) in valores.iter().enumerate() {
            let col = col as u16;
            match valor {
                Valor::Texto(t) => {
                    hoja.write_string_with_format(fila, col, *t, &texto)?;
                }
                Valor::Entero(n) => {
                    hoja.write_number_with_format(fila, col, *n as f64, &texto)?;
                }
                Valor::Moneda(m) => {
                    hoja.write_number_with_format(fila, col, *m, &moneda)?;
                }
                // Los porcentajes llegan en escala 0-100
                Valor::Porcentaje(p) => {
                    hoja.write_number_with_format(fila, col, *p / 100.0, &porcentaje)?;
                }
            }
        }
        self.fila += 1;
        Ok(())
    }

    fn anchos(&mut self, anchos: &[f64]) -> DashboardResult<()> {
        let hoja = self.hoja()?;
        for (col, ancho) in anchos.iter().enumerate() {
            hoja.set_column_width(col as u16, *ancho)?;
        }
        Ok(())
    }

    fn filtro_y_congelar(&mut self, fila_encabezado: u32, columnas: u16) -> DashboardResult<()> {
        let ultima = self.fila.saturating_sub(1).max(fila_encabezado);
        let hoja = self.hoja()?;
        hoja.autofilter(fila_encabezado, 0, ultima, columnas.saturating_sub(1))?;
        hoja.set_freeze_panes(fila_encabezado + 1, 0)?;
        Ok(())
    }

    fn saltar(&mut self, filas: u32) {
        self.fila += filas;
    }

    fn guardar(mut self) -> DashboardResult<Vec<u8>> {
        if let Some(hoja) = self.hoja_actual.take() {
            self.workbook.push_worksheet(hoja);
        }
        Ok(self.workbook.save_to_buffer()?)
    }
}

fn hoja_resumen(libro: &mut LibroExcel, datos: &DatosReporte<'_>) -> DashboardResult<()> {
    libro.nueva_hoja(HOJA_RESUMEN)?;
    libro.titulo(&format!("{} - Resumen al {}", datos.empresa, datos.fecha_corte.format("%d/%m/%Y")))?;
    libro.encabezados(&["Indicador", "Valor"])?;

    if let Some(cartera) = datos.cartera {
        let m = calcular_metricas_basicas(&cartera.registros);
        libro.fila_valores(&[Valor::Texto("Total adeudado"), Valor::Moneda(m.total_adeudado)], false)?;
        libro.fila_valores(&[Valor::Texto("Vigente"), Valor::Moneda(m.vigente)], false)?;
        libro.fila_valores(&[Valor::Texto("Vencida"), Valor::Moneda(m.vencida)], false)?;
        libro.fila_valores(&[Valor::Texto("Vencida 0-30"), Valor::Moneda(m.vencida_0_30)], false)?;
        libro.fila_valores(&[Valor::Texto("Vencida 31-60"), Valor::Moneda(m.vencida_31_60)], false)?;
        libro.fila_valores(&[Valor::Texto("Vencida 61-90"), Valor::Moneda(m.vencida_61_90)], false)?;
        libro.fila_valores(&[Valor::Texto("Alto riesgo (>90)"), Valor::Moneda(m.alto_riesgo)], false)?;
        libro.fila_valores(&[Valor::Texto("% Vigente"), Valor::Porcentaje(m.pct_vigente)], false)?;
        libro.fila_valores(&[Valor::Texto("% Vencida"), Valor::Porcentaje(m.pct_vencida)], false)?;
        libro.fila_valores(&[Valor::Texto("% Crítica"), Valor::Porcentaje(m.pct_critica)], false)?;
        libro.fila_valores(&[Valor::Texto("Score de salud"), Valor::Entero(m.score_salud.round() as i64)], false)?;
        libro.fila_valores(
            &[Valor::Texto("Clasificación"), Valor::Texto(m.clasificacion_salud.etiqueta())],
            false,
        )?;
        libro.fila_valores(&[Valor::Texto("Deudores"), Valor::Entero(m.num_deudores as i64)], false)?;
        libro.fila_valores(
            &[Valor::Texto("Días de atraso"), Valor::Texto(cartera.metodo_overdue.descripcion())],
            false,
        )?;
    }

    if let Some(ventas) = datos.ventas.filter(|v| !v.is_empty()) {
        let kpis = calcular_kpis_ventas(ventas, TOP_VENTAS);
        libro.fila_valores(&[Valor::Texto("Ventas totales"), Valor::Moneda(kpis.total_ventas)], false)?;
        libro.fila_valores(
            &[Valor::Texto("Operaciones"), Valor::Entero(kpis.num_transacciones as i64)],
            false,
        )?;
        libro.fila_valores(&[Valor::Texto("Ticket promedio"), Valor::Moneda(kpis.ticket_promedio)], false)?;
        libro.fila_valores(
            &[Valor::Texto("Clientes únicos"), Valor::Entero(kpis.clientes_unicos as i64)],
            false,
        )?;
    }

    libro.anchos(&[28.0, 40.0])
}

const COLUMNAS_ANTIGUEDAD: [&str; 10] = [
    "Nombre",
    "Vigente",
    "1-30",
    "31-60",
    "61-90",
    ">90",
    "Total",
    "% Vencido",
    "Máx. días",
    "Documentos",
];

fn tabla_antiguedad(libro: &mut LibroExcel, matriz: &MatrizAntiguedad) -> DashboardResult<()> {
    libro.encabezados(&COLUMNAS_ANTIGUEDAD)?;
    for fila in matriz.filas.iter().chain(std::iter::once(&matriz.totales)) {
        let es_total = std::ptr::eq(fila, &matriz.totales);
        let mut valores = vec![Valor::Texto(&fila.nombre)];
        valores.extend(
            RangoAntiguedad::TODOS
                .iter()
                .map(|r| Valor::Moneda(fila.saldo_en(*r))),
        );
        valores.push(Valor::Moneda(fila.total));
        valores.push(Valor::Porcentaje(fila.pct_vencido));
        valores.push(Valor::Entero(fila.max_dias_overdue));
        valores.push(Valor::Entero(fila.facturas as i64));
        libro.fila_valores(&valores, es_total)?;
    }
    Ok(())
}

fn hoja_antiguedad(libro: &mut LibroExcel, cartera: &CarteraCxc) -> DashboardResult<()> {
    libro.nueva_hoja(HOJA_ANTIGUEDAD)?;
    libro.titulo("Antigüedad de saldos por deudor")?;
    tabla_antiguedad(libro, &antiguedad_por_deudor(&cartera.registros))?;

    let por_linea = antiguedad_por_linea(&cartera.registros);
    if por_linea.filas.iter().any(|f| f.nombre != crate::cxc::aging::LINEA_SIN_ASIGNAR) {
        libro.saltar(2);
        libro.titulo("Antigüedad por línea de negocio")?;
        tabla_antiguedad(libro, &por_linea)?;
    }

    libro.anchos(&[36.0, 14.0, 14.0, 14.0, 14.0, 14.0, 16.0, 11.0, 10.0, 11.0])
}

fn hoja_detalle(libro: &mut LibroExcel, cartera: &CarteraCxc) -> DashboardResult<()> {
    libro.nueva_hoja(HOJA_DETALLE)?;
    let columnas = [
        "Deudor",
        "Factura",
        "Línea de negocio",
        "Vendedor",
        "Estatus",
        "Saldo adeudado",
        "Días overdue",
        "Rango",
    ];
    libro.encabezados(&columnas)?;

    for r in &cartera.registros {
        libro.fila_valores(
            &[
                Valor::Texto(&r.deudor),
                Valor::Texto(r.factura.as_deref().unwrap_or("")),
                Valor::Texto(r.linea_negocio.as_deref().unwrap_or("")),
                Valor::Texto(r.vendedor.as_deref().unwrap_or("")),
                Valor::Texto(r.estatus.as_deref().unwrap_or("")),
                Valor::Moneda(r.saldo_adeudado),
                Valor::Entero(r.dias_overdue),
                Valor::Texto(RangoAntiguedad::para_dias(r.dias_overdue).etiqueta()),
            ],
            false,
        )?;
    }

    libro.filtro_y_congelar(0, columnas.len() as u16)?;
    libro.anchos(&[36.0, 14.0, 20.0, 20.0, 14.0, 16.0, 12.0, 10.0])
}

fn hoja_ventas(libro: &mut LibroExcel, ventas: &[RegistroVenta]) -> DashboardResult<()> {
    let kpis = calcular_kpis_ventas(ventas, TOP_VENTAS);

    libro.nueva_hoja(HOJA_VENTAS)?;
    libro.titulo("Ventas mensuales")?;
    libro.encabezados(&["Periodo", "Ventas USD"])?;
    for punto in &kpis.ventas_mensuales {
        libro.fila_valores(&[Valor::Texto(&punto.periodo), Valor::Moneda(punto.total)], false)?;
    }
    libro.fila_valores(&[Valor::Texto("Total"), Valor::Moneda(kpis.total_ventas)], true)?;

    libro.saltar(2);
    libro.titulo("Ventas por cliente")?;
    libro.encabezados(&["Cliente", "Ventas USD", "Operaciones", "% del total"])?;
    for p in &kpis.por_cliente {
        libro.fila_valores(
            &[
                Valor::Texto(&p.nombre),
                Valor::Moneda(p.total),
                Valor::Entero(p.operaciones as i64),
                Valor::Porcentaje(p.pct),
            ],
            false,
        )?;
    }

    libro.anchos(&[32.0, 16.0, 12.0, 12.0])
}

fn hoja_vendedores(libro: &mut LibroExcel, ventas: &[RegistroVenta], cartera: Option<&CarteraCxc>) -> DashboardResult<()> {
    let registros = cartera.map(|c| c.registros.as_slice()).unwrap_or(&[]);
    let ranking = ranking_vendedores(ventas, registros);

    libro.nueva_hoja(HOJA_VENDEDORES)?;
    let columnas = [
        "#",
        "Vendedor",
        "Ventas USD",
        "Operaciones",
        "Ticket promedio",
        "Clientes",
        "Cartera total",
        "Cartera vencida",
        "Cartera crítica (>90)",
        "% Vencida",
        "Índice de eficiencia",
    ];
    libro.encabezados(&columnas)?;
    for v in &ranking {
        libro.fila_valores(
            &[
                Valor::Entero(v.posicion as i64),
                Valor::Texto(&v.vendedor),
                Valor::Moneda(v.ventas),
                Valor::Entero(v.operaciones as i64),
                Valor::Moneda(v.ticket_promedio),
                Valor::Entero(v.clientes_unicos as i64),
                Valor::Moneda(v.cartera_total),
                Valor::Moneda(v.cartera_vencida),
                Valor::Moneda(v.cartera_critica),
                Valor::Porcentaje(v.pct_vencida),
                Valor::Entero(v.indice_eficiencia.round() as i64),
            ],
            false,
        )?;
    }

    libro.filtro_y_congelar(0, columnas.len() as u16)?;
    libro.anchos(&[5.0, 28.0, 16.0, 12.0, 16.0, 10.0, 16.0, 16.0, 18.0, 11.0, 18.0])
}

/// Libro `.xlsx` con resumen, antigüedad y detalle de CxC, más ventas y
/// vendedores cuando hay ventas cargadas.
pub fn generar_excel(datos: &DatosReporte<'_>) -> DashboardResult<Vec<u8>> {
    if datos.cartera.is_none() && datos.ventas.map_or(true, |v| v.is_empty()) {
        return Err(DashboardError::SinDatos("no hay datos cargados para exportar".to_string()));
    }

    let mut libro = LibroExcel::new();
    hoja_resumen(&mut libro, datos)?;

    if let Some(cartera) = datos.cartera {
        hoja_antiguedad(&mut libro, cartera)?;
        hoja_detalle(&mut libro, cartera)?;
    }

    if let Some(ventas) = datos.ventas.filter(|v| !v.is_empty()) {
        hoja_ventas(&mut libro, ventas)?;
        hoja_vendedores(&mut libro, ventas, datos.cartera)?;
    }

    let buffer = libro.guardar()?;
    tracing::info!(bytes = buffer.len(), "Libro de Excel generado");
    Ok(buffer)
}
