use std::io::Read;
use std::sync::Arc;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::{Local, NaiveDate, Utc};
use flate2::read::GzDecoder;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ai::ContextoNarrativa;
use crate::core::Tabla;
use crate::cxc::{
    antiguedad_por_deudor, antiguedad_por_linea, calcular_metricas_con_umbral, construir_cartera, CarteraCxc,
    UMBRAL_CRITICO_KPI,
};
use crate::ingest::{cargar_tabla, TipoDatos};
use crate::report::{generar_cartas_txt, generar_csv_cxc, generar_excel, generar_reporte_ejecutivo, DatosReporte};
use crate::telemetry;
use crate::ventas::{calcular_kpis_ventas, construir_ventas, ranking_vendedores, RegistroVenta};

use super::error::{ApiError, ApiResult};
use super::state::{ApiState, ArchivoCargado, ResumenArchivo, Sesion, SesionCompartida};

const TOP_KPIS_DEFAULT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ParametrosCarga {
    pub tipo: TipoDatos,
    pub nombre: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParametrosCorte {
    pub fecha_corte: Option<NaiveDate>,
    pub umbral_critico: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agrupacion {
    #[default]
    Deudor,
    Linea,
}

#[derive(Debug, Deserialize)]
pub struct ParametrosAntiguedad {
    pub fecha_corte: Option<NaiveDate>,
    #[serde(default)]
    pub agrupar: Agrupacion,
    pub top: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ParametrosKpis {
    pub top: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolicitudResumen {
    pub api_key: Option<String>,
    pub fecha_corte: Option<NaiveDate>,
}

/// Lo que los endpoints de lectura necesitan de una sesión, copiado fuera del candado.
struct Instantanea {
    cxc: Option<Tabla>,
    ventas: Option<Tabla>,
    narrativa: Option<crate::ai::Narrativa>,
}

fn hoy_o(fecha: Option<NaiveDate>) -> NaiveDate {
    fecha.unwrap_or_else(|| Local::now().date_naive())
}

/// Cada acceso renueva el tiempo de inactividad de la sesión.
async fn buscar_sesion(state: &ApiState, id: Uuid) -> ApiResult<SesionCompartida> {
    state
        .sesiones
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Sesión {} no encontrada", id)))
}

async fn instantanea(state: &ApiState, id: Uuid) -> ApiResult<Instantanea> {
    let compartida = buscar_sesion(state, id).await?;
    let sesion = compartida.read().await;
    Ok(Instantanea {
        cxc: sesion.cxc.as_ref().map(|a| a.tabla.clone()),
        ventas: sesion.ventas.as_ref().map(|a| a.tabla.clone()),
        narrativa: sesion.narrativa.clone(),
    })
}

fn cartera_requerida(tabla: Option<&Tabla>, fecha_corte: NaiveDate) -> ApiResult<CarteraCxc> {
    let tabla = tabla.ok_or_else(|| ApiError::unprocessable("La sesión no tiene datos de CxC cargados"))?;
    Ok(construir_cartera(tabla, fecha_corte)?)
}

fn ventas_requeridas(tabla: Option<&Tabla>) -> ApiResult<Vec<RegistroVenta>> {
    let tabla = tabla.ok_or_else(|| ApiError::unprocessable("La sesión no tiene datos de ventas cargados"))?;
    Ok(construir_ventas(tabla)?)
}

fn cartera_opcional(tabla: Option<&Tabla>, fecha_corte: NaiveDate) -> ApiResult<Option<CarteraCxc>> {
    tabla
        .map(|t| construir_cartera(t, fecha_corte))
        .transpose()
        .map_err(ApiError::from)
}

fn ventas_opcionales(tabla: Option<&Tabla>) -> ApiResult<Option<Vec<RegistroVenta>>> {
    tabla.map(construir_ventas).transpose().map_err(ApiError::from)
}

fn adjunto(contenido: Vec<u8>, content_type: &str, nombre: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", nombre),
        ))
        .body(contenido)
}

fn archivo_demasiado_grande(max_size: usize) -> HttpResponse {
    HttpResponse::PayloadTooLarge().json(json!({
        "error": "Archivo demasiado grande",
        "max_size_mb": max_size / 1_048_576
    }))
}

pub async fn crear_sesion(state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let sesion = Sesion::new();
    let id = sesion.id;
    let creada = sesion.creada;
    state.sesiones.insert(id, Arc::new(RwLock::new(sesion))).await;

    tracing::info!(sesion = %id, "Sesión creada");
    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "creada": creada
    })))
}

pub async fn estado_sesion(path: web::Path<Uuid>, state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let compartida = buscar_sesion(&state, id).await?;
    let sesion = compartida.read().await;

    Ok(HttpResponse::Ok().json(json!({
        "id": sesion.id,
        "creada": sesion.creada,
        "cxc": sesion.cxc.as_ref().map(ResumenArchivo::from),
        "ventas": sesion.ventas.as_ref().map(ResumenArchivo::from),
        "tiene_narrativa": sesion.narrativa.is_some()
    })))
}

pub async fn eliminar_sesion(path: web::Path<Uuid>, state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    match state.sesiones.remove(&id).await {
        Some(_) => {
            tracing::info!(sesion = %id, "Sesión eliminada");
            Ok(HttpResponse::NoContent().finish())
        }
        None => Err(ApiError::not_found(format!("Sesión {} no encontrada", id))),
    }
}

/// Recibe el archivo crudo en el cuerpo (gzip permitido) y lo deja normalizado en la sesión.
pub async fn cargar_archivo(
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCarga>,
    mut payload: web::Payload,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let ParametrosCarga { tipo, nombre } = query.into_inner();

    buscar_sesion(&state, id).await?;

    // Leer el cuerpo con límite de tamaño
    let mut body = web::BytesMut::new();
    let max_size = state.config.max_upload_size_bytes;

    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if (body.len() + chunk.len()) > max_size {
            return Ok(archivo_demasiado_grande(max_size));
        }
        body.extend_from_slice(&chunk);
    }

    let content_encoding = req
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|h| h.to_str().ok());

    let bytes = match content_encoding {
        Some("gzip") => {
            // El límite aplica también al contenido descomprimido
            let mut decoder = GzDecoder::new(&body[..]).take(max_size as u64 + 1);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| ApiError::bad_request(format!("gzip inválido: {}", e)))?;
            if decompressed.len() > max_size {
                return Ok(archivo_demasiado_grande(max_size));
            }
            decompressed
        }
        _ => body.to_vec(),
    };

    if bytes.is_empty() {
        return Err(ApiError::bad_request("El archivo está vacío"));
    }

    let nombre_archivo = nombre.clone();
    let hoy = Local::now().date_naive();
    let resultado = tokio::task::spawn_blocking(move || {
        let tabla = cargar_tabla(bytes, &nombre_archivo, tipo)?;
        // Validar que la tabla sirve antes de guardarla
        let metodo = match tipo {
            TipoDatos::Cxc => Some(construir_cartera(&tabla, hoy)?.metodo_overdue),
            TipoDatos::Ventas => {
                construir_ventas(&tabla)?;
                None
            }
        };
        Ok::<_, crate::core::DashboardError>((tabla, metodo))
    })
    .await?;

    let (tabla, metodo) = match resultado {
        Ok(ok) => ok,
        Err(e) => {
            telemetry::contar_archivo(tipo.as_str(), "error");
            tracing::warn!(sesion = %id, archivo = %nombre, "Archivo rechazado: {}", e);
            return Err(e.into());
        }
    };

    let archivo = ArchivoCargado {
        nombre: nombre.clone(),
        tabla,
        cargado: Utc::now(),
    };
    let resumen = ResumenArchivo::from(&archivo);

    {
        let compartida = buscar_sesion(&state, id).await?;
        let mut sesion = compartida.write().await;
        match tipo {
            TipoDatos::Cxc => sesion.cxc = Some(archivo),
            TipoDatos::Ventas => sesion.ventas = Some(archivo),
        }
        // Una narrativa previa ya no corresponde a los datos nuevos
        sesion.narrativa = None;
    }

    telemetry::contar_archivo(tipo.as_str(), "ok");

    Ok(HttpResponse::Ok().json(json!({
        "sesion": id,
        "tipo": tipo,
        "archivo": resumen,
        "metodo_overdue": metodo
    })))
}

pub async fn metricas_cxc(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let umbral = query.umbral_critico.unwrap_or(UMBRAL_CRITICO_KPI);

    let cartera = cartera_requerida(datos.cxc.as_ref(), fecha_corte)?;
    let metricas = calcular_metricas_con_umbral(&cartera.registros, umbral);

    Ok(HttpResponse::Ok().json(json!({
        "fecha_corte": fecha_corte,
        "metodo_overdue": cartera.metodo_overdue,
        "descripcion_metodo": cartera.metodo_overdue.descripcion(),
        "metricas": metricas
    })))
}

pub async fn antiguedad_cxc(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosAntiguedad>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let cartera = cartera_requerida(datos.cxc.as_ref(), fecha_corte)?;

    let mut matriz = match query.agrupar {
        Agrupacion::Deudor => antiguedad_por_deudor(&cartera.registros),
        Agrupacion::Linea => antiguedad_por_linea(&cartera.registros),
    };
    if let Some(top) = query.top {
        matriz.filas.truncate(top);
    }

    Ok(HttpResponse::Ok().json(json!({
        "fecha_corte": fecha_corte,
        "metodo_overdue": cartera.metodo_overdue,
        "antiguedad": matriz
    })))
}

pub async fn kpis_ventas(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosKpis>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let ventas = ventas_requeridas(datos.ventas.as_ref())?;
    let kpis = calcular_kpis_ventas(&ventas, query.top.unwrap_or(TOP_KPIS_DEFAULT));
    Ok(HttpResponse::Ok().json(kpis))
}

pub async fn vendedores(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let ventas = ventas_requeridas(datos.ventas.as_ref())?;
    let cartera = cartera_opcional(datos.cxc.as_ref(), fecha_corte)?;

    let registros = cartera.as_ref().map(|c| c.registros.as_slice()).unwrap_or(&[]);
    let ranking = ranking_vendedores(&ventas, registros);

    Ok(HttpResponse::Ok().json(json!({
        "fecha_corte": fecha_corte,
        "con_cartera": cartera.is_some(),
        "vendedores": ranking
    })))
}

pub async fn reporte_ejecutivo(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let cartera = cartera_opcional(datos.cxc.as_ref(), fecha_corte)?;
    let ventas = ventas_opcionales(datos.ventas.as_ref())?;

    let reporte = DatosReporte {
        empresa: &state.config.empresa,
        fecha_corte,
        cartera: cartera.as_ref(),
        ventas: ventas.as_deref(),
        narrativa: datos.narrativa.as_ref(),
    };
    let html = generar_reporte_ejecutivo(&state.plantillas, &reporte)?;
    telemetry::contar_reporte("html");

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

pub async fn reporte_excel(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let empresa = state.config.empresa.clone();

    let buffer = tokio::task::spawn_blocking(move || {
        let cartera = cartera_opcional(datos.cxc.as_ref(), fecha_corte)?;
        let ventas = ventas_opcionales(datos.ventas.as_ref())?;
        let reporte = DatosReporte {
            empresa: &empresa,
            fecha_corte,
            cartera: cartera.as_ref(),
            ventas: ventas.as_deref(),
            narrativa: None,
        };
        generar_excel(&reporte).map_err(ApiError::from)
    })
    .await??;
    telemetry::contar_reporte("xlsx");

    Ok(adjunto(
        buffer,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &format!("cxc_{}.xlsx", fecha_corte.format("%Y%m%d")),
    ))
}

pub async fn reporte_csv(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let cartera = cartera_requerida(datos.cxc.as_ref(), fecha_corte)?;

    let contenido = generar_csv_cxc(&cartera)?;
    telemetry::contar_reporte("csv");

    Ok(adjunto(
        contenido,
        "text/csv; charset=utf-8",
        &format!("cxc_detalle_{}.csv", fecha_corte.format("%Y%m%d")),
    ))
}

pub async fn cartas_cobranza(
    path: web::Path<Uuid>,
    query: web::Query<ParametrosCorte>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let datos = instantanea(&state, path.into_inner()).await?;
    let fecha_corte = hoy_o(query.fecha_corte);
    let cartera = cartera_requerida(datos.cxc.as_ref(), fecha_corte)?;

    let texto = generar_cartas_txt(&state.plantillas, &state.config.empresa, &cartera)?;
    telemetry::contar_reporte("txt");

    Ok(adjunto(
        texto.into_bytes(),
        "text/plain; charset=utf-8",
        &format!("cartas_cobranza_{}.txt", fecha_corte.format("%Y%m%d")),
    ))
}

/// Pide la narrativa al proveedor de IA. Los errores se registran y se
/// devuelven como `{"error": ...}`; no hay reintentos.
pub async fn resumen_ia(
    path: web::Path<Uuid>,
    body: Option<web::Json<SolicitudResumen>>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let solicitud = body.map(|b| b.into_inner()).unwrap_or_default();

    if state.rate_limiter.check_key(&id.to_string()).is_err() {
        return Ok(HttpResponse::TooManyRequests().json(json!({
            "error": "Límite de solicitudes de IA excedido",
            "retry_after": 60
        })));
    }

    let api_key = solicitud
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.openai_api_key.clone())
        .ok_or_else(|| ApiError::bad_request("Se requiere una API key (api_key u OPENAI_API_KEY)"))?;

    let datos = instantanea(&state, id).await?;
    let fecha_corte = hoy_o(solicitud.fecha_corte);
    let cartera = cartera_opcional(datos.cxc.as_ref(), fecha_corte)?;
    let ventas = ventas_opcionales(datos.ventas.as_ref())?;

    let contexto = ContextoNarrativa::construir(
        &state.config.empresa,
        fecha_corte,
        cartera.as_ref(),
        ventas.as_deref(),
    );
    if !contexto.tiene_datos() {
        return Err(ApiError::unprocessable("La sesión no tiene datos cargados"));
    }

    let narrativa = match state.narrador.generar_narrativa(&contexto, &api_key).await {
        Ok(narrativa) => narrativa,
        Err(e) => {
            telemetry::contar_llamada_ia("error");
            tracing::warn!(sesion = %id, "No se pudo generar la narrativa: {}", e);
            return Err(e.into());
        }
    };
    telemetry::contar_llamada_ia("ok");

    if let Some(compartida) = state.sesiones.get(&id).await {
        compartida.write().await.narrativa = Some(narrativa.clone());
    }

    Ok(HttpResponse::Ok().json(json!({
        "sesion": id,
        "fecha_corte": fecha_corte,
        "narrativa": narrativa
    })))
}
