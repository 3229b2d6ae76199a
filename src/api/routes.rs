use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{web, HttpResponse};

use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health checks
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))

        // API v1
        .service(
            web::scope("/api/v1")
                .wrap(Compress::default())
                .wrap(
                    Cors::default()
                        .allowed_origin_fn(|origin, _req_head| {
                            origin.as_bytes().starts_with(b"http://localhost") ||
                            origin.as_bytes().starts_with(b"https://")
                        })
                        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                        .allowed_headers(vec!["Content-Type", "Content-Encoding"])
                        .max_age(3600)
                )

                .service(
                    web::scope("/sesiones")
                        .route("", web::post().to(handlers::crear_sesion))
                        .route("/{id}", web::get().to(handlers::estado_sesion))
                        .route("/{id}", web::delete().to(handlers::eliminar_sesion))
                        .route("/{id}/archivos", web::post().to(handlers::cargar_archivo))

                        // Cuentas por cobrar
                        .route("/{id}/cxc/metricas", web::get().to(handlers::metricas_cxc))
                        .route("/{id}/cxc/antiguedad", web::get().to(handlers::antiguedad_cxc))

                        // Ventas
                        .route("/{id}/ventas/kpis", web::get().to(handlers::kpis_ventas))
                        .route("/{id}/vendedores", web::get().to(handlers::vendedores))

                        // Reportes
                        .route("/{id}/reportes/ejecutivo.html", web::get().to(handlers::reporte_ejecutivo))
                        .route("/{id}/reportes/cxc.xlsx", web::get().to(handlers::reporte_excel))
                        .route("/{id}/reportes/cxc.csv", web::get().to(handlers::reporte_csv))
                        .route("/{id}/reportes/cartas.txt", web::get().to(handlers::cartas_cobranza))

                        .route("/{id}/ia/resumen", web::post().to(handlers::resumen_ia))
                )
        );
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

async fn metrics_endpoint() -> HttpResponse {
    match crate::telemetry::exportar_metricas() {
        Ok(buffer) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(e) => {
            tracing::error!("No se pudieron exportar las métricas: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
