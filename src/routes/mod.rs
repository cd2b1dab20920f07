pub mod ai;
pub mod auth;
pub mod candidatures;
pub mod documents;
pub mod health;
pub mod stats;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index).service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(stats::stats_routes)
            .configure(documents::document_routes)
            .configure(candidatures::candidature_routes)
            .configure(ai::ai_routes),
    );
}
