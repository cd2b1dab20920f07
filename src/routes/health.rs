use actix_web::{get, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}

/// GET / - Identification de l'API
#[get("/")]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "name": "ApplicationTrack API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_health_check_reports_ok() {
        let app = test::init_service(App::new().service(health_check)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }
}
