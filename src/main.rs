mod config;
mod db;
mod models;
mod routes;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};

use crate::config::{AiConfig, AppConfig, MailConfig};
use crate::services::ai_service::AiService;
use crate::services::chatbot_service::ChatBotService;
use crate::services::mail_service::MailService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let app_config = AppConfig::from_env();
    let ai_config = AiConfig::from_env();

    println!("🔌 Connecting to database...");
    let db = db::establish_connection()
        .await
        .expect("Failed to connect to database");
    println!("✅ Database connected!");

    let providers = AiService::new(ai_config.clone()).check_config();
    println!(
        "🤖 AI providers: openai={} anthropic={} gemini={}",
        providers.openai, providers.anthropic, providers.gemini
    );

    let ai_service = web::Data::new(AiService::new(ai_config.clone()));
    let chatbot_service = web::Data::new(ChatBotService::new(&ai_config));
    let mail_service = web::Data::new(MailService::new(MailConfig::from_env()));
    let app_config = web::Data::new(app_config);
    let db = web::Data::new(db);

    println!("🚀 Starting server on http://127.0.0.1:8080");

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
            .max_age(3600);
        for origin in &app_config.cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .app_data(db.clone())
            .app_data(app_config.clone())
            .app_data(ai_service.clone())
            .app_data(chatbot_service.clone())
            .app_data(mail_service.clone())
            .configure(routes::configure_routes)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
