use actix_web::{get, post, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;

use crate::models::candidature::Entity as Candidatures;
use crate::services::ai_service::{AiError, AiService, JobData, UserProfile};
use crate::services::chatbot_service::{ChatBotService, ChatCandidature};

#[derive(Deserialize)]
pub struct CoverLetterRequest {
    pub candidature_id: i32,
    pub user_profile: Option<UserProfile>,
    // "openai" | "anthropic" | "gemini"
    pub provider: Option<String>,
}

#[derive(Deserialize)]
pub struct ParseAnnonceRequest {
    pub texte: Option<String>,
    pub url: Option<String>,
    pub provider: Option<String>,
}

#[derive(Deserialize)]
pub struct MatchingRequest {
    pub candidature_id: i32,
    pub user_profile: UserProfile,
    pub provider: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub candidatures: Vec<ChatCandidature>,
}

/// Les erreurs d'entrée donnent un 400, le reste (provider, parse, scrape)
/// un 500; le message d'erreur ne contient jamais de clé API (redaction
/// faite au niveau provider)
fn ai_error_response(err: AiError) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": err.to_string()
    });

    if err.is_user_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        log::error!("Erreur IA: {}", err);
        HttpResponse::InternalServerError().json(body)
    }
}

async fn load_job(
    candidature_id: i32,
    db: &DatabaseConnection,
) -> Result<JobData, HttpResponse> {
    match Candidatures::find_by_id(candidature_id).one(db).await {
        Ok(Some(candidature)) => Ok(JobData::from(&candidature)),
        Ok(None) => Err(HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Candidature non trouvée"
        }))),
        Err(e) => Err(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Database error: {}", e)
        }))),
    }
}

/// GET /api/ai/check-config - Providers dont la clé est configurée
#[get("/ai/check-config")]
pub async fn check_config(ai: web::Data<AiService>) -> HttpResponse {
    HttpResponse::Ok().json(ai.check_config())
}

/// POST /api/ai/generate-cover-letter - Lettre de motivation
/// Retombe sur le template local si la clé du provider demandé est absente
#[post("/ai/generate-cover-letter")]
pub async fn generate_cover_letter(
    body: web::Json<CoverLetterRequest>,
    db: web::Data<DatabaseConnection>,
    ai: web::Data<AiService>,
) -> HttpResponse {
    let job = match load_job(body.candidature_id, db.get_ref()).await {
        Ok(job) => job,
        Err(response) => return response,
    };

    let provider = body.provider.as_deref().unwrap_or("openai");

    match ai
        .generate_cover_letter(&job, body.user_profile.as_ref(), provider)
        .await
    {
        Ok(letter) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "letter": letter.letter,
            "provider": letter.provider,
            "tokens_used": letter.tokens_used
        })),
        Err(err) => ai_error_response(err),
    }
}

/// POST /api/ai/parse-annonce (alias: /api/ai/parse-announcement) -
/// Extraction structurée d'une offre d'emploi (texte direct ou URL à scraper)
pub async fn parse_annonce(
    body: web::Json<ParseAnnonceRequest>,
    ai: web::Data<AiService>,
) -> HttpResponse {
    match ai
        .parse_annonce(
            body.texte.as_deref(),
            body.url.as_deref(),
            body.provider.as_deref(),
        )
        .await
    {
        Ok(parsed) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": parsed
        })),
        Err(err) => ai_error_response(err),
    }
}

/// POST /api/ai/matching-score - Adéquation candidat / poste
#[post("/ai/matching-score")]
pub async fn matching_score(
    body: web::Json<MatchingRequest>,
    db: web::Data<DatabaseConnection>,
    ai: web::Data<AiService>,
) -> HttpResponse {
    let job = match load_job(body.candidature_id, db.get_ref()).await {
        Ok(job) => job,
        Err(response) => return response,
    };

    match ai
        .matching_score(&job, &body.user_profile, body.provider.as_deref())
        .await
    {
        Ok(result) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "score": result.score,
            "points_forts": result.points_forts,
            "points_faibles": result.points_faibles,
            "conseils": result.conseils
        })),
        Err(err) => ai_error_response(err),
    }
}

/// POST /api/ai/chat - Assistant conversationnel (fallback local garanti,
/// ce endpoint ne renvoie jamais d'erreur IA)
#[post("/ai/chat")]
pub async fn chat(
    body: web::Json<ChatRequest>,
    chatbot: web::Data<ChatBotService>,
) -> HttpResponse {
    if body.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Message vide"
        }));
    }

    let reply = chatbot
        .generate_response(&body.message, &body.candidatures)
        .await;

    HttpResponse::Ok().json(reply)
}

pub fn ai_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check_config)
        .service(generate_cover_letter)
        .route("/ai/parse-annonce", web::post().to(parse_annonce))
        .route("/ai/parse-announcement", web::post().to(parse_annonce))
        .service(matching_score)
        .service(chat);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    use crate::config::AiConfig;

    #[actix_web::test]
    async fn test_parse_annonce_served_under_both_names() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AiService::new(AiConfig::default())))
                .route("/ai/parse-annonce", web::post().to(parse_annonce))
                .route("/ai/parse-announcement", web::post().to(parse_annonce)),
        )
        .await;

        for path in ["/ai/parse-annonce", "/ai/parse-announcement"] {
            let req = test::TestRequest::post()
                .uri(path)
                .set_json(serde_json::json!({ "texte": "Développeur Rust CDI" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            // Sans clé configurée: erreur provider (500), jamais un 404
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        }
    }
}
