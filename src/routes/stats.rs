use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::models::candidature::{self, Entity as Candidatures};
use crate::models::users::Entity as Users;
use crate::services::stats_service::StatsService;

async fn load_candidatures(
    user_id: i32,
    db: &DatabaseConnection,
) -> Result<Vec<candidature::Model>, HttpResponse> {
    match Users::find_by_id(user_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            })));
        }
        Err(e) => {
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            })));
        }
    }

    Candidatures::find()
        .filter(candidature::Column::UserId.eq(user_id))
        .all(db)
        .await
        .map_err(|e| {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        })
}

/// GET /api/users/{user_id}/stats - Compteurs par état
#[get("/users/{user_id}/stats")]
pub async fn basic_stats(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match load_candidatures(path.into_inner(), db.get_ref()).await {
        Ok(candidatures) => HttpResponse::Ok().json(StatsService::count_etats(&candidatures)),
        Err(response) => response,
    }
}

/// GET /api/users/{user_id}/stats/advanced - Taux et séries temporelles
#[get("/users/{user_id}/stats/advanced")]
pub async fn advanced_stats(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match load_candidatures(path.into_inner(), db.get_ref()).await {
        Ok(candidatures) => {
            let stats = StatsService::advanced(&candidatures, Utc::now().naive_utc());
            HttpResponse::Ok().json(stats)
        }
        Err(response) => response,
    }
}

pub fn stats_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(advanced_stats).service(basic_stats);
}
