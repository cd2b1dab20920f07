use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::models::candidature::{
    self, ActiveModel as CandidatureActiveModel, Entity as Candidatures, ETAT_DEFAUT,
    is_valid_etat,
};
use crate::models::dto::CandidatureResponse;
use crate::models::users::Entity as Users;
use crate::services::candidature_service::{CandidatureService, ListQuery};

#[derive(Deserialize)]
pub struct CreateCandidatureRequest {
    pub entreprise: String,
    pub annonce: String,
    pub date: String,
    pub etat: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub contact_nom: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub rappel_date: Option<chrono::NaiveDateTime>,
    pub salaire: Option<String>,
    pub localisation: Option<String>,
    pub type_contrat: Option<String>,
}

/// Mise à jour partielle: seuls les champs présents sont appliqués
#[derive(Deserialize)]
pub struct UpdateCandidatureRequest {
    pub entreprise: Option<String>,
    pub annonce: Option<String>,
    pub date: Option<String>,
    pub etat: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub contact_nom: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub rappel_date: Option<chrono::NaiveDateTime>,
    pub salaire: Option<String>,
    pub localisation: Option<String>,
    pub type_contrat: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateEtatRequest {
    pub etat: String,
}

fn serialize_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// GET /api/users/{user_id}/candidatures - Liste avec filtres/tri
/// Query params: etat, search, tags, type_contrat, date_debut, date_fin,
/// sort_by (created_at|date|entreprise), sort_order (asc|desc)
#[get("/users/{user_id}/candidatures")]
pub async fn list_candidatures(
    path: web::Path<i32>,
    query: web::Query<ListQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let user_id = path.into_inner();

    match Users::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    }

    let candidatures = Candidatures::find()
        .filter(candidature::Column::UserId.eq(user_id))
        .order_by_desc(candidature::Column::CreatedAt)
        .all(db.get_ref())
        .await;

    match candidatures {
        Ok(candidatures) => {
            let filtered = CandidatureService::filter_and_sort(candidatures, &query);
            let response: Vec<CandidatureResponse> =
                filtered.into_iter().map(CandidatureResponse::from).collect();
            HttpResponse::Ok().json(response)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        })),
    }
}

/// POST /api/users/{user_id}/candidatures - Créer une candidature
#[post("/users/{user_id}/candidatures")]
pub async fn create_candidature(
    path: web::Path<i32>,
    body: web::Json<CreateCandidatureRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let user_id = path.into_inner();

    match Users::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    }

    if body.entreprise.trim().is_empty() || body.annonce.trim().is_empty() || body.date.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Données manquantes"
        }));
    }

    let etat = body.etat.clone().unwrap_or_else(|| ETAT_DEFAUT.to_string());
    if !is_valid_etat(&etat) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("État inconnu: {}", etat)
        }));
    }

    let now = Utc::now().naive_utc();
    let nouvelle_candidature = CandidatureActiveModel {
        user_id: Set(user_id),
        entreprise: Set(body.entreprise.clone()),
        annonce: Set(body.annonce.clone()),
        date: Set(body.date.clone()),
        etat: Set(etat),
        notes: Set(body.notes.clone()),
        tags: Set(body.tags.as_deref().map(serialize_tags)),
        contact_nom: Set(body.contact_nom.clone()),
        contact_email: Set(body.contact_email.clone()),
        contact_telephone: Set(body.contact_telephone.clone()),
        rappel_date: Set(body.rappel_date),
        salaire: Set(body.salaire.clone()),
        localisation: Set(body.localisation.clone()),
        type_contrat: Set(body.type_contrat.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match nouvelle_candidature.insert(db.get_ref()).await {
        Ok(candidature) => HttpResponse::Created().json(serde_json::json!({
            "message": "Candidature créée avec succès",
            "candidature": CandidatureResponse::from(candidature)
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create candidature: {}", e)
        })),
    }
}

/// GET /api/candidatures/{id} - Récupérer une candidature
#[get("/candidatures/{id}")]
pub async fn get_candidature(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match Candidatures::find_by_id(path.into_inner()).one(db.get_ref()).await {
        Ok(Some(candidature)) => HttpResponse::Ok().json(CandidatureResponse::from(candidature)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Ressource non trouvée"
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        })),
    }
}

/// PUT /api/candidatures/{id} - Mettre à jour (champs présents uniquement)
#[put("/candidatures/{id}")]
pub async fn update_candidature(
    path: web::Path<i32>,
    body: web::Json<UpdateCandidatureRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let candidature = match Candidatures::find_by_id(path.into_inner()).one(db.get_ref()).await {
        Ok(Some(candidature)) => candidature,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    if let Some(etat) = body.etat.as_deref() {
        if !is_valid_etat(etat) {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("État inconnu: {}", etat)
            }));
        }
    }

    let mut model: CandidatureActiveModel = candidature.into();

    if let Some(entreprise) = &body.entreprise {
        model.entreprise = Set(entreprise.clone());
    }
    if let Some(annonce) = &body.annonce {
        model.annonce = Set(annonce.clone());
    }
    if let Some(date) = &body.date {
        model.date = Set(date.clone());
    }
    if let Some(etat) = &body.etat {
        model.etat = Set(etat.clone());
    }
    if let Some(notes) = &body.notes {
        model.notes = Set(Some(notes.clone()));
    }
    if let Some(tags) = &body.tags {
        model.tags = Set(Some(serialize_tags(tags)));
    }
    if let Some(contact_nom) = &body.contact_nom {
        model.contact_nom = Set(Some(contact_nom.clone()));
    }
    if let Some(contact_email) = &body.contact_email {
        model.contact_email = Set(Some(contact_email.clone()));
    }
    if let Some(contact_telephone) = &body.contact_telephone {
        model.contact_telephone = Set(Some(contact_telephone.clone()));
    }
    if let Some(rappel_date) = body.rappel_date {
        model.rappel_date = Set(Some(rappel_date));
    }
    if let Some(salaire) = &body.salaire {
        model.salaire = Set(Some(salaire.clone()));
    }
    if let Some(localisation) = &body.localisation {
        model.localisation = Set(Some(localisation.clone()));
    }
    if let Some(type_contrat) = &body.type_contrat {
        model.type_contrat = Set(Some(type_contrat.clone()));
    }
    model.updated_at = Set(Utc::now().naive_utc());

    match model.update(db.get_ref()).await {
        Ok(candidature) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Candidature mise à jour",
            "candidature": CandidatureResponse::from(candidature)
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to update candidature: {}", e)
        })),
    }
}

/// DELETE /api/candidatures/{id} - Supprimer (cascade sur les documents)
#[delete("/candidatures/{id}")]
pub async fn delete_candidature(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let candidature = match Candidatures::find_by_id(path.into_inner()).one(db.get_ref()).await {
        Ok(Some(candidature)) => candidature,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    match Candidatures::delete_by_id(candidature.id).exec(db.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Candidature supprimée"
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to delete candidature: {}", e)
        })),
    }
}

/// PATCH /api/candidatures/{id}/etat - Changer uniquement l'état
/// Aucun graphe de transition: tout état peut remplacer tout autre
#[patch("/candidatures/{id}/etat")]
pub async fn update_etat(
    path: web::Path<i32>,
    body: web::Json<UpdateEtatRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if !is_valid_etat(&body.etat) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("État inconnu: {}", body.etat)
        }));
    }

    let candidature = match Candidatures::find_by_id(path.into_inner()).one(db.get_ref()).await {
        Ok(Some(candidature)) => candidature,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    let mut model: CandidatureActiveModel = candidature.into();
    model.etat = Set(body.etat.clone());
    model.updated_at = Set(Utc::now().naive_utc());

    match model.update(db.get_ref()).await {
        Ok(candidature) => HttpResponse::Ok().json(serde_json::json!({
            "message": "État mis à jour",
            "candidature": CandidatureResponse::from(candidature)
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to update etat: {}", e)
        })),
    }
}

/// GET /api/users/{user_id}/export/csv - Export CSV des candidatures
#[get("/users/{user_id}/export/csv")]
pub async fn export_csv(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let user_id = path.into_inner();

    match Users::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Ressource non trouvée"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    }

    let candidatures = match Candidatures::find()
        .filter(candidature::Column::UserId.eq(user_id))
        .order_by_desc(candidature::Column::CreatedAt)
        .all(db.get_ref())
        .await
    {
        Ok(candidatures) => candidatures,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    match CandidatureService::export_csv(&candidatures) {
        Ok(csv_bytes) => {
            let filename = format!(
                "candidatures_{}_{}.csv",
                user_id,
                Utc::now().format("%Y%m%d")
            );
            HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .body(csv_bytes)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Export CSV impossible: {}", e)
        })),
    }
}

pub fn candidature_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_candidatures)
        .service(create_candidature)
        .service(export_csv)
        .service(get_candidature)
        .service(update_candidature)
        .service(delete_candidature)
        .service(update_etat);
}
