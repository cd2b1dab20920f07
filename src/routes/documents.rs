use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::models::candidature::Entity as Candidatures;
use crate::models::document::{
    self, ActiveModel as DocumentActiveModel, Entity as Documents,
};
use crate::utils::files::{is_allowed_extension, sanitize_filename, MAX_FILE_SIZE};

/// L'appelant s'identifie par query param (?user_id=), le contrôle de
/// propriété passe par la candidature liée au document
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: i32,
}

/// À l'upload, user_id arrive normalement comme champ du formulaire
/// multipart; la query string reste acceptée
#[derive(Deserialize)]
pub struct UploadQuery {
    pub user_id: Option<i32>,
}

/// Lit un champ texte du multipart (None si vide ou non UTF-8)
async fn read_text_field(field: &mut actix_multipart::Field) -> Option<String> {
    let mut value = Vec::new();
    while let Some(Ok(chunk)) = field.next().await {
        value.extend_from_slice(&chunk);
    }
    String::from_utf8(value)
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Vérifie que la candidature existe et appartient à l'utilisateur.
/// 404 si elle n'existe pas, 403 si elle appartient à quelqu'un d'autre.
async fn check_ownership(
    candidature_id: i32,
    user_id: i32,
    db: &DatabaseConnection,
) -> Result<(), HttpResponse> {
    match Candidatures::find_by_id(candidature_id).one(db).await {
        Ok(Some(candidature)) if candidature.user_id == user_id => Ok(()),
        Ok(Some(_)) => Err(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Accès non autorisé"
        }))),
        Ok(None) => Err(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Ressource non trouvée"
        }))),
        Err(e) => Err(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        }))),
    }
}

/// POST /api/candidatures/{id}/documents - Upload multipart
/// Champs: "file" obligatoire, "user_id" (ou ?user_id= en query),
/// "type_document" optionnel
#[post("/candidatures/{id}/documents")]
pub async fn upload_document(
    path: web::Path<i32>,
    query: web::Query<UploadQuery>,
    mut payload: Multipart,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let candidature_id = path.into_inner();

    let mut form_user_id: Option<i32> = None;
    let mut filename: Option<String> = None;
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut type_document = "autre".to_string();

    // 1. Lire les champs du multipart (le fichier est bufferisé en mémoire,
    //    la taille est plafonnée à 10 MB)
    while let Ok(Some(mut field)) = payload.try_next().await {
        let field_name = field.name().to_string();

        match field_name.as_str() {
            "file" => {
                filename = field
                    .content_disposition()
                    .get_filename()
                    .map(|f| f.to_string());

                while let Some(chunk) = field.next().await {
                    let chunk = match chunk {
                        Ok(c) => c,
                        Err(e) => {
                            return HttpResponse::BadRequest().json(serde_json::json!({
                                "error": format!("Lecture du fichier impossible: {}", e)
                            }));
                        }
                    };
                    if file_bytes.len() + chunk.len() > MAX_FILE_SIZE {
                        return HttpResponse::BadRequest().json(serde_json::json!({
                            "error": "Fichier trop volumineux (maximum 10 MB)"
                        }));
                    }
                    file_bytes.extend_from_slice(&chunk);
                }
            }
            "user_id" => {
                let Some(text) = read_text_field(&mut field).await else {
                    continue;
                };
                match text.parse::<i32>() {
                    Ok(id) => form_user_id = Some(id),
                    Err(_) => {
                        return HttpResponse::BadRequest().json(serde_json::json!({
                            "error": "user_id invalide"
                        }));
                    }
                }
            }
            "type_document" => {
                if let Some(text) = read_text_field(&mut field).await {
                    type_document = text;
                }
            }
            _ => {}
        }
    }

    // 2. Identifier l'appelant (champ du formulaire prioritaire) et
    //    vérifier la propriété de la candidature
    let Some(user_id) = form_user_id.or(query.user_id) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Données manquantes"
        }));
    };

    if let Err(response) = check_ownership(candidature_id, user_id, db.get_ref()).await {
        return response;
    }

    // 3. Valider nom et extension
    let Some(filename) = filename.filter(|f| !f.trim().is_empty()) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Aucun fichier fourni"
        }));
    };

    if !is_allowed_extension(&filename) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Type de fichier non autorisé (pdf, doc, docx, txt, png, jpg, jpeg)"
        }));
    }

    if file_bytes.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Fichier vide"
        }));
    }

    // 4. Écrire sur disque: uploads/<user_id>/<timestamp>_<nom nettoyé>
    let safe_name = sanitize_filename(&filename);
    let stored_name = format!("{}_{}", Utc::now().timestamp(), safe_name);
    let user_dir = format!("{}/{}", config.upload_dir, user_id);
    let stored_path = format!("{}/{}", user_dir, stored_name);

    if let Err(e) = tokio::fs::create_dir_all(&user_dir).await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Création du répertoire d'upload impossible: {}", e)
        }));
    }
    if let Err(e) = tokio::fs::write(&stored_path, &file_bytes).await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Écriture du fichier impossible: {}", e)
        }));
    }

    // 5. Enregistrer les métadonnées
    let nouveau_document = DocumentActiveModel {
        candidature_id: Set(candidature_id),
        nom_fichier: Set(filename),
        type_document: Set(type_document),
        url_fichier: Set(stored_path.clone()),
        taille: Set(Some(file_bytes.len() as i32)),
        created_at: Set(Some(Utc::now().naive_utc())),
        ..Default::default()
    };

    match nouveau_document.insert(db.get_ref()).await {
        Ok(doc) => HttpResponse::Created().json(serde_json::json!({
            "message": "Document ajouté",
            "document": doc
        })),
        Err(e) => {
            // Le fichier orphelin est retiré au mieux, l'erreur BD prime
            if let Err(remove_err) = tokio::fs::remove_file(&stored_path).await {
                log::warn!("Fichier orphelin non supprimé {}: {}", stored_path, remove_err);
            }
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to save document: {}", e)
            }))
        }
    }
}

/// GET /api/candidatures/{id}/documents?user_id= - Liste des documents
#[get("/candidatures/{id}/documents")]
pub async fn list_documents(
    path: web::Path<i32>,
    query: web::Query<UserIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let candidature_id = path.into_inner();

    if let Err(response) = check_ownership(candidature_id, query.user_id, db.get_ref()).await {
        return response;
    }

    match Documents::find()
        .filter(document::Column::CandidatureId.eq(candidature_id))
        .all(db.get_ref())
        .await
    {
        Ok(documents) => HttpResponse::Ok().json(documents),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        })),
    }
}

async fn find_owned_document(
    document_id: i32,
    user_id: i32,
    db: &DatabaseConnection,
) -> Result<document::Model, HttpResponse> {
    let doc = match Documents::find_by_id(document_id).one(db).await {
        Ok(Some(doc)) => doc,
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
    };

    check_ownership(doc.candidature_id, user_id, db).await?;
    Ok(doc)
}

/// GET /api/documents/{id}/download?user_id= - Téléchargement
#[get("/documents/{id}/download")]
pub async fn download_document(
    path: web::Path<i32>,
    query: web::Query<UserIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let doc = match find_owned_document(path.into_inner(), query.user_id, db.get_ref()).await {
        Ok(doc) => doc,
        Err(response) => return response,
    };

    match tokio::fs::read(&doc.url_fichier).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", sanitize_filename(&doc.nom_fichier)),
            ))
            .body(bytes),
        Err(e) => {
            log::error!("Fichier introuvable sur disque {}: {}", doc.url_fichier, e);
            HttpResponse::NotFound().json(serde_json::json!({
                "error": "Fichier introuvable"
            }))
        }
    }
}

/// DELETE /api/documents/{id}?user_id= - Suppression
/// La ligne BD est supprimée d'abord; l'échec de suppression du fichier
/// sur disque est loggé mais ne fait pas échouer la requête
#[delete("/documents/{id}")]
pub async fn delete_document(
    path: web::Path<i32>,
    query: web::Query<UserIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let doc = match find_owned_document(path.into_inner(), query.user_id, db.get_ref()).await {
        Ok(doc) => doc,
        Err(response) => return response,
    };

    if let Err(e) = Documents::delete_by_id(doc.id).exec(db.get_ref()).await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to delete document: {}", e)
        }));
    }

    if Path::new(&doc.url_fichier).exists() {
        if let Err(e) = tokio::fs::remove_file(&doc.url_fichier).await {
            log::warn!("Suppression du fichier {} échouée: {}", doc.url_fichier, e);
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Document supprimé"
    }))
}

pub fn document_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_document)
        .service(list_documents)
        .service(download_document)
        .service(delete_document);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::models::candidature;

    fn candidature_owned_by(user_id: i32) -> candidature::Model {
        let now = Utc::now().naive_utc();
        candidature::Model {
            id: 1,
            user_id,
            entreprise: "Acme".to_string(),
            annonce: "Dev Rust".to_string(),
            date: "2024-01-01".to_string(),
            etat: "en_attente".to_string(),
            notes: None,
            tags: None,
            contact_nom: None,
            contact_email: None,
            contact_telephone: None,
            rappel_date: None,
            salaire: None,
            localisation: None,
            type_contrat: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn document_row() -> document::Model {
        document::Model {
            id: 1,
            candidature_id: 1,
            nom_fichier: "cv.pdf".to_string(),
            type_document: "cv".to_string(),
            url_fichier: "uploads/1/0_cv.pdf".to_string(),
            taille: Some(20),
            created_at: Some(Utc::now().naive_utc()),
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            cors_origins: Vec::new(),
            frontend_url: "http://localhost:5173".to_string(),
            upload_dir: std::env::temp_dir()
                .join("applicationtrack_uploads_test")
                .to_string_lossy()
                .into_owned(),
        }
    }

    const BOUNDARY: &str = "----------applicationtrack";

    /// Corps multipart tel que le frontend l'envoie: user_id et
    /// type_document comme champs du formulaire, puis le fichier
    fn multipart_body(with_user_id: bool) -> Vec<u8> {
        let mut body = String::new();
        if with_user_id {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n1\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"type_document\"\r\n\r\ncv\r\n"
        ));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4 contenu\r\n"
        ));
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body.into_bytes()
    }

    #[actix_web::test]
    async fn test_upload_accepts_user_id_as_form_field() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![candidature_owned_by(1)]])
            .append_query_results([vec![document_row()]])
            .into_connection();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(test_config()))
                .service(upload_document),
        )
        .await;

        // Pas de ?user_id= dans l'URL: seul le champ du formulaire identifie l'appelant
        let req = test::TestRequest::post()
            .uri("/candidatures/1/documents")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(true))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_upload_without_any_user_id_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(test_config()))
                .service(upload_document),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/candidatures/1/documents")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(false))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
