use actix_web::{post, web, HttpResponse};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::password_reset_tokens::{
    self, ActiveModel as TokenActiveModel, Entity as ResetTokens,
};
use crate::models::users::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users};
use crate::services::mail_service::MailService;
use crate::utils::password;

// DTO pour l'inscription
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// POST /api/register - Créer un compte
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Valider les champs requis
    if body.username.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Données manquantes"
        }));
    }

    // 2. Vérifier l'unicité du username puis de l'email
    match Users::find()
        .filter(UserColumn::Username.eq(&body.username))
        .one(db.get_ref())
        .await
    {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(serde_json::json!({
                "error": "Nom d'utilisateur déjà utilisé"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
        _ => {}
    }

    match Users::find()
        .filter(UserColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await
    {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(serde_json::json!({
                "error": "Email déjà utilisé"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
        _ => {}
    }

    // 3. Hash le mot de passe (jamais stocké en clair)
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to hash password: {}", e)
            }));
        }
    };

    // 4. Créer l'utilisateur
    let new_user = UserActiveModel {
        username: Set(body.username.clone()),
        email: Set(body.email.clone()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    match new_user.insert(db.get_ref()).await {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "message": "Utilisateur créé avec succès",
            "user": user
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create user: {}", e)
        })),
    }
}

/// POST /api/login - Se connecter
/// Ne révèle jamais si le username existe (message unique pour les deux cas)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Données manquantes"
        }));
    }

    let user = match Users::find()
        .filter(UserColumn::Username.eq(&body.username))
        .one(db.get_ref())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Identifiants incorrects"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    let is_valid = match password::verify_password(&body.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Password verification error: {}", e)
            }));
        }
    };

    if !is_valid {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Identifiants incorrects"
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Connexion réussie",
        "user": user
    }))
}

/// POST /api/forgot-password - Demander un lien de réinitialisation
/// Retourne toujours le même message, que l'email existe ou non
/// (empêche l'énumération de comptes)
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mail: web::Data<MailService>,
) -> HttpResponse {
    let generic_response = serde_json::json!({
        "message": "Si cette adresse existe, un email de réinitialisation a été envoyé"
    });

    let user = match Users::find()
        .filter(UserColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::Ok().json(generic_response),
        Err(e) => {
            log::error!("forgot-password: erreur BD: {}", e);
            return HttpResponse::Ok().json(generic_response);
        }
    };

    // Token UUID v4 à usage unique, valide 1 heure
    let now = Utc::now().naive_utc();
    let token = Uuid::new_v4().to_string();

    let new_token = TokenActiveModel {
        user_id: Set(user.id),
        token: Set(token.clone()),
        expires_at: Set(now + Duration::hours(1)),
        used: Set(false),
        created_at: Set(Some(now)),
        ..Default::default()
    };

    if let Err(e) = new_token.insert(db.get_ref()).await {
        log::error!("forgot-password: insertion du token échouée: {}", e);
        return HttpResponse::Ok().json(generic_response);
    }

    let reset_link = format!("{}/reset-password/{}", config.frontend_url, token);
    mail.send_reset_email(&user.email, &reset_link).await;

    HttpResponse::Ok().json(generic_response)
}

/// POST /api/reset-password/{token} - Consommer un token et changer le mot de passe
/// Consommation du token + mise à jour du password dans une même transaction
#[post("/reset-password/{token}")]
pub async fn reset_password(
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let token_value = path.into_inner();

    if body.password.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Données manquantes"
        }));
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    // 1. Charger le token
    let token = match ResetTokens::find()
        .filter(password_reset_tokens::Column::Token.eq(&token_value))
        .one(&txn)
        .await
    {
        Ok(Some(token)) => token,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Token invalide ou expiré"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    // 2. Vérifier: non utilisé et non expiré
    if !token.is_valid(Utc::now().naive_utc()) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Token invalide ou expiré"
        }));
    }

    // 3. Hasher le nouveau mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to hash password: {}", e)
            }));
        }
    };

    // 4. Mettre à jour l'utilisateur
    let user = match Users::find_by_id(token.user_id).one(&txn).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Token invalide ou expiré"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    let mut user_model: UserActiveModel = user.into();
    user_model.password_hash = Set(password_hash);
    if let Err(e) = user_model.update(&txn).await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to update password: {}", e)
        }));
    }

    // 5. Consommer le token (usage unique)
    let mut token_model: TokenActiveModel = token.into();
    token_model.used = Set(true);
    if let Err(e) = token_model.update(&txn).await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to consume token: {}", e)
        }));
    }

    if let Err(e) = txn.commit().await {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Mot de passe réinitialisé avec succès"
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(forgot_password)
        .service(reset_password);
}
