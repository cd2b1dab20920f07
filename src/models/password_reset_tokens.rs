// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Colonnes de la table password_reset_tokens:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - user_id (INTEGER, NOT NULL, FK vers users, ON DELETE CASCADE)
//   - token (VARCHAR, UNIQUE, NOT NULL) - UUID v4
//   - expires_at (TIMESTAMP, NOT NULL) - created_at + 1 heure
//   - used (BOOLEAN, DEFAULT FALSE, NOT NULL)
//   - created_at (TIMESTAMP, DEFAULT CURRENT_TIMESTAMP)
//
// Workflow:
//   1. User demande un reset via POST /api/forgot-password
//   2. Backend génère un token UUID v4 et l'insère dans cette table
//   3. Backend envoie un email avec le lien FRONTEND_URL/reset-password/<token>
//   4. Frontend envoie POST /api/reset-password/<token> avec le nouveau password
//   5. Backend vérifie: token existe, not expired, not used
//   6. Backend change le password et met used = true (même transaction)
//
// Points d'attention:
//   - Un token ne peut être utilisé qu'une fois (used = true)
//   - Token expire après 1 heure (3600 secondes)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    #[sea_orm(unique)]
    pub token: String,

    pub expires_at: DateTime,

    pub used: bool,

    pub created_at: Option<DateTime>,
}

impl Model {
    /// Un token est valide ssi il n'a pas été consommé et n'a pas expiré
    pub fn is_valid(&self, now: DateTime) -> bool {
        !self.used && now < self.expires_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn token_created_at(created: DateTime) -> Model {
        Model {
            id: 1,
            user_id: 1,
            token: "t".to_string(),
            expires_at: created + Duration::hours(1),
            used: false,
            created_at: Some(created),
        }
    }

    #[test]
    fn test_valid_just_after_creation() {
        let now = Utc::now().naive_utc();
        let token = token_created_at(now);
        assert!(token.is_valid(now + Duration::seconds(1)));
    }

    #[test]
    fn test_invalid_after_one_hour() {
        let now = Utc::now().naive_utc();
        let token = token_created_at(now);
        assert!(!token.is_valid(now + Duration::hours(1)));
        assert!(!token.is_valid(now + Duration::hours(2)));
    }

    #[test]
    fn test_invalid_once_used() {
        let now = Utc::now().naive_utc();
        let mut token = token_created_at(now);
        token.used = true;
        assert!(!token.is_valid(now + Duration::seconds(1)));
    }
}
