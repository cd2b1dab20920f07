use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Jamais exposé en JSON
    pub password_hash: String,
    pub telephone: Option<String>,
    pub ville: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::candidature::Entity")]
    Candidature,

    #[sea_orm(has_many = "super::password_reset_tokens::Entity")]
    PasswordResetToken,
}

impl Related<super::candidature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Candidature.def()
    }
}

impl Related<super::password_reset_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PasswordResetToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
