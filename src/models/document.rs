use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub candidature_id: i32,
    pub nom_fichier: String,
    pub type_document: String,
    // Chemin de stockage sur disque (uploads/<user_id>/<timestamp>_<nom>)
    pub url_fichier: String,
    pub taille: Option<i32>,
    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::candidature::Entity",
        from = "Column::CandidatureId",
        to = "super::candidature::Column::Id"
    )]
    Candidature,
}

impl Related<super::candidature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Candidature.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
