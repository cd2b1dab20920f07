use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

/// États possibles d'une candidature. Aucun graphe de transition imposé:
/// n'importe quel état peut être remplacé par n'importe quel autre.
pub const ETATS: [&str; 7] = [
    "en_attente",
    "entretien_passe",
    "accepte",
    "refus_etude",
    "refuse_entretien",
    "sans_reponse",
    "sans_reponse_entretien",
];

pub const ETAT_DEFAUT: &str = "en_attente";

pub fn is_valid_etat(etat: &str) -> bool {
    ETATS.contains(&etat)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "candidatures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub entreprise: String,
    #[sea_orm(column_type = "Text")]
    pub annonce: String,
    pub date: String,
    pub etat: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    // Liste de tags sérialisée en JSON (["remote","urgent"])
    pub tags: Option<String>,
    pub contact_nom: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub rappel_date: Option<DateTime>,
    pub salaire: Option<String>,
    pub localisation: Option<String>,
    pub type_contrat: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::document::Entity")]
    Document,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etats_connus() {
        assert!(is_valid_etat("en_attente"));
        assert!(is_valid_etat("sans_reponse_entretien"));
        assert!(!is_valid_etat("embauche"));
        assert!(!is_valid_etat(""));
    }
}
