//pour les réponses structurées de l'API
use serde::Serialize;
use crate::models::candidature;

/// Candidature telle qu'exposée par l'API: les tags sérialisés en base
/// sont désérialisés en vraie liste JSON
#[derive(Debug, Clone, Serialize)]
pub struct CandidatureResponse {
    pub id: i32,
    pub user_id: i32,
    pub entreprise: String,
    pub annonce: String,
    pub date: String,
    pub etat: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub contact_nom: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub rappel_date: Option<chrono::NaiveDateTime>,
    pub salaire: Option<String>,
    pub localisation: Option<String>,
    pub type_contrat: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<candidature::Model> for CandidatureResponse {
    fn from(m: candidature::Model) -> Self {
        let tags = m
            .tags
            .as_deref()
            .and_then(|t| serde_json::from_str::<Vec<String>>(t).ok())
            .unwrap_or_default();

        Self {
            id: m.id,
            user_id: m.user_id,
            entreprise: m.entreprise,
            annonce: m.annonce,
            date: m.date,
            etat: m.etat,
            notes: m.notes,
            tags,
            contact_nom: m.contact_nom,
            contact_email: m.contact_email,
            contact_telephone: m.contact_telephone,
            rappel_date: m.rappel_date,
            salaire: m.salaire,
            localisation: m.localisation,
            type_contrat: m.type_contrat,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn modele(tags: Option<&str>) -> candidature::Model {
        let now = Utc::now().naive_utc();
        candidature::Model {
            id: 1,
            user_id: 1,
            entreprise: "Acme".to_string(),
            annonce: "Dev Rust".to_string(),
            date: "2024-01-01".to_string(),
            etat: "en_attente".to_string(),
            notes: None,
            tags: tags.map(|t| t.to_string()),
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

    #[test]
    fn test_tags_round_trip() {
        let m = modele(Some(r#"["remote","urgent"]"#));
        let resp = CandidatureResponse::from(m);
        assert_eq!(resp.tags, vec!["remote".to_string(), "urgent".to_string()]);
    }

    #[test]
    fn test_tags_absents_ou_invalides() {
        assert!(CandidatureResponse::from(modele(None)).tags.is_empty());
        assert!(CandidatureResponse::from(modele(Some("pas du json"))).tags.is_empty());
    }
}
