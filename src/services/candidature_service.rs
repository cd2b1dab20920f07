// Filtrage, tri et export CSV des candidatures d'un utilisateur.
// Les candidatures sont chargées depuis la BD puis traitées en mémoire,
// ce qui garde la logique pure et testable sans base.

use serde::Deserialize;

use crate::models::candidature::Model as Candidature;

/// Paramètres de requête de la liste de candidatures
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub etat: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub type_contrat: Option<String>,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

pub struct CandidatureService;

impl CandidatureService {
    /// Applique filtres puis tri. Tri par défaut: created_at décroissant.
    /// Le tri par entreprise est octet par octet (sensible à la casse).
    pub fn filter_and_sort(candidatures: Vec<Candidature>, query: &ListQuery) -> Vec<Candidature> {
        let mut result: Vec<Candidature> = candidatures
            .into_iter()
            .filter(|c| Self::matches(c, query))
            .collect();

        match query.sort_by.as_deref() {
            Some("entreprise") => result.sort_by(|a, b| a.entreprise.cmp(&b.entreprise)),
            // Les dates sont au format YYYY-MM-DD: l'ordre lexical suit l'ordre chronologique
            Some("date") => result.sort_by(|a, b| a.date.cmp(&b.date)),
            _ => result.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }

        // Ordre par défaut: décroissant
        let descending = query.sort_order.as_deref() != Some("asc");

        if descending {
            result.reverse();
        }

        result
    }

    fn matches(c: &Candidature, query: &ListQuery) -> bool {
        if let Some(etat) = query.etat.as_deref() {
            if c.etat != etat {
                return false;
            }
        }

        if let Some(type_contrat) = query.type_contrat.as_deref() {
            if c.type_contrat.as_deref() != Some(type_contrat) {
                return false;
            }
        }

        // Recherche insensible à la casse sur plusieurs champs texte
        if let Some(search) = query.search.as_deref() {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(c.entreprise.as_str()),
                Some(c.annonce.as_str()),
                c.notes.as_deref(),
                c.localisation.as_deref(),
                c.contact_nom.as_deref(),
            ];
            let found = haystacks
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }

        // Filtre par sous-chaîne sur les tags sérialisés
        if let Some(tags) = query.tags.as_deref() {
            match c.tags.as_deref() {
                Some(serialized) if serialized.contains(tags) => {}
                _ => return false,
            }
        }

        // Plage de dates inclusive sur la date de candidature (YYYY-MM-DD)
        if let Some(debut) = query.date_debut.as_deref() {
            if c.date.as_str() < debut {
                return false;
            }
        }
        if let Some(fin) = query.date_fin.as_deref() {
            if c.date.as_str() > fin {
                return false;
            }
        }

        true
    }

    /// Export CSV: une ligne par candidature, colonnes fixes,
    /// timestamps au format ISO
    pub fn export_csv(candidatures: &[Candidature]) -> Result<Vec<u8>, String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record([
                "id",
                "entreprise",
                "annonce",
                "date",
                "etat",
                "notes",
                "created_at",
                "updated_at",
            ])
            .map_err(|e| format!("CSV header: {}", e))?;

        for c in candidatures {
            writer
                .write_record([
                    c.id.to_string(),
                    c.entreprise.clone(),
                    c.annonce.clone(),
                    c.date.clone(),
                    c.etat.clone(),
                    c.notes.clone().unwrap_or_default(),
                    c.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    c.updated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
                ])
                .map_err(|e| format!("CSV row: {}", e))?;
        }

        writer
            .into_inner()
            .map_err(|e| format!("CSV flush: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candidature(id: i32, entreprise: &str, etat: &str, date: &str, days_ago: i64) -> Candidature {
        let created = Utc::now().naive_utc() - Duration::days(days_ago);
        Candidature {
            id,
            user_id: 1,
            entreprise: entreprise.to_string(),
            annonce: format!("Annonce de {}", entreprise),
            date: date.to_string(),
            etat: etat.to_string(),
            notes: None,
            tags: None,
            contact_nom: None,
            contact_email: None,
            contact_telephone: None,
            rappel_date: None,
            salaire: None,
            localisation: None,
            type_contrat: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn sample() -> Vec<Candidature> {
        vec![
            candidature(1, "Zenith", "en_attente", "2024-01-10", 3),
            candidature(2, "acme", "accepte", "2024-01-05", 2),
            candidature(3, "Banque Centrale", "en_attente", "2024-01-20", 1),
        ]
    }

    #[test]
    fn test_default_sort_created_at_desc() {
        let result = CandidatureService::filter_and_sort(sample(), &ListQuery::default());
        let ids: Vec<i32> = result.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_entreprise_asc_is_case_sensitive() {
        let query = ListQuery {
            sort_by: Some("entreprise".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(sample(), &query);
        let noms: Vec<&str> = result.iter().map(|c| c.entreprise.as_str()).collect();
        // Ordre octet par octet: les majuscules avant les minuscules
        assert_eq!(noms, vec!["Banque Centrale", "Zenith", "acme"]);
    }

    #[test]
    fn test_sort_by_date_desc() {
        let query = ListQuery {
            sort_by: Some("date".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(sample(), &query);
        let dates: Vec<&str> = result.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-20", "2024-01-10", "2024-01-05"]);
    }

    #[test]
    fn test_filter_etat_exact() {
        let query = ListQuery {
            etat: Some("en_attente".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(sample(), &query);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.etat == "en_attente"));
    }

    #[test]
    fn test_search_case_insensitive_multi_field() {
        let mut cands = sample();
        cands[0].notes = Some("Contact via LinkedIn".to_string());

        let query = ListQuery {
            search: Some("linkedin".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(cands, &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);

        let query = ListQuery {
            search: Some("ACME".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(sample(), &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].entreprise, "acme");
    }

    #[test]
    fn test_filter_tags_substring() {
        let mut cands = sample();
        cands[1].tags = Some(r#"["remote","urgent"]"#.to_string());

        let query = ListQuery {
            tags: Some("remote".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(cands, &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_date_range_inclusive() {
        let query = ListQuery {
            date_debut: Some("2024-01-05".to_string()),
            date_fin: Some("2024-01-10".to_string()),
            ..Default::default()
        };
        let result = CandidatureService::filter_and_sort(sample(), &query);
        let ids: Vec<i32> = result.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&1) && ids.contains(&2));
    }

    #[test]
    fn test_export_csv_format() {
        let csv_bytes = CandidatureService::export_csv(&sample()).unwrap();
        let content = String::from_utf8(csv_bytes).unwrap();
        let mut lines = content.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,entreprise,annonce,date,etat,notes,created_at,updated_at"
        );
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains("Zenith"));
        assert!(content.contains("2024-01-05"));
    }
}
