// Statistiques de candidatures: compteurs par état, taux (réponse /
// entretien / acceptation) et séries temporelles, calculés en mémoire
// sur les candidatures chargées de l'utilisateur.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::candidature::Model as Candidature;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct EtatCounts {
    pub total: usize,
    pub en_attente: usize,
    pub entretien_passe: usize,
    pub accepte: usize,
    pub refus_etude: usize,
    pub refuse_entretien: usize,
    pub sans_reponse: usize,
    pub sans_reponse_entretien: usize,
}

#[derive(Debug, Serialize)]
pub struct TimelinePoint {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MonthBucket {
    pub mois: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AdvancedStats {
    #[serde(flatten)]
    pub counts: EtatCounts,
    pub taux_reponse: f64,
    pub taux_entretien: f64,
    pub taux_acceptation: f64,
    pub timeline: Vec<TimelinePoint>,
    pub par_mois: Vec<MonthBucket>,
}

pub struct StatsService;

impl StatsService {
    /// Compteurs de base par état
    pub fn count_etats(candidatures: &[Candidature]) -> EtatCounts {
        let mut counts = EtatCounts {
            total: candidatures.len(),
            ..Default::default()
        };

        for c in candidatures {
            match c.etat.as_str() {
                "en_attente" => counts.en_attente += 1,
                "entretien_passe" => counts.entretien_passe += 1,
                "accepte" => counts.accepte += 1,
                "refus_etude" => counts.refus_etude += 1,
                "refuse_entretien" => counts.refuse_entretien += 1,
                "sans_reponse" => counts.sans_reponse += 1,
                "sans_reponse_entretien" => counts.sans_reponse_entretien += 1,
                _ => {}
            }
        }

        counts
    }

    /// Statistiques avancées: taux en pourcentages arrondis à 2 décimales,
    /// timeline sur 7 jours et série sur 6 tranches de 30 jours.
    /// total == 0 => structure entièrement à zéro (pas de division)
    pub fn advanced(candidatures: &[Candidature], now: NaiveDateTime) -> AdvancedStats {
        let counts = Self::count_etats(candidatures);
        let total = counts.total;

        let (taux_reponse, taux_entretien, taux_acceptation) = if total == 0 {
            (0.0, 0.0, 0.0)
        } else {
            // "sans réponse" n'inclut pas sans_reponse_entretien: un entretien
            // obtenu implique une réponse de l'entreprise
            let avec_reponse = total - counts.sans_reponse - counts.en_attente;
            let entretiens = counts.entretien_passe + counts.refuse_entretien + counts.accepte;

            (
                percent(avec_reponse, total),
                percent(entretiens, total),
                percent(counts.accepte, total),
            )
        };

        AdvancedStats {
            counts,
            taux_reponse,
            taux_entretien,
            taux_acceptation,
            timeline: Self::timeline(candidatures, now.date()),
            par_mois: Self::par_mois(candidatures, now.date()),
        }
    }

    /// Nombre de candidatures créées chaque jour sur les 7 derniers jours
    fn timeline(candidatures: &[Candidature], today: NaiveDate) -> Vec<TimelinePoint> {
        if candidatures.is_empty() {
            return Vec::new();
        }

        (0..7)
            .rev()
            .map(|offset| {
                let day = today - Duration::days(offset);
                let count = candidatures
                    .iter()
                    .filter(|c| c.created_at.date() == day)
                    .count();
                TimelinePoint {
                    date: day.format("%Y-%m-%d").to_string(),
                    count,
                }
            })
            .collect()
    }

    /// Série sur 6 tranches de 30 jours, de la plus ancienne à la plus récente
    fn par_mois(candidatures: &[Candidature], today: NaiveDate) -> Vec<MonthBucket> {
        if candidatures.is_empty() {
            return Vec::new();
        }

        (0..6)
            .rev()
            .map(|bucket| {
                let end = today - Duration::days(bucket * 30);
                let start = end - Duration::days(30);
                let count = candidatures
                    .iter()
                    .filter(|c| {
                        let d = c.created_at.date();
                        d > start && d <= end
                    })
                    .count();
                MonthBucket {
                    mois: end.format("%Y-%m").to_string(),
                    count,
                }
            })
            .collect()
    }
}

fn percent(part: usize, total: usize) -> f64 {
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidature(etat: &str, created_days_ago: i64) -> Candidature {
        let created = Utc::now().naive_utc() - Duration::days(created_days_ago);
        Candidature {
            id: 0,
            user_id: 1,
            entreprise: "Acme".to_string(),
            annonce: "annonce".to_string(),
            date: "2024-01-01".to_string(),
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

    #[test]
    fn test_count_etats() {
        let cands = vec![
            candidature("en_attente", 0),
            candidature("en_attente", 1),
            candidature("accepte", 2),
            candidature("refus_etude", 3),
        ];
        let counts = StatsService::count_etats(&cands);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.en_attente, 2);
        assert_eq!(counts.accepte, 1);
        assert_eq!(counts.refus_etude, 1);
        assert_eq!(counts.entretien_passe, 0);
    }

    #[test]
    fn test_advanced_zero_candidatures() {
        let stats = StatsService::advanced(&[], Utc::now().naive_utc());
        assert_eq!(stats.counts.total, 0);
        assert_eq!(stats.taux_reponse, 0.0);
        assert_eq!(stats.taux_entretien, 0.0);
        assert_eq!(stats.taux_acceptation, 0.0);
        assert!(stats.timeline.is_empty());
        assert!(stats.par_mois.is_empty());
    }

    #[test]
    fn test_advanced_rates() {
        // 6 candidatures: 1 en_attente, 1 sans_reponse, 2 entretien_passe,
        // 1 refuse_entretien, 1 accepte
        let cands = vec![
            candidature("en_attente", 0),
            candidature("sans_reponse", 0),
            candidature("entretien_passe", 0),
            candidature("entretien_passe", 0),
            candidature("refuse_entretien", 0),
            candidature("accepte", 0),
        ];
        let stats = StatsService::advanced(&cands, Utc::now().naive_utc());

        // (6 - 1 - 1) / 6 = 66.67%
        assert_eq!(stats.taux_reponse, 66.67);
        // (2 + 1 + 1) / 6 = 66.67%
        assert_eq!(stats.taux_entretien, 66.67);
        // 1 / 6 = 16.67%
        assert_eq!(stats.taux_acceptation, 16.67);
    }

    #[test]
    fn test_timeline_seven_days() {
        let cands = vec![
            candidature("en_attente", 0),
            candidature("en_attente", 0),
            candidature("en_attente", 3),
            candidature("en_attente", 30), // hors fenêtre
        ];
        let timeline = StatsService::timeline(&cands, Utc::now().naive_utc().date());
        assert_eq!(timeline.len(), 7);
        assert_eq!(timeline[6].count, 2); // aujourd'hui en dernier
        assert_eq!(timeline[3].count, 1);
        assert_eq!(timeline.iter().map(|p| p.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_par_mois_six_buckets() {
        let cands = vec![
            candidature("en_attente", 5),
            candidature("en_attente", 45),
            candidature("en_attente", 200), // hors fenêtre (> 180 jours)
        ];
        let buckets = StatsService::par_mois(&cands, Utc::now().naive_utc().date());
        assert_eq!(buckets.len(), 6);
        assert_eq!(buckets[5].count, 1);
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}
