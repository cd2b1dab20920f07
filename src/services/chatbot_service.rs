// ============================================================================
// SERVICE CHATBOT - assistant conversationnel de suivi de candidatures
// ============================================================================
//
// Répond à un message libre, éventuellement ancré dans un instantané des
// candidatures de l'utilisateur. Le contexte statistique n'est ajouté au
// prompt que si le message semble parler de candidatures (heuristique par
// mots-clés), pour garder le prompt minimal.
//
// Ce service ne peut pas échouer: sans clé Gemini ou sur toute erreur
// d'appel, une réponse locale déterministe est produite.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::services::providers::{CompletionProvider, GeminiProvider, GenerationParams};

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 1500;

/// Mots-clés indiquant que le message parle des candidatures suivies
const CANDIDATURE_KEYWORDS: [&str; 12] = [
    "candidature",
    "postul",
    "entretien",
    "refus",
    "accept",
    "entreprise",
    "offre",
    "relance",
    "statistique",
    "combien",
    "total",
    "attente",
];

/// Mots-clés déclenchant le plafond "analytique" (250 mots au lieu de 150)
const ANALYTICAL_KEYWORDS: [&str; 6] = [
    "analyse",
    "conseil",
    "pourquoi",
    "statistique",
    "bilan",
    "stratégie",
];

/// Instantané minimal d'une candidature tel qu'envoyé par le frontend
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCandidature {
    pub entreprise: String,
    pub etat: String,
    #[serde(default)]
    pub type_contrat: Option<String>,
    #[serde(default)]
    pub localisation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub provider: String,
}

#[derive(Debug, Default, PartialEq)]
struct ChatStats {
    total: usize,
    en_attente: usize,
    entretiens: usize,
    refuses: usize,
    acceptees: usize,
}

pub struct ChatBotService {
    gemini: Option<GeminiProvider>,
}

impl ChatBotService {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            gemini: config.gemini_key.clone().map(GeminiProvider::new),
        }
    }

    /// Répond au message. Fallback local garanti: cette fonction réussit toujours.
    pub async fn generate_response(
        &self,
        message: &str,
        candidatures: &[ChatCandidature],
    ) -> ChatReply {
        let Some(gemini) = &self.gemini else {
            return fallback_response(message, candidatures);
        };

        let prompt = build_chat_prompt(message, candidatures);
        let params = GenerationParams {
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
        };

        match gemini.complete(&prompt, &params).await {
            Ok(completion) => ChatReply {
                success: true,
                response: completion.text,
                provider: gemini.label().to_string(),
            },
            Err(e) => {
                log::warn!("Chatbot: échec Gemini, fallback local ({})", e);
                fallback_response(message, candidatures)
            }
        }
    }
}

fn analyze_candidatures(candidatures: &[ChatCandidature]) -> ChatStats {
    let mut stats = ChatStats {
        total: candidatures.len(),
        ..Default::default()
    };

    for c in candidatures {
        match c.etat.as_str() {
            "en_attente" => stats.en_attente += 1,
            "entretien_passe" => stats.entretiens += 1,
            "refus_etude" | "refuse_entretien" => stats.refuses += 1,
            "accepte" => stats.acceptees += 1,
            _ => {}
        }
    }

    stats
}

fn mentions_candidatures(message: &str) -> bool {
    let lower = message.to_lowercase();
    CANDIDATURE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_analytical(message: &str) -> bool {
    let lower = message.to_lowercase();
    ANALYTICAL_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn build_chat_prompt(message: &str, candidatures: &[ChatCandidature]) -> String {
    let max_mots = if is_analytical(message) { 250 } else { 150 };

    let mut prompt = String::from(
        "Tu es un assistant virtuel expert en recherche d'emploi et suivi de candidatures. \
         Tu t'appelles \"Assistant ApplicationTrack\".\n\n",
    );

    // Contexte ajouté seulement si le message parle de candidatures
    if mentions_candidatures(message) && !candidatures.is_empty() {
        let stats = analyze_candidatures(candidatures);
        prompt.push_str(&format!(
            "**CONTEXTE DE L'UTILISATEUR :**\n\
             - Nombre total de candidatures : {}\n\
             - En attente de réponse : {}\n\
             - Entretiens passés : {}\n\
             - Refus : {}\n\
             - Acceptées : {}\n\n",
            stats.total, stats.en_attente, stats.entretiens, stats.refuses, stats.acceptees
        ));

        // Les candidatures arrivent déjà triées de la plus récente à la plus ancienne
        prompt.push_str("**DERNIÈRES CANDIDATURES :**\n");
        for c in candidatures.iter().take(3) {
            prompt.push_str(&format!("- {} ({})\n", c.entreprise, c.etat));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "**MESSAGE DE L'UTILISATEUR :**\n\"{message}\"\n\n\
         **INSTRUCTIONS :**\n\
         1. Réponds de manière amicale, concise mais COMPLÈTE\n\
         2. Si l'utilisateur demande des statistiques, base-toi sur le contexte ci-dessus\n\
         3. Si l'utilisateur demande des conseils, sois spécifique et actionnable\n\
         4. Génère une réponse COMPLÈTE, ne t'arrête pas au milieu d'une phrase\n\
         5. Maximum {max_mots} mots dans ta réponse\n\n\
         Génère une réponse utile, personnalisée et COMPLÈTE."
    ));

    prompt
}

/// Réponse locale déterministe, par groupes de mots-clés
fn fallback_response(message: &str, candidatures: &[ChatCandidature]) -> ChatReply {
    let lower = message.to_lowercase();
    let stats = analyze_candidatures(candidatures);

    let response = if ["combien", "nombre", "statistique", "total"]
        .iter()
        .any(|k| lower.contains(k))
    {
        format!(
            "📊 **Voici tes statistiques :**\n\n\
             • Total de candidatures : {}\n\
             • En attente : {}\n\
             • Entretiens passés : {}\n\
             • Refus : {}\n\
             • Acceptées : {}\n\n\
             Continue comme ça ! 💪",
            stats.total, stats.en_attente, stats.entretiens, stats.refuses, stats.acceptees
        )
    } else if ["conseil", "aide", "comment", "que faire"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "💡 **Quelques conseils généraux :**\n\n\
         • Relance les entreprises 1-2 semaines après candidature\n\
         • Personnalise chaque lettre de motivation\n\
         • Prépare des questions pour les entretiens\n\
         • Note tes impressions après chaque contact\n\
         • Reste motivé(e), la recherche prend du temps !\n\n\
         N'hésite pas à demander plus de détails ! 😊"
            .to_string()
    } else if ["relance", "email", "contacter"].iter().any(|k| lower.contains(k)) {
        "✉️ **Modèle d'email de relance :**\n\n\
         Objet : Suivi de ma candidature - [Poste]\n\n\
         Bonjour,\n\n\
         Je me permets de revenir vers vous concernant ma candidature pour le poste de [Poste] \
         envoyée le [Date].\n\n\
         Toujours très intéressé(e) par cette opportunité, je reste à votre disposition pour échanger.\n\n\
         Cordialement,\n\
         [Ton nom]\n\n\
         Simple et efficace ! 👍"
            .to_string()
    } else {
        format!(
            "Je suis ton assistant ApplicationTrack ! 🤖\n\n\
             Je peux t'aider à :\n\
             • 📊 Analyser tes {} candidatures\n\
             • 💡 Te donner des conseils personnalisés\n\
             • ✉️ Rédiger des emails de relance\n\
             • 🎯 Préparer tes entretiens\n\n\
             Pose-moi une question plus précise ! 😊",
            stats.total
        )
    };

    ChatReply {
        success: true,
        response,
        provider: "Réponse automatique".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<ChatCandidature> {
        let etats = [
            ("Acme", "en_attente"),
            ("Globex", "entretien_passe"),
            ("Initech", "refus_etude"),
            ("Umbrella", "accepte"),
            ("Stark", "refuse_entretien"),
        ];
        etats
            .iter()
            .map(|(entreprise, etat)| ChatCandidature {
                entreprise: entreprise.to_string(),
                etat: etat.to_string(),
                type_contrat: None,
                localisation: None,
            })
            .collect()
    }

    #[test]
    fn test_analyze_candidatures() {
        let stats = analyze_candidatures(&snapshot());
        assert_eq!(
            stats,
            ChatStats {
                total: 5,
                en_attente: 1,
                entretiens: 1,
                refuses: 2,
                acceptees: 1,
            }
        );
    }

    #[test]
    fn test_prompt_includes_context_only_when_relevant() {
        let with_context = build_chat_prompt("Combien de candidatures en attente ?", &snapshot());
        assert!(with_context.contains("CONTEXTE DE L'UTILISATEUR"));
        assert!(with_context.contains("Acme (en_attente)"));

        let without_context = build_chat_prompt("Quel temps fait-il ?", &snapshot());
        assert!(!without_context.contains("CONTEXTE DE L'UTILISATEUR"));
    }

    #[test]
    fn test_prompt_limits_to_three_candidatures() {
        let prompt = build_chat_prompt("Parle-moi de mes candidatures", &snapshot());
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("Initech"));
        assert!(!prompt.contains("Umbrella"));
        assert!(!prompt.contains("Stark"));
    }

    #[test]
    fn test_word_cap_depends_on_message() {
        assert!(build_chat_prompt("bonjour candidature", &snapshot()).contains("Maximum 150 mots"));
        assert!(
            build_chat_prompt("fais-moi une analyse de mes candidatures", &snapshot())
                .contains("Maximum 250 mots")
        );
    }

    #[tokio::test]
    async fn test_fallback_without_key_never_fails() {
        let service = ChatBotService::new(&crate::config::AiConfig::default());

        let stats_reply = service
            .generate_response("Combien de candidatures au total ?", &snapshot())
            .await;
        assert!(stats_reply.success);
        assert!(stats_reply.response.contains("Total de candidatures : 5"));
        assert_eq!(stats_reply.provider, "Réponse automatique");

        let generic = service.generate_response("blabla", &[]).await;
        assert!(generic.success);
        assert!(generic.response.contains("assistant ApplicationTrack"));
    }

    #[tokio::test]
    async fn test_fallback_email_template() {
        let service = ChatBotService::new(&crate::config::AiConfig::default());
        let reply = service
            .generate_response("Je veux rédiger un email de relance", &[])
            .await;
        assert!(reply.response.contains("Objet : Suivi de ma candidature"));
    }
}
