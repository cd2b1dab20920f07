// ============================================================================
// SERVICE IA - lettres de motivation, parsing d'annonces, score de matching
// ============================================================================
//
// Trois opérations au-dessus des providers de complétion:
//   - generate_cover_letter : lettre FR structurée (300-400 mots), fallback
//     template déterministe si la clé du provider demandé est absente
//   - parse_annonce : texte libre ou URL -> JSON strict (champs null, jamais
//     omis), échec immédiat si aucune clé configurée
//   - matching_score : score 0-100 + points forts/faibles + conseils, les
//     clés manquantes du JSON décodé sont remplacées par des défauts
//
// Toute erreur provider est capturée ici et remontée en AiError structurée
// (jamais de panique, clé API toujours redactée en amont).
// ============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiConfig;
use crate::models::candidature;
use crate::services::providers::{
    AnthropicProvider, Completion, CompletionProvider, GeminiProvider, GenerationParams,
    OpenAiProvider, ProviderError,
};
use crate::services::scraper;
use crate::utils::json_extract::extract_json_block;

const LETTER_TEMPERATURE: f32 = 0.7;
const LETTER_MAX_TOKENS: u32 = 1024;
// Sortie JSON: température basse pour limiter les digressions
const JSON_TEMPERATURE: f32 = 0.2;
const JSON_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Aucune clé API de provider IA n'est configurée")]
    NoProvider,

    #[error("Erreur {provider}: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Réponse IA non décodable en JSON (ligne {line}, colonne {column}): {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Récupération de l'annonce impossible: {0}")]
    Scrape(String),
}

impl AiError {
    /// Les erreurs d'entrée utilisateur donnent un 400, le reste un 500
    pub fn is_user_error(&self) -> bool {
        matches!(self, AiError::InvalidInput(_))
    }
}

/// Profil candidat fourni par le frontend (tous les champs optionnels,
/// remplacés par des placeholders dans les prompts)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub nom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub ville: Option<String>,
    pub experience: Option<String>,
    pub competences: Option<String>,
    pub motivation: Option<String>,
}

/// Données du poste, extraites d'une candidature existante
#[derive(Debug, Clone, Default)]
pub struct JobData {
    pub entreprise: String,
    pub annonce: String,
    pub type_contrat: Option<String>,
    pub localisation: Option<String>,
}

impl From<&candidature::Model> for JobData {
    fn from(c: &candidature::Model) -> Self {
        Self {
            entreprise: c.entreprise.clone(),
            annonce: c.annonce.clone(),
            type_contrat: c.type_contrat.clone(),
            localisation: c.localisation.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoverLetter {
    pub letter: String,
    pub provider: String,
    pub tokens_used: u32,
}

/// Résultat du parsing d'annonce: exactement ces champs, null si inconnu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAnnonce {
    pub entreprise: Option<String>,
    pub poste: Option<String>,
    pub type_contrat: Option<String>,
    pub salaire: Option<String>,
    pub localisation: Option<String>,
    #[serde(default)]
    pub competences: Vec<String>,
    pub resume: Option<String>,
}

fn default_score() -> i64 {
    50
}

/// Résultat du matching: les clés absentes du JSON décodé prennent des
/// valeurs par défaut au lieu de faire échouer l'opération
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingResult {
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default)]
    pub points_forts: Vec<String>,
    #[serde(default)]
    pub points_faibles: Vec<String>,
    #[serde(default)]
    pub conseils: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvidersStatus {
    pub openai: bool,
    pub anthropic: bool,
    pub gemini: bool,
}

pub struct AiService {
    config: AiConfig,
}

impl AiService {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// Providers dont la clé est configurée
    pub fn check_config(&self) -> ProvidersStatus {
        ProvidersStatus {
            openai: self.config.openai_key.is_some(),
            anthropic: self.config.anthropic_key.is_some(),
            gemini: self.config.gemini_key.is_some(),
        }
    }

    /// Lookup par nom de provider, restreint à ceux dont la clé est présente
    fn provider(&self, name: &str) -> Option<Box<dyn CompletionProvider>> {
        match name {
            "openai" => self
                .config
                .openai_key
                .clone()
                .map(|k| Box::new(OpenAiProvider::new(k)) as Box<dyn CompletionProvider>),
            "anthropic" => self
                .config
                .anthropic_key
                .clone()
                .map(|k| Box::new(AnthropicProvider::new(k)) as Box<dyn CompletionProvider>),
            "gemini" => self
                .config
                .gemini_key
                .clone()
                .map(|k| Box::new(GeminiProvider::new(k)) as Box<dyn CompletionProvider>),
            _ => None,
        }
    }

    /// Premier provider configuré, dans l'ordre openai > anthropic > gemini
    fn any_provider(&self) -> Option<Box<dyn CompletionProvider>> {
        ["openai", "anthropic", "gemini"]
            .iter()
            .find_map(|name| self.provider(name))
    }

    async fn call(
        &self,
        provider: &dyn CompletionProvider,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<Completion, AiError> {
        provider
            .complete(prompt, &params)
            .await
            .map_err(|source| AiError::Provider { provider: provider.label(), source })
    }

    // ------------------------------------------------------------------
    // Lettre de motivation
    // ------------------------------------------------------------------

    /// Génère une lettre via le provider demandé, ou retombe sur le template
    /// déterministe si sa clé n'est pas configurée (ce chemin réussit toujours)
    pub async fn generate_cover_letter(
        &self,
        job: &JobData,
        profile: Option<&UserProfile>,
        provider_name: &str,
    ) -> Result<CoverLetter, AiError> {
        let Some(provider) = self.provider(provider_name) else {
            return Ok(template_letter(job, profile));
        };

        let prompt = build_letter_prompt(job, profile);
        let params = GenerationParams {
            temperature: LETTER_TEMPERATURE,
            max_tokens: LETTER_MAX_TOKENS,
        };

        let completion = self.call(provider.as_ref(), &prompt, params).await?;

        Ok(CoverLetter {
            letter: completion.text,
            provider: provider.label().to_string(),
            tokens_used: completion.tokens_used,
        })
    }

    // ------------------------------------------------------------------
    // Parsing d'annonce
    // ------------------------------------------------------------------

    /// Parse une annonce (texte direct ou URL à scraper) en champs structurés
    pub async fn parse_annonce(
        &self,
        texte: Option<&str>,
        url: Option<&str>,
        provider_name: Option<&str>,
    ) -> Result<ParsedAnnonce, AiError> {
        let provider = match provider_name {
            Some(name) => self.provider(name).ok_or(AiError::NoProvider)?,
            None => self.any_provider().ok_or(AiError::NoProvider)?,
        };

        let (annonce, company_hint) = match (texte, url) {
            (Some(t), _) if !t.trim().is_empty() => (t.trim().to_string(), None),
            (_, Some(u)) if !u.trim().is_empty() => {
                let scraped = scraper::fetch_announcement(u.trim())
                    .await
                    .map_err(AiError::Scrape)?;
                (scraped.text, scraped.company_guess)
            }
            _ => {
                return Err(AiError::InvalidInput(
                    "Fournir le texte de l'annonce ou son URL".to_string(),
                ));
            }
        };

        let prompt = build_parse_prompt(&annonce, company_hint.as_deref());
        let params = GenerationParams {
            temperature: JSON_TEMPERATURE,
            max_tokens: JSON_MAX_TOKENS,
        };

        let completion = self.call(provider.as_ref(), &prompt, params).await?;
        decode_ai_json(&completion.text)
    }

    // ------------------------------------------------------------------
    // Score de matching
    // ------------------------------------------------------------------

    pub async fn matching_score(
        &self,
        job: &JobData,
        profile: &UserProfile,
        provider_name: Option<&str>,
    ) -> Result<MatchingResult, AiError> {
        let provider = match provider_name {
            Some(name) => self.provider(name).ok_or(AiError::NoProvider)?,
            None => self.any_provider().ok_or(AiError::NoProvider)?,
        };

        let prompt = build_matching_prompt(job, profile);
        let params = GenerationParams {
            temperature: JSON_TEMPERATURE,
            max_tokens: JSON_MAX_TOKENS,
        };

        let completion = self.call(provider.as_ref(), &prompt, params).await?;
        decode_ai_json(&completion.text)
    }
}

/// Nettoie la sortie du modèle puis la décode; l'échec remonte la position
/// exacte du parseur (la réparation d'un JSON tronqué n'est pas tentée)
fn decode_ai_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let cleaned = extract_json_block(text);
    serde_json::from_str(cleaned).map_err(|e| AiError::Parse {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}

fn field_or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Prompts
// ----------------------------------------------------------------------------

pub fn build_letter_prompt(job: &JobData, profile: Option<&UserProfile>) -> String {
    let p = profile.cloned().unwrap_or_default();

    let nom = field_or_placeholder(p.nom.as_deref(), "Le Candidat");
    let email = field_or_placeholder(p.email.as_deref(), "[À compléter]");
    let telephone = field_or_placeholder(p.telephone.as_deref(), "[À compléter]");
    let ville = field_or_placeholder(p.ville.as_deref(), "[À compléter]");
    let experience = p.experience.unwrap_or_default();
    let competences = p.competences.unwrap_or_default();
    let motivation = p.motivation.unwrap_or_default();

    let entreprise = &job.entreprise;
    let type_contrat = job.type_contrat.as_deref().unwrap_or("");
    let localisation = job.localisation.as_deref().unwrap_or("");

    format!(
        r#"Tu es un expert en recrutement et rédaction de lettres de motivation professionnelles en français.

Génère une lettre de motivation COMPLÈTE et personnalisée pour cette candidature :

**INFORMATIONS SUR LE POSTE :**
- Entreprise : {entreprise}
- Type de contrat : {type_contrat}
- Localisation : {localisation}
- Description complète du poste :
{annonce}

**PROFIL DU CANDIDAT :**
- Nom complet : {nom}
- Email : {email}
- Téléphone : {telephone}
- Ville : {ville}
- Années d'expérience : {experience}
- Compétences clés : {competences}
- Motivation personnelle : {motivation}

**INSTRUCTIONS POUR LA LETTRE :**
1. **En-tête** : Commence par les coordonnées du candidat :
   - {nom}
   - [Adresse complète à compléter]
   - {telephone}
   - {email}
2. **Date** : Ajoute [Date] comme placeholder
3. **Destinataire** : Ajoute {entreprise} et [Adresse de l'entreprise]
4. **Objet** : Ligne "Objet : Candidature au poste de {type_contrat}"
5. **Corps de la lettre** :
   - Introduction : Pourquoi je postule, comment j'ai découvert l'offre
   - Paragraphe 1 : Mon expérience de {experience} et mes compétences ({competences}) en lien avec le poste
   - Paragraphe 2 : Analyse de l'offre et en quoi mon profil correspond parfaitement
   - Paragraphe 3 : Ma motivation ({motivation}) et ce que je peux apporter à {entreprise}
   - Conclusion : Disponibilité pour un entretien
6. **Formule de politesse** : Formule de politesse professionnelle
7. **Signature** : {nom}

**CRITÈRES IMPORTANTS :**
- Ton professionnel, enthousiaste et personnalisé
- Utilise VRAIMENT les informations du candidat (expérience, compétences, motivation)
- Analyse l'offre d'emploi et fais des liens concrets
- Longueur : 300-400 mots
- Format français standard avec sauts de lignes appropriés
- AUCUN commentaire ou note en dehors de la lettre

Génère UNIQUEMENT la lettre complète, prête à être envoyée."#,
        annonce = job.annonce,
    )
}

pub fn build_parse_prompt(annonce: &str, company_hint: Option<&str>) -> String {
    let hint = match company_hint {
        Some(c) => format!(
            "\nIndice : le domaine de l'annonce suggère que l'entreprise est \"{}\".\n",
            c
        ),
        None => String::new(),
    };

    format!(
        r#"Analyse cette offre d'emploi et extrais-en les informations structurées.
{hint}
**ANNONCE :**
{annonce}

**RÉPONSE ATTENDUE :**
Réponds UNIQUEMENT avec un objet JSON valide, sans texte autour, avec EXACTEMENT ces champs :
{{
  "entreprise": "nom de l'entreprise ou null",
  "poste": "intitulé du poste ou null",
  "type_contrat": "CDI, CDD, stage, alternance, freelance... ou null",
  "salaire": "fourchette de salaire ou null",
  "localisation": "ville/région ou null",
  "competences": ["liste", "des", "compétences", "demandées"],
  "resume": "résumé de l'offre en une phrase ou null"
}}

Chaque champ inconnu doit valoir null, jamais être omis. Pas de markdown, pas de commentaire."#,
    )
}

pub fn build_matching_prompt(job: &JobData, profile: &UserProfile) -> String {
    let experience = field_or_placeholder(profile.experience.as_deref(), "[non renseignée]");
    let competences = field_or_placeholder(profile.competences.as_deref(), "[non renseignées]");
    let motivation = field_or_placeholder(profile.motivation.as_deref(), "[non renseignée]");

    format!(
        r#"Tu es un expert en recrutement. Évalue l'adéquation entre ce candidat et ce poste.

**POSTE :**
- Entreprise : {entreprise}
- Type de contrat : {type_contrat}
- Annonce :
{annonce}

**CANDIDAT :**
- Expérience : {experience}
- Compétences : {competences}
- Motivation : {motivation}

**RÉPONSE ATTENDUE :**
Réponds UNIQUEMENT avec un objet JSON valide, sans texte autour :
{{
  "score": <entier entre 0 et 100>,
  "points_forts": ["..."],
  "points_faibles": ["..."],
  "conseils": ["..."]
}}"#,
        entreprise = job.entreprise,
        type_contrat = job.type_contrat.as_deref().unwrap_or(""),
        annonce = job.annonce,
    )
}

// ----------------------------------------------------------------------------
// Lettre template (fallback sans IA, réussit toujours)
// ----------------------------------------------------------------------------

pub fn template_letter(job: &JobData, profile: Option<&UserProfile>) -> CoverLetter {
    let p = profile.cloned().unwrap_or_default();

    let nom = field_or_placeholder(p.nom.as_deref(), "[Votre nom]");
    let email = field_or_placeholder(p.email.as_deref(), "[Email]");
    let telephone = field_or_placeholder(p.telephone.as_deref(), "[Téléphone]");
    let experience = field_or_placeholder(p.experience.as_deref(), "[X années d'expérience]");
    let competences = field_or_placeholder(p.competences.as_deref(), "[vos compétences]");
    let motivation = field_or_placeholder(p.motivation.as_deref(), "contribuer à vos projets");

    let entreprise = &job.entreprise;
    let type_contrat = job.type_contrat.as_deref().unwrap_or("poste");
    let lieu = job
        .localisation
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or("[Ville]");

    let contexte_poste = if job.annonce.len() > 50 {
        " décrit dans votre offre"
    } else {
        ""
    };

    let letter = format!(
        r#"{nom}
[Adresse complète]
{telephone}
{email}

[Date]

{entreprise}
[Adresse de l'entreprise]
{lieu}

Objet : Candidature pour le poste de {type_contrat}

Madame, Monsieur,

C'est avec un vif intérêt que je vous adresse ma candidature pour le poste de {type_contrat}{contexte_poste} au sein de {entreprise}.

Forte de {experience} dans le domaine, j'ai développé une expertise solide en {competences}. Mon parcours professionnel m'a permis d'acquérir des compétences techniques et relationnelles qui correspondent parfaitement aux exigences de ce poste.

Votre entreprise, {entreprise}, représente pour moi une opportunité exceptionnelle de {motivation}. Les responsabilités décrites dans l'offre résonnent particulièrement avec mon expérience et mes ambitions professionnelles.

Mes principales qualifications incluent :
- {experience} d'expérience pertinente dans le secteur
- Maîtrise de : {competences}
- Grande capacité d'adaptation et esprit d'équipe
- Motivation à relever de nouveaux défis

Je suis convaincu(e) que mon profil et ma motivation peuvent apporter une réelle valeur ajoutée à votre équipe. Je serais ravi(e) de pouvoir échanger avec vous lors d'un entretien pour vous exposer plus en détail ma vision et mes compétences.

Je reste à votre entière disposition pour toute information complémentaire.

Dans l'attente de votre retour, je vous prie d'agréer, Madame, Monsieur, l'expression de mes salutations distinguées.

{nom}"#,
    );

    CoverLetter {
        letter,
        provider: "Template personnalisé (aucune clé API configurée)".to_string(),
        tokens_used: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobData {
        JobData {
            entreprise: "Acme".to_string(),
            annonce: "Nous recherchons un développeur Rust pour notre équipe backend.".to_string(),
            type_contrat: Some("CDI".to_string()),
            localisation: Some("Lyon".to_string()),
        }
    }

    #[test]
    fn test_letter_prompt_embeds_job_and_placeholders() {
        let prompt = build_letter_prompt(&job(), None);
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("développeur Rust"));
        assert!(prompt.contains("[À compléter]"));
        assert!(prompt.contains("300-400 mots"));
    }

    #[test]
    fn test_template_letter_uses_profile() {
        let profile = UserProfile {
            nom: Some("Alice Martin".to_string()),
            competences: Some("Rust, SQL".to_string()),
            ..Default::default()
        };
        let result = template_letter(&job(), Some(&profile));
        assert!(result.letter.contains("Alice Martin"));
        assert!(result.letter.contains("Rust, SQL"));
        assert!(result.letter.contains("Acme"));
        assert_eq!(result.tokens_used, 0);
    }

    #[tokio::test]
    async fn test_cover_letter_falls_back_without_key() {
        let service = AiService::new(AiConfig::default());
        let result = service
            .generate_cover_letter(&job(), None, "openai")
            .await
            .unwrap();
        assert!(result.provider.contains("Template"));
        assert!(result.letter.contains("Acme"));
    }

    #[tokio::test]
    async fn test_parse_requires_provider_key() {
        let service = AiService::new(AiConfig::default());
        let err = service
            .parse_annonce(Some("annonce"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NoProvider));
    }

    #[tokio::test]
    async fn test_parse_requires_text_or_url() {
        let config = AiConfig {
            gemini_key: Some("k".to_string()),
            ..Default::default()
        };
        let err = AiService::new(config)
            .parse_annonce(None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    #[test]
    fn test_matching_defaults_on_missing_keys() {
        let decoded: MatchingResult =
            decode_ai_json(r#"{"score": 72, "points_forts": ["Rust"]}"#).unwrap();
        assert_eq!(decoded.score, 72);
        assert_eq!(decoded.points_forts, vec!["Rust".to_string()]);
        assert!(decoded.points_faibles.is_empty());
        assert!(decoded.conseils.is_empty());

        let empty: MatchingResult = decode_ai_json("{}").unwrap();
        assert_eq!(empty.score, 50);
    }

    #[test]
    fn test_decode_reports_parser_position() {
        let err = decode_ai_json::<MatchingResult>("{\"score\": oops}").unwrap_err();
        match err {
            AiError::Parse { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column > 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_handles_fenced_json() {
        let parsed: ParsedAnnonce = decode_ai_json(
            "```json\n{\"entreprise\": \"Acme\", \"poste\": null, \"type_contrat\": null, \"salaire\": null, \"localisation\": null, \"competences\": [], \"resume\": null}\n```",
        )
        .unwrap();
        assert_eq!(parsed.entreprise.as_deref(), Some("Acme"));
        assert!(parsed.poste.is_none());
    }
}
