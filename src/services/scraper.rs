// Récupération d'une annonce depuis une URL: on ne garde que le contenu
// textuel principal (scripts, styles et navigation supprimés), tronqué à
// 5000 caractères. Timeout 15s, pas de retry.

use regex::RegexBuilder;
use std::time::Duration;

pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_ANNOUNCE_CHARS: usize = 5000;

#[derive(Debug, Clone)]
pub struct ScrapedAnnouncement {
    pub text: String,
    /// Nom d'entreprise deviné depuis le domaine, utilisé comme indice
    /// de secours pour le parsing IA
    pub company_guess: Option<String>,
}

/// Télécharge la page et en extrait le texte principal
pub async fn fetch_announcement(url: &str) -> Result<ScrapedAnnouncement, String> {
    let client = reqwest::Client::builder()
        .timeout(SCRAPE_TIMEOUT)
        .build()
        .map_err(|e| format!("Client HTTP: {}", e))?;

    let response = client
        .get(url)
        .header("User-Agent", "Mozilla/5.0 (ApplicationTrack)")
        .send()
        .await
        .map_err(|e| format!("Impossible de récupérer l'URL: {}", e))?;

    if !response.status().is_success() {
        return Err(format!(
            "La page a répondu avec le status {}",
            response.status().as_u16()
        ));
    }

    let html = response
        .text()
        .await
        .map_err(|e| format!("Lecture de la page impossible: {}", e))?;

    Ok(ScrapedAnnouncement {
        text: extract_main_text(&html),
        company_guess: company_from_url(url),
    })
}

/// Supprime scripts/styles/nav puis tout le balisage, et normalise les espaces
pub fn extract_main_text(html: &str) -> String {
    let mut text = html.to_string();

    for block in ["script", "style", "nav", "header", "footer"] {
        let pattern = format!(r"<{b}[^>]*>.*?</{b}>", b = block);
        if let Ok(re) = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
        {
            text = re.replace_all(&text, " ").into_owned();
        }
    }

    if let Ok(tags) = RegexBuilder::new(r"<[^>]+>").build() {
        text = tags.replace_all(&text, " ").into_owned();
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_ANNOUNCE_CHARS)
}

/// Devine le nom de l'entreprise depuis le domaine de l'URL
/// (ex: https://careers.acme.io/jobs/42 -> "Acme")
pub fn company_from_url(url: &str) -> Option<String> {
    let host = reqwest::Url::parse(url).ok()?.host_str()?.to_string();

    let labels: Vec<&str> = host
        .trim_start_matches("www.")
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();

    // On ignore les sous-domaines génériques (careers.acme.io -> acme)
    let candidate = match labels.as_slice() {
        [] => return None,
        [only] => only,
        [first, rest @ ..] => {
            if matches!(*first, "careers" | "jobs" | "emploi" | "recrutement") && rest.len() >= 2 {
                rest[0]
            } else {
                first
            }
        }
    };

    let mut chars = candidate.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_main_text_strips_markup() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script>var x = 1;</script></head>
            <body><nav><a href="/">Accueil</a></nav>
            <h1>Développeur Rust</h1><p>CDI à Lyon</p></body></html>"#;
        let text = extract_main_text(html);
        assert_eq!(text, "Développeur Rust CDI à Lyon");
    }

    #[test]
    fn test_extract_main_text_truncated() {
        let html = format!("<p>{}</p>", "a".repeat(6000));
        assert_eq!(extract_main_text(&html).chars().count(), MAX_ANNOUNCE_CHARS);
    }

    #[test]
    fn test_company_from_url() {
        assert_eq!(company_from_url("https://www.acme.fr/jobs/42"), Some("Acme".to_string()));
        assert_eq!(company_from_url("https://careers.acme.io/x"), Some("Acme".to_string()));
        assert_eq!(company_from_url("pas une url"), None);
    }
}
