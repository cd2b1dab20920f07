use std::env;

/// Configuration générale de l'application (lue une seule fois au démarrage)
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_origins: Vec<String>,
    pub frontend_url: String,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:5174".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            cors_origins,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
        }
    }
}

/// Clés API des providers IA. Immutable, passée aux adapters à la construction
/// (pas de lookup global caché dans les services).
#[derive(Clone, Debug, Default)]
pub struct AiConfig {
    pub openai_key: Option<String>,
    pub anthropic_key: Option<String>,
    pub gemini_key: Option<String>,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            openai_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            anthropic_key: non_empty(env::var("ANTHROPIC_API_KEY").ok()),
            gemini_key: non_empty(env::var("GEMINI_API_KEY").ok()),
        }
    }
}

/// Transport SMTP pour l'email de reset password.
/// Si MAIL_SERVER n'est pas défini, l'envoi est désactivé (loggé, non bloquant).
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl MailConfig {
    pub fn from_env() -> Option<Self> {
        let smtp_host = non_empty(env::var("MAIL_SERVER").ok())?;
        let username = env::var("MAIL_USERNAME").unwrap_or_default();

        Some(Self {
            smtp_host,
            smtp_port: env::var("MAIL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            from_address: env::var("MAIL_DEFAULT_SENDER").unwrap_or_else(|_| username.clone()),
            username,
            password: env::var("MAIL_PASSWORD").unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_filters_blank() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("sk-abc".to_string())), Some("sk-abc".to_string()));
    }
}
