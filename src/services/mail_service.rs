// Envoi d'emails transactionnels (lien de reset password) via SMTP.
// Si aucun transport n'est configuré (MAIL_SERVER absent), l'envoi est
// loggé puis ignoré: une panne mail ne doit jamais bloquer le flux de reset.

use lettre::{
    message::MultiPart,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

pub struct MailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl MailService {
    pub fn new(config: Option<MailConfig>) -> Self {
        let Some(config) = config else {
            log::warn!("MAIL_SERVER non configuré: les emails ne seront pas envoyés");
            return Self {
                transport: None,
                from_address: String::new(),
            };
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map(|builder| {
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.username.clone(),
                        config.password.clone(),
                    ))
                    .build()
            });

        match transport {
            Ok(transport) => Self {
                transport: Some(transport),
                from_address: config.from_address,
            },
            Err(e) => {
                log::error!("Transport SMTP invalide: {}", e);
                Self {
                    transport: None,
                    from_address: String::new(),
                }
            }
        }
    }

    /// Envoie le lien de réinitialisation. L'échec est loggé, jamais propagé:
    /// la réponse HTTP de /forgot-password reste identique dans tous les cas.
    pub async fn send_reset_email(&self, to: &str, reset_link: &str) {
        let Some(transport) = &self.transport else {
            log::info!("Email de reset non envoyé (transport absent)");
            return;
        };

        let text_body = format!(
            "Bonjour,\n\n\
             Vous avez demandé la réinitialisation de votre mot de passe ApplicationTrack.\n\
             Cliquez sur ce lien (valide 1 heure) :\n\n{reset_link}\n\n\
             Si vous n'êtes pas à l'origine de cette demande, ignorez cet email."
        );

        let html_body = format!(
            "<p>Bonjour,</p>\
             <p>Vous avez demandé la réinitialisation de votre mot de passe ApplicationTrack.</p>\
             <p><a href=\"{reset_link}\">Réinitialiser mon mot de passe</a> (lien valide 1 heure)</p>\
             <p>Si vous n'êtes pas à l'origine de cette demande, ignorez cet email.</p>"
        );

        let message = Message::builder()
            .from(match self.from_address.parse() {
                Ok(from) => from,
                Err(e) => {
                    log::error!("Adresse expéditeur invalide: {}", e);
                    return;
                }
            })
            .to(match to.parse() {
                Ok(to) => to,
                Err(e) => {
                    log::error!("Adresse destinataire invalide: {}", e);
                    return;
                }
            })
            .subject("Réinitialisation de votre mot de passe ApplicationTrack")
            .multipart(MultiPart::alternative_plain_html(text_body, html_body));

        let message = match message {
            Ok(m) => m,
            Err(e) => {
                log::error!("Construction de l'email impossible: {}", e);
                return;
            }
        };

        if let Err(e) = transport.send(message).await {
            log::error!("Envoi de l'email de reset échoué: {}", e);
        }
    }
}
