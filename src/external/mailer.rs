use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;
use crate::models::order_status::status_label;

/// 单个邮件服务商的 SMTP 连接参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmtpProvider {
    pub smtp_server: &'static str,
    pub smtp_port: u16,
    pub use_tls: bool,
}

/// 按配置里的 provider 键取连接参数
pub fn provider_settings(provider: &str) -> Option<SmtpProvider> {
    match provider {
        "gmail" => Some(SmtpProvider {
            smtp_server: "smtp.gmail.com",
            smtp_port: 587,
            use_tls: true,
        }),
        "outlook" => Some(SmtpProvider {
            smtp_server: "smtp-mail.outlook.com",
            smtp_port: 587,
            use_tls: true,
        }),
        "yahoo" => Some(SmtpProvider {
            smtp_server: "smtp.mail.yahoo.com",
            smtp_port: 587,
            use_tls: true,
        }),
        _ => None,
    }
}

/// 邮件发送封装。发送失败只记日志并返回 false，调用方永远拿不到异常，
/// 业务流程（下单、改状态）不因邮件故障中断。
#[derive(Clone)]
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn verification_url_base(&self) -> &str {
        &self.config.verification_url_base
    }

    fn transport(&self) -> Result<SmtpTransport, String> {
        let provider = provider_settings(&self.config.provider)
            .ok_or_else(|| format!("unknown email provider: {}", self.config.provider))?;

        let builder = if provider.use_tls {
            SmtpTransport::starttls_relay(provider.smtp_server).map_err(|e| e.to_string())?
        } else {
            SmtpTransport::relay(provider.smtp_server).map_err(|e| e.to_string())?
        };

        Ok(builder
            .port(provider.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }

    fn try_send(
        &self,
        to: &str,
        subject: &str,
        html_content: &str,
        text_content: Option<&str>,
    ) -> Result<(), String> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| format!("invalid sender address: {e}"))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| format!("invalid recipient address: {e}"))?;

        let builder = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject);

        let message = match text_content {
            Some(text) => builder
                .multipart(MultiPart::alternative_plain_html(
                    text.to_string(),
                    html_content.to_string(),
                ))
                .map_err(|e| e.to_string())?,
            None => builder
                .singlepart(SinglePart::html(html_content.to_string()))
                .map_err(|e| e.to_string())?,
        };

        self.transport()?.send(&message).map_err(|e| e.to_string())?;
        Ok(())
    }

    /// 发送邮件，返回是否成功
    pub fn send(
        &self,
        to: &str,
        subject: &str,
        html_content: &str,
        text_content: Option<&str>,
    ) -> bool {
        match self.try_send(to, subject, html_content, text_content) {
            Ok(()) => {
                log::info!("Email sent successfully to {to}");
                true
            }
            Err(e) => {
                log::error!("Failed to send email to {to}: {e}");
                false
            }
        }
    }

    /// 验证 SMTP 凭证是否可用，返回是否成功
    pub fn test_connection(&self) -> bool {
        let transport = match self.transport() {
            Ok(t) => t,
            Err(e) => {
                log::error!("SMTP configuration error: {e}");
                return false;
            }
        };
        match transport.test_connection() {
            Ok(ok) => ok,
            Err(e) => {
                log::error!("SMTP connection failed: {e}");
                false
            }
        }
    }

    pub fn send_verification_email(&self, to: &str, token: &str) -> bool {
        let link = format!(
            "{}/verify-email?token={}",
            self.config.verification_url_base, token
        );
        let html = format!(
            "<h2>Bienvenue sur DOUKA KM !</h2>\
             <p>Merci de confirmer votre adresse email en cliquant sur le lien ci-dessous :</p>\
             <p><a href=\"{link}\">Vérifier mon adresse email</a></p>\
             <p>Ce lien expire dans 24 heures.</p>"
        );
        let text = format!(
            "Bienvenue sur DOUKA KM !\n\n\
             Confirmez votre adresse email : {link}\n\
             Ce lien expire dans 24 heures."
        );
        self.send(
            to,
            "Vérifiez votre adresse email - DOUKA KM",
            &html,
            Some(&text),
        )
    }

    pub fn send_password_reset_email(&self, to: &str, token: &str, user_type: &str) -> bool {
        let link = format!(
            "{}/reset-password?token={}&type={}",
            self.config.verification_url_base, token, user_type
        );
        let html = format!(
            "<h2>Réinitialisation de votre mot de passe</h2>\
             <p>Pour choisir un nouveau mot de passe, cliquez sur le lien ci-dessous :</p>\
             <p><a href=\"{link}\">Réinitialiser mon mot de passe</a></p>\
             <p>Ce lien expire dans 1 heure. Si vous n'êtes pas à l'origine de cette \
             demande, ignorez ce message.</p>"
        );
        let text = format!(
            "Réinitialisation de votre mot de passe DOUKA KM\n\n\
             Lien : {link}\n\
             Ce lien expire dans 1 heure."
        );
        self.send(
            to,
            "Réinitialisation de votre mot de passe - DOUKA KM",
            &html,
            Some(&text),
        )
    }

    pub fn send_order_status_email(&self, to: &str, order_number: &str, status: &str) -> bool {
        let label = status_label(status).unwrap_or(status);
        let subject = format!("Mise à jour de votre commande {order_number} - DOUKA KM");
        let html = format!(
            "<h2>Votre commande {order_number}</h2>\
             <p>Statut actuel : <strong>{label}</strong></p>\
             <p>Merci de votre confiance.</p>"
        );
        let text = format!("Votre commande {order_number}\nStatut actuel : {label}");
        self.send(to, &subject, &html, Some(&text))
    }
}
