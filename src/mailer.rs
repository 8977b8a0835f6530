#![cfg(feature = "quiz")]
use crate::config::QuizConfig;
use crate::error::QuizError;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info};
use serde_json::Value;

/// Sends quiz results over an authenticated, implicit-TLS SMTP connection.
pub struct QuizMailer {
    smtp: SmtpTransport,
    sender: Mailbox,
}

impl QuizMailer {
    /// Connect settings for `sender`, logging in with an app-specific password.
    ///
    /// No connection is opened until the first message is sent.
    pub fn new(config: &QuizConfig, sender: &str, app_password: &str) -> Result<Self, QuizError> {
        let sender: Mailbox = sender.parse()?;
        let creds = Credentials::new(sender.email.to_string(), app_password.to_string());

        let tls_parameters = TlsParameters::new(config.smtp_host.clone())?;

        let smtp = SmtpTransport::relay(&config.smtp_host)?
            .credentials(creds)
            .port(config.smtp_port)
            .tls(Tls::Wrapper(tls_parameters))
            .build();

        Ok(QuizMailer { smtp, sender })
    }

    /// Send one e-mail with one line per row of `values`.
    pub fn send_results(
        &self,
        receiver: &str,
        subject: &str,
        values: &[Vec<Value>],
    ) -> Result<(), QuizError> {
        let email = build_message(self.sender.clone(), receiver, subject, values)?;
        self.smtp.send(&email)?;
        Ok(())
    }
}

/// Build the plain-text results message.
pub fn build_message(
    sender: Mailbox,
    receiver: &str,
    subject: &str,
    values: &[Vec<Value>],
) -> Result<Message, QuizError> {
    Ok(Message::builder()
        .from(sender)
        .to(receiver.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(format_rows(values))?)
}

/// One line per row, cells joined with ", ".
pub fn format_rows(values: &[Vec<Value>]) -> String {
    let mut body = String::new();
    for row in values {
        let line: Vec<String> = row.iter().map(cell_text).collect();
        body.push_str(&line.join(", "));
        body.push('\n');
    }
    body
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Best-effort delivery of quiz results by e-mail.
///
/// Any failure is logged and swallowed; result delivery must never abort the
/// calling computation.
pub fn send_results_email(
    sender: &str,
    receiver: &str,
    subject: &str,
    app_password: &str,
    values: &[Vec<Value>],
) {
    let result = QuizMailer::new(&QuizConfig::default(), sender, app_password)
        .and_then(|mailer| mailer.send_results(receiver, subject, values));

    match result {
        Ok(()) => info!("Email sent successfully!"),
        Err(e) => error!("Failed to send email: {}", e),
    }
}
