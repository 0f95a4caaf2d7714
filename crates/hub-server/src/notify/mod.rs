//! Outbound email notifications
//!
//! Delivery is best effort: [`dispatch`] sends on a detached task and only
//! logs failures, so a request never waits on or fails because of email.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;

/// Timeout for a single SendGrid request
pub const SENDGRID_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Sends mail through the SendGrid v3 API
pub struct SendGridNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
    from_email: String,
}

impl SendGridNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SENDGRID_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from_email: from_email.into(),
        })
    }

    fn payload(&self, message: &EmailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from_email },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": render_html(&message.body) }],
        })
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(&message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %message.to, status = status.as_u16(), "Email sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email delivery not configured, logging message"
        );
        Ok(())
    }
}

/// SendGrid when credentials are configured, the log otherwise
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.sendgrid() {
        Some((api_key, from_email)) => Ok(Arc::new(SendGridNotifier::new(
            config.endpoint.clone(),
            api_key,
            from_email,
        )?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Send `message` on a detached task. Failures are logged, never returned.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: EmailMessage) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let to = message.to.clone();
        if let Err(e) = notifier.send(message).await {
            tracing::warn!(to = %to, error = %e, "Failed to send notification email");
        }
    })
}

/// Plain text body as HTML: markup characters escaped, newlines as `<br>`
fn render_html(body: &str) -> String {
    let mut html = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\n' => html.push_str("<br>"),
            _ => html.push(c),
        }
    }
    html
}

/// Email telling a proposer how their proposal was decided
pub fn decision_email(to: &str, dataset_title: &str, community_name: &str, accepted: bool) -> EmailMessage {
    let (subject, body) = if accepted {
        (
            format!("Your dataset was accepted into '{}'", community_name),
            format!(
                "Good news! Your dataset '{}' has been accepted into the community '{}'.",
                dataset_title, community_name
            ),
        )
    } else {
        (
            format!("Your dataset was rejected from '{}'", community_name),
            format!(
                "Your dataset '{}' was not accepted into the community '{}'. You can propose it again later.",
                dataset_title, community_name
            ),
        )
    };

    EmailMessage {
        to: to.to_string(),
        subject,
        body,
    }
}
