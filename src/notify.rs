//! Change notifications via the Resend email API.
//!
//! Missing credentials or recipients degrade to a structured error the
//! orchestrator logs and moves past; monitoring never stops because email
//! is unconfigured.

use serde::Serialize;

use crate::config::Config;
use crate::error::NotifyError;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub trait Notifier {
    /// Announces that the page at `url` has changed.
    fn send(&self, url: &str) -> Result<(), NotifyError>;
}

/// Substitutes the changed URL into the configured body template.
pub fn render_template(template: &str, url: &str) -> String {
    template.replace("{url}", url)
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: String,
}

pub struct ResendNotifier {
    api_key: Option<String>,
    from: String,
    recipients: Vec<String>,
    subject: String,
    template: String,
    client: reqwest::blocking::Client,
}

impl ResendNotifier {
    pub fn from_config(config: &Config) -> Self {
        ResendNotifier {
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            recipients: config.recipients.clone(),
            subject: config.subject.clone(),
            template: config.template.clone(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Notifier for ResendNotifier {
    fn send(&self, url: &str) -> Result<(), NotifyError> {
        let api_key = self.api_key.as_deref().ok_or(NotifyError::MissingApiKey)?;
        if self.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let body = SendRequest {
            from: &self.from,
            to: &self.recipients,
            subject: &self.subject,
            html: render_template(&self.template, url),
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_url() {
        let html = render_template(
            "Updated! <a href='{url}'>View page</a>",
            "https://example.com/a",
        );
        assert_eq!(
            html,
            "Updated! <a href='https://example.com/a'>View page</a>"
        );
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        assert_eq!(
            render_template("Something changed.", "https://example.com"),
            "Something changed."
        );
    }

    #[test]
    fn missing_api_key_is_a_structured_skip() {
        let notifier = ResendNotifier {
            api_key: None,
            from: "Vigil <v@example.com>".into(),
            recipients: vec!["ops@example.com".into()],
            subject: "Page updated".into(),
            template: "{url}".into(),
            client: reqwest::blocking::Client::new(),
        };
        assert!(matches!(
            notifier.send("https://example.com"),
            Err(NotifyError::MissingApiKey)
        ));
    }

    #[test]
    fn empty_recipients_is_a_structured_skip() {
        let notifier = ResendNotifier {
            api_key: Some("re_test".into()),
            from: "Vigil <v@example.com>".into(),
            recipients: vec![],
            subject: "Page updated".into(),
            template: "{url}".into(),
            client: reqwest::blocking::Client::new(),
        };
        assert!(matches!(
            notifier.send("https://example.com"),
            Err(NotifyError::NoRecipients)
        ));
    }
}
