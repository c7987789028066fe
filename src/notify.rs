use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{NotifyKind, Settings};
use crate::report::ChangeReport;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const SENDER_NAME: &str = "Sky News People Monitor";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notify = \"webhook\" needs webhook_url to be set")]
    MissingWebhookUrl,
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Where change reports go after a pass that changed something.
pub enum Notifier {
    Log,
    Webhook { client: reqwest::Client, url: String },
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub from: &'static str,
    pub to: &'a [String],
    pub subject: String,
    pub text: String,
    pub report: &'a ChangeReport<'a>,
}

impl Notifier {
    pub fn from_settings(settings: &Settings, client: &reqwest::Client) -> Result<Self, NotifyError> {
        match settings.notify {
            NotifyKind::Log => Ok(Notifier::Log),
            NotifyKind::Webhook => {
                let url = settings
                    .webhook_url
                    .clone()
                    .ok_or(NotifyError::MissingWebhookUrl)?;
                Ok(Notifier::Webhook {
                    client: client.clone(),
                    url,
                })
            }
        }
    }

    pub async fn notify(&self, report: &ChangeReport<'_>, recipients: &[String]) -> Result<(), NotifyError> {
        let message = message(report, recipients);
        match self {
            Notifier::Log => {
                info!("{} ({} recipients)\n{}", message.subject, recipients.len(), message.text);
                Ok(())
            }
            Notifier::Webhook { client, url } => {
                let response = client.post(url).json(&message).send().await?;
                if !response.status().is_success() {
                    return Err(NotifyError::Status(response.status()));
                }
                info!("Sent change report to {} recipients", recipients.len());
                Ok(())
            }
        }
    }
}

pub fn message<'a>(report: &'a ChangeReport<'a>, recipients: &'a [String]) -> Message<'a> {
    Message {
        from: SENDER_NAME,
        to: recipients,
        subject: format!("Profile changes: {}", report.summary()),
        text: report.render(),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::profile::ProfileRecord;
    use crate::reconcile::SyncOutcome;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("someone@example.com"));
        assert!(is_valid_email("first.last+tag@news.co.uk"));
        assert!(!is_valid_email("someone@example"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn message_carries_summary_and_recipients() {
        let outcome = SyncOutcome {
            changes: diff(&[ProfileRecord::new(4, "New Person")], &[]),
            ..Default::default()
        };
        let report = ChangeReport::new("https://news.sky.com/sky-news-profiles", &outcome, false);
        let to = vec!["a@example.com".to_string()];
        let m = message(&report, &to);
        assert_eq!(m.subject, "Profile changes: 1 inserted, 0 updated, 0 deleted");
        assert!(m.text.contains("+ 4 New Person"));

        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["to"][0], "a@example.com");
        assert_eq!(v["from"], SENDER_NAME);
    }

    #[test]
    fn webhook_requires_url() {
        let settings = Settings {
            source_url: String::new(),
            user_agent: String::new(),
            db_path: "x.sqlite".into(),
            title_case_job_titles: false,
            notify: NotifyKind::Webhook,
            webhook_url: None,
        };
        let client = reqwest::Client::new();
        assert!(matches!(
            Notifier::from_settings(&settings, &client),
            Err(NotifyError::MissingWebhookUrl)
        ));
    }
}
