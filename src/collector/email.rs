//! Mailer and Email Extension settings from the global configuration page.

use std::collections::BTreeSet;

use regex::Regex;

use crate::client::JenkinsClient;
use crate::client::html::{all_captures, first_capture, static_regex};
use crate::collector::job_config::sample_job_configs;
use crate::collector::{Collector, CollectorError};

const DEFAULT_JOB_SAMPLE: usize = 10;

/// Email Extension triggers looked for on the page.
const TRIGGERS: &[&str] = &[
    "Always",
    "Success",
    "Failure",
    "Unstable",
    "Fixed",
    "Still Failing",
    "Still Unstable",
    "Regression",
    "Improvement",
];

/// Email notification settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailReport {
    pub enabled: bool,
    pub extended_email: bool,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<String>,
    pub smtp_auth: bool,
    pub smtp_username: Option<String>,
    pub default_suffix: Option<String>,
    pub admin_email: Option<String>,
    pub reply_to: Option<String>,
    /// Extended email only.
    pub content_type: Option<String>,
    pub triggers: Vec<String>,
    pub test_available: bool,
    /// Addresses found in `<recipients>` of sampled jobs, sorted.
    pub recipient_examples: Vec<String>,
}

fn field(re: &Regex, html: &str) -> Option<String> {
    first_capture(re, html).filter(|v| !v.is_empty())
}

impl EmailReport {
    pub fn from_page(html: &str) -> Self {
        let enabled = html.contains("E-mail Notification") || html.contains("Email Notification");
        let extended_email = html.contains("Extended E-mail Notification");
        let smtp_auth = html.contains("Use SMTP Authentication");

        let mut report = Self {
            enabled,
            extended_email,
            smtp_server: field(static_regex!(r#"SMTP Server"?.*?value="(.*?)""#), html),
            smtp_port: field(static_regex!(r#"SMTP Port"?.*?value="(.*?)""#), html),
            smtp_auth,
            default_suffix: field(static_regex!(r#"[dD]efault [sS]uffix"?.*?value="(.*?)""#), html),
            admin_email: field(
                static_regex!(r#"[aA]dmin [eE]-?mail [aA]ddress"?.*?value="(.*?)""#),
                html,
            ),
            reply_to: field(static_regex!(r#"[rR]eply-?[tT]o [aA]ddress"?.*?value="(.*?)""#), html),
            ..Self::default()
        };

        if smtp_auth {
            report.smtp_username = field(static_regex!(r#"User Name"?.*?value="(.*?)""#), html);
        }

        if extended_email {
            report.content_type =
                field(static_regex!(r#"Default Content Type"?.*?value="(.*?)""#), html);
            report.triggers = TRIGGERS
                .iter()
                .filter(|t| {
                    html.contains(&format!("\"{t}\""))
                        || html.contains(&format!("'{t}'"))
                        || html.contains(&format!(">{t}<"))
                })
                .map(|t| t.to_string())
                .collect();
        }

        report
    }
}

/// Email addresses listed in `<recipients>` elements.
pub fn recipients(config: &str) -> Vec<String> {
    all_captures(static_regex!(r"<recipients>(.*?)</recipients>"), config)
        .iter()
        .flat_map(|list| {
            static_regex!(r"[,;\s]+")
                .split(list)
                .filter(|r| r.contains('@'))
                .map(|r| r.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Collects [`EmailReport`].
#[derive(Debug, Clone, Copy)]
pub struct EmailCollector {
    job_sample: usize,
}

impl EmailCollector {
    pub fn new() -> Self {
        Self {
            job_sample: DEFAULT_JOB_SAMPLE,
        }
    }

    pub fn with_job_sample(mut self, sample: usize) -> Self {
        self.job_sample = sample;
        self
    }
}

impl Default for EmailCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for EmailCollector {
    type Report = EmailReport;

    fn name(&self) -> &'static str {
        "email"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<EmailReport, CollectorError> {
        let html = client.get_text("configure").await.map_err(|e| {
            tracing::debug!(error = %e, "Configure page unavailable");
            CollectorError::MissingData("Could not access email configuration".to_string())
        })?;
        let mut report = EmailReport::from_page(&html);

        report.test_available = client
            .get_text("descriptorByName/hudson.tasks.Mailer/help")
            .await
            .is_ok_and(|help| help.contains("Test configuration"));

        match sample_job_configs(client, self.job_sample).await {
            Ok(configs) => {
                let found: BTreeSet<String> =
                    configs.iter().flat_map(|c| recipients(&c.xml)).collect();
                report.recipient_examples = found.into_iter().collect();
            }
            Err(e) => tracing::debug!(error = %e, "No job configs for recipients"),
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = concat!(
        "<h1>E-mail Notification</h1>\n",
        "<td>SMTP Server</td><td><input name=\"_.smtpHost\" value=\"smtp.example.com\"></td>\n",
        "<td>Default suffix</td><td><input value=\"@example.com\"></td>\n",
        "<td>SMTP Port</td><td><input value=\"587\"></td>\n",
        "<td>Reply-To Address</td><td><input value=\"\"></td>\n",
        "<label>Use SMTP Authentication</label>\n",
        "<td>User Name</td><td><input value=\"mailer\"></td>\n",
        "<h1>Extended E-mail Notification</h1>\n",
        "<td>Default Content Type</td><td><input value=\"text/html\"></td>\n",
        "<option>Failure</option><option value=\"Fixed\">x</option>\n",
    );

    #[test]
    fn test_from_page() {
        let report = EmailReport::from_page(PAGE);
        assert!(report.enabled);
        assert!(report.extended_email);
        assert_eq!(report.smtp_server.as_deref(), Some("smtp.example.com"));
        assert_eq!(report.default_suffix.as_deref(), Some("@example.com"));
        assert_eq!(report.smtp_port.as_deref(), Some("587"));
        assert_eq!(report.reply_to, None);
        assert!(report.smtp_auth);
        assert_eq!(report.smtp_username.as_deref(), Some("mailer"));
        assert_eq!(report.content_type.as_deref(), Some("text/html"));
        assert_eq!(report.triggers, vec!["Failure", "Fixed"]);
    }

    #[test]
    fn test_from_page_disabled() {
        let report = EmailReport::from_page("<html>nothing here</html>");
        assert!(!report.enabled);
        assert!(!report.smtp_auth);
        assert!(report.triggers.is_empty());
        assert_eq!(report.smtp_server, None);
    }

    #[test]
    fn test_recipients() {
        let config = "<recipients>dev@example.com, ops@example.com;qa</recipients>\
                      <recipients>lead@example.com</recipients>";
        assert_eq!(
            recipients(config),
            vec!["dev@example.com", "ops@example.com", "lead@example.com"]
        );
        assert!(recipients("<project/>").is_empty());
    }
}
