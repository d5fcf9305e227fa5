//! Notification channels: Slack, Microsoft Teams, email and others.

use crate::api::{Plugin, PluginManager};
use crate::client::JenkinsClient;
use crate::client::html::{UNKNOWN, first_capture, static_regex};
use crate::collector::job_config::{JobConfig, sample_job_configs};
use crate::collector::{Collector, CollectorError};

const DEFAULT_JOB_SAMPLE: usize = 20;

const SLACK_DESCRIPTOR: &str = "descriptorByName/jenkins.plugins.slack.SlackNotifier/configure";

/// Masked token value rendered by the Slack plugin.
const MASKED_TOKEN: &str = "value=\"••••••••\"";

/// Keywords marking a job as using some other notifier.
const OTHER_KEYWORDS: &[&str] = &[
    "telegram",
    "irc",
    "jabber",
    "xmpp",
    "mattermost",
    "discord",
    "webhook",
    "notification",
];

fn other_systems() -> [(&'static str, &'static regex::Regex); 7] {
    [
        ("Telegram", static_regex!(r"[tT]elegram")),
        ("IRC", static_regex!(r"IRC|Internet Relay Chat")),
        ("Jabber", static_regex!(r"[jJ]abber|XMPP")),
        ("Mattermost", static_regex!(r"[mM]attermost")),
        ("Discord", static_regex!(r"[dD]iscord")),
        ("Google Chat", static_regex!(r"[gG]oogle\s+[cC]hat|Hangouts")),
        ("Webhooks", static_regex!(r"[wW]ebhooks?")),
    ]
}

/// Slack plugin state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlackInfo {
    pub enabled: bool,
    pub version: Option<String>,
    pub workspace: Option<String>,
    pub default_channel: Option<String>,
    pub token_configured: bool,
}

impl SlackInfo {
    fn from_plugin(plugin: Option<&Plugin>) -> Self {
        Self {
            enabled: plugin.is_some_and(|p| p.active),
            version: plugin.map(|p| p.version.clone().unwrap_or_else(|| UNKNOWN.to_string())),
            ..Self::default()
        }
    }

    /// Read workspace, channel and token state from a settings page.
    /// Returns whether a workspace was found.
    pub fn apply_page(&mut self, html: &str) -> bool {
        self.workspace = first_capture(static_regex!(r#"[tT]eam [sS]ubdomain.*?value="(.*?)""#), html);
        self.default_channel =
            first_capture(static_regex!(r#"[dD]efault [cC]hannel.*?value="(.*?)""#), html);
        self.token_configured = html.contains("Integration Token") && html.contains(MASKED_TOKEN);
        self.workspace.is_some()
    }
}

/// Microsoft Teams / Office 365 connector state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamsInfo {
    pub enabled: bool,
    pub version: Option<String>,
    /// First characters of the webhook host, never the full secret URL.
    pub webhook: Option<String>,
    pub webhook_configured: bool,
}

impl TeamsInfo {
    fn from_plugin(plugin: Option<&Plugin>) -> Self {
        Self {
            enabled: plugin.is_some_and(|p| p.active),
            version: plugin.map(|p| p.version.clone().unwrap_or_else(|| UNKNOWN.to_string())),
            ..Self::default()
        }
    }

    pub fn apply_page(&mut self, html: &str) {
        if !(html.contains("Microsoft Teams") || html.contains("Office 365")) {
            return;
        }
        self.webhook = first_capture(
            static_regex!(r#"[wW]ebhook [uU][rR][lL].*?value="https://(.*?)""#),
            html,
        )
        .map(|rest| format!("https://{}...", rest.chars().take(10).collect::<String>()));
        self.webhook_configured = html.contains("Webhook URL") && html.contains("value=\"https://");
    }
}

/// Core mailer state as seen from the configuration page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailNotifierInfo {
    pub enabled: bool,
    pub extended_email: bool,
    pub smtp_server: Option<String>,
}

impl EmailNotifierInfo {
    pub fn from_page(html: &str) -> Self {
        Self {
            enabled: html.contains("E-mail Notification") || html.contains("Email Notification"),
            extended_email: html.contains("Extended E-mail Notification"),
            smtp_server: first_capture(static_regex!(r#"SMTP Server"?.*?value="(.*?)""#), html),
        }
    }
}

/// Jobs using each channel among the sampled configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationUsage {
    pub slack: usize,
    pub teams: usize,
    pub email: usize,
    pub other: usize,
    pub total_jobs_checked: usize,
}

impl NotificationUsage {
    pub fn from_configs(configs: &[JobConfig]) -> Self {
        let mut usage = Self {
            total_jobs_checked: configs.len(),
            ..Self::default()
        };
        for config in configs {
            let xml = config.xml.to_lowercase();
            if xml.contains("slack") {
                usage.slack += 1;
            }
            if xml.contains("teams") || xml.contains("office365") || xml.contains("office-365") {
                usage.teams += 1;
            }
            if xml.contains("mailto") || xml.contains("email") || xml.contains("e-mail") {
                usage.email += 1;
            }
            if OTHER_KEYWORDS.iter().any(|k| xml.contains(k)) {
                usage.other += 1;
            }
        }
        usage
    }
}

/// Notification channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationsReport {
    pub slack: SlackInfo,
    pub teams: TeamsInfo,
    pub email: EmailNotifierInfo,
    /// Other systems mentioned on the configuration page.
    pub other: Vec<String>,
    pub usage: NotificationUsage,
}

impl NotificationsReport {
    pub fn from_plugins(plugins: &[Plugin]) -> Self {
        let find = |pred: fn(&str) -> bool| {
            plugins
                .iter()
                .find(|p| pred(&p.short_name.to_lowercase()))
        };
        Self {
            slack: SlackInfo::from_plugin(find(|n| n.contains("slack"))),
            teams: TeamsInfo::from_plugin(find(|n| {
                n.contains("microsoft-teams") || n.contains("office-365")
            })),
            ..Self::default()
        }
    }

    /// Apply the global configuration page.
    pub fn apply_configure_page(&mut self, html: &str) {
        self.email = EmailNotifierInfo::from_page(html);
        if self.teams.enabled {
            self.teams.apply_page(html);
        }
        if self.slack.enabled && self.slack.workspace.is_none() && html.contains("Slack") {
            self.slack.apply_page(html);
        }
        self.other = other_systems()
            .iter()
            .filter(|(_, re)| re.is_match(html))
            .map(|(name, _)| name.to_string())
            .collect();
    }
}

/// Collects [`NotificationsReport`]. Every lookup is best-effort.
#[derive(Debug, Clone, Copy)]
pub struct NotificationsCollector {
    job_sample: usize,
}

impl NotificationsCollector {
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

impl Default for NotificationsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for NotificationsCollector {
    type Report = NotificationsReport;

    fn name(&self) -> &'static str {
        "notifications"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<NotificationsReport, CollectorError> {
        let mut report = match client
            .get_json_depth::<PluginManager>("pluginManager/api/json", 1)
            .await
        {
            Ok(manager) => NotificationsReport::from_plugins(&manager.plugins),
            Err(e) => {
                tracing::debug!(error = %e, "Plugin list unavailable");
                NotificationsReport::default()
            }
        };

        if report.slack.enabled {
            if let Ok(html) = client.get_text(SLACK_DESCRIPTOR).await {
                report.slack.apply_page(&html);
            }
        }

        match client.get_text("configure").await {
            Ok(html) => report.apply_configure_page(&html),
            Err(e) => tracing::debug!(error = %e, "Configure page unavailable"),
        }

        if let Ok(configs) = sample_job_configs(client, self.job_sample).await {
            report.usage = NotificationUsage::from_configs(&configs);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plugins() -> Vec<Plugin> {
        serde_json::from_value(json!([
            {"shortName": "slack", "version": "700.v", "active": true},
            {"shortName": "Office-365-Connector", "version": "4.20", "active": false},
            {"shortName": "git", "active": true}
        ]))
        .unwrap()
    }

    #[test]
    fn test_from_plugins() {
        let report = NotificationsReport::from_plugins(&plugins());
        assert!(report.slack.enabled);
        assert_eq!(report.slack.version.as_deref(), Some("700.v"));
        assert!(!report.teams.enabled);
        assert_eq!(report.teams.version.as_deref(), Some("4.20"));

        let none = NotificationsReport::from_plugins(&[]);
        assert!(!none.slack.enabled);
        assert_eq!(none.slack.version, None);
    }

    #[test]
    fn test_apply_configure_page() {
        let html = concat!(
            "<h2>Slack</h2><td>Team Subdomain</td><input value=\"acme\">\n",
            "<td>Default channel</td><input value=\"#builds\">\n",
            "<td>Integration Token</td><input value=\"••••••••\">\n",
            "<h2>E-mail Notification</h2><td>SMTP Server</td><input value=\"mail.acme.io\">\n",
            "<p>Mattermost endpoint, Webhook receivers</p>\n",
        );
        let mut report = NotificationsReport::from_plugins(&plugins());
        report.apply_configure_page(html);

        assert_eq!(report.slack.workspace.as_deref(), Some("acme"));
        assert_eq!(report.slack.default_channel.as_deref(), Some("#builds"));
        assert!(report.slack.token_configured);
        assert!(report.email.enabled);
        assert_eq!(report.email.smtp_server.as_deref(), Some("mail.acme.io"));
        assert_eq!(report.other, vec!["Mattermost", "Webhooks"]);
    }

    #[test]
    fn test_teams_webhook_truncated() {
        let mut teams = TeamsInfo {
            enabled: true,
            ..TeamsInfo::default()
        };
        teams.apply_page(
            r#"Microsoft Teams <td>Webhook URL</td><input value="https://outlook.office.com/webhook/secret">"#,
        );
        assert_eq!(teams.webhook.as_deref(), Some("https://outlook.of..."));
        assert!(teams.webhook_configured);
    }

    #[test]
    fn test_usage() {
        let configs = vec![
            JobConfig { name: "a".into(), xml: "<jenkins.plugins.slack.SlackNotifier/>".into() },
            JobConfig { name: "b".into(), xml: "<hudson.tasks.Mailer><recipients>x@y</recipients>".into() },
            JobConfig { name: "c".into(), xml: "<office365ConnectorSend webhookUrl=''/>".into() },
        ];
        let usage = NotificationUsage::from_configs(&configs);
        assert_eq!(usage.total_jobs_checked, 3);
        assert_eq!(usage.slack, 1);
        assert_eq!(usage.teams, 1);
        assert_eq!(usage.email, 0);
        assert_eq!(usage.other, 1);
    }
}
