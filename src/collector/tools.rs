//! Global tool installations (JDK, Git, Maven, ...) and their use in jobs.

use std::collections::BTreeMap;

use regex::Regex;

use crate::client::JenkinsClient;
use crate::client::html::all_captures;
use crate::collector::job_config::{JobConfig, sample_job_configs};
use crate::collector::{Collector, CollectorError};

const DEFAULT_JOB_SAMPLE: usize = 20;

/// Example jobs kept per tool.
const USAGE_EXAMPLES: usize = 5;

/// Kind of configurable tool.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum ToolKind {
    #[strum(serialize = "JDK")]
    Jdk,
    Git,
    Maven,
    Ant,
    Gradle,
    Docker,
    #[strum(serialize = "NodeJS")]
    NodeJs,
    #[strum(serialize = "SonarQube Scanner")]
    SonarQube,
}

impl ToolKind {
    /// Text that opens the tool's section on the configuration page.
    fn section(self) -> &'static str {
        match self {
            Self::Jdk => "JDK installations",
            Self::Git => "Git installations",
            Self::Maven => "Maven installations",
            Self::Ant => "Ant installations",
            Self::Gradle => "Gradle installations",
            Self::Docker => "Docker",
            Self::NodeJs => "NodeJS",
            Self::SonarQube => "SonarQube",
        }
    }

    fn present_in(self, html: &str) -> bool {
        html.contains(self.section()) || (self == Self::NodeJs && html.contains("Node.js"))
    }

    /// Whether installations carry a home directory.
    fn has_home(self) -> bool {
        matches!(
            self,
            Self::Jdk | Self::Git | Self::Maven | Self::Ant | Self::Gradle
        )
    }

    /// Whether a lowercased job config mentions this tool.
    fn used_by(self, config: &str) -> bool {
        match self {
            Self::Jdk => config.contains("jdk"),
            Self::Git => config.contains("git"),
            Self::Maven => config.contains("maven"),
            Self::Ant => config.contains("ant"),
            Self::Gradle => config.contains("gradle"),
            Self::Docker => config.contains("docker"),
            Self::NodeJs => config.contains("nodejs") || config.contains("node.js"),
            Self::SonarQube => config.contains("sonar"),
        }
    }
}

/// One configured installation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInstallation {
    pub kind: ToolKind,
    pub name: String,
    pub path: Option<String>,
    pub version: Option<String>,
    pub auto_install: bool,
}

fn section_regex(kind: ToolKind, tail: &str) -> Option<Regex> {
    Regex::new(&format!("(?s){}{tail}", regex::escape(kind.section()))).ok()
}

fn captures(kind: ToolKind, tail: &str, html: &str) -> Vec<String> {
    section_regex(kind, tail)
        .map(|re| all_captures(&re, html))
        .unwrap_or_default()
}

/// Installations of `kind` declared on the configuration page.
pub fn extract_installations(kind: ToolKind, html: &str) -> Vec<ToolInstallation> {
    if !kind.present_in(html) {
        return Vec::new();
    }

    let names = captures(kind, r#".*?name="?.*?name"?.*?value="(.*?)""#, html);
    let homes = if kind.has_home() {
        captures(kind, r#".*?home.*?value="(.*?)""#, html)
    } else {
        Vec::new()
    };
    let versions = match kind {
        ToolKind::Maven => captures(kind, r#".*?id="[^"]*" value="([\d.]+)""#, html),
        _ => Vec::new(),
    };
    let jdk_auto = match kind {
        ToolKind::Jdk => section_regex(kind, r".*?jdk-\d+u\d+-oth-JPR")
            .map_or(0, |re| re.find_iter(html).count()),
        _ => 0,
    };

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| ToolInstallation {
            kind,
            name,
            path: homes.get(i).cloned(),
            version: versions.get(i).cloned(),
            auto_install: match kind {
                ToolKind::Jdk => i < jdk_auto,
                ToolKind::Maven => i < versions.len(),
                _ => false,
            },
        })
        .collect()
}

/// Jobs referencing a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolUsage {
    pub job_count: usize,
    /// First few referencing jobs.
    pub examples: Vec<String>,
}

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolsReport {
    pub installations: Vec<ToolInstallation>,
    pub uses_auto_install: bool,
    pub usage: BTreeMap<ToolKind, ToolUsage>,
}

impl ToolsReport {
    pub fn from_page(html: &str) -> Self {
        use strum::IntoEnumIterator;
        Self {
            installations: ToolKind::iter()
                .flat_map(|kind| extract_installations(kind, html))
                .collect(),
            uses_auto_install: html.contains("Install automatically"),
            usage: BTreeMap::new(),
        }
    }

    pub fn total_tools(&self) -> usize {
        self.installations.len()
    }

    pub fn installations_of(&self, kind: ToolKind) -> impl Iterator<Item = &ToolInstallation> {
        self.installations.iter().filter(move |t| t.kind == kind)
    }

    pub fn scan_job_configs(&mut self, configs: &[JobConfig]) {
        use strum::IntoEnumIterator;
        for config in configs {
            let lowered = config.xml.to_lowercase();
            for kind in ToolKind::iter().filter(|k| k.used_by(&lowered)) {
                let usage = self.usage.entry(kind).or_default();
                usage.job_count += 1;
                if usage.examples.len() < USAGE_EXAMPLES {
                    usage.examples.push(config.name.clone());
                }
            }
        }
    }
}

/// Collects [`ToolsReport`].
#[derive(Debug, Clone, Copy)]
pub struct ToolsCollector {
    job_sample: usize,
}

impl ToolsCollector {
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

impl Default for ToolsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for ToolsCollector {
    type Report = ToolsReport;

    fn name(&self) -> &'static str {
        "tools"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<ToolsReport, CollectorError> {
        let html = match client.get_text("configureTools").await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(error = %e, "configureTools unavailable, trying configure");
                client.get_text("configure").await.map_err(|_| {
                    CollectorError::MissingData("Could not access tools configuration".to_string())
                })?
            }
        };

        let mut report = ToolsReport::from_page(&html);
        match sample_job_configs(client, self.job_sample).await {
            Ok(configs) => report.scan_job_configs(&configs),
            Err(e) => tracing::debug!(error = %e, "No job configs for tool usage"),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_jdk() {
        let html = r#"<h2>JDK installations</h2>
            <input name="_.name" value="jdk17">
            <input name="_.home" value="/opt/jdk17">"#;
        let tools = extract_installations(ToolKind::Jdk, html);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "jdk17");
        assert_eq!(tools[0].path.as_deref(), Some("/opt/jdk17"));
        assert!(!tools[0].auto_install);
    }

    #[test]
    fn test_extract_maven_auto_install() {
        let html = r#"<h2>Maven installations</h2>
            <input name="_.name" value="maven-3">
            <select id="installer" value="3.9.6"></select>"#;
        let tools = extract_installations(ToolKind::Maven, html);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].version.as_deref(), Some("3.9.6"));
        assert!(tools[0].auto_install);
    }

    #[test]
    fn test_absent_section() {
        assert!(extract_installations(ToolKind::Gradle, "<html></html>").is_empty());
    }

    #[test]
    fn test_report_from_page() {
        let html = r#"<h2>Git installations</h2><input name="_.name" value="Default">
            <label>Install automatically</label>"#;
        let report = ToolsReport::from_page(html);
        assert_eq!(report.total_tools(), 1);
        assert_eq!(report.installations_of(ToolKind::Git).count(), 1);
        assert!(report.uses_auto_install);
        assert_eq!(ToolKind::SonarQube.to_string(), "SonarQube Scanner");
    }

    #[test]
    fn test_scan_job_configs() {
        let configs: Vec<JobConfig> = (0..7)
            .map(|i| JobConfig {
                name: format!("job-{i}"),
                xml: "<scm class=\"hudson.plugins.git.GitSCM\"/><jdk>jdk17</jdk>".into(),
            })
            .collect();

        let mut report = ToolsReport::default();
        report.scan_job_configs(&configs);
        let git = &report.usage[&ToolKind::Git];
        assert_eq!(git.job_count, 7);
        assert_eq!(git.examples.len(), USAGE_EXAMPLES);
        assert!(report.usage.contains_key(&ToolKind::Jdk));
        assert!(!report.usage.contains_key(&ToolKind::Maven));
    }
}
