//! Installed plugins, pending updates and categories.

use std::collections::{BTreeMap, HashMap};

use crate::api::{PluginManager, UpdateCenter};
use crate::client::JenkinsClient;
use crate::client::html::UNKNOWN;
use crate::collector::{Collector, CollectorError};

/// How many recently released plugins to list.
const RECENT_PLUGINS: usize = 5;

/// A plugin with a newer version available.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginUpdate {
    pub short_name: String,
    pub name: String,
    pub current_version: String,
    pub new_version: String,
}

/// A plugin listed by release date.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPlugin {
    pub name: String,
    pub version: String,
}

/// Plugin inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginsReport {
    pub total_plugins: usize,
    pub active_plugins: usize,
    pub updates_available: usize,
    pub update_list: Vec<PluginUpdate>,
    /// First category of each plugin, "Other" when it has none.
    pub categories: BTreeMap<String, usize>,
    pub recent_plugins: Vec<RecentPlugin>,
}

impl PluginsReport {
    /// Build the inventory. `latest` maps short names to the version offered
    /// by the update center and backs up a missing `updateInfo`.
    pub fn from_plugins(manager: &PluginManager, latest: &HashMap<String, String>) -> Self {
        let mut report = Self {
            total_plugins: manager.plugins.len(),
            ..Self::default()
        };

        for plugin in &manager.plugins {
            if plugin.active {
                report.active_plugins += 1;
            }

            if plugin.has_update {
                report.updates_available += 1;
                let current_version = plugin.version.clone().unwrap_or_else(|| UNKNOWN.to_string());
                let new_version = plugin
                    .update_info
                    .as_ref()
                    .and_then(|u| u.version.clone())
                    .or_else(|| latest.get(&plugin.short_name).cloned())
                    .unwrap_or_else(|| format!("Newer than {current_version}"));

                report.update_list.push(PluginUpdate {
                    short_name: plugin.short_name.clone(),
                    name: plugin.display_name().to_string(),
                    current_version,
                    new_version,
                });
            }

            let category = plugin
                .primary_category()
                .unwrap_or_else(|| "Other".to_string());
            *report.categories.entry(category).or_default() += 1;
        }

        let mut dated: Vec<_> = manager
            .plugins
            .iter()
            .filter(|p| p.release_timestamp.is_some())
            .collect();
        dated.sort_by(|a, b| b.release_timestamp.cmp(&a.release_timestamp));
        report.recent_plugins = dated
            .into_iter()
            .take(RECENT_PLUGINS)
            .map(|p| RecentPlugin {
                name: p.display_name().to_string(),
                version: p.version.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            })
            .collect();

        report
    }

    /// Pending updates whose name mentions "security".
    pub fn security_updates(&self) -> Vec<&PluginUpdate> {
        self.update_list
            .iter()
            .filter(|u| {
                u.name.to_lowercase().contains("security")
                    || u.short_name.to_lowercase().contains("security")
            })
            .collect()
    }
}

/// Latest version per plugin across every update site.
pub fn latest_versions(center: &UpdateCenter) -> HashMap<String, String> {
    center
        .sites
        .iter()
        .flat_map(|site| site.plugins.iter())
        .map(|(name, info)| {
            (
                name.clone(),
                info.version.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            )
        })
        .collect()
}

/// Collects [`PluginsReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PluginsCollector;

#[async_trait::async_trait]
impl Collector for PluginsCollector {
    type Report = PluginsReport;

    fn name(&self) -> &'static str {
        "plugins"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<PluginsReport, CollectorError> {
        let manager: PluginManager = client
            .get_json_depth("pluginManager/api/json", 2)
            .await
            .map_err(|e| CollectorError::context("plugins", e))?;

        let latest = match client
            .get_json_depth::<UpdateCenter>("updateCenter/api/json", 2)
            .await
        {
            Ok(center) => latest_versions(&center),
            Err(e) => {
                tracing::debug!(error = %e, "Update center unavailable");
                HashMap::new()
            }
        };

        Ok(PluginsReport::from_plugins(&manager, &latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> PluginManager {
        serde_json::from_value(json!({
            "plugins": [
                {"shortName": "git", "longName": "Git plugin", "version": "5.0", "active": true,
                 "hasUpdate": true, "updateInfo": {"version": "5.2"},
                 "categories": ["scm"], "releaseTimestamp": 300},
                {"shortName": "matrix-auth", "longName": "Matrix Authorization", "version": "3.1",
                 "active": true, "hasUpdate": true, "categories": [{"name": "security"}],
                 "releaseTimestamp": 500},
                {"shortName": "role-strategy", "version": "1.0", "active": false, "hasUpdate": true},
                {"shortName": "workflow-aggregator", "longName": "Pipeline", "version": "2.6",
                 "active": true, "releaseTimestamp": 100}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_plugins() {
        let latest = HashMap::from([("matrix-auth".to_string(), "3.2".to_string())]);
        let report = PluginsReport::from_plugins(&manager(), &latest);

        assert_eq!(report.total_plugins, 4);
        assert_eq!(report.active_plugins, 3);
        assert_eq!(report.updates_available, 3);
        assert_eq!(report.update_list[0].new_version, "5.2");
        assert_eq!(report.update_list[1].new_version, "3.2");
        assert_eq!(report.update_list[2].new_version, "Newer than 1.0");
        assert_eq!(report.update_list[2].name, "role-strategy");

        assert_eq!(report.categories.get("Other"), Some(&2));
        assert_eq!(report.categories.get("scm"), Some(&1));
        assert_eq!(report.categories.get("security"), Some(&1));

        let recent: Vec<_> = report.recent_plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(recent, vec!["Matrix Authorization", "Git plugin", "Pipeline"]);
    }

    #[test]
    fn test_security_updates() {
        let mut report = PluginsReport::from_plugins(&manager(), &HashMap::new());
        assert!(report.security_updates().is_empty());

        report.update_list.push(PluginUpdate {
            short_name: "owasp-markup-formatter".into(),
            name: "OWASP Markup Security Formatter".into(),
            current_version: "1".into(),
            new_version: "2".into(),
        });
        assert_eq!(report.security_updates().len(), 1);
    }

    #[test]
    fn test_latest_versions() {
        let center: UpdateCenter = serde_json::from_value(json!({
            "sites": [{"id": "default", "plugins": {"git": {"version": "5.3"}}}]
        }))
        .unwrap();
        assert_eq!(latest_versions(&center).get("git").map(String::as_str), Some("5.3"));
    }
}
