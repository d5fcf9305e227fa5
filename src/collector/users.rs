//! Users, LDAP settings and the permission model.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::api::AuthorizationStrategy;
use crate::client::JenkinsClient;
use crate::client::html::{UNKNOWN, static_regex};
use crate::collector::security::{ldap_field, matrix_row_users};
use crate::collector::{Collector, CollectorError};

/// People endpoints, tried in order until one answers.
const PEOPLE_ENDPOINTS: &[&str] = &[
    "asynchPeople/api/json",
    "manage/asynchPeople/api/json",
    "securityRealm/user/api/json",
    "manage/securityRealm/user/api/json",
    "people/api/json",
];

const REALM_ENDPOINTS: &[&str] = &["securityRealm/api/json", "manage/securityRealm/api/json"];

const SECURITY_API_ENDPOINTS: &[&str] = &[
    "configureSecurity/api/json",
    "manage/configureSecurity/api/json",
];

const SECURITY_PAGE: &str = "manage/configureSecurity/";

/// LDAP inputs on the security page with their display keys.
const LDAP_FIELDS: &[(&str, &str)] = &[
    ("server", "server"),
    ("rootDN", "root_dn"),
    ("userSearchBase", "user_search_base"),
    ("groupSearchBase", "group_search_base"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PeopleResponse {
    users: Option<Vec<PersonEntry>>,
    people: Option<Vec<PersonEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PersonEntry {
    user: Option<PersonUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersonUser {
    full_name: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RealmResponse {
    #[serde(rename = "_class")]
    class: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StrategyResponse {
    authorization_strategy: Option<AuthorizationStrategy>,
}

/// Users from a people endpoint; `None` when the payload has neither list.
fn parse_people(response: PeopleResponse) -> Option<Vec<User>> {
    let entries = response.users.or(response.people)?;
    Some(
        entries
            .into_iter()
            .map(|entry| {
                let user = entry.user.unwrap_or_default();
                User {
                    id: user.id.unwrap_or_else(|| UNKNOWN.to_string()),
                    name: user.full_name.unwrap_or_else(|| UNKNOWN.to_string()),
                }
            })
            .collect(),
    )
}

/// Users linked from the security realm page (`user-<id>">Name<`).
pub fn users_from_realm_page(html: &str) -> Vec<User> {
    static_regex!(r#"user-([^"]+)"[^>]*>([^<]+)<"#)
        .captures_iter(html)
        .map(|c| User {
            id: c[1].to_string(),
            name: c[2].to_string(),
        })
        .collect()
}

/// LDAP configuration state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapSettings {
    pub configured: bool,
    /// Display key to value, e.g. `server`, `root_dn`.
    pub settings: BTreeMap<String, String>,
}

impl LdapSettings {
    pub fn apply_page(&mut self, html: &str) {
        for (field, key) in LDAP_FIELDS {
            if let Some(value) = ldap_field(html, field) {
                self.settings.insert(key.to_string(), value);
            }
        }
    }
}

/// Authorization strategy and whatever permission matrix could be read.
#[derive(Debug, Clone, PartialEq)]
pub struct Permissions {
    pub strategy: String,
    /// Permission id (or `users`) to SIDs.
    pub matrix: BTreeMap<String, Value>,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            strategy: UNKNOWN.to_string(),
            matrix: BTreeMap::new(),
        }
    }
}

/// Human name for an authorization strategy class.
pub fn strategy_label(class: &str) -> String {
    if class.contains("ProjectMatrixAuthorizationStrategy") {
        "Project-based Matrix Authorization".to_string()
    } else if class.contains("GlobalMatrixAuthorizationStrategy") {
        "Matrix Authorization".to_string()
    } else if class.contains("LegacyAuthorizationStrategy") {
        "Legacy Authorization".to_string()
    } else if class.contains("RoleBasedAuthorizationStrategy") {
        "Role-based Authorization".to_string()
    } else {
        class.rsplit('.').next().unwrap_or(class).to_string()
    }
}

impl Permissions {
    pub fn from_strategy(strategy: &AuthorizationStrategy) -> Self {
        Self {
            strategy: strategy_label(strategy.class.as_deref().unwrap_or_default()),
            matrix: strategy.data.clone(),
        }
    }

    /// Fill gaps from the security page: strategy markers and matrix rows.
    pub fn apply_page(&mut self, html: &str) {
        if html.contains("Matrix Authorization") {
            self.strategy = "Matrix Authorization".to_string();
        } else if html.contains("Project-based Matrix") {
            self.strategy = "Project-based Matrix Authorization".to_string();
        } else if html.contains("Role-Based Strategy") {
            self.strategy = "Role-based Authorization".to_string();
        }

        let users = matrix_row_users(html);
        if !users.is_empty() {
            self.matrix.insert(
                "users".to_string(),
                Value::Array(users.into_iter().map(Value::String).collect()),
            );
        }
    }

    fn is_incomplete(&self) -> bool {
        self.strategy == UNKNOWN || self.matrix.is_empty()
    }
}

/// Users and permissions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersReport {
    pub users: Vec<User>,
    pub ldap: LdapSettings,
    pub permissions: Permissions,
}

/// Collects [`UsersReport`]. Every lookup is best-effort, so collection
/// only fails when nothing at all could be learned.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsersCollector;

impl UsersCollector {
    async fn users(&self, client: &JenkinsClient) -> Vec<User> {
        for endpoint in PEOPLE_ENDPOINTS {
            match client.get_json::<PeopleResponse>(endpoint).await {
                Ok(response) => {
                    if let Some(users) = parse_people(response) {
                        return users;
                    }
                }
                Err(e) => tracing::debug!(endpoint = %endpoint, error = %e, "People endpoint unavailable"),
            }
        }

        match client.get_text("manage/securityRealm/").await {
            Ok(html) => users_from_realm_page(&html),
            Err(_) => Vec::new(),
        }
    }

    async fn ldap(&self, client: &JenkinsClient, page: Option<&str>) -> LdapSettings {
        let mut ldap = LdapSettings::default();
        for endpoint in REALM_ENDPOINTS {
            if let Ok(realm) = client.get_json::<RealmResponse>(endpoint).await {
                if realm
                    .class
                    .as_deref()
                    .is_some_and(|c| c.contains("LDAPSecurityRealm"))
                {
                    ldap.configured = true;
                    break;
                }
            }
        }

        if !ldap.configured {
            ldap.configured = page.is_some_and(|html| html.contains("LDAP"));
        }
        if ldap.configured {
            if let Some(html) = page {
                ldap.apply_page(html);
            }
        }
        ldap
    }

    async fn permissions(&self, client: &JenkinsClient, page: Option<&str>) -> Permissions {
        let mut permissions = Permissions::default();
        for endpoint in SECURITY_API_ENDPOINTS {
            if let Ok(StrategyResponse {
                authorization_strategy: Some(strategy),
            }) = client.get_json::<StrategyResponse>(endpoint).await
            {
                permissions = Permissions::from_strategy(&strategy);
                break;
            }
        }

        if permissions.is_incomplete() {
            if let Some(html) = page {
                permissions.apply_page(html);
            }
        }

        if permissions.strategy == "Role-based Authorization" && permissions.matrix.is_empty() {
            if let Ok(Value::Object(roles)) = client.get_json::<Value>("role-strategy/api/json").await {
                permissions.matrix = roles.into_iter().collect();
            }
        }

        permissions
    }
}

#[async_trait::async_trait]
impl Collector for UsersCollector {
    type Report = UsersReport;

    fn name(&self) -> &'static str {
        "users"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<UsersReport, CollectorError> {
        let page = match client.get_text(SECURITY_PAGE).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::debug!(error = %e, "Security page unavailable");
                None
            }
        };

        Ok(UsersReport {
            users: self.users(client).await,
            ldap: self.ldap(client, page.as_deref()).await,
            permissions: self.permissions(client, page.as_deref()).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_people() {
        let response: PeopleResponse = serde_json::from_value(json!({
            "users": [
                {"user": {"fullName": "Alice Admin", "id": "alice"}},
                {"user": {"fullName": "Bob"}},
                {}
            ]
        }))
        .unwrap();
        let users = parse_people(response).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0], User { id: "alice".into(), name: "Alice Admin".into() });
        assert_eq!(users[1].id, UNKNOWN);
        assert_eq!(users[2].name, UNKNOWN);

        let people: PeopleResponse =
            serde_json::from_value(json!({"people": [{"user": {"id": "carol"}}]})).unwrap();
        assert_eq!(parse_people(people).unwrap()[0].id, "carol");

        assert!(parse_people(PeopleResponse::default()).is_none());
    }

    #[test]
    fn test_users_from_realm_page() {
        let html = r#"<a href="user/x" id="user-alice">Alice</a><a id="user-bob" class="x">Bob</a>"#;
        let users = users_from_realm_page(html);
        assert_eq!(users.len(), 2);
        assert_eq!(users[1], User { id: "bob".into(), name: "Bob".into() });
    }

    #[test]
    fn test_strategy_label() {
        assert_eq!(
            strategy_label("hudson.security.ProjectMatrixAuthorizationStrategy"),
            "Project-based Matrix Authorization"
        );
        assert_eq!(
            strategy_label("hudson.security.GlobalMatrixAuthorizationStrategy"),
            "Matrix Authorization"
        );
        assert_eq!(
            strategy_label("hudson.security.FullControlOnceLoggedInAuthorizationStrategy"),
            "FullControlOnceLoggedInAuthorizationStrategy"
        );
    }

    #[test]
    fn test_permissions_from_strategy_and_page() {
        let strategy: AuthorizationStrategy = serde_json::from_value(json!({
            "_class": "hudson.security.GlobalMatrixAuthorizationStrategy",
            "data": {"hudson.model.Hudson.Administer": ["admin"]}
        }))
        .unwrap();
        let permissions = Permissions::from_strategy(&strategy);
        assert_eq!(permissions.strategy, "Matrix Authorization");
        assert!(!permissions.is_incomplete());

        let mut scraped = Permissions::default();
        scraped.apply_page(r#"Role-Based Strategy <tr id="row-group-dev">"#);
        assert_eq!(scraped.strategy, "Role-based Authorization");
        assert_eq!(scraped.matrix["users"], json!(["dev"]));
    }

    #[test]
    fn test_ldap_apply_page() {
        let mut ldap = LdapSettings {
            configured: true,
            ..LdapSettings::default()
        };
        ldap.apply_page(
            r#"<input name="_.server" value="ldaps://dir:636"><input name="_.userSearchBase" value="ou=people">"#,
        );
        assert_eq!(ldap.settings["server"], "ldaps://dir:636");
        assert_eq!(ldap.settings["user_search_base"], "ou=people");
        assert!(!ldap.settings.contains_key("root_dn"));
    }
}
