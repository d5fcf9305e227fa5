//! Security configuration, users, LDAP and permission renderers.

use serde_json::Value;

use crate::collector::{SecurityReport, UsersReport};
use crate::display::{DisplayOptions, Page, enabled_disabled, grid, property_table, row};
use crate::format::{Tone, paint};

/// Example SIDs listed per permission.
const PERMISSION_EXAMPLES: usize = 3;

fn present_missing(present: bool) -> String {
    if present {
        paint("Present", Tone::Success)
    } else {
        paint("Missing", Tone::Error)
    }
}

pub fn render_security(report: &SecurityReport) -> String {
    let mut rows = vec![
        ("Authorization Strategy", report.authorization_strategy.clone()),
        ("Security Realm", report.security_realm.clone()),
        ("CSRF Protection", enabled_disabled(report.csrf_protection)),
    ];
    if let Some(server) = &report.ldap_server {
        rows.push(("LDAP Server", mask_server(server)));
    }

    let mut page = Page::new();
    page.table(
        "Jenkins Security Configuration",
        &property_table(["Setting", "Value"], rows),
    );

    if let Some(headers) = report.headers {
        let rows = vec![
            (
                "Content-Security-Policy",
                present_missing(headers.content_security_policy),
            ),
            (
                "X-Content-Type-Options",
                present_missing(headers.x_content_type_options),
            ),
            ("X-Frame-Options", present_missing(headers.x_frame_options)),
        ];
        page.table("Security Headers", &property_table(["Header", "Status"], rows));
    }

    let mut table = grid(&["Setting", "Current", "Recommended", "Status"]);
    for rec in report.recommendations() {
        let status = if rec.is_good() {
            paint(rec.status(), Tone::Success)
        } else {
            paint(rec.status(), Tone::Warning)
        };
        table.add_row(row([
            rec.name.to_string(),
            enabled_disabled(rec.enabled),
            enabled_disabled(rec.recommended),
            status,
        ]));
    }
    page.table("Security Recommendations", &table);

    page.finish()
}

/// Keep the scheme and host of a server URL, hide the port.
pub(crate) fn mask_server(value: &str) -> String {
    match value.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(':').next().unwrap_or(rest);
            format!("{scheme}://{host}:*****")
        }
        None => value.to_string(),
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// SIDs granted a permission, from either an array or a single string value.
fn sids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect(),
        Value::String(s) => vec![s.clone()],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// Users summary, user listing and permission matrix.
pub fn render_users(report: &UsersReport, opts: &DisplayOptions) -> String {
    let rows = vec![
        ("Total Users", report.users.len().to_string()),
        ("Authorization Strategy", report.permissions.strategy.clone()),
        (
            "LDAP",
            if report.ldap.configured {
                paint("Configured", Tone::Success)
            } else {
                "Not configured".to_string()
            },
        ),
    ];

    let mut page = Page::new();
    page.table("Jenkins Users Summary", &property_table(["Metric", "Value"], rows));

    if report.users.is_empty() {
        page.message("No user information available", Tone::Warning);
    } else {
        let mut users: Vec<_> = report.users.iter().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        let (shown, note) = opts.limit(&users, "users");
        let mut table = grid(&["User ID", "Full Name"]);
        for user in shown {
            let name = if user.name.is_empty() { &user.id } else { &user.name };
            table.add_row(row([&user.id, name]));
        }
        page.table("Users", &table).note(note);
    }

    if report.permissions.matrix.is_empty() {
        page.message("No permissions information available", Tone::Warning);
    } else {
        let mut table = grid(&["Permission", "Users", "Example Users"]);
        for (permission, value) in &report.permissions.matrix {
            let sids = sids(value);
            let mut examples = sids
                .iter()
                .take(PERMISSION_EXAMPLES)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if sids.len() > PERMISSION_EXAMPLES {
                examples.push_str("...");
            }
            table.add_row(row([permission.clone(), sids.len().to_string(), examples]));
        }
        page.table("Jenkins Permissions", &table);
    }

    page.finish()
}

/// LDAP settings with server addresses masked.
pub fn render_ldap(report: &UsersReport) -> String {
    let mut page = Page::new();
    if !report.ldap.configured {
        page.message("LDAP: Not configured", Tone::Info);
        return page.finish();
    }

    let rows = report.ldap.settings.iter().map(|(key, value)| {
        let value = if key.contains("server") && !value.is_empty() {
            mask_server(value)
        } else {
            value.clone()
        };
        (key.as_str(), value)
    });
    let mut table = grid(&["Setting", "Value"]);
    for (key, value) in rows {
        table.add_row(row([title_case(key), value]));
    }
    page.table(
        &format!("LDAP Configuration ({})", paint("Enabled", Tone::Success)),
        &table,
    );
    page.finish()
}
