use anyhow::{Context, Result};
use std::collections::HashMap;
use std::process::Command;
use tracing::info;

use crate::profile::{QuotaInfo, QuotaLimit};

/// Narrow contract over the control panel's account query interface. Each
/// method maps to one API call; `None` means the panel had no data, not an
/// error.
pub trait PanelApi {
    fn is_system_user(&self, token: &str) -> bool;
    fn main_domain(&self, user: &str) -> Result<Option<String>>;
    fn domain_owner(&self, domain: &str) -> Result<Option<String>>;
    fn quota_info(&self, user: &str) -> Result<Option<QuotaInfo>>;
    fn php_vhost_versions(&self, user: &str) -> Result<HashMap<String, String>>;
}

/// Production implementation that shells out to the panel's command-line
/// API tools and parses their key:value output.
pub struct CommandPanel;

impl CommandPanel {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        info!(action = "exec", component = "panel_api", program = program, "Querying panel API");
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {}", program))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PanelApi for CommandPanel {
    fn is_system_user(&self, token: &str) -> bool {
        Command::new("id")
            .arg("-u")
            .arg(token)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn main_domain(&self, user: &str) -> Result<Option<String>> {
        let text = self.run("whmapi1", &["accountsummary", &format!("user={}", user)])?;
        Ok(parse_field(&text, "main_domain"))
    }

    fn domain_owner(&self, domain: &str) -> Result<Option<String>> {
        let text = self.run("/scripts/whoowns", &[domain])?;
        let owner = text.trim();
        if owner.is_empty() {
            Ok(None)
        } else {
            Ok(Some(owner.to_string()))
        }
    }

    fn quota_info(&self, user: &str) -> Result<Option<QuotaInfo>> {
        let text = self.run(
            "uapi",
            &[&format!("--user={}", user), "Quota", "get_quota_info"],
        )?;
        Ok(parse_quota(&text))
    }

    fn php_vhost_versions(&self, user: &str) -> Result<HashMap<String, String>> {
        let text = self.run(
            "uapi",
            &[
                &format!("--user={}", user),
                "LangPHP",
                "php_get_vhost_versions",
            ],
        )?;
        Ok(parse_vhost_versions(&text))
    }
}

/// Extracts the value of a `key: value` line from panel API output.
/// Returns `None` when the key is missing or its value is blank.
pub fn parse_field(text: &str, key: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(key) {
            if let Some(value) = rest.trim_start().strip_prefix(':') {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// The quota API reports megabytes; a limit of the literal token
/// "unlimited" means the account has no cap.
pub fn parse_quota(text: &str) -> Option<QuotaInfo> {
    let used_mb = parse_field(text, "megabytes_used")?.parse::<f64>().ok()?;
    let limit = match parse_field(text, "megabyte_limit") {
        Some(raw) if raw.eq_ignore_ascii_case("unlimited") => QuotaLimit::Unlimited,
        Some(raw) => raw
            .parse::<f64>()
            .map(QuotaLimit::Megabytes)
            .unwrap_or(QuotaLimit::Unknown),
        None => QuotaLimit::Unknown,
    };
    Some(QuotaInfo { used_mb, limit })
}

/// The vhost PHP API emits repeating `vhost:` / `version:` line pairs;
/// fold them into a domain -> version mapping.
pub fn parse_vhost_versions(text: &str) -> HashMap<String, String> {
    let mut versions = HashMap::new();
    let mut current_vhost: Option<String> = None;

    for line in text.lines() {
        if let Some(vhost) = parse_field(line, "vhost") {
            current_vhost = Some(vhost);
        } else if let Some(version) = parse_field(line, "version") {
            if let Some(vhost) = current_vhost.take() {
                versions.insert(vhost, version);
            }
        }
    }
    versions
}
