use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::dns::DnsSources;
use crate::panel::PanelApi;
use crate::profile::{
    AccountProfile, QuotaLimit, LOCAL_ZONE_MISS, PHP_LOG_MISS, PHP_SYSTEM_DEFAULT,
    PUBLIC_DNS_MISS, UNAVAILABLE,
};
use crate::utils;

pub const HOME_ROOT: &str = "/home";

/// Maps a free-form token to `(username, primary_domain)`. An existing
/// system account always wins over a same-spelled domain. An unowned domain
/// is the resolver's only non-usage fatal error.
pub fn resolve_identity(panel: &dyn PanelApi, token: &str) -> Result<(String, String)> {
    if panel.is_system_user(token) {
        info!(action = "resolve", component = "identity", token = token, "Token is a system account");
        let domain = panel
            .main_domain(token)?
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        return Ok((token.to_string(), domain));
    }

    match panel.domain_owner(token)? {
        Some(owner) => {
            info!(
                action = "resolve",
                component = "identity",
                token = token,
                owner = owner.as_str(),
                "Token is a hosted domain"
            );
            Ok((owner, token.to_string()))
        }
        None => anyhow::bail!("domain {} is not hosted on this server", token),
    }
}

/// Gathers the DNS, quota, and PHP facts for a resolved account. Each fact
/// degrades to its sentinel independently; nothing here is fatal.
pub fn build_profile(
    panel: &dyn PanelApi,
    dns: &dyn DnsSources,
    home_root: &Path,
    username: &str,
    primary_domain: &str,
) -> AccountProfile {
    let local_a_record = dns
        .zone_records(primary_domain)
        .into_iter()
        .next()
        .unwrap_or_else(|| LOCAL_ZONE_MISS.to_string());

    let public_a_record = dns
        .public_records(primary_domain)
        .into_iter()
        .next()
        .unwrap_or_else(|| PUBLIC_DNS_MISS.to_string());

    let (disk_used, disk_limit) = match panel.quota_info(username) {
        Ok(Some(quota)) => {
            let limit = match quota.limit {
                QuotaLimit::Megabytes(mb) => utils::format_gb(mb),
                QuotaLimit::Unlimited => "Unlimited".to_string(),
                QuotaLimit::Unknown => UNAVAILABLE.to_string(),
            };
            (utils::format_gb(quota.used_mb), limit)
        }
        _ => (UNAVAILABLE.to_string(), UNAVAILABLE.to_string()),
    };

    let php_version = match panel.php_vhost_versions(username) {
        Ok(versions) => versions
            .get(primary_domain)
            .cloned()
            .unwrap_or_else(|| PHP_SYSTEM_DEFAULT.to_string()),
        Err(_) => PHP_SYSTEM_DEFAULT.to_string(),
    };

    let php_error_log = find_php_error_log(home_root, username, primary_domain)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| PHP_LOG_MISS.to_string());

    AccountProfile {
        username: username.to_string(),
        primary_domain: primary_domain.to_string(),
        local_a_record,
        public_a_record,
        disk_used,
        disk_limit,
        php_version,
        php_error_log,
    }
}

/// First of the two conventional PHP error-log locations that exists.
pub fn find_php_error_log(home_root: &Path, user: &str, domain: &str) -> Option<PathBuf> {
    let candidates = [
        home_root
            .join(user)
            .join("logs")
            .join(format!("{}.php.error.log", domain)),
        home_root.join(user).join("public_html").join("error_log"),
    ];
    candidates.into_iter().find(|path| path.is_file())
}

/// One flat line per fact; sentinel values print like any other value.
pub fn print_profile(profile: &AccountProfile) {
    println!("cpanel_user:     {}", profile.username);
    println!("main_domain:     {}", profile.primary_domain);
    println!("local_a_record:  {}", profile.local_a_record);
    println!("public_a_record: {}", profile.public_a_record);
    println!(
        "disk_quota:      {} used / {} limit",
        profile.disk_used, profile.disk_limit
    );
    println!("php_version:     {}", profile.php_version);
    println!("php_error_log:   {}", profile.php_error_log);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::QuotaInfo;
    use anyhow::Result;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakePanel {
        users: Vec<String>,
        main_domains: HashMap<String, String>,
        owners: HashMap<String, String>,
        quotas: HashMap<String, QuotaInfo>,
        php: HashMap<String, HashMap<String, String>>,
    }

    impl PanelApi for FakePanel {
        fn is_system_user(&self, token: &str) -> bool {
            self.users.iter().any(|u| u == token)
        }

        fn main_domain(&self, user: &str) -> Result<Option<String>> {
            Ok(self.main_domains.get(user).cloned())
        }

        fn domain_owner(&self, domain: &str) -> Result<Option<String>> {
            Ok(self.owners.get(domain).cloned())
        }

        fn quota_info(&self, user: &str) -> Result<Option<QuotaInfo>> {
            Ok(self.quotas.get(user).cloned())
        }

        fn php_vhost_versions(&self, user: &str) -> Result<HashMap<String, String>> {
            Ok(self.php.get(user).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeDns {
        local: Vec<String>,
        public: Vec<String>,
    }

    impl DnsSources for FakeDns {
        fn zone_records(&self, _domain: &str) -> Vec<String> {
            self.local.clone()
        }

        fn public_records(&self, _domain: &str) -> Vec<String> {
            self.public.clone()
        }
    }

    #[test]
    fn system_account_wins_over_a_same_spelled_domain() {
        let mut panel = FakePanel::default();
        panel.users.push("corp.example".to_string());
        panel
            .main_domains
            .insert("corp.example".to_string(), "real-site.example".to_string());
        // a hosted domain with the exact same spelling, owned by someone else
        panel
            .owners
            .insert("corp.example".to_string(), "intruder".to_string());

        let (user, domain) = resolve_identity(&panel, "corp.example").unwrap();
        assert_eq!(user, "corp.example");
        assert_eq!(domain, "real-site.example");
    }

    #[test]
    fn domain_token_resolves_to_its_owner() {
        let mut panel = FakePanel::default();
        panel
            .owners
            .insert("bob.example".to_string(), "bobby".to_string());

        let (user, domain) = resolve_identity(&panel, "bob.example").unwrap();
        assert_eq!(user, "bobby");
        assert_eq!(domain, "bob.example");
    }

    #[test]
    fn unhosted_domain_is_fatal() {
        let panel = FakePanel::default();
        assert!(resolve_identity(&panel, "nowhere.example").is_err());
    }

    #[test]
    fn dns_misses_use_distinct_sentinels() {
        let panel = FakePanel::default();
        let dns = FakeDns::default();
        let home = TempDir::new().unwrap();

        let profile = build_profile(&panel, &dns, home.path(), "bobby", "bob.example");
        assert_eq!(profile.local_a_record, LOCAL_ZONE_MISS);
        assert_eq!(profile.public_a_record, PUBLIC_DNS_MISS);
        assert_ne!(profile.local_a_record, profile.public_a_record);
    }

    #[test]
    fn first_zone_record_is_selected_without_resorting() {
        let panel = FakePanel::default();
        let dns = FakeDns {
            local: vec!["203.0.113.20".to_string(), "203.0.113.5".to_string()],
            public: vec!["198.51.100.1".to_string()],
        };
        let home = TempDir::new().unwrap();

        let profile = build_profile(&panel, &dns, home.path(), "bobby", "bob.example");
        assert_eq!(profile.local_a_record, "203.0.113.20");
        assert_eq!(profile.public_a_record, "198.51.100.1");
    }

    #[test]
    fn unlimited_quota_never_renders_as_a_number() {
        let mut panel = FakePanel::default();
        panel.quotas.insert(
            "bobby".to_string(),
            QuotaInfo {
                used_mb: 2048.0,
                limit: QuotaLimit::Unlimited,
            },
        );
        let dns = FakeDns::default();
        let home = TempDir::new().unwrap();

        let profile = build_profile(&panel, &dns, home.path(), "bobby", "bob.example");
        assert_eq!(profile.disk_used, "2.00GB");
        assert_eq!(profile.disk_limit, "Unlimited");
    }

    #[test]
    fn missing_php_binding_means_system_default() {
        let mut panel = FakePanel::default();
        panel.php.insert(
            "bobby".to_string(),
            HashMap::from([("other.example".to_string(), "ea-php81".to_string())]),
        );
        let dns = FakeDns::default();
        let home = TempDir::new().unwrap();

        let profile = build_profile(&panel, &dns, home.path(), "bobby", "bob.example");
        assert_eq!(profile.php_version, PHP_SYSTEM_DEFAULT);
    }

    #[test]
    fn php_error_log_falls_back_to_public_html() {
        let home = TempDir::new().unwrap();
        let public_html = home.path().join("bobby/public_html");
        fs::create_dir_all(&public_html).unwrap();
        fs::write(public_html.join("error_log"), "").unwrap();

        let found = find_php_error_log(home.path(), "bobby", "bob.example").unwrap();
        assert!(found.ends_with("public_html/error_log"));
    }

    #[test]
    fn php_error_log_prefers_the_per_domain_log() {
        let home = TempDir::new().unwrap();
        let logs = home.path().join("bobby/logs");
        let public_html = home.path().join("bobby/public_html");
        fs::create_dir_all(&logs).unwrap();
        fs::create_dir_all(&public_html).unwrap();
        fs::write(logs.join("bob.example.php.error.log"), "").unwrap();
        fs::write(public_html.join("error_log"), "").unwrap();

        let found = find_php_error_log(home.path(), "bobby", "bob.example").unwrap();
        assert!(found.ends_with("logs/bob.example.php.error.log"));
    }

    #[test]
    fn absent_php_error_log_uses_the_sentinel() {
        let panel = FakePanel::default();
        let dns = FakeDns::default();
        let home = TempDir::new().unwrap();

        let profile = build_profile(&panel, &dns, home.path(), "bobby", "bob.example");
        assert_eq!(profile.php_error_log, PHP_LOG_MISS);
    }
}
