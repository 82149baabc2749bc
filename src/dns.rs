use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::Resolver;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Where the server keeps its authoritative zone files.
pub const ZONE_DIR: &str = "/var/named";

const PUBLIC_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// The resolver's two address sources: the server's own zone store and a
/// public (non-authoritative) resolver. They may legitimately disagree.
pub trait DnsSources {
    fn zone_records(&self, domain: &str) -> Vec<String>;
    fn public_records(&self, domain: &str) -> Vec<String>;
}

pub struct HostDns {
    pub zone_dir: PathBuf,
}

impl Default for HostDns {
    fn default() -> Self {
        HostDns {
            zone_dir: PathBuf::from(ZONE_DIR),
        }
    }
}

impl DnsSources for HostDns {
    fn zone_records(&self, domain: &str) -> Vec<String> {
        local_a_records(&self.zone_dir, domain)
    }

    fn public_records(&self, domain: &str) -> Vec<String> {
        public_a_records(domain)
    }
}

/// A records from the local authoritative zone, in file order.
pub fn local_a_records(zone_dir: &Path, domain: &str) -> Vec<String> {
    let path = zone_dir.join(format!("{}.db", domain));
    match fs::read_to_string(&path) {
        Ok(text) => parse_zone_a_records(&text),
        Err(_) => {
            warn!(action = "read", component = "local_zone", zone_file = ?path, "Zone file not readable");
            Vec::new()
        }
    }
}

/// Pulls A-record addresses out of zone-file text, preserving file order.
pub fn parse_zone_a_records(text: &str) -> Vec<String> {
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        // name [ttl] IN A address
        let Some(pos) = fields.iter().position(|f| f.eq_ignore_ascii_case("A")) else {
            continue;
        };
        if pos == 0 || !fields[pos - 1].eq_ignore_ascii_case("IN") {
            continue;
        }
        if let Some(addr) = fields.get(pos + 1) {
            if addr.parse::<std::net::Ipv4Addr>().is_ok() {
                records.push(addr.to_string());
            }
        }
    }
    records
}

/// Best-effort lookup against a public resolver with a bounded timeout;
/// any failure degrades to an empty answer set.
pub fn public_a_records(domain: &str) -> Vec<String> {
    let mut opts = ResolverOpts::default();
    opts.timeout = PUBLIC_LOOKUP_TIMEOUT;
    opts.attempts = 1;

    let resolver = match Resolver::new(ResolverConfig::google(), opts) {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!(action = "init", component = "public_dns", error = %e, "Public resolver unavailable");
            return Vec::new();
        }
    };

    match resolver.lookup_ip(domain) {
        Ok(lookup) => {
            let addresses: Vec<String> = lookup
                .iter()
                .filter(|ip| ip.is_ipv4())
                .map(|ip| ip.to_string())
                .collect();
            info!(
                action = "lookup",
                component = "public_dns",
                domain = domain,
                answer_count = addresses.len(),
                "Public lookup completed"
            );
            addresses
        }
        Err(e) => {
            warn!(action = "lookup", component = "public_dns", domain = domain, error = %e, "Public lookup failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = "\
; zone file for example.com
$TTL 14400
example.com.    86400   IN      SOA     ns1.example.com. host.example.com. (2026082300 3600 1800 1209600 86400)
example.com.    86400   IN      NS      ns1.example.com.
example.com.    14400   IN      A       203.0.113.10
www             14400   IN      A       203.0.113.11
mail            14400   IN      CNAME   example.com.
example.com.    14400   IN      MX      0 example.com.
";

    #[test]
    fn a_records_come_back_in_file_order() {
        let records = parse_zone_a_records(ZONE);
        assert_eq!(records, vec!["203.0.113.10", "203.0.113.11"]);
    }

    #[test]
    fn comments_and_other_record_types_are_ignored() {
        let records = parse_zone_a_records("; A 1.2.3.4\nfoo IN CNAME bar\n");
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_addresses_are_skipped() {
        let records = parse_zone_a_records("www 14400 IN A not-an-address\n");
        assert!(records.is_empty());
    }

    #[test]
    fn missing_zone_file_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        assert!(local_a_records(dir.path(), "absent.example").is_empty());
    }
}
