use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

use crate::logscan::{self, AccessRecord};
use crate::render::{push_table, Section};

/// Substrings that mark a user agent as a bot or crawler.
const BOT_MARKERS: [&str; 6] = ["crawl", "bot", "spider", "yahoo", "bing", "google"];

/// Web-server capacity exhaustion markers in the error log.
const CAPACITY_MARKERS: [&str; 2] = ["server reached", "scoreboard"];

const MAX_CHILDREN_MARKER: &str = "reached max_children setting";

/// `SMTP connection from [host]:port (TCP/IP connection count = N)` puts the
/// bracketed host in the sixth whitespace column.
const MTA_HOST_FIELD: usize = 5;

/// `WARNING: [pool name] server reached ...` puts the pool name in the fifth
/// whitespace column.
const FPM_POOL_FIELD: usize = 4;

/// Every path the collectors touch, with real-host defaults. Tests point
/// these at fixture trees instead.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub system_log: PathBuf,
    pub exim_mainlog: PathBuf,
    /// Marker file whose presence selects the newer web-server log layout.
    pub ea4_marker: PathBuf,
    pub ea4_domlogs: PathBuf,
    pub ea4_error_log: PathBuf,
    pub ea3_domlogs: PathBuf,
    pub ea3_error_log: PathBuf,
    /// Installation root holding one `ea-php*` directory per runtime.
    pub php_install_root: PathBuf,
    /// Date token used to filter access logs to the current calendar day.
    pub today: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            system_log: PathBuf::from("/var/log/messages"),
            exim_mainlog: PathBuf::from("/var/log/exim_mainlog"),
            ea4_marker: PathBuf::from("/etc/cpanel/ea4/is_ea4"),
            ea4_domlogs: PathBuf::from("/var/log/apache2/domlogs"),
            ea4_error_log: PathBuf::from("/var/log/apache2/error_log"),
            ea3_domlogs: PathBuf::from("/usr/local/apache/domlogs"),
            ea3_error_log: PathBuf::from("/usr/local/apache/logs/error_log"),
            php_install_root: PathBuf::from("/opt/cpanel"),
            today: logscan::today_token(),
        }
    }
}

/// Runs every collector in report order. Collectors never fail the run; a
/// missing source degrades its own section only.
pub fn run_all(cfg: &HealthConfig) -> Vec<Section> {
    vec![
        system_snapshot(),
        critical_log_scan(cfg),
        mail_queue_status(cfg),
        web_traffic_analysis(cfg),
        php_worker_pool_scan(cfg),
    ]
}

fn run_command(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) => Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string()),
        Err(e) => {
            warn!(action = "exec", component = "system_command", program = program, error = %e, "Command unavailable");
            None
        }
    }
}

/// Pass-through of the host's resource commands; nothing here is parsed.
pub fn system_snapshot() -> Section {
    let mut section = Section::new("System Snapshot");
    let commands: [(&str, &str, &[&str]); 4] = [
        ("Load / uptime", "uptime", &[]),
        ("Disk usage", "df", &["-h"]),
        ("Memory", "free", &["-m"]),
        ("Logical cores", "nproc", &[]),
    ];

    for (label, program, args) in commands {
        section.line(format!("{}:", label));
        match run_command(program, args) {
            Some(text) if !text.is_empty() => {
                section.extend(text.lines().map(|l| format!("  {}", l)));
            }
            _ => section.line(format!("  {} output unavailable", program)),
        }
    }
    section
}

/// Out-of-memory events from the system log, most recent last, capped at 10.
pub fn critical_log_scan(cfg: &HealthConfig) -> Section {
    let mut section = Section::new("Critical Log Scan");

    let text = match fs::read_to_string(&cfg.system_log) {
        Ok(text) => text,
        Err(_) => {
            section.line(format!(
                "System log {} is not readable, skipping",
                cfg.system_log.display()
            ));
            return section;
        }
    };

    let events = logscan::lines_containing(&text, &["oom-killer", "killed"]);
    if events.is_empty() {
        section.line("No out-of-memory events in the system log");
    } else {
        section.line("Most recent out-of-memory events:");
        for line in logscan::tail(&events, 10) {
            section.line(format!("  {}", line));
        }
    }
    section
}

/// Outbound queue count plus a ranking of hosts tripping the MTA's
/// connection-count limit.
pub fn mail_queue_status(cfg: &HealthConfig) -> Section {
    let mut section = Section::new("Mail Queue Status");

    match run_command("exim", &["-bpc"]) {
        Some(count) if !count.is_empty() => {
            section.line(format!("Messages in outbound queue: {}", count))
        }
        _ => section.line("Mail queue count unavailable"),
    }

    match fs::read_to_string(&cfg.exim_mainlog) {
        Ok(text) => {
            let hosts: Vec<String> = logscan::lines_containing(&text, &["connection count"])
                .into_iter()
                .filter_map(|line| logscan::bracketed_field(line, MTA_HOST_FIELD))
                .collect();
            let table = logscan::frequency_table(hosts, 10);
            push_table(
                &mut section,
                "Hosts hitting the connection-count limit:",
                &table,
                "none found",
            );
        }
        Err(_) => section.line(format!(
            "Mail log {} is not readable, skipping rate-limit scan",
            cfg.exim_mainlog.display()
        )),
    }
    section
}

pub fn is_bot_agent(agent: &str) -> bool {
    let agent = agent.to_lowercase();
    BOT_MARKERS.iter().any(|marker| agent.contains(marker))
}

/// Per-domain log file names carry an `-ssl_log` suffix for the TLS vhost;
/// fold both into one domain key.
fn domain_from_log_name(name: &str) -> String {
    name.strip_suffix("-ssl_log").unwrap_or(name).to_string()
}

/// Today's traffic across every per-domain access log: the window is read
/// and parsed once, then five independent rankings are drawn from it.
pub fn web_traffic_analysis(cfg: &HealthConfig) -> Section {
    let mut section = Section::new("Web Traffic Analysis");

    let (domlogs, error_log) = if cfg.ea4_marker.exists() {
        (&cfg.ea4_domlogs, &cfg.ea4_error_log)
    } else {
        (&cfg.ea3_domlogs, &cfg.ea3_error_log)
    };
    info!(action = "select", component = "web_traffic", domlogs = ?domlogs, "Log layout selected");

    let entries = match fs::read_dir(domlogs) {
        Ok(entries) => entries,
        Err(_) => {
            section.line(format!(
                "Domlogs directory {} does not exist, skipping traffic analysis",
                domlogs.display()
            ));
            return section;
        }
    };

    let re = logscan::access_line_regex();
    let mut window: Vec<AccessRecord> = Vec::new();
    let mut files_read = 0usize;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(text) = fs::read_to_string(&path) else {
            continue;
        };
        files_read += 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let domain = domain_from_log_name(&name);

        for line in text.lines() {
            if !line.contains(&cfg.today) {
                continue;
            }
            if let Some(record) = logscan::parse_access_line(&re, &domain, line) {
                window.push(record);
            }
        }
    }
    info!(
        action = "materialize",
        component = "web_traffic",
        files_read,
        hits_today = window.len(),
        "Today's log window materialized"
    );

    if window.is_empty() {
        section.line("No traffic yet today");
    } else {
        let ips = logscan::frequency_table(window.iter().map(|r| r.ip.clone()), 15);
        push_table(&mut section, "Top 15 source IPs by hits:", &ips, "none");

        let post_domains = logscan::frequency_table(
            window
                .iter()
                .filter(|r| r.method == "POST")
                .map(|r| r.domain.clone()),
            10,
        );
        push_table(
            &mut section,
            "Top 10 domains by POST requests:",
            &post_domains,
            "none",
        );

        let get_domains = logscan::frequency_table(
            window
                .iter()
                .filter(|r| r.method == "GET")
                .map(|r| r.domain.clone()),
            10,
        );
        push_table(
            &mut section,
            "Top 10 domains by GET requests:",
            &get_domains,
            "none",
        );

        let post_uris = logscan::frequency_table(
            window
                .iter()
                .filter(|r| r.method == "POST")
                .map(|r| r.uri.clone()),
            10,
        );
        push_table(
            &mut section,
            "Top 10 URIs receiving POST requests:",
            &post_uris,
            "none",
        );

        let bot_domains = logscan::frequency_table(
            window
                .iter()
                .filter(|r| is_bot_agent(&r.user_agent))
                .map(|r| r.domain.clone()),
            10,
        );
        push_table(
            &mut section,
            "Top 10 domains hit by bots and crawlers:",
            &bot_domains,
            "none",
        );
    }

    match fs::read_to_string(error_log) {
        Ok(text) => {
            let hits = logscan::lines_containing(&text, &CAPACITY_MARKERS);
            if hits.is_empty() {
                section.line("No capacity-exhaustion entries in the web server error log");
            } else {
                section.line("Recent capacity-exhaustion entries:");
                for line in logscan::tail(&hits, 5) {
                    section.line(format!("  {}", line));
                }
            }
        }
        Err(_) => section.line(format!(
            "Web server error log {} not found",
            error_log.display()
        )),
    }
    section
}

/// Per-installed-runtime scan of the FPM error log for pools that hit their
/// max_children ceiling. One missing log never stops the loop.
pub fn php_worker_pool_scan(cfg: &HealthConfig) -> Section {
    let mut section = Section::new("PHP Worker-Pool Scan");

    let entries = match fs::read_dir(&cfg.php_install_root) {
        Ok(entries) => entries,
        Err(_) => {
            section.line(format!(
                "No PHP installations found under {}",
                cfg.php_install_root.display()
            ));
            return section;
        }
    };

    let mut versions: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .map_or(false, |n| n.to_string_lossy().starts_with("ea-php"))
        })
        .collect();
    versions.sort();

    if versions.is_empty() {
        section.line(format!(
            "No PHP installations found under {}",
            cfg.php_install_root.display()
        ));
        return section;
    }

    for version_dir in versions {
        let version = version_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        section.line(format!("{}:", version));

        let log_path = version_dir.join("root/usr/var/log/php-fpm/error.log");
        let Ok(text) = fs::read_to_string(&log_path) else {
            section.line("  log file not found for this version");
            continue;
        };

        let pools: Vec<String> = text
            .lines()
            .filter(|line| line.contains(MAX_CHILDREN_MARKER))
            .filter_map(|line| logscan::bracketed_field(line, FPM_POOL_FIELD))
            .collect();

        if pools.is_empty() {
            section.line("  no errors found");
        } else {
            section.line(format!("  max_children exhaustion events: {}", pools.len()));
            for (pool, count) in logscan::frequency_table(pools, 10) {
                section.line(format!("  {:>6}  {}", count, pool));
            }
        }
    }
    section
}
