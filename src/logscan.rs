use chrono::Local;
use regex::Regex;
use std::collections::HashMap;

/// Timestamp token the web server writes into access-log lines. This is a
/// server convention, not a locale setting, so it lives in one explicit
/// constant instead of being assumed inline.
pub const ACCESS_LOG_DATE_FORMAT: &str = "%d/%b/%Y";

/// Today's date in the access-log timestamp convention.
pub fn today_token() -> String {
    Local::now().format(ACCESS_LOG_DATE_FORMAT).to_string()
}

/// One access-log hit, projected down to the fields the report ranks on.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub domain: String,
    pub ip: String,
    pub method: String,
    pub uri: String,
    pub user_agent: String,
}

/// Combined log format:
/// ip - user [time] "METHOD uri proto" status size "referer" "agent"
pub fn access_line_regex() -> Regex {
    Regex::new(r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) (\S+)[^"]*" \S+ \S+ "[^"]*" "([^"]*)""#)
        .expect("access-log grammar is a fixed literal")
}

/// Parses one combined-format line; unparsable lines are dropped, not errors.
pub fn parse_access_line(re: &Regex, domain: &str, line: &str) -> Option<AccessRecord> {
    let caps = re.captures(line)?;
    Some(AccessRecord {
        domain: domain.to_string(),
        ip: caps[1].to_string(),
        method: caps[3].to_string(),
        uri: caps[4].to_string(),
        user_agent: caps[5].to_string(),
    })
}

/// Counts occurrences and returns `(key, count)` pairs sorted by descending
/// count, ties broken by first-seen order, truncated to `limit`.
pub fn frequency_table<I>(items: I, limit: usize) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, (u32, usize)> = HashMap::new();
    let mut next_index = 0usize;

    for item in items {
        let entry = counts.entry(item).or_insert_with(|| {
            let slot = (0, next_index);
            next_index += 1;
            slot
        });
        entry.0 += 1;
    }

    let mut entries: Vec<(String, u32, usize)> = counts
        .into_iter()
        .map(|(key, (count, first_seen))| (key, count, first_seen))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    entries
        .into_iter()
        .take(limit)
        .map(|(key, count, _)| (key, count))
        .collect()
}

/// Case-insensitive filter keeping lines that contain any of `needles`,
/// in stored order.
pub fn lines_containing<'a>(text: &'a str, needles: &[&str]) -> Vec<&'a str> {
    let lowered: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();
    text.lines()
        .filter(|line| {
            let line = line.to_lowercase();
            lowered.iter().any(|needle| line.contains(needle))
        })
        .collect()
}

/// The last `n` items, preserving stored order.
pub fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items[start..].to_vec()
}

/// Whitespace field at `index` with its brackets stripped: `[1.2.3.4]:5` at
/// the right column becomes `1.2.3.4`. The MTA and FPM logs both put their
/// interesting token at a fixed column.
pub fn bracketed_field(line: &str, index: usize) -> Option<String> {
    let field = line.split_whitespace().nth(index)?;
    let inner = field.trim_start_matches('[');
    let inner = match inner.find(']') {
        Some(pos) => &inner[..pos],
        None => inner,
    };
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}
