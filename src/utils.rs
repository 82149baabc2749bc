use anyhow::Result;
use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second]"
        )))
        .with_writer(std::io::stderr)
        .init();
}

/// Quota sources report megabytes; operators read gigabytes.
pub fn format_gb(mb: f64) -> String {
    format!("{:.2}GB", mb / 1024.0)
}

pub fn validate_token(token: Option<&str>) -> Result<String> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        _ => anyhow::bail!("usage: acctinfo <username|domain>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_render_as_two_decimal_gigabytes() {
        assert_eq!(format_gb(2048.0), "2.00GB");
        assert_eq!(format_gb(1536.0), "1.50GB");
        assert_eq!(format_gb(0.0), "0.00GB");
    }

    #[test]
    fn missing_or_blank_token_is_a_usage_error() {
        assert!(validate_token(None).is_err());
        assert!(validate_token(Some("")).is_err());
        assert!(validate_token(Some("   ")).is_err());
    }

    #[test]
    fn token_is_trimmed() {
        assert_eq!(validate_token(Some(" bob ")).unwrap(), "bob");
    }
}
