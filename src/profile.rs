/// Placeholder strings for facts whose source lookup yielded no data. Each
/// one distinguishes "checked and absent" from "not checked".
pub const LOCAL_ZONE_MISS: &str = "Not Found in local zone";
pub const PUBLIC_DNS_MISS: &str = "Not Found in public DNS";
pub const PHP_SYSTEM_DEFAULT: &str = "System Default";
pub const PHP_LOG_MISS: &str = "Not found at common locations";
pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Debug, Clone, PartialEq)]
pub enum QuotaLimit {
    Megabytes(f64),
    Unlimited,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct QuotaInfo {
    pub used_mb: f64,
    pub limit: QuotaLimit,
}

/// Everything the resolver learned about one account, ready for display.
/// Fields hold sentinel strings rather than options so rendering stays flat.
#[derive(Debug)]
pub struct AccountProfile {
    pub username: String,
    pub primary_domain: String,
    pub local_a_record: String,
    pub public_a_record: String,
    pub disk_used: String,
    pub disk_limit: String,
    pub php_version: String,
    pub php_error_log: String,
}
