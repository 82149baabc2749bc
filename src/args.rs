use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "acctinfo",
    about = "Resolve a username or domain to its owning account profile",
    version,
    long_about = None
)]
pub struct ResolverArgs {
    /// Username or domain to look up
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "healthscan",
    about = "Aggregate server-health signals into a human-readable report",
    version,
    long_about = None
)]
pub struct HealthArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
