use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::error;

use hostdiag::args::ResolverArgs;
use hostdiag::dns::HostDns;
use hostdiag::panel::CommandPanel;
use hostdiag::resolver;
use hostdiag::utils;

fn main() {
    let args = ResolverArgs::parse();
    utils::setup_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!(action = "abort", component = "acctinfo", error = %e, "Resolution failed");
        std::process::exit(1);
    }
}

fn run(args: &ResolverArgs) -> Result<()> {
    let token = utils::validate_token(args.token.as_deref())?;
    let panel = CommandPanel;
    let dns = HostDns::default();

    let (username, primary_domain) = resolver::resolve_identity(&panel, &token)?;
    let profile = resolver::build_profile(
        &panel,
        &dns,
        Path::new(resolver::HOME_ROOT),
        &username,
        &primary_domain,
    );
    resolver::print_profile(&profile);
    Ok(())
}
