use clap::Parser;

use hostdiag::args::HealthArgs;
use hostdiag::health::{self, HealthConfig};
use hostdiag::render;
use hostdiag::utils;

fn main() {
    let args = HealthArgs::parse();
    utils::setup_logging(args.verbose);

    // every collector degrades on its own; the scan itself always succeeds
    let sections = health::run_all(&HealthConfig::default());
    render::print_report(&sections);
}
