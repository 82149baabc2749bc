pub mod args;
pub mod dns;
pub mod health;
pub mod logscan;
pub mod panel;
pub mod profile;
pub mod render;
pub mod resolver;
pub mod utils;

pub use args::{HealthArgs, ResolverArgs};
pub use profile::AccountProfile;
pub use render::Section;
