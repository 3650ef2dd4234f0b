use std::path::PathBuf;

use clap::Parser;

/// Load route sources into one execution context and report what they define.
///
/// Sources given on the command line are loaded after those configured in
/// `SWITCHYARD_ROUTES`.
#[derive(Parser, Debug)]
#[command(name = "switchyard", about = "Load route sources into an execution context")]
pub struct CliArgs {
    /// Route source URI, e.g. file:routes/Routes.java or classpath:Api.java (repeatable)
    #[arg(long = "route", value_name = "URI")]
    pub routes: Vec<String>,

    /// Root directory searched for classpath: sources (repeatable)
    #[arg(long = "classpath", value_name = "DIR")]
    pub classpath: Vec<PathBuf>,

    /// TOML file of context properties (overrides SWITCHYARD_PROPERTIES)
    #[arg(long, value_name = "FILE")]
    pub properties: Option<PathBuf>,

    /// Configuration profile; keys are looked up as {PROFILE}_{KEY} first
    #[arg(long, env = "SWITCHYARD_PROFILE")]
    pub profile: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
