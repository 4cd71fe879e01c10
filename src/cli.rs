use crate::portal::DEFAULT_GAME_VERSION;
use crate::version::Version;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "modlock",
    about = "Resolve, lock, and install game mods from the mod portal",
    version,
    long_about = None
)]
pub struct Cli {
    /// Game version used for bundled mods (base, space-age, ...).
    #[arg(long, global = true, value_name = "VERSION", default_value = DEFAULT_GAME_VERSION)]
    pub game_version: Version,

    /// Path to the mod requirement list.
    #[arg(long, global = true, value_name = "PATH", default_value = "mods.txt")]
    pub mods: PathBuf,

    /// Path to the lockfile.
    #[arg(long, global = true, value_name = "PATH", default_value = "mods.lock")]
    pub lock: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the requirement list and rewrite the lockfile.
    Update(UpdateArgs),
    /// Download locked mods, generating the lockfile first if missing.
    Install(InstallArgs),
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Resolve against a local JSON index instead of the portal.
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Directory mods are installed into.
    #[arg(long, value_name = "DIR", default_value = "mods")]
    pub target: PathBuf,

    /// Portal username; downloads require it.
    #[arg(long, env = "MODLOCK_USERNAME")]
    pub username: String,

    /// Portal download token (generated on the portal's profile page).
    #[arg(long, env = "MODLOCK_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Maximum number of concurrent downloads.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Resolve against a local JSON index instead of the portal when the
    /// lockfile has to be generated.
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,
}
