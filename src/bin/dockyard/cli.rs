//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Dockyard - typed project and crate declarations for build orchestrators
#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate the manifest and report any error
    Check(CheckArgs),

    /// Print the composed descriptors
    Show(ShowArgs),

    /// Print the target matrix of a project
    Targets(TargetsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Path to Dockyard.toml (searched upward from the current directory by default)
    #[arg(long, env = "DOCKYARD_MANIFEST")]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Fail when a declared project is never registered as a crate
    #[arg(long)]
    pub deny_unregistered: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Only show this project
    pub project: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Project name
    pub project: String,

    /// Show targets as declared, without the implicit host target
    #[arg(long)]
    pub declared: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
