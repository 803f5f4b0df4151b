use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "stage-collect")]
#[command(about = "Collect stage deliverables from a working tree into a delivery tree")]
#[command(version)]
pub struct Cli {
    /// Verbose output (also lists files that already exist at the destination)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors and summary only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./stage-collect.toml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy matching stage files from the source tree into the delivery tree
    Collect {
        /// Source root (default: [general].source_root)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination root (default: [general].destination_root)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Only copy classified files whose name matches this glob (e.g. "*.xlsx")
        #[arg(short, long)]
        file_pattern: Option<String>,

        /// Artifact folder name (default: [general].artifact_dir)
        #[arg(long)]
        artifact_dir: Option<String>,

        /// Show what would be copied without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the delivery tree afterwards; with a path, write it to that file
        #[arg(short, long, num_args = 0..=1)]
        tree_output: Option<Option<PathBuf>>,
    },

    /// Print a directory tree (default: the destination root)
    Tree {
        /// Directory to render
        path: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the resolved stage rules
    Stages,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a commented config template
    Init,

    /// Show the config file in use
    Path,

    /// Show general settings and resolved mappings
    Show,
}
