use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stage_collect_core::{
    render_paths, render_tree, CollectOptions, Collector, Config, CopyEvent, CopyStatus, Result,
    StageCollectError, CONFIG_FILE,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

const CONFIG_ENV: &str = "STAGE_COLLECT_CONFIG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let verbosity = Verbosity {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Some(Commands::Collect {
            source,
            dest,
            file_pattern,
            artifact_dir,
            dry_run,
            tree_output,
        }) => handle_collect(
            cli.config.as_deref(),
            CollectArgs {
                source,
                dest,
                file_pattern,
                artifact_dir,
                dry_run,
                tree_output,
            },
            verbosity,
        ),
        Some(Commands::Tree { path, output }) => {
            handle_tree(cli.config.as_deref(), path, output.as_deref())
        }
        Some(Commands::Stages) => handle_stages(cli.config.as_deref()),
        Some(Commands::Config { action }) => handle_config(action, cli.config.as_deref()),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

#[derive(Clone, Copy)]
struct Verbosity {
    verbose: bool,
    quiet: bool,
}

struct CollectArgs {
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    file_pattern: Option<String>,
    artifact_dir: Option<String>,
    dry_run: bool,
    tree_output: Option<Option<PathBuf>>,
}

/// Log to stderr; `RUST_LOG` takes precedence over -v/-q
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "stage-collect", &mut io::stdout());
}

/// Find the config file to use
/// Priority: --config > $STAGE_COLLECT_CONFIG > ./stage-collect.toml > user config dir
///
/// Explicit paths are returned even when missing so that loading reports the error.
fn resolve_config_path(cli_config: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("stage-collect").join("config.toml"))
        .filter(|p| p.is_file())
}

fn load_config(cli_config: Option<&Path>) -> Result<Config> {
    match resolve_config_path(cli_config) {
        Some(path) => {
            let config = Config::load(&path)?;
            info!("Loaded config: {}", path.display());
            Ok(config)
        }
        None => {
            debug!("No config file found, using builtin stages");
            Ok(Config::default())
        }
    }
}

fn handle_collect(
    cli_config: Option<&Path>,
    args: CollectArgs,
    verbosity: Verbosity,
) -> Result<()> {
    let config = load_config(cli_config)?;

    let source = args
        .source
        .or_else(|| config.general.source_root.clone())
        .ok_or(StageCollectError::SourceNotSet)?;
    let dest = args
        .dest
        .or_else(|| config.general.destination_root.clone())
        .ok_or(StageCollectError::DestinationNotSet)?;

    let options = CollectOptions {
        artifact_dir: args
            .artifact_dir
            .unwrap_or_else(|| config.general.artifact_dir.clone()),
        file_pattern: args.file_pattern,
        dry_run: args.dry_run,
    };
    let store = config.stage_store()?;
    let collector = Collector::new(&store, &options)?;

    info!("Source: {}", source.display());
    info!("Destination: {}", dest.display());
    info!("Stages: {}", store.names().join(", "));
    if let Some(pattern) = &options.file_pattern {
        info!("File pattern: {}", pattern);
    }

    if !verbosity.quiet {
        println!();
        println!("Source: {}", source.display());
        println!("Destination: {}", dest.display());
        println!("Artifact folder: {}", options.artifact_dir.cyan());
        if options.dry_run {
            println!("{}", "(dry run)".yellow());
        }
        println!();
        println!("Collecting...");
    }

    let on_copy = |event: &CopyEvent| {
        if verbosity.quiet || (event.status == CopyStatus::Exists && !verbosity.verbose) {
            return;
        }
        let label = format!("[{}]", event.status.label());
        let label = match event.status {
            CopyStatus::Copied => label.green(),
            CopyStatus::Planned => label.cyan(),
            CopyStatus::Exists => label.yellow(),
        };
        let dst_dir = event.destination.parent().unwrap_or(&event.destination);
        println!(
            "  {} ({}) {} -> {}",
            label,
            event.placement,
            event.file_name,
            dst_dir.display()
        );
    };

    let result = collector.collect(&source, &dest, Some(&on_copy))?;

    println!();
    println!("Summary:");
    if options.dry_run {
        println!("  Planned: {}", result.planned);
    } else {
        println!("  Copied: {}", result.copied);
    }
    println!("  Already present: {}", result.existing);
    println!("  Unmatched: {}", result.unmatched);
    if options.file_pattern.is_some() {
        println!("  Filtered by pattern: {}", result.filtered);
    }

    if let Some(target) = args.tree_output {
        let rendered = if options.dry_run {
            let paths: Vec<_> = result
                .events
                .iter()
                .map(|e| e.relative_destination(&dest))
                .collect();
            render_paths(&dest.display().to_string(), &paths)
        } else {
            render_tree(&dest)?
        };
        println!();
        write_output(&rendered, target.as_deref())?;
    }

    println!();
    if options.dry_run {
        println!("{}", "Dry run complete".green());
    } else {
        println!("{} {}", "Collection complete:".green(), dest.display());
    }

    Ok(())
}

fn handle_tree(
    cli_config: Option<&Path>,
    path: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let root = match path {
        Some(p) => p,
        None => load_config(cli_config)?
            .general
            .destination_root
            .ok_or(StageCollectError::DestinationNotSet)?,
    };

    if !root.is_dir() {
        return Err(StageCollectError::SourceNotDirectory { path: root });
    }

    let rendered = render_tree(&root)?;
    write_output(&rendered, output)
}

fn handle_stages(cli_config: Option<&Path>) -> Result<()> {
    let config = load_config(cli_config)?;
    let store = config.stage_store()?;

    println!();
    println!("Artifact folder: {}", config.general.artifact_dir.cyan());
    for stage in store.all() {
        println!();
        println!("{}", stage.name().cyan().bold());
        println!("  top_level: {}", stage.top_level().join(", "));
        println!("  artifact:  {}", stage.artifact().join(", "));
    }
    println!();

    Ok(())
}

fn handle_config(action: ConfigAction, cli_config: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = cli_config
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            if Config::init(&path)? {
                println!("{} {}", "Initialized:".green(), path.display());
            } else {
                println!("{} {}", "Already exists:".yellow(), path.display());
            }
        }
        ConfigAction::Path => match resolve_config_path(cli_config) {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", "(no config file, using defaults)".yellow()),
        },
        ConfigAction::Show => {
            let config = load_config(cli_config)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
    }

    Ok(())
}

/// Write to `path` when given, else to stdout
fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            info!("Wrote tree: {}", path.display());
            println!("{} {}", "Tree written:".green(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
