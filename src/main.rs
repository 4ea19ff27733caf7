// Main entry point for test-report

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use test_report::cli::Cli;
use test_report::commands;
use test_report::config::{self, ReportConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    test_report::logging::init(cli.verbose);

    if cli.verbose {
        info!("Starting test-report v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Some(shell_type) = &cli.completion {
        return handle_completion(shell_type);
    }

    let config = resolve_config(&cli)?;

    if let Some(config_file) = &cli.init_config {
        std::fs::write(config_file, config.to_toml()?)
            .with_context(|| format!("Failed to write {}", config_file.display()))?;
        println!("Configuration file created: {}", config_file.display());
        print_precedence();
        return Ok(());
    }

    if cli.show_config {
        println!("Resolved configuration:\n");
        println!("{}", config.to_toml()?);
        print_precedence();
        return Ok(());
    }

    let stats = commands::run_replay(&cli, config)?;
    debug!(
        "replayed {} event(s), {} test(s), {} failure(s)",
        stats.events, stats.tests, stats.failures
    );

    if stats.failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Defaults, then the environment, then the config file, then CLI flags
fn resolve_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match ReportConfig::load().context("Failed to load configuration file")? {
        Some(config) => config,
        None => {
            let mut config = ReportConfig::default();
            if std::env::var_os(config::ENV_NO_COLOR).is_some() {
                config.logging.no_color = true;
            }
            config
        }
    };
    cli.apply_to(&mut config);
    config.validate();
    Ok(config)
}

fn print_precedence() {
    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Configuration file ({})", config::CONFIG_FILE_NAME);
    println!("  3. Environment variables ({})", config::ENV_NO_COLOR);
    println!("  4. Built-in defaults (lowest)");
}

fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell};

    let shell = match shell_type {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => {
            eprintln!("Error: Unsupported shell type '{}'", shell_type);
            eprintln!("Supported shells: bash, zsh, fish, elvish, powershell");
            return Err(anyhow::anyhow!("Unsupported shell type"));
        }
    };

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut std::io::stdout());

    Ok(())
}
