//! Mockforge CLI binary.
//!
//! Thin entry point: parses arguments, initializes logging, and hands off
//! to the library's command executor.

use clap::Parser;
use mockforge::cli::Cli;
use mockforge::config::MockforgeConfig;
use mockforge::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    info!("Mockforge CLI starting");

    match mockforge::cli::execute(cli).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{output}");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI flags, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = MockforgeConfig::load(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_raises_the_log_level() {
        let cli = Cli::try_parse_from(["mockforge", "--verbose", "scenes"]).unwrap();
        let config = build_logging_config(&cli);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn explicit_log_level_wins_over_verbose() {
        let cli =
            Cli::try_parse_from(["mockforge", "--verbose", "--log-level", "trace", "scenes"])
                .unwrap();
        let config = build_logging_config(&cli);
        assert_eq!(config.level, "trace");
    }
}
