use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::path::Path;

use crate::cli::Output;
use crate::config::TaskpoolConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Validate the merged configuration
    Validate,
    /// Print the built-in defaults, ignoring files and environment
    Defaults,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub fn execute(args: ConfigArgs, custom_config: Option<&Path>, output: &Output) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = TaskpoolConfig::load(custom_config, None::<()>)?;
            println!("{}", render(&config, format)?);
        }
        ConfigCommand::Validate => {
            let config = TaskpoolConfig::load(custom_config, None::<()>)?;
            output.success("Configuration is valid");
            output.table_row(
                "Workers",
                &config.pool_settings().workers.to_string(),
            );
            output.table_row("History capacity", &config.anomaly.history_capacity.to_string());
            output.table_row("Slack", &format!("{}%", config.anomaly.slack_percent));
        }
        ConfigCommand::Defaults => {
            let config = TaskpoolConfig::embedded_defaults()?;
            println!("{}", render(&config, ConfigFormat::Toml)?);
        }
    }

    Ok(())
}

fn render(config: &TaskpoolConfig, format: ConfigFormat) -> Result<String> {
    match format {
        ConfigFormat::Toml => config.to_toml(),
        ConfigFormat::Json => config.to_json(),
    }
}
