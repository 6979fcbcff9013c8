use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

/// flowctl - validate, inspect and classify conversation flows
#[derive(Parser, Debug)]
#[command(name = "flowctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory containing Flow YAML files
    #[arg(long, global = true, env = "FLOWCTL_FLOWS_DIR", default_value = "flows")]
    pub flows: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every flow, resolve references and report problems
    Validate,

    /// List resources (get flows)
    Get {
        /// Resource type (flows)
        resource_type: String,

        /// Output format (wide, json, yaml, name)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Describe a flow in detail
    Describe {
        /// Flow name
        name: String,
    },

    /// Classify a message with the flows' patterns
    Classify {
        /// Message to classify
        message: String,

        /// Router configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Validate => commands::validate::execute(&self.flows),
            Commands::Get {
                resource_type,
                output,
            } => commands::get::execute(&self.flows, &resource_type, &output),
            Commands::Describe { name } => commands::describe::execute(&self.flows, &name),
            Commands::Classify { message, config } => {
                commands::classify::execute(&self.flows, &message, config.as_deref()).await
            }
            Commands::Completion { shell } => commands::completion::execute(shell),
        }
    }
}
