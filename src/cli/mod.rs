pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "school-office")]
#[command(about = "School office CLI - expand and check classroom schedules offline")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Expand weekly schedules into dated sessions")]
    Expand(commands::expand::ExpandArgs),

    #[command(about = "Check weekly schedules for inverted times and overlaps")]
    Validate(commands::validate::ValidateArgs),

    #[command(about = "List known entities and whether reads hide deleted rows")]
    Entities(commands::entities::EntitiesArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Expand(args) => commands::expand::handle(args, output_format).await,
        Commands::Validate(args) => commands::validate::handle(args, output_format).await,
        Commands::Entities(args) => commands::entities::handle(args, output_format).await,
    }
}
