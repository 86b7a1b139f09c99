//! sbomkit CLI -- 카탈로거 선택과 SBOM 카탈로깅 명령줄 도구

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use sbomkit_core::config::{GeneralConfig, SbomkitConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 설정 파일이 깨져 있어도 로깅은 기본값으로 시작
    let mut general = SbomkitConfig::load_or_default(&cli.config)
        .await
        .map(|c| c.general)
        .unwrap_or_else(|_| GeneralConfig::default());
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("{} {:#}", "warning:".yellow().bold(), e);
    }

    tracing::debug!(config = %cli.config.display(), "sbomkit starting");

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Catalogers(args) => {
            commands::catalogers::execute(args, &cli.config, &writer).await
        }
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
