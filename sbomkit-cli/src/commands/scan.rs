//! `sbomkit scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sbomkit_cataloging::{CatalogingResult, CreateSbomConfig, create_sbom, resolver_for};
use sbomkit_core::SourceDescription;

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let result = run(&args, config_path).await?;
    writer.render(&ScanReport { result })?;
    Ok(())
}

/// Load config, apply flags, and catalog the scan target.
///
/// Ctrl-C cancels the run; the engine then returns no partial result.
///
/// # Errors
///
/// * `CliError::Config` - invalid config file, flags, or cross-field settings
/// * `CliError::UnsupportedSource` - the path cannot be cataloged
/// * `CliError::Cancelled` - interrupted before completion
async fn run(args: &ScanArgs, config_path: &Path) -> Result<CatalogingResult, CliError> {
    let mut core = super::load_config(config_path).await?;
    if let Some(parallelism) = args.parallelism {
        core.cataloging.parallelism = parallelism;
    }
    super::apply_selection(&mut core, &args.selection)?;
    let config = CreateSbomConfig::from_core(&core)?;

    let source = SourceDescription::from_path(&args.path)?;
    info!(source = %source, "starting scan");

    let resolver = resolver_for(&source, config.max_file_size).await?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling scan");
                cancel.cancel();
            }
        })
    };

    let result = create_sbom(&source, resolver, &config, cancel).await;
    interrupt.abort();
    Ok(result?)
}

/// Scan output. JSON renders the full cataloging result.
#[derive(Serialize)]
#[serde(transparent)]
pub struct ScanReport {
    pub result: CatalogingResult,
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let result = &self.result;
        let sbom = &result.sbom;

        writeln!(w, "Scan: {}", result.source.to_string().bold())?;
        writeln!(w, "Run ID: {}", result.run_id)?;
        if let Some(release) = &sbom.linux_release {
            writeln!(w, "Distro: {}", release.distro_qualifier())?;
        }
        writeln!(w, "Catalogers used: {}", result.manifest.used.join(", "))?;
        writeln!(w)?;

        writeln!(
            w,
            "Packages: {}  Relationships: {}  Files: {}  Executables: {}  Unknowns: {}",
            sbom.packages.len(),
            sbom.relationships.len(),
            sbom.files.len(),
            sbom.executables.len(),
            sbom.unknowns.len()
        )?;
        writeln!(w)?;

        if sbom.packages.is_empty() {
            writeln!(w, "{}", "No packages found.".yellow())?;
        } else {
            writeln!(
                w,
                "{:<30} {:<20} {:<10} Found by",
                "Name", "Version", "Type"
            )?;
            writeln!(w, "{}", "-".repeat(90))?;

            let mut packages: Vec<_> = sbom.packages.iter().collect();
            packages.sort_by(|a, b| a.name.cmp(&b.name).then(a.version.cmp(&b.version)));
            for p in packages {
                writeln!(
                    w,
                    "{:<30} {:<20} {:<10} {}",
                    p.name,
                    p.version,
                    p.package_type.to_string(),
                    p.found_by.dimmed()
                )?;
            }
        }

        if !result.failures.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{}",
                format!("{} task(s) failed:", result.failures.len()).red().bold()
            )?;
            for f in &result.failures {
                writeln!(w, "  {} [{}]: {}", f.task.red(), f.stage, f.reason)?;
            }
        }

        Ok(())
    }
}
