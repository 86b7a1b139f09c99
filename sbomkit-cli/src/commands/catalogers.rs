//! `sbomkit catalogers` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use sbomkit_cataloging::catalog::{default_file_tasks, package_tasks};
use sbomkit_cataloging::{CreateSbomConfig, SelectionRequest, Task, make_task_groups};
use sbomkit_core::config::SbomkitConfig;
use sbomkit_core::{
    DirectoryMetadata, FileMetadata, ImageMetadata, SourceDescription, SourceMetadata,
};

use crate::cli::{CatalogersAction, CatalogersArgs, SourceKind};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `catalogers` command.
pub async fn execute(
    args: CatalogersArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        CatalogersAction::List { source, selection } => {
            let mut core = super::load_config(config_path).await?;
            super::apply_selection(&mut core, &selection)?;
            info!(source = ?source, "listing catalogers");
            let listing = build_listing(&core, source)?;
            writer.render(&listing)?;
            Ok(())
        }
    }
}

/// Source descriptor used only for classification.
fn placeholder_source(kind: SourceKind) -> SourceDescription {
    let metadata = match kind {
        SourceKind::Image => SourceMetadata::Image(ImageMetadata {
            user_input: "image".to_owned(),
            ..ImageMetadata::default()
        }),
        SourceKind::Directory => SourceMetadata::Directory(DirectoryMetadata {
            path: ".".to_owned(),
        }),
        SourceKind::File => SourceMetadata::File(FileMetadata {
            path: ".".to_owned(),
        }),
    };
    SourceDescription::new(metadata)
}

fn entry(task: &dyn Task, kind: &'static str, used: bool) -> CatalogerEntry {
    CatalogerEntry {
        name: task.name().to_owned(),
        kind,
        tags: task
            .selector()
            .map(|s| s.tags().to_vec())
            .unwrap_or_default(),
        always_enabled: task.always_enabled(),
        used,
    }
}

/// Resolve the selection for `kind` and describe every task in the universe.
///
/// Infrastructure tasks always run and are listed last.
fn build_listing(core: &SbomkitConfig, kind: SourceKind) -> Result<CatalogerListing, CliError> {
    let config = CreateSbomConfig::from_core(core)?;
    let source = placeholder_source(kind);
    let (stages, manifest) = make_task_groups(&config, &source)?;

    let mut catalogers: Vec<CatalogerEntry> = package_tasks(&config)?
        .iter()
        .map(|t| entry(t.as_ref(), "package", manifest.uses(t.name())))
        .collect();
    catalogers.extend(
        default_file_tasks(&config)
            .iter()
            .map(|t| entry(t.as_ref(), "file", manifest.uses(t.name()))),
    );
    for stage in stages.iter().filter(|s| s.kind().is_fixed()) {
        catalogers.extend(stage.tasks().iter().map(|t| entry(t.as_ref(), "infrastructure", true)));
    }

    Ok(CatalogerListing {
        source: source.kind().to_owned(),
        requested: manifest.requested,
        catalogers,
    })
}

#[derive(Serialize)]
pub struct CatalogerListing {
    pub source: String,
    pub requested: SelectionRequest,
    pub catalogers: Vec<CatalogerEntry>,
}

#[derive(Serialize)]
pub struct CatalogerEntry {
    pub name: String,
    pub kind: &'static str,
    pub tags: Vec<String>,
    pub always_enabled: bool,
    pub used: bool,
}

impl Render for CatalogerListing {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Source: {}", self.source.bold())?;
        writeln!(
            w,
            "Default: {}",
            self.requested.default_names_or_tags.join(", ")
        )?;
        for (label, tokens) in [
            ("Selection", &self.requested.sub_select_tags),
            ("Addition", &self.requested.add_names_or_tags),
            ("Removal", &self.requested.remove_names_or_tags),
        ] {
            if !tokens.is_empty() {
                writeln!(w, "{}: {}", label, tokens.join(", "))?;
            }
        }
        writeln!(w)?;

        writeln!(w, "{:<6} {:<36} {:<15} Tags", "Used", "Name", "Kind")?;
        writeln!(w, "{}", "-".repeat(90))?;

        for c in &self.catalogers {
            let used = if c.used {
                "yes".green().bold()
            } else {
                "no".dimmed()
            };
            writeln!(
                w,
                "{:<6} {:<36} {:<15} {}",
                used,
                c.name,
                c.kind,
                c.tags.join(",")
            )?;
        }

        let used = self.catalogers.iter().filter(|c| c.used).count();
        writeln!(w)?;
        writeln!(w, "{} of {} tasks selected", used, self.catalogers.len())?;
        Ok(())
    }
}
