//! `sbomkit config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use sbomkit_cataloging::CreateSbomConfig;
use sbomkit_core::config::SbomkitConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Section names accepted by `config show --section`.
const SECTIONS: [&str; 5] = ["general", "cataloging", "files", "relationships", "unknowns"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Loads the file (value ranges and enumerations) and then runs the engine's
/// cross-field validation on the converted configuration.
///
/// # Errors
///
/// Returns `CliError::Config` if either validation step fails.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validate_file(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

async fn validate_file(config_path: &Path) -> ConfigValidationReport {
    let errors = match SbomkitConfig::load(config_path).await {
        Ok(core) => match CreateSbomConfig::from_core(&core).and_then(|c| c.validate()) {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        },
        Err(e) => vec![e.to_string()],
    };

    ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Execute the config show subcommand.
///
/// Displays the effective configuration (file + env overrides + defaults).
/// A missing file shows the defaults.
///
/// # Errors
///
/// Returns `CliError::Config` if loading fails or `CliError::Command` if section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = super::load_config(config_path).await?;
    let report = build_report(&config, config_path, section.as_deref())?;
    writer.render(&report)?;

    Ok(())
}

fn build_report(
    config: &SbomkitConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let source = config_path.display().to_string();
    match section {
        None => ConfigReport::new(source, None, config),
        Some("general") => ConfigReport::new(source, section, &config.general),
        Some("cataloging") => ConfigReport::new(source, section, &config.cataloging),
        Some("files") => ConfigReport::new(source, section, &config.files),
        Some("relationships") => ConfigReport::new(source, section, &config.relationships),
        Some("unknowns") => ConfigReport::new(source, section, &config.unknowns),
        Some(other) => Err(CliError::Command(format!(
            "unknown section: {} (expected: {})",
            other,
            SECTIONS.join(", ")
        ))),
    }
}

/// Configuration display report.
///
/// JSON output carries the structured value; text output renders it as TOML.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Structured configuration value
    pub config: serde_json::Value,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl ConfigReport {
    fn new<T: Serialize>(
        source: String,
        section: Option<&str>,
        value: &T,
    ) -> Result<Self, CliError> {
        Ok(Self {
            source,
            section: section.map(str::to_owned),
            config: serde_json::to_value(value)?,
            config_toml: toml::to_string_pretty(value)
                .unwrap_or_else(|e| format!("(serialization error: {})", e)),
        })
    }
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
