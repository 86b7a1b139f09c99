//! Command handlers -- one module per subcommand

pub mod catalogers;
pub mod config;
pub mod scan;

use std::path::Path;

use sbomkit_core::config::SbomkitConfig;

use crate::cli::SelectionArgs;
use crate::error::CliError;

/// Load the configuration, falling back to defaults when the file is missing.
pub(crate) async fn load_config(config_path: &Path) -> Result<SbomkitConfig, CliError> {
    Ok(SbomkitConfig::load_or_default(config_path).await?)
}

/// Apply command-line selection flags on top of the loaded configuration.
///
/// A non-empty flag replaces the corresponding list; the result is re-validated.
pub(crate) fn apply_selection(
    config: &mut SbomkitConfig,
    args: &SelectionArgs,
) -> Result<(), CliError> {
    for (target, value) in [
        (&mut config.cataloging.default, &args.defaults),
        (&mut config.cataloging.select, &args.select),
        (&mut config.cataloging.add, &args.add),
        (&mut config.cataloging.remove, &args.remove),
    ] {
        if !value.is_empty() {
            *target = value.clone();
        }
    }
    if let Some(selection) = &args.file_selection {
        config.files.selection = selection.clone();
    }
    Ok(config.validate()?)
}
