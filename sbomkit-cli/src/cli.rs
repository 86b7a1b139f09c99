//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// sbomkit -- software bill of materials cataloging.
///
/// Use `sbomkit <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "sbomkit", version, about, long_about = None)]
pub struct Cli {
    /// Path to the sbomkit.toml configuration file.
    #[arg(short, long, default_value = "sbomkit.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Catalog a directory or a single file.
    Scan(ScanArgs),

    /// Inspect the cataloger universe and the current selection.
    Catalogers(CatalogersArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- selection (shared) ----

/// Cataloger selection flags. Each flag takes a comma-separated list and
/// replaces the corresponding `[cataloging]` list from the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Replace the source's default tags (`default` expands to them).
    #[arg(long = "default", value_delimiter = ',')]
    pub defaults: Vec<String>,

    /// Narrow the default set to catalogers carrying any of these tags.
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Add catalogers by name or tag.
    #[arg(long, value_delimiter = ',')]
    pub add: Vec<String>,

    /// Remove catalogers by name or tag.
    #[arg(long, value_delimiter = ',')]
    pub remove: Vec<String>,

    /// File analysis scope (owned-by-package, all, none).
    #[arg(long)]
    pub file_selection: Option<String>,
}

// ---- scan ----

/// Catalog packages and files of a local source.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to scan (default: current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Maximum number of concurrently running tasks per stage.
    #[arg(long)]
    pub parallelism: Option<usize>,
}

// ---- catalogers ----

/// Inspect catalogers.
#[derive(Args, Debug)]
pub struct CatalogersArgs {
    #[command(subcommand)]
    pub action: CatalogersAction,
}

#[derive(Subcommand, Debug)]
pub enum CatalogersAction {
    /// List every cataloger, its tags and whether the selection uses it.
    List {
        /// Source kind to resolve the selection for.
        #[arg(long, default_value = "directory")]
        source: SourceKind,

        #[command(flatten)]
        selection: SelectionArgs,
    },
}

/// Source kinds accepted by `catalogers list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Container image.
    Image,
    /// Directory tree.
    Directory,
    /// Single file.
    File,
}

// ---- config ----

/// Manage sbomkit configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, cataloging, files, relationships, unknowns).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["sbomkit", "scan"]).expect("parse succeeded");
        match cli.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.path, PathBuf::from("."));
                assert!(scan_args.selection.select.is_empty());
                assert!(scan_args.selection.file_selection.is_none());
                assert!(scan_args.parallelism.is_none());
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_selection_lists() {
        let cli = Cli::try_parse_from([
            "sbomkit",
            "scan",
            "/src/project",
            "--select",
            "javascript,python",
            "--remove",
            "digest",
            "--add",
            "dpkg-db-cataloger",
            "--default",
            "image,file",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.path, PathBuf::from("/src/project"));
                assert_eq!(scan_args.selection.select, vec!["javascript", "python"]);
                assert_eq!(scan_args.selection.remove, vec!["digest"]);
                assert_eq!(scan_args.selection.add, vec!["dpkg-db-cataloger"]);
                assert_eq!(scan_args.selection.defaults, vec!["image", "file"]);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_file_selection_and_parallelism() {
        let cli = Cli::try_parse_from([
            "sbomkit",
            "scan",
            "--file-selection",
            "all",
            "--parallelism",
            "8",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.selection.file_selection.as_deref(), Some("all"));
                assert_eq!(scan_args.parallelism, Some(8));
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_catalogers_list_default_source() {
        let cli = Cli::try_parse_from(["sbomkit", "catalogers", "list"]).expect("parse succeeded");
        match cli.command {
            Commands::Catalogers(args) => match args.action {
                CatalogersAction::List { source, selection } => {
                    assert_eq!(source, SourceKind::Directory);
                    assert!(selection.remove.is_empty());
                }
            },
            _ => panic!("expected Catalogers command"),
        }
    }

    #[test]
    fn test_cli_parse_catalogers_list_image_with_selection() {
        let cli = Cli::try_parse_from([
            "sbomkit",
            "catalogers",
            "list",
            "--source",
            "image",
            "--select",
            "os",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Catalogers(args) => match args.action {
                CatalogersAction::List { source, selection } => {
                    assert_eq!(source, SourceKind::Image);
                    assert_eq!(selection.select, vec!["os"]);
                }
            },
            _ => panic!("expected Catalogers command"),
        }
    }

    #[test]
    fn test_cli_parse_catalogers_invalid_source_fails() {
        let args = Cli::try_parse_from(["sbomkit", "catalogers", "list", "--source", "snap"]);
        assert!(args.is_err(), "should reject unknown source kind");
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["sbomkit", "config", "validate"]).expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Validate => {}
                _ => panic!("expected Validate action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["sbomkit", "config", "show", "--section", "files"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("files".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "sbomkit",
            "-c",
            "/custom/sbomkit.toml",
            "--log-level",
            "debug",
            "--output",
            "json",
            "scan",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/custom/sbomkit.toml"));
        assert_eq!(cli.log_level, Some("debug".to_owned()));
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_cli_parse_default_config_path() {
        let cli = Cli::try_parse_from(["sbomkit", "config", "show"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("sbomkit.toml"));
        assert!(matches!(cli.output, OutputFormat::Text));
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        let args = Cli::try_parse_from(["sbomkit"]);
        assert!(args.is_err(), "should fail when no command provided");
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "sbomkit");

        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"scan"));
        assert!(subcommands.contains(&"catalogers"));
        assert!(subcommands.contains(&"config"));
    }
}
