//! CLI for OpenControl gap analysis.
//!
//! Subcommands:
//! - `diff` (alias `d`): list the controls a certification requires that no
//!   component claims.
//!
//! Exit codes: 0 = no missing controls, 1 = missing controls, 2 = error.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use masonry_compliance::config::{DEFAULT_CONCURRENCY, DEFAULT_OPENCONTROL_DIR};
use masonry_compliance::export::{json_export, render_text};
use masonry_compliance::{compute_gap_analysis, CancelToken, WorkspaceConfig};

#[derive(Parser)]
#[command(
    name = "masonry-compliance",
    about = "OpenControl certification gap analysis",
    version
)]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the gap between a certification and the documented components.
    #[command(visible_alias = "d")]
    Diff {
        /// Certification name (file stem under certifications/). When
        /// omitted, the available certifications are listed.
        certification: Option<String>,
        /// OpenControl workspace directory.
        #[arg(short = 'o', long = "opencontrols", default_value = DEFAULT_OPENCONTROL_DIR)]
        opencontrols: PathBuf,
        /// Maximum number of descriptor files loaded at once.
        #[arg(long, env = "MASONRY_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
        /// Stop loading as soon as a whole phase fails.
        #[arg(long)]
        fail_fast: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Diff {
            certification,
            opencontrols,
            concurrency,
            fail_fast,
            format,
        } => {
            let config = WorkspaceConfig::new(opencontrols, certification.unwrap_or_default())
                .with_concurrency(concurrency)
                .with_fail_fast(fail_fast);
            run_diff(&config, format).await
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_diff(config: &WorkspaceConfig, format: OutputFormat) -> i32 {
    let result = match compute_gap_analysis(config, &CancelToken::new()).await {
        Ok(r) => r,
        Err(e) => {
            error!(event = "diff_failed", code = e.kind().code(), "{}", e);
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    if result.degraded {
        for warning in &result.warnings {
            warn!(event = "load_warning", code = warning.code(), "{}", warning);
        }
        eprintln!(
            "Warning: {} load failure(s); missing controls may be overstated",
            result.warnings.len()
        );
    }

    match format {
        OutputFormat::Text => print!("{}", render_text(&result)),
        OutputFormat::Json => match json_export::to_json(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 2;
            }
        },
    }

    if result.missing_count() == 0 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_diff_alias_and_defaults() {
        let cli = Cli::try_parse_from(["masonry-compliance", "d", "LATO"]).unwrap();
        match cli.command {
            Commands::Diff {
                certification,
                opencontrols,
                fail_fast,
                format,
                ..
            } => {
                assert_eq!(certification.as_deref(), Some("LATO"));
                assert_eq!(opencontrols, PathBuf::from("opencontrols"));
                assert!(!fail_fast);
                assert_eq!(format, OutputFormat::Text);
            }
        }
    }

    #[test]
    fn test_certification_argument_is_optional() {
        let cli = Cli::try_parse_from(["masonry-compliance", "diff"]).unwrap();
        match cli.command {
            Commands::Diff { certification, .. } => assert_eq!(certification, None),
        }
    }

    #[tokio::test]
    async fn test_missing_certification_exits_with_error() {
        let root = tempfile::tempdir().unwrap();
        let certifications = root.path().join("certifications");
        std::fs::create_dir_all(&certifications).unwrap();
        std::fs::write(certifications.join("LATO.yaml"), "standards: {}\n").unwrap();

        let config = WorkspaceConfig::new(root.path(), String::new());
        assert_eq!(run_diff(&config, OutputFormat::Text).await, 2);
    }

    #[test]
    fn test_diff_flags() {
        let cli = Cli::try_parse_from([
            "masonry-compliance",
            "diff",
            "FedRAMP-low",
            "-o",
            "/tmp/oc",
            "--concurrency",
            "2",
            "--format",
            "json",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Diff {
                opencontrols,
                concurrency,
                format,
                ..
            } => {
                assert_eq!(opencontrols, PathBuf::from("/tmp/oc"));
                assert_eq!(concurrency, 2);
                assert_eq!(format, OutputFormat::Json);
            }
        }
    }
}
