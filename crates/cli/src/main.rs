use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use log::{debug, LevelFilter};
use photo_date_renamer_core::{
    ensure_directory, execute_plan, load_config, load_config_from, parse_enforced_extension,
    plan_directory, ExecuteMode, ExecuteOutcome, ExifMetadataReader, PlanOptions, RenameConfig,
    RenameError, RenamePlan,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_USAGE: u8 = 1;
const EXIT_TOO_MANY_DIRECTORIES: u8 = 10;
const EXIT_NO_DIRECTORY: u8 = 11;
const EXIT_BAD_EXTENSION: u8 = 12;
const EXIT_DECLINED: u8 = 100;

#[derive(Debug, Parser)]
#[command(name = "photo-date-renamer", version)]
#[command(about = "Rename JPEG photos and their raw siblings after the EXIF capture time")]
struct Cli {
    /// Directory holding the photos (default: current directory)
    #[arg(value_name = "DIRECTORY")]
    directories: Vec<PathBuf>,
    /// Rename without asking for confirmation
    #[arg(short = 'y', long = "yes", default_value_t = false)]
    skip_confirmation: bool,
    /// Show the plan but do not rename anything
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    /// Force the image extension: jpg, jpeg or empty to keep the original
    #[arg(short = 'e', long, value_name = "EXT", default_value = "")]
    enforce_extension: String,
    /// Also list files that keep their name
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
    /// Log why files are skipped
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Log every name probe
    #[arg(long, default_value_t = false)]
    trace: bool,
    /// Read settings from this TOML file instead of the user config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
                _ => EXIT_USAGE,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_logger(&cli);

    match cmd_rename(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn init_logger(cli: &Cli) {
    let level = if cli.trace {
        LevelFilter::Trace
    } else if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RenameError>() {
        Some(RenameError::DirectoryNotFound(_) | RenameError::NotADirectory(_)) => {
            EXIT_NO_DIRECTORY
        }
        Some(RenameError::Extension(_)) => EXIT_BAD_EXTENSION,
        _ => EXIT_USAGE,
    }
}

fn cmd_rename(cli: Cli) -> Result<u8> {
    if cli.directories.len() > 1 {
        eprintln!("error: only one directory may be given");
        return Ok(EXIT_TOO_MANY_DIRECTORIES);
    }
    let directory = cli
        .directories
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    ensure_directory(&directory)?;
    let enforced_extension =
        parse_enforced_extension(&cli.enforce_extension).map_err(RenameError::from)?;

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    debug!("config: {config:?}");

    let options = PlanOptions { enforced_extension };
    let plan = plan_directory(&directory, &ExifMetadataReader, &options, &config)?;

    let mode = ExecuteMode {
        dry_run: cli.dry_run,
        skip_confirmation: cli.skip_confirmation,
        verbose: cli.verbose,
    };
    let mut input = io::stdin().lock();
    let outcome = match cli.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            execute_plan(&plan, &mode, &mut input, &mut io::stderr().lock())?
        }
        OutputFormat::Table => {
            print_scan_summary(&plan, &config, cli.verbose);
            execute_plan(&plan, &mode, &mut input, &mut io::stdout().lock())?
        }
    };

    Ok(finish(outcome))
}

fn print_scan_summary(plan: &RenamePlan, config: &RenameConfig, verbose: bool) {
    if !verbose {
        return;
    }
    let scan = &plan.scan;
    println!(
        "scanned={} candidates={} raw={} skipped: not_file={} non_image={} unreadable={} no_{}={} bad_timestamp={}",
        scan.scanned_entries,
        scan.candidates,
        scan.raw_siblings,
        scan.skipped_not_file,
        scan.skipped_non_image,
        scan.skipped_unreadable,
        config.datetime_field,
        scan.skipped_missing_field,
        scan.skipped_bad_timestamp
    );
}

fn finish(outcome: ExecuteOutcome) -> u8 {
    match outcome {
        ExecuteOutcome::DryRun { .. } => 0,
        ExecuteOutcome::Declined => {
            eprintln!("aborted: no files were renamed");
            EXIT_DECLINED
        }
        ExecuteOutcome::Applied(result) => {
            for failure in &result.failures {
                eprintln!(
                    "failed: {} -> {}: {}",
                    failure.source_path.display(),
                    failure.target_path.display(),
                    failure.error
                );
            }
            eprintln!(
                "renamed {} file(s), {} unchanged, {} failed",
                result.applied,
                result.unchanged,
                result.failures.len()
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cmd_rename, exit_code_for, finish, Cli, EXIT_BAD_EXTENSION, EXIT_DECLINED,
        EXIT_NO_DIRECTORY, EXIT_TOO_MANY_DIRECTORIES, EXIT_USAGE,
    };
    use clap::Parser;
    use photo_date_renamer_core::{
        parse_enforced_extension, ApplyResult, ExecuteOutcome, RenameError, RenameFailure,
    };
    use std::path::PathBuf;

    #[test]
    fn parses_flags_and_default_directory() {
        let cli = Cli::try_parse_from(["photo-date-renamer", "-y", "-n", "-e", ".JPEG", "-v"])
            .expect("flags must parse");
        assert!(cli.directories.is_empty());
        assert!(cli.skip_confirmation);
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.enforce_extension, ".JPEG");
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        assert!(Cli::try_parse_from(["photo-date-renamer", "--bogus"]).is_err());
    }

    #[test]
    fn two_directories_are_rejected() {
        let cli = Cli::try_parse_from(["photo-date-renamer", "a", "b"]).expect("parse");
        assert_eq!(cmd_rename(cli).expect("run"), EXIT_TOO_MANY_DIRECTORIES);
    }

    #[test]
    fn missing_directory_maps_to_its_exit_code() {
        let cli = Cli::try_parse_from(["photo-date-renamer", "/definitely/not/here"])
            .expect("parse");
        let err = cmd_rename(cli).expect_err("missing directory");
        assert_eq!(exit_code_for(&err), EXIT_NO_DIRECTORY);
    }

    #[test]
    fn typed_errors_map_to_exit_codes() {
        let bad = parse_enforced_extension("png").expect_err("png is invalid");
        let err = anyhow::Error::from(RenameError::from(bad));
        assert_eq!(exit_code_for(&err), EXIT_BAD_EXTENSION);

        let err = anyhow::Error::from(RenameError::NotADirectory(PathBuf::from("x")));
        assert_eq!(exit_code_for(&err), EXIT_NO_DIRECTORY);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), EXIT_USAGE);
    }

    #[test]
    fn outcomes_map_to_exit_codes() {
        assert_eq!(finish(ExecuteOutcome::DryRun { planned: 3 }), 0);
        assert_eq!(finish(ExecuteOutcome::Declined), EXIT_DECLINED);

        let partial = ApplyResult {
            applied: 1,
            unchanged: 0,
            failures: vec![RenameFailure {
                source_path: PathBuf::from("IMG2.JPG"),
                target_path: PathBuf::from("2023_0803_150850a.JPG"),
                error: "target already exists".to_string(),
            }],
        };
        assert_eq!(finish(ExecuteOutcome::Applied(partial)), 0);
    }
}
