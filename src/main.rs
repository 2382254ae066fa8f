use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use photo_tools::config::AppConfig;
use photo_tools::walker::collect_paths;
use photo_tools::{Backend, Exif, ExtractOptions, WriteReport, WriteValue};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo-tools", version, about = "Read and write metadata of local photo files")]
struct Cli {
    /// Path to the exiftool binary (defaults to the one on PATH)
    #[arg(long, global = true)]
    exiftool: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metadata of files as JSON
    Extract {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Read EXIF in-process instead of running exiftool
        #[arg(long)]
        native: bool,
        #[arg(long)]
        clean_keys: bool,
        #[arg(long)]
        clean_values: bool,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Set tags, given as Name=value
    Write {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long = "tag", value_parser = parse_assignment, required = true)]
        tags: Vec<(String, String)>,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Clear tags
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long = "tag", required = true)]
        tags: Vec<String>,
        #[arg(short, long)]
        recursive: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected Name=value, got \"{}\"", raw))
}

fn open(config: &AppConfig, inputs: &[PathBuf], recursive: bool) -> Result<Exif> {
    let paths = collect_paths(inputs, &config.allowed_extensions, recursive)?;
    let exif = Exif::from_config(&paths, config).context("Failed to prepare files")?;
    info!("Operating on {} file(s)", exif.paths().len());
    Ok(exif)
}

/// Process exit code for a write or remove: 2 when any file was left
/// unchanged.
fn exit_code(report: &WriteReport) -> i32 {
    if report.values().all(|ok| *ok) {
        0
    } else {
        2
    }
}

fn print_report(report: &WriteReport) -> Result<i32> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(exit_code(report))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::new().context("Failed to load configuration")?;
    if let Some(path) = cli.exiftool {
        config.exiftool_path = Some(path);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    info!("Starting photo-tools {}", photo_tools::VERSION);

    let code = match cli.command {
        Commands::Extract {
            paths,
            native,
            clean_keys,
            clean_values,
            recursive,
        } => {
            let exif = open(&config, &paths, recursive)?;
            let options = ExtractOptions {
                backend: if native { Backend::Native } else { Backend::Exiftool },
                clean_keys,
                clean_values,
            };
            let exifd = exif.extract(options)?;
            println!("{}", serde_json::to_string_pretty(&exifd)?);
            0
        }
        Commands::Write {
            paths,
            tags,
            recursive,
        } => {
            let exif = open(&config, &paths, recursive)?;
            let attrs: Vec<(String, WriteValue)> = tags
                .into_iter()
                .map(|(name, value)| (name, WriteValue::from(value)))
                .collect();
            print_report(&exif.write(&attrs)?)?
        }
        Commands::Remove {
            paths,
            tags,
            recursive,
        } => {
            let exif = open(&config, &paths, recursive)?;
            print_report(&exif.remove(&tags)?)?
        }
    };

    info!("photo-tools finished");

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("Artist=Jane Doe"),
            Ok(("Artist".to_string(), "Jane Doe".to_string()))
        );
        assert_eq!(
            parse_assignment("Comment=a=b"),
            Ok(("Comment".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_assignment("Copyright="),
            Ok(("Copyright".to_string(), String::new()))
        );
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert!(parse_assignment("Artist").is_err());
        assert!(parse_assignment("=Jane").is_err());
        assert!(parse_assignment("  =Jane").is_err());
    }

    #[test]
    fn failed_files_give_exit_code_two() {
        let mut report = WriteReport::new();
        assert_eq!(exit_code(&report), 0);
        report.insert(PathBuf::from("/p/a.jpg"), true);
        assert_eq!(exit_code(&report), 0);
        report.insert(PathBuf::from("/p/b.jpg"), false);
        assert_eq!(exit_code(&report), 2);
    }

    #[test]
    fn cli_parses_write_tags() {
        let cli = Cli::try_parse_from([
            "photo-tools",
            "write",
            "a.jpg",
            "-t",
            "Artist=Jane",
            "--tag",
            "Keywords=sea, sky",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Write { paths, tags, .. } => {
                assert_eq!(paths, vec![PathBuf::from("a.jpg")]);
                assert_eq!(tags[1], ("Keywords".to_string(), "sea, sky".to_string()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn write_without_tags_is_a_usage_error() {
        assert!(Cli::try_parse_from(["photo-tools", "write", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["photo-tools", "extract"]).is_err());
    }
}
