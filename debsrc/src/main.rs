//! debsrc CLI
//!
//! Command-line interface for generating and inspecting source descriptors.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use debsrc::{Config, Dsc, Paragraph, Result};

static CHECK_MARK: LazyLock<colored::ColoredString> = LazyLock::new(|| "✔".bright_green().bold());
static CROSS_MARK: LazyLock<colored::ColoredString> = LazyLock::new(|| "〤".bright_red().bold());

#[derive(Parser)]
#[command(name = "debsrc")]
#[command(about = "Generator for Debian source package descriptors", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render (and sign, if configured) a .dsc file
    Package {
        /// Package config file
        #[arg(short, long, default_value = "debsrc.yaml")]
        config: PathBuf,

        /// Output file, or directory to place the conventionally named file in
        #[arg(short, long, default_value = ".")]
        target: PathBuf,
    },

    /// Print the conventional .dsc filename for a config
    Filename {
        /// Package config file
        #[arg(short, long, default_value = "debsrc.yaml")]
        config: PathBuf,
    },

    /// Show the fields of an existing descriptor
    Show {
        /// Path to a .dsc file
        file: PathBuf,

        /// Print only this field's value
        #[arg(short, long)]
        field: Option<String>,
    },
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
    }
}

/// Resolve where the descriptor goes: directories get the conventional name.
fn output_path(target: &Path, file_name: &str) -> PathBuf {
    let trailing_slash = target.as_os_str().to_string_lossy().ends_with('/');
    if target.is_dir() || trailing_slash {
        target.join(file_name)
    } else {
        target.to_path_buf()
    }
}

fn cmd_package(config: PathBuf, target: PathBuf) -> Result<()> {
    let info = Config::load(&config)?.into_metadata();
    let dsc = Dsc::new();

    let path = output_path(&target, &dsc.conventional_file_name(&info));
    debug!(config = %config.display(), output = %path.display(), "packaging");

    // Buffer first so a failed render or signature leaves no file behind.
    let mut content = Vec::new();
    dsc.package(&info, &mut content)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;

    println!("[{}] created {}", &*CHECK_MARK, path.display());
    Ok(())
}

fn cmd_filename(config: PathBuf) -> Result<()> {
    let info = Config::load(config)?.into_metadata();
    println!("{}", Dsc::new().conventional_file_name(&info));
    Ok(())
}

fn cmd_show(file: PathBuf, field: Option<String>) -> Result<()> {
    let content = fs::read_to_string(&file)?;
    let paragraph = Paragraph::parse(&content)?;

    if let Some(field) = field {
        match paragraph.get(&field) {
            Some(value) => println!("{}", value),
            None => {
                return Err(debsrc::Error::Config(format!(
                    "field '{}' not found in {}",
                    field,
                    file.display()
                )))
            }
        }
        return Ok(());
    }

    for (key, value) in paragraph.fields() {
        println!("{}: {}", key.bright_blue().bold(), value.replace('\n', "\n "));
    }
    if paragraph.is_signed() {
        println!("[{}] clear-signed", "+".bright_blue().bold());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Package { config, target } => cmd_package(config, target),
        Commands::Filename { config } => cmd_filename(config),
        Commands::Show { file, field } => cmd_show(file, field),
    };

    if let Err(err) = result {
        eprintln!("[{}] {}", &*CROSS_MARK, err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path(dir.path(), "foo_1.0_amd64.dsc"),
            dir.path().join("foo_1.0_amd64.dsc")
        );
    }

    #[test]
    fn test_output_path_trailing_slash() {
        assert_eq!(
            output_path(Path::new("dist/"), "foo_1.0_amd64.dsc"),
            PathBuf::from("dist/foo_1.0_amd64.dsc")
        );
    }

    #[test]
    fn test_output_path_explicit_file() {
        assert_eq!(
            output_path(Path::new("out/custom.dsc"), "foo_1.0_amd64.dsc"),
            PathBuf::from("out/custom.dsc")
        );
    }
}
