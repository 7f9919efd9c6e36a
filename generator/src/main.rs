use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use devconf_generator::{
    BuildOptions, Config, build, config::CONFIG_FILE, generator::DEFAULT_BRANCH,
};

#[derive(Debug, Parser)]
#[command(version, about = "Render the DevConf site into a directory of static files")]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Verbose logging
    #[arg(short, long, global = true)]
    debug: bool,
    /// Config file, relative paths in it are relative to the file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render all pages and copy static files into the build dir
    Build {
        /// Build label passed to templates as `__branch`
        #[arg(short, long, default_value = DEFAULT_BRANCH)]
        branch: String,
        /// Remove the previous build first
        #[arg(short, long)]
        clean: bool,
    },
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Warn
        } else if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Build { branch, clean } => {
            log::info!("read config from: {}", cli.config.display());
            let config = Config::from_file(&cli.config).context("failed to load config")?;

            build(config, BuildOptions { branch, clean })?;
        }
    }

    Ok(())
}
