//! Command line and configuration file handling.
//!
//! Settings come from three places. Command line flags (and their
//! environment fallbacks) win over the TOML file, and the file wins over
//! the built-in defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mailgate_proto::Config;
use serde::Deserialize;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "mailgate", version, about = "Mailbox protocol server")]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "MAILGATE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Path of the SQLite database.
    #[arg(long, env = "MAILGATE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Domain announced in greetings and assigned to new mailboxes.
    #[arg(long)]
    pub domain: Option<String>,

    /// Seconds a session may stay idle before it is closed.
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Contents of the TOML configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Address to listen on.
    pub bind: Option<SocketAddr>,
    /// Path of the SQLite database.
    pub database: Option<PathBuf>,
    /// Server domain.
    pub domain: Option<String>,
    /// Idle timeout in seconds.
    pub idle_timeout: Option<u64>,
    /// Longest accepted command line, in characters.
    pub max_line_length: Option<usize>,
    /// Largest accepted frame, in bytes.
    pub max_frame_size: Option<usize>,
}

impl FileConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has unknown keys.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Fully resolved settings for one server run.
#[derive(Debug)]
pub struct Settings {
    /// Protocol engine configuration.
    pub server: Config,
    /// Database location.
    pub database: PathBuf,
    /// Debug logging requested.
    pub verbose: bool,
}

impl Settings {
    /// Resolves settings from the command line, loading `--config` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(cli, file))
    }

    /// Merges command line values over file values over defaults.
    #[must_use]
    pub fn resolve(cli: Cli, file: FileConfig) -> Self {
        let mut builder = Config::builder();
        if let Some(bind) = cli.bind.or(file.bind) {
            builder = builder.bind(bind);
        }
        if let Some(domain) = cli.domain.or(file.domain) {
            builder = builder.domain(domain);
        }
        if let Some(secs) = cli.idle_timeout.or(file.idle_timeout) {
            builder = builder.idle_timeout(Duration::from_secs(secs));
        }
        if let Some(len) = file.max_line_length {
            builder = builder.max_line_length(len);
        }
        if let Some(len) = file.max_frame_size {
            builder = builder.max_frame_size(len);
        }

        Self {
            server: builder.build(),
            database: cli
                .database
                .or(file.database)
                .unwrap_or_else(default_database_path),
            verbose: cli.verbose,
        }
    }
}

/// `<data dir>/mailgate/mailgate.db`, or `./mailgate.db` when the platform
/// has no data directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("mailgate.db"),
        |dir| dir.join("mailgate").join("mailgate.db"),
    )
}
