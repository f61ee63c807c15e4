use clap::{Parser, Subcommand};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::fs::MountOptions;

#[derive(Parser, Debug)]
#[command(name = "zipmount")]
#[command(version)]
#[command(about = "Browse a ZIP archive as a read-only virtual filesystem", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipmount data.zip                      list the archive root\n  \
  zipmount data.zip ls -l /docs          long listing of a directory\n  \
  zipmount data.zip cat docs/readme.md   print a file\n  \
  zipmount https://example.com/a.zip tree   walk a remote archive")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Number of decompressed files kept in memory
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// More log output (-vv for debug, -vvv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (-qq => errors suppressed too)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the direct children of a directory
    Ls {
        /// Directory inside the archive
        #[arg(default_value = "/")]
        path: String,

        /// Show size and modification time
        #[arg(short = 'l')]
        long: bool,
    },
    /// Recursively list a directory
    Tree {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show metadata for a path
    Stat { path: String },
    /// Write files to stdout
    Cat {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn mount_options(&self) -> MountOptions {
        MountOptions {
            cache_capacity: self.cache_capacity,
        }
    }

    /// Default log directive derived from `-v` / `-q`.
    pub fn log_level(&self) -> &'static str {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            i16::MIN..=-2 => "off",
            -1 => "error",
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// The command to run, `ls /` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Ls {
            path: "/".to_string(),
            long: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_listing_root() {
        let cli = Cli::parse_from(["zipmount", "a.zip"]);
        assert_eq!(cli.cache_capacity, 128);
        assert_eq!(cli.log_level(), "warn");
        assert_eq!(
            cli.command(),
            Command::Ls {
                path: "/".into(),
                long: false
            }
        );
        assert!(!cli.is_http_url());
    }

    #[test]
    fn parses_subcommands_and_verbosity() {
        let cli = Cli::parse_from([
            "zipmount",
            "--cache-capacity",
            "4",
            "https://example.com/a.zip",
            "cat",
            "x",
            "y",
            "-vv",
        ]);
        assert!(cli.is_http_url());
        assert_eq!(cli.mount_options().cache_capacity, 4);
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(
            cli.command(),
            Command::Cat {
                paths: vec!["x".into(), "y".into()]
            }
        );
    }

    #[test]
    fn quiet_lowers_level() {
        let cli = Cli::parse_from(["zipmount", "-qq", "a.zip", "stat", "f"]);
        assert_eq!(cli.log_level(), "off");
    }
}
