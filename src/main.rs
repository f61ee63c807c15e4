//! Main entry point for the zipmount CLI application.
//!
//! Loads an archive from the local filesystem or an HTTP URL, indexes it,
//! and answers filesystem-style queries against it from the command line.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zipmount::cli::Command;
use zipmount::time::format_timestamp;
use zipmount::{
    ArchiveBytes, ChildStat, Cli, Container, HttpRangeReader, ReadAt, RemoteSource, ResolvedNode,
    ZipFs,
};

/// Application entry point.
///
/// Parses command-line arguments, indexes the archive, then runs the
/// requested command. Remote archives are read with HTTP Range requests as
/// the command needs them.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    let options = cli.mount_options();

    if cli.is_http_url() {
        let reader = HttpRangeReader::new(cli.archive.clone()).await?;
        let fs = ZipFs::from_source(RemoteSource::new(reader)?, &options)
            .with_context(|| format!("index archive '{}'", cli.archive))?;

        run(&fs, cli.command()).await?;

        let reader = fs.archive().container().source().reader();
        info!(
            url = reader.url(),
            requests = reader.requests(),
            transferred = %format_size(reader.transferred_bytes()),
            archive = %format_size(reader.size()),
            "remote archive session finished"
        );
        Ok(())
    } else {
        let bytes = ArchiveBytes::map_file(Path::new(&cli.archive))?;
        let fs = ZipFs::open(bytes, &options)
            .with_context(|| format!("index archive '{}'", cli.archive))?;
        run(&fs, cli.command()).await
    }
}

/// Install the fmt subscriber on stderr. `RUST_LOG` overrides the CLI level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run<C: Container>(fs: &ZipFs<C>, command: Command) -> Result<()> {
    match command {
        Command::Ls { path, long } => list(fs, &path, long),
        Command::Tree { path } => tree(fs, &path),
        Command::Stat { path } => stat(fs, &path),
        Command::Cat { paths } => cat(fs, &paths).await,
    }
}

/// List the direct children of a directory.
///
/// Long format prints size and modification time before each name, and a
/// summary line at the end, like `unzip -v`.
fn list<C: Container>(fs: &ZipFs<C>, path: &str, long: bool) -> Result<()> {
    let mut total_size = 0u64;
    let mut count = 0usize;

    for child in fs.children(path).with_context(|| format!("list '{path}'"))? {
        let child = child?;
        if long {
            println!(
                "{:>10}  {}  {}",
                if child.is_directory {
                    "<DIR>".to_string()
                } else {
                    child.size.to_string()
                },
                format_timestamp(child.mtime),
                display_name(&child)
            );
            total_size += child.size;
            count += 1;
        } else {
            println!("{}", display_name(&child));
        }
    }

    if long {
        println!("{}", "-".repeat(40));
        println!("{:>10}  {:>16}  {} entries", total_size, "", count);
    }

    Ok(())
}

/// Recursively list a directory, resolving each child directory in turn.
fn tree<C: Container>(fs: &ZipFs<C>, path: &str) -> Result<()> {
    let base = path.trim_matches('/');
    println!("{}", if base.is_empty() { "/" } else { base });
    walk(fs, base, 1)
}

fn walk<C: Container>(fs: &ZipFs<C>, dir: &str, depth: usize) -> Result<()> {
    for child in fs.children(dir).with_context(|| format!("list '{dir}'"))? {
        let child = child?;
        println!("{}{}", "  ".repeat(depth), display_name(&child));

        if child.is_directory {
            let sub = if dir.is_empty() {
                child.name.clone()
            } else {
                format!("{dir}/{}", child.name)
            };
            walk(fs, &sub, depth + 1)?;
        }
    }
    Ok(())
}

/// Print metadata for a single path.
fn stat<C: Container>(fs: &ZipFs<C>, path: &str) -> Result<()> {
    match fs.locate(path) {
        ResolvedNode::NotFound => bail!("'{path}': no such file or directory"),
        node @ ResolvedNode::SyntheticDirectory { .. } => {
            println!("  Path: {path}");
            match fs.directory_marker(path, node) {
                Some(marker) => {
                    println!("  Type: directory");
                    println!("Modify: {}", format_timestamp(fs.stat_at(marker)?.mtime));
                }
                None => println!("  Type: directory (implied by entry paths)"),
            }
        }
        ResolvedNode::RealEntry(index) => {
            let entry = fs.stat_at(index)?;
            println!("  Path: {}", entry.path);
            println!(
                "  Type: {}",
                if entry.is_directory { "directory" } else { "file" }
            );
            println!("  Size: {} ({})", entry.size, format_size(entry.size));
            println!("Modify: {}", format_timestamp(entry.mtime));
            println!(" Index: {index}");
        }
    }
    Ok(())
}

/// Write the contents of files to stdout.
async fn cat<C: Container>(fs: &ZipFs<C>, paths: &[String]) -> Result<()> {
    let mut stdout = tokio::io::stdout();

    for path in paths {
        let ResolvedNode::RealEntry(index) = fs.locate(path) else {
            bail!("'{path}': not a file in the archive");
        };
        if fs.stat_at(index)?.is_directory {
            bail!("'{path}': is a directory");
        }

        let body = fs.body(index)?;
        stdout.write_all(&body).await?;
    }

    stdout.flush().await?;
    Ok(())
}

fn display_name(child: &ChildStat) -> String {
    if child.is_directory {
        format!("{}/", child.name)
    } else {
        child.name.clone()
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
