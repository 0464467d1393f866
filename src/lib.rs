// src/lib.rs

pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::codec::Document;
use crate::config::{ConfigFile, load_or_default};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::Direction;
use crate::watch::{Watcher, resolver_for_target};

pub use crate::codec::{DataFileCodec, KeySet};
pub use crate::errors::{DatahookError, Result as DatahookResult};
pub use crate::watch::{WatchOptions, WatchState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - data file path resolution
/// - the one-shot codec commands, or the watcher + Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let path = resolve_path(fs.as_ref(), &cfg, args.command.path_override().map(PathBuf::as_path))?;

    if args.dry_run {
        print_dry_run(&cfg, &path);
        return Ok(());
    }

    match args.command {
        Command::Watch { .. } => watch_and_print(path, &cfg, fs).await,
        Command::Decode { direction, .. } => decode_once(fs.as_ref(), &path, &cfg, direction),
        Command::Encode { input, .. } => {
            let doc = read_input(&input)?;
            encode_once(path, &cfg, fs, &doc).await
        }
    }
}

fn resolve_path(
    fs: &dyn FileSystem,
    cfg: &ConfigFile,
    path_override: Option<&Path>,
) -> Result<PathBuf> {
    let resolver = resolver_for_target(fs, &cfg.target, path_override)?;
    let path = resolver.resolve()?;
    debug!(?path, "resolved data file");
    Ok(path)
}

async fn watch_and_print(path: PathBuf, cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Result<()> {
    let mut watcher = Watcher::spawn(path, cfg.watch_options(), fs);

    // Ctrl-C -> close; `next` then returns None and the loop ends.
    {
        let closer = watcher.close_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            closer.close();
        });
    }

    let mut stdout = std::io::stdout();
    while let Some(event) = watcher.next().await {
        match event {
            Ok(doc) => {
                writeln!(stdout, "{}", render(&doc))?;
                stdout.flush()?;
            }
            Err(e) if e.is_codec_error() => warn!(error = %e, "skipping undecodable change"),
            Err(e) => error!(error = %e, "could not read changed data file"),
        }
    }

    info!("watcher closed");
    watcher.join().await;
    Ok(())
}

fn decode_once(
    fs: &dyn FileSystem,
    path: &Path,
    cfg: &ConfigFile,
    direction: Direction,
) -> Result<()> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading data file {:?}", path))?;
    let doc = cfg.codec().parse_as(&bytes, direction)?;
    println!("{}", render(&doc));
    Ok(())
}

async fn encode_once(
    path: PathBuf,
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    doc: &Document,
) -> Result<()> {
    // The write path lives on the watcher so it shares the IO lock and
    // retry policy. The current file is only a baseline here.
    let mut options = cfg.watch_options();
    options.deliver_initial = false;
    let watcher = Watcher::spawn(path, options, fs);
    let result = watcher.write(doc).await;
    watcher.join().await;
    result?;
    Ok(())
}

fn read_input(input: &str) -> Result<Document> {
    let mut buf = Vec::new();
    if input == "-" {
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading document from stdin")?;
    } else {
        buf = std::fs::read(input).with_context(|| format!("reading document {input:?}"))?;
    }
    Ok(Document::new(buf))
}

/// Compact JSON when the payload is JSON, lossy UTF-8 otherwise.
fn render(doc: &Document) -> String {
    match doc.to_json() {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(doc.as_bytes()).into_owned(),
    }
}

/// Simple dry-run output: print resolved path and effective settings.
fn print_dry_run(cfg: &ConfigFile, path: &Path) {
    println!("datahook dry-run");
    println!("  data file = {}", path.display());
    println!("  poll.missing_interval_ms = {}", cfg.poll.missing_interval_ms);
    println!("  poll.present_interval_us = {}", cfg.poll.present_interval_us);
    println!("  poll.deliver_initial = {}", cfg.poll.deliver_initial);
    println!("  poll.suppress_unchanged = {}", cfg.poll.suppress_unchanged);
    println!("  read.retries = {}", cfg.read.retries);
    println!("  read.backoff_us = {}", cfg.read.backoff_us);
    println!("  codec.chunk_size = {}", cfg.codec.chunk_size);

    debug!("dry-run complete (nothing read or written)");
}
