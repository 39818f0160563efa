//! Upload service and command-line tool for removing XMP metadata from PDFs.
//!
//! `stripxmppdf` with no subcommand starts the web server. The other
//! subcommands run the same library routines on local files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stripxmppdf::{remover, server, sweeper, telemetry, Config, PdfAnalyzer, XmpMetadata};

#[derive(Debug, Parser)]
#[command(name = "stripxmppdf", version, about = "Remove XMP metadata from PDF files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the upload server (default).
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        upload_folder: Option<PathBuf>,
    },
    /// Print the XMP and document-info metadata of a PDF.
    Inspect { pdf: PathBuf },
    /// Write a copy of a PDF without its XMP packet.
    Strip { input: PathBuf, output: PathBuf },
    /// Delete files older than the retention window once and exit.
    Sweep {
        /// Directory to sweep; defaults to UPLOAD_FOLDER.
        dir: Option<PathBuf>,
        /// Maximum age in seconds; defaults to CLEANUP_INTERVAL_SECS.
        #[arg(long)]
        max_age_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        upload_folder: None,
    }) {
        Command::Serve {
            host,
            port,
            upload_folder,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = upload_folder {
                config.upload_folder = dir;
            }
            server::serve(&config).await
        }
        Command::Inspect { pdf } => inspect(&pdf),
        Command::Strip { input, output } => strip(&input, &output),
        Command::Sweep { dir, max_age_secs } => {
            let dir = dir.unwrap_or(config.upload_folder);
            let max_age = max_age_secs
                .map(Duration::from_secs)
                .unwrap_or(config.cleanup_interval);
            let report = sweeper::sweep(&dir, max_age);
            println!(
                "🧹 {}: scanned {}, removed {}, failed {}",
                dir.display(),
                report.scanned,
                report.removed,
                report.failed
            );
            Ok(())
        }
    }
}

fn inspect(pdf: &Path) -> Result<()> {
    println!("🔍 Analyzing PDF: {}", pdf.display());
    println!("{}", "─".repeat(60));

    let analyzer = PdfAnalyzer::from_path(pdf).with_context(|| format!("cannot open {}", pdf.display()))?;
    println!("📄 Pages: {}", analyzer.page_count());

    let info = analyzer.document_info();
    if info.is_empty() {
        println!("\nℹ️  No document-info dictionary");
    } else {
        println!("\n📋 Document info (kept when stripping):");
        for (key, value) in &info.entries {
            println!("   {key}: {value}");
        }
    }

    match analyzer.xmp_metadata()? {
        XmpMetadata::Absent => println!("\nℹ️  No XMP packet"),
        XmpMetadata::Malformed(reason) => println!("\n⚠️  XMP packet is not well-formed: {reason}"),
        XmpMetadata::Parsed(map) if map.is_empty() => println!("\nℹ️  XMP packet carries no values"),
        XmpMetadata::Parsed(map) => {
            println!("\n🏷️  XMP (removed when stripping):");
            for (key, value) in &map {
                println!("   {key}: {value}");
            }
        }
    }

    Ok(())
}

fn strip(input: &Path, output: &Path) -> Result<()> {
    let report = remover::strip_xmp(input, output)
        .with_context(|| format!("cannot strip {}", input.display()))?;

    if report.xmp_dropped {
        println!("✅ XMP packet removed");
    } else {
        println!("ℹ️  No XMP packet found, document rewritten unchanged");
    }
    println!("   📄 Pages: {}", report.page_count);
    println!("   📋 Document info kept: {}", if report.info_copied { "yes" } else { "none present" });
    println!("   💾 {} ({} bytes)", output.display(), report.bytes_written);

    Ok(())
}
