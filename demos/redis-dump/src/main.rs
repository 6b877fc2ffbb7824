//! Dumps the configuration a Redis keyspace would provide.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rconf_redis::{ClassifiedEntry, CollectingSink, FileMaterializer, RedisProvider};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Print the configuration entries stored in Redis")]
struct Args {
    /// Redis host.
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Redis port.
    #[arg(long, default_value_t = 6379)]
    port: i64,
    /// Database index.
    #[arg(long, default_value_t = 0)]
    db: i64,
    /// Password sent with AUTH.
    #[arg(long)]
    password: Option<String>,
    /// Only keys starting with this prefix are read.
    #[arg(long, default_value = "")]
    prefix: String,
    /// Separator between key segments.
    #[arg(long, default_value = ".")]
    separator: String,
    /// Write file entries under this directory.
    #[arg(long)]
    write_files: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    let root = json!({
        "redis": {
            "host": args.host,
            "port": args.port,
            "db": args.db,
            "password": args.password,
            "prefix": args.prefix,
            "separator": args.separator,
        }
    });

    let provider = RedisProvider::new();
    let (report, collected) = match args.write_files {
        Some(dir) => {
            let mut sink = FileMaterializer::new(dir, CollectingSink::new());
            let report = provider.load_data(&root, &mut sink).await?;
            info!(
                written = sink.written().len(),
                root = %sink.root().display(),
                "files materialized"
            );
            (report, sink.into_inner())
        }
        None => {
            let mut sink = CollectingSink::new();
            let report = provider.load_data(&root, &mut sink).await?;
            (report, sink)
        }
    };

    for entry in collected.entries() {
        match entry {
            ClassifiedEntry::KeyValue { key, value } => println!("{key} = {value}"),
            ClassifiedEntry::File { key, payload } => println!(
                "{key} -> {} ({} bytes)",
                payload.path(),
                payload.content().len()
            ),
        }
    }

    for skipped in &report.skipped {
        warn!(key = %skipped.raw_key, reason = %skipped.reason, "skipped");
    }
    info!(
        key_values = report.key_values,
        files = report.files,
        skipped = report.skipped.len(),
        "done"
    );
    Ok(())
}
