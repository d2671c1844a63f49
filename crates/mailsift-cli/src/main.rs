//! `mailsift` - decode an email message and print it as JSON.
//!
//! Usage: `mailsift [PATH]` (reads stdin when no path is given).

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod summary;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summary::Summary;

fn main() -> Result<()> {
    // Initialize logging on stderr, stdout carries the JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut args = std::env::args_os().skip(1);
    let path = args.next().map(PathBuf::from);
    if args.next().is_some() {
        bail!("usage: mailsift [PATH]");
    }

    let reader: Box<dyn Read> = match &path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let source = path
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    debug!(%source, "decoding");

    let email = mailsift::parse_reader(reader).with_context(|| format!("decoding {source}"))?;
    info!(
        attachments = email.attachments.len(),
        embedded_files = email.embedded_files.len(),
        "decoded {source}"
    );

    let json = serde_json::to_string_pretty(&Summary::from(&email))?;
    println!("{json}");

    Ok(())
}
