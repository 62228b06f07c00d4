// src/main.rs
// =============================================================================
// This is the entry point of the no-dead-urls CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Read every Markdown file and pull out its URL references
// 3. Lint all files concurrently against one shared link cache
// 4. Print the findings and exit with the proper code
//    (0 = no dead URLs, 1 = dead URLs found, 2 = error)
// =============================================================================

mod cli;
mod logging;
mod output;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use tracing::{error, info};

use cli::Cli;
use no_dead_urls::engine::JsonFileStore;
use no_dead_urls::{Document, DocumentMeta, HttpChecker, HttpProbe, LinkCache, Linter};
use output::FileReport;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no dead URLs
//   Ok(1) = dead URLs found
//   Ok(2) = some URLs could not be checked at all
//   Err   = unexpected error (bad file, bad pattern, ...)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    let options = cli.lint_options();
    // Fail fast on bad patterns before touching the network
    options.skip_policy()?;

    // Pathnames for --origin are relative to here
    let cwd = std::env::current_dir().ok();
    let documents = cli
        .files
        .iter()
        .map(|path| load_document(path, cli.origin.as_deref(), cwd.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let store = cli
        .cache_file
        .as_ref()
        .map(|path| JsonFileStore::open(path).map(Arc::new))
        .transpose()?;

    let cache = match &store {
        Some(store) => Arc::new(LinkCache::with_store(store.clone())),
        None => LinkCache::global(),
    };

    let checker = Arc::new(HttpChecker::new()?);
    let probe = Arc::new(HttpProbe::new()?);
    let linter = Linter::new(checker, probe).with_cache(cache);

    let results =
        join_all(documents.iter().map(|document| linter.lint(document, &options))).await;

    let mut reports = Vec::with_capacity(documents.len());
    for (document, result) in documents.iter().zip(results) {
        let report = result.with_context(|| format!("could not lint {}", document.name))?;
        reports.push(FileReport::new(document.name.as_str(), report));
    }

    if let Some(store) = &store {
        store.save()?;
        info!(path = %store.path().display(), "outcome cache saved");
    }

    output::print_results(&reports, cli.json)?;

    let dead = reports.iter().any(|report| report.findings.iter().any(|f| f.is_fatal()));
    let failed = reports.iter().any(|report| !report.failures.is_empty());

    Ok(if dead {
        1
    } else if failed {
        2
    } else {
        0
    })
}

fn load_document(path: &Path, origin: Option<&str>, cwd: Option<&Path>) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let mut document = Document::from_markdown(path.display().to_string(), &text);

    if let Some(origin) = origin {
        document = document.with_meta(DocumentMeta {
            origin: origin.to_string(),
            pathname: pathname_for(path, cwd),
        });
    }

    Ok(document)
}

// docs/guide.md -> /docs/guide.md, and <cwd>/docs/guide.md -> /docs/guide.md
fn pathname_for(path: &Path, cwd: Option<&Path>) -> String {
    let relative = cwd
        .and_then(|cwd| path.strip_prefix(cwd).ok())
        .unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("/{}", parts.join("/"))
}
