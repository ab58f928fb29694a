//! Fetches metadata for a URL and prints the rendered card.
//!
//! ```text
//! cargo run --example card_demo --features logging -- https://www.rust-lang.org
//! ```

use clap::Parser;
use link_preview_card::{registry, render, Fetcher, FetcherConfig, LoadStatus, MetadataCard};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Render a link preview card for a URL")]
struct Args {
    /// Page to preview
    url: String,

    /// Metadata service endpoint
    #[arg(long, default_value = link_preview_card::DEFAULT_METADATA_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Include the style sheet in the output
    #[arg(long)]
    styles: bool,

    /// Render the fancy variant
    #[arg(long)]
    fancy: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    #[cfg(feature = "logging")]
    link_preview_card::setup_logging(link_preview_card::LogConfig {
        file_output: false,
        ..Default::default()
    })?;

    let endpoint = args.endpoint.clone();
    let timeout = Duration::from_secs(args.timeout);
    registry::define(MetadataCard::TAG, move || {
        MetadataCard::with_fetcher(Fetcher::new_with_config(FetcherConfig {
            endpoint: endpoint.clone(),
            timeout,
            ..FetcherConfig::default()
        }))
    })?;

    let card = registry::create(MetadataCard::TAG).ok_or("link-preview is not defined")?;
    card.set_fancy(args.fancy);
    card.set_url(args.url.as_str());
    let state = card.settled().await;

    #[cfg(feature = "logging")]
    link_preview_card::log_preview_card(&state);

    if state.status == LoadStatus::Failed {
        eprintln!("Failed to load metadata for {}", state.url);
    }

    if args.styles {
        println!("{}", render::render_document(&state));
    } else {
        println!("{}", render::render(&state));
    }
    Ok(())
}
