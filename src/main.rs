//! RelayBot CLI - conversation context manager for multi-platform chatbots
//!
//! All CLI logic lives in the `cli` module. This file is just the entry point.

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    cli::run().await
}
