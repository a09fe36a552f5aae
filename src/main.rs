//! arizona-status-bot

#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(
    doc,
    warn(
        rustdoc::bare_urls,
        rustdoc::broken_intra_doc_links,
        rustdoc::invalid_codeblock_attributes,
        rustdoc::invalid_rust_codeblocks,
        rustdoc::missing_crate_level_docs
    )
)]

use std::process::ExitCode;

use arizona_status_bot::run_bot;

/// Run arizona-status-bot.
#[tokio::main]
async fn main() -> ExitCode {
    match run_bot().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("arizona-status-bot: {error}");
            ExitCode::FAILURE
        }
    }
}
