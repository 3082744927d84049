use std::io::{self, BufRead, Write};

use transfer_dispatcher::types::checksummed;
use transfer_dispatcher::{AssetMetadata, Endpoint, Preview, Prompter};

pub const CONFIRMATION_WORD: &str = "YES";

/// Prompts on stdout and reads answers from stdin.
pub struct StdinPrompter {
    assume_yes: bool,
}

impl StdinPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn read_answer(&self, question: &str) -> String {
        print!("{question}");
        if let Err(err) = io::stdout().flush() {
            tracing::debug!(%err, "Failed to flush stdout");
        }
        let mut answer = String::new();
        if let Err(err) = io::stdin().lock().read_line(&mut answer) {
            tracing::debug!(%err, "Failed to read answer");
            answer.clear();
        }
        answer.trim().to_string()
    }
}

impl Prompter for StdinPrompter {
    fn show_selection(&mut self, endpoint: &Endpoint, metadata: &AssetMetadata) {
        println!("{}", render_selection(endpoint, metadata));
    }

    fn show_preview(&mut self, preview: &Preview) {
        println!("{}", render_preview(preview));
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            tracing::info!("Confirmation skipped (--yes)");
            return true;
        }
        is_confirmation(&self.read_answer(&format!("{prompt}: ")))
    }

    fn ask(&mut self, prompt: &str, default: &str) -> String {
        if self.assume_yes {
            return default.to_string();
        }
        or_default(self.read_answer(&format!("{prompt} (default {default}): ")), default)
    }
}

/// `YES` in any letter case confirms; anything else cancels.
pub fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(CONFIRMATION_WORD)
}

fn or_default(answer: String, default: &str) -> String {
    if answer.is_empty() {
        default.to_string()
    } else {
        answer
    }
}

pub fn render_selection(endpoint: &Endpoint, metadata: &AssetMetadata) -> String {
    format!(
        "✔ Using RPC: {} (chain {})\nAsset: {} ({} decimals)\n",
        endpoint.url, endpoint.chain_id, metadata.symbol, metadata.decimals
    )
}

pub fn render_preview(preview: &Preview) -> String {
    let mut out = String::from("Preview mapping (first rows):\n");
    for row in &preview.rows {
        out.push_str(&format!(
            "{}. {}  ->  {}\n",
            row.position,
            checksummed(&row.signer),
            row.recipient
        ));
    }
    if preview.remaining > 0 {
        out.push_str(&format!("... (+{} more)\n", preview.remaining));
    }
    out
}
