use transfer_dispatcher::amount;
use transfer_dispatcher::types::checksummed;
use transfer_dispatcher::{DispatchEvent, OutcomeStatus, RunSummary};

/// Renders dispatch progress on stdout.
#[derive(Debug, Default)]
pub struct Console {
    symbol: String,
    decimals: u8,
}

impl Console {
    pub fn on_event(&mut self, event: DispatchEvent<'_>) {
        if let Some(line) = self.render(event) {
            println!("{line}");
        }
    }

    pub fn render(&mut self, event: DispatchEvent<'_>) -> Option<String> {
        match event {
            DispatchEvent::Started(plan) => {
                self.symbol = plan.metadata.symbol.clone();
                self.decimals = plan.metadata.decimals;
                Some(format!(
                    "Sending {} {} x{} per recipient",
                    amount::format(plan.amount, self.decimals),
                    self.symbol,
                    plan.transactions_per_recipient
                ))
            }
            DispatchEvent::Recipient {
                position,
                total,
                signer,
                recipient,
                balance,
            } => {
                let mut line = format!(
                    "\n[{position}/{total}] {} -> {recipient}",
                    checksummed(&signer)
                );
                if let Some(check) = balance {
                    line.push_str(&format!(
                        "\n  balance: {} {}",
                        amount::format(check.balance, self.decimals),
                        self.symbol
                    ));
                    if !check.is_sufficient() {
                        line.push_str(&format!(
                            " (needs {}, sending anyway)",
                            amount::format(check.required, self.decimals)
                        ));
                    }
                }
                Some(line)
            }
            DispatchEvent::Outcome(outcome) => Some(match &outcome.status {
                OutcomeStatus::Submitted { tx_hash, .. } => {
                    format!("  TX #{}: {tx_hash:?}", outcome.attempt)
                }
                OutcomeStatus::Failed(err) => format!("  TX #{} failed: {err}", outcome.attempt),
            }),
        }
    }
}

pub fn render_summary(summary: &RunSummary) -> String {
    format!(
        "\nDone via {}: {} submitted, {} failed",
        summary.endpoint.url,
        summary.report.submitted(),
        summary.report.failed()
    )
}
