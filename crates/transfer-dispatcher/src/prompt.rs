use crate::endpoint::Endpoint;
use crate::signer::Preview;
use crate::types::AssetMetadata;

/// Operator interaction, injected into the batch run. Implementations may block on a terminal;
/// the dispatch loop itself never calls them.
pub trait Prompter {
    /// Reports the endpoint the run settled on and the asset it resolved, before the preview.
    fn show_selection(&mut self, endpoint: &Endpoint, metadata: &AssetMetadata);

    /// Shows the signer → recipient mapping before asking for confirmation.
    fn show_preview(&mut self, preview: &Preview);

    /// Whether the operator agreed to `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// The operator's answer to `prompt`, or `default` when the answer is empty.
    fn ask(&mut self, prompt: &str, default: &str) -> String;
}

/// Agrees to everything and answers every question with its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn show_selection(&mut self, _endpoint: &Endpoint, _metadata: &AssetMetadata) {}

    fn show_preview(&mut self, _preview: &Preview) {}

    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }

    fn ask(&mut self, _prompt: &str, default: &str) -> String {
        default.to_string()
    }
}
