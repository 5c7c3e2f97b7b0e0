//! Approval gate implementations.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use relay_common::CandidateItem;

use crate::traits::ApprovalGate;

/// Fully automated mode: every candidate passes.
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn decide(&self, _candidate: &CandidateItem, _caption: &str) -> bool {
        true
    }
}

/// Adapter for a synchronous decision function. Used by callers that embed
/// their own review UI.
pub struct FnGate<F>(pub F);

#[async_trait]
impl<F> ApprovalGate for FnGate<F>
where
    F: Fn(&CandidateItem, &str) -> bool + Send + Sync,
{
    async fn decide(&self, candidate: &CandidateItem, caption: &str) -> bool {
        (self.0)(candidate, caption)
    }
}

/// Interactive terminal gate: prints a candidate summary and reads y/n.
/// Anything that is not an explicit yes counts as a rejection.
pub struct StdinGate;

#[async_trait]
impl ApprovalGate for StdinGate {
    async fn decide(&self, candidate: &CandidateItem, caption: &str) -> bool {
        println!(
            "\n--- Candidate {} from r/{} (score {}) ---\n{}\n\n{}\n",
            candidate.id, candidate.channel, candidate.score, candidate.title, caption
        );
        println!("Publish? [y/N] ");

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        if let Err(e) = reader.read_line(&mut line).await {
            warn!(id = candidate.id.as_str(), error = %e, "Failed to read approval input, rejecting");
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use relay_common::MediaKind;

    fn candidate() -> CandidateItem {
        CandidateItem {
            id: "c1".into(),
            title: "title".into(),
            channel: "mma".into(),
            author: "a".into(),
            score: 1,
            url: "https://example.com/x.jpg".into(),
            media_url: "https://example.com/x.jpg".into(),
            media_kind: MediaKind::Image,
            created_at: Utc::now(),
            permalink: "https://reddit.com/x".into(),
        }
    }

    #[tokio::test]
    async fn auto_approve_always_passes() {
        assert!(AutoApprove.decide(&candidate(), "caption").await);
    }

    #[tokio::test]
    async fn fn_gate_delegates_to_closure() {
        let gate = FnGate(|c: &CandidateItem, _: &str| c.score > 10);
        assert!(!gate.decide(&candidate(), "caption").await);
    }
}
