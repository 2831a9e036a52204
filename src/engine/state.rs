use serde::{Deserialize, Serialize};

/// What the cycle did with one slot visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Sent { reply: String },
    SkippedSelfAuthored,
    SkippedEmpty,
    /// Same counterpart message already answered on this slot.
    SkippedAlreadyReplied,
    SkippedDryRun { reply: String },
    CaptureFailed { error: String },
    GenerationFailed { error: String },
    DeliveryFailed { reply: String, error: String },
}

impl ReplyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ReplyOutcome::CaptureFailed { .. }
                | ReplyOutcome::GenerationFailed { .. }
                | ReplyOutcome::DeliveryFailed { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReplyOutcome::Sent { .. } => "sent",
            ReplyOutcome::SkippedSelfAuthored => "skipped_self_authored",
            ReplyOutcome::SkippedEmpty => "skipped_empty",
            ReplyOutcome::SkippedAlreadyReplied => "skipped_already_replied",
            ReplyOutcome::SkippedDryRun { .. } => "skipped_dry_run",
            ReplyOutcome::CaptureFailed { .. } => "capture_failed",
            ReplyOutcome::GenerationFailed { .. } => "generation_failed",
            ReplyOutcome::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}

/// Totals reported when the cycle stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub cycles: u64,
    pub sent: u64,
    pub skipped: u64,
    pub failures: u64,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn count(&mut self, outcome: &ReplyOutcome) {
        self.steps += 1;
        match outcome {
            ReplyOutcome::Sent { .. } => self.sent += 1,
            o if o.is_failure() => self.failures += 1,
            _ => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(ReplyOutcome::Sent { reply: "Hi".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "sent", "reply": "Hi" }));
        let json = serde_json::to_value(ReplyOutcome::SkippedEmpty).unwrap();
        assert_eq!(json["outcome"], "skipped_empty");
    }

    #[test]
    fn summary_buckets() {
        let mut summary = RunSummary::default();
        summary.count(&ReplyOutcome::Sent { reply: "a".into() });
        summary.count(&ReplyOutcome::SkippedDryRun { reply: "b".into() });
        summary.count(&ReplyOutcome::CaptureFailed { error: "c".into() });
        assert_eq!((summary.steps, summary.sent, summary.skipped, summary.failures), (3, 1, 1, 1));
    }
}
