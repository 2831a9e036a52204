use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::classifier::{MessageVerdict, SenderClassifier};
use crate::config::{ChatSlot, RunConfig, RunLimits};
use crate::engine::loop_control::LoopController;
use crate::engine::run_log::RunLog;
use crate::engine::state::{ReplyOutcome, RunSummary};
use crate::executor::delivery::DeliveryAdapter;
use crate::llm::generator::ReplyGenerator;
use crate::perception::traits::CaptureAdapter;

/// Result of one scan-decide-act step. `None` from [`ChatCycleController::step`]
/// means the step was abandoned because of cancellation.
pub type StepResult = (Option<MessageVerdict>, ReplyOutcome);

/// Visits every chat slot in turn, forever or until cancelled, and answers
/// counterpart messages. Slots are handled strictly one at a time.
pub struct ChatCycleController {
    config: RunConfig,
    classifier: SenderClassifier,
    capture: Arc<dyn CaptureAdapter>,
    delivery: Arc<dyn DeliveryAdapter>,
    generator: Arc<dyn ReplyGenerator>,
    run_log: RunLog,
    loop_ctrl: LoopController,
    /// Last counterpart message answered per slot, cleared once our own
    /// message shows up again.
    last_replied: HashMap<usize, String>,
    summary: RunSummary,
}

impl ChatCycleController {
    pub fn new(
        config: RunConfig,
        capture: Arc<dyn CaptureAdapter>,
        delivery: Arc<dyn DeliveryAdapter>,
        generator: Arc<dyn ReplyGenerator>,
        run_log: RunLog,
        limits: RunLimits,
    ) -> Self {
        let classifier = SenderClassifier::from_run_config(&config);
        let loop_ctrl = LoopController::new(config.slots.len(), limits);
        Self {
            config,
            classifier,
            capture,
            delivery,
            generator,
            run_log,
            loop_ctrl,
            last_replied: HashMap::new(),
            summary: RunSummary::default(),
        }
    }

    pub async fn run(&mut self, cancel: &CancellationToken) -> RunSummary {
        tracing::info!(
            run_id = %self.run_log.run_id(),
            slots = self.config.slots.len(),
            dry_run = self.config.dry_run,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "starting chat cycle"
        );
        if self.config.slots.is_empty() {
            tracing::error!("no chat slots configured; nothing to do");
            return self.summary.clone();
        }

        if cancel.is_cancelled() {
            self.summary.cancelled = true;
            return self.finish();
        }
        self.open_chat_list().await;

        loop {
            if cancel.is_cancelled() {
                self.summary.cancelled = true;
                break;
            }

            let index = self.loop_ctrl.advance();
            let cycle = self.loop_ctrl.current_cycle();
            let slot = self.config.slots[index];

            let Some((verdict, outcome)) = self.step(&slot, cancel).await else {
                tracing::info!(cycle, slot = index, "cancelled mid-step, nothing delivered");
                self.summary.cancelled = true;
                break;
            };
            self.run_log
                .record(cycle, index, verdict.as_ref(), &outcome, chrono::Utc::now());
            self.summary.count(&outcome);

            if self.loop_ctrl.should_stop() {
                tracing::info!("loop limit reached");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.summary.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.finish()
    }

    fn finish(&mut self) -> RunSummary {
        self.summary.cycles = self.loop_ctrl.completed_cycles();
        tracing::info!(
            run_id = %self.run_log.run_id(),
            steps = self.summary.steps,
            sent = self.summary.sent,
            failures = self.summary.failures,
            cancelled = self.summary.cancelled,
            "chat cycle ended"
        );
        self.summary.clone()
    }

    async fn open_chat_list(&self) {
        let Some(at) = self.config.chat_icon else {
            return;
        };
        if self.config.dry_run {
            tracing::info!(x = at.x, y = at.y, "dry-run: would open chat list");
            return;
        }
        if let Err(e) = self.delivery.open_chat_list(at).await {
            tracing::warn!(error = %e, "opening the chat list failed; continuing");
        }
    }

    /// One scan-decide-act pass over `slot`.
    pub async fn step(&mut self, slot: &ChatSlot, cancel: &CancellationToken) -> Option<StepResult> {
        // ── Select ────────────────────────────────────────────────────────
        if self.config.dry_run {
            tracing::debug!(slot = slot.index, at = %slot.list_entry, "dry-run: would focus chat");
        } else if let Err(e) = self.delivery.focus_slot(slot.list_entry).await {
            return Some((
                None,
                ReplyOutcome::CaptureFailed {
                    error: format!("focusing chat failed: {e}"),
                },
            ));
        }

        // ── Capture + classify ────────────────────────────────────────────
        let raw = match self.capture.capture(slot.index, &slot.region).await {
            Ok(raw) => raw,
            Err(e) => {
                return Some((None, ReplyOutcome::CaptureFailed { error: e.to_string() }));
            }
        };
        tracing::debug!(slot = slot.index, len = raw.len(), "chat captured");
        let verdict = self.classifier.classify(&raw);

        let content = match &verdict {
            MessageVerdict::CounterpartAuthored(content) => Some(content.clone()),
            _ => None,
        };
        let Some(content) = content else {
            let outcome = if verdict == MessageVerdict::SelfAuthored {
                self.last_replied.remove(&slot.index);
                ReplyOutcome::SkippedSelfAuthored
            } else {
                ReplyOutcome::SkippedEmpty
            };
            return Some((Some(verdict), outcome));
        };

        if self.guards_repeats() && self.last_replied.get(&slot.index) == Some(&content) {
            return Some((Some(verdict), ReplyOutcome::SkippedAlreadyReplied));
        }

        // ── Generate ──────────────────────────────────────────────────────
        let reply = match self.generator.generate(&content, &self.config.persona).await {
            Ok(reply) => reply,
            Err(e) => {
                return Some((Some(verdict), ReplyOutcome::GenerationFailed { error: e.to_string() }));
            }
        };

        if self.config.dry_run {
            return Some((Some(verdict), ReplyOutcome::SkippedDryRun { reply }));
        }

        // ── Deliver ───────────────────────────────────────────────────────
        // Last point where cancellation is honoured; a started delivery always
        // runs to completion.
        if cancel.is_cancelled() {
            return None;
        }
        let outcome = match self.delivery.deliver(slot.input_box, &reply).await {
            Ok(()) => {
                if self.config.reply_once_per_message {
                    self.last_replied.insert(slot.index, content);
                }
                ReplyOutcome::Sent { reply }
            }
            Err(e) => ReplyOutcome::DeliveryFailed {
                reply,
                error: e.to_string(),
            },
        };
        Some((Some(verdict), outcome))
    }

    fn guards_repeats(&self) -> bool {
        self.config.reply_once_per_message && !self.config.dry_run
    }
}
