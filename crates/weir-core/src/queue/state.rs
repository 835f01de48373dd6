//! Scheduler state: backlog, counters, threshold flags, result sink.

use std::collections::VecDeque;

use crate::domain::events::QueueEvent;
use crate::domain::task::TaskReport;

use super::builder::QueueOptions;
use super::record::TaskRecord;

/// Mutable scheduler state, one per queue, guarded by a single mutex.
///
/// Design:
/// - Single source of truth for backlog order and the running count. Only
///   the dispatch loop pops the backlog; only the completion shim decrements
///   `running`. Invariant: `running <= concurrency` at all times.
/// - Threshold crossings are recorded here so each backpressure signal fires
///   once per crossing and re-fires after the backlog crosses back.
/// - Events raised while the lock is held are accumulated by the caller and
///   delivered to the sink after release.
pub(crate) struct QueueState {
    pub(crate) backlog: VecDeque<TaskRecord>,
    pub(crate) running: usize,
    pub(crate) paused: bool,
    pub(crate) flooded: bool,
    drain_signalled: bool,
    pub(crate) results: Vec<TaskReport>,
}

impl QueueState {
    pub(crate) fn new(paused: bool) -> Self {
        Self {
            backlog: VecDeque::new(),
            running: 0,
            paused,
            flooded: false,
            drain_signalled: false,
            results: Vec::new(),
        }
    }

    /// Append a submission to the backlog in arrival order.
    ///
    /// Returns `true` when the post-submission backlog is still below the
    /// flood threshold. Raises `Flooded` on the rising edge only; while the
    /// flag is set, further flooded submissions return `false` silently.
    pub(crate) fn admit(
        &mut self,
        records: impl IntoIterator<Item = TaskRecord>,
        opts: &QueueOptions,
        events: &mut Vec<QueueEvent>,
    ) -> bool {
        for record in records {
            self.backlog.push_back(record);
        }

        let len = self.backlog.len();
        if len >= opts.drain {
            // Back above the drain threshold: arm the falling edge again.
            self.drain_signalled = false;
        }
        if len >= opts.flood {
            if !self.flooded {
                self.flooded = true;
                events.push(QueueEvent::Flooded);
            }
            false
        } else {
            true
        }
    }

    /// Record the falling edge after a pop: the first time the backlog falls
    /// below the drain threshold, clear the flood flag and raise `Drained`.
    pub(crate) fn note_drain(&mut self, opts: &QueueOptions, events: &mut Vec<QueueEvent>) {
        if self.backlog.len() < opts.drain {
            self.flooded = false;
            if !self.drain_signalled {
                self.drain_signalled = true;
                events.push(QueueEvent::Drained);
            }
        }
    }

    /// Hand out the result sink for a `Flushed` emission: drained when the
    /// post-flush clearing policy is on, copied otherwise.
    pub(crate) fn take_results(&mut self, cleanup: bool) -> Vec<TaskReport> {
        if cleanup {
            std::mem::take(&mut self.results)
        } else {
            self.results.clone()
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.backlog.is_empty() && self.running == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::IdentityWorker;
    use std::sync::Arc;

    fn records(n: usize) -> Vec<TaskRecord> {
        (0..n)
            .map(|i| {
                TaskRecord::new(
                    Arc::new(serde_json::json!(i)),
                    None,
                    Arc::new(IdentityWorker),
                )
            })
            .collect()
    }

    fn opts(flood: usize, drain: usize) -> QueueOptions {
        QueueOptions {
            flood,
            drain,
            ..QueueOptions::default()
        }
    }

    #[test]
    fn admit_reports_flood_on_rising_edge_only() {
        let mut state = QueueState::new(false);
        let opts = opts(4, 2);
        let mut events = Vec::new();

        assert!(state.admit(records(3), &opts, &mut events));
        assert!(events.is_empty());
        assert!(!state.flooded);

        assert!(!state.admit(records(1), &opts, &mut events));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], QueueEvent::Flooded));
        assert!(state.flooded);

        // Still flooded: no re-emission, still refused admission.
        assert!(!state.admit(records(1), &opts, &mut events));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn drain_fires_once_at_first_crossing() {
        let mut state = QueueState::new(false);
        let opts = opts(256, 5);
        let mut events = Vec::new();

        state.admit(records(8), &opts, &mut events);
        assert!(events.is_empty());

        // Pop down to 4: first length below the threshold of 5.
        while state.backlog.len() > 4 {
            state.backlog.pop_front();
            state.note_drain(&opts, &mut events);
        }
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], QueueEvent::Drained));

        // Further pops stay silent.
        while state.backlog.pop_front().is_some() {
            state.note_drain(&opts, &mut events);
        }
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn drain_refires_after_recrossing() {
        let mut state = QueueState::new(false);
        let opts = opts(256, 3);
        let mut events = Vec::new();

        state.admit(records(4), &opts, &mut events);
        while state.backlog.pop_front().is_some() {
            state.note_drain(&opts, &mut events);
        }
        assert_eq!(events.len(), 1);

        // Refill above the threshold, then drain again: second signal.
        state.admit(records(4), &opts, &mut events);
        while state.backlog.pop_front().is_some() {
            state.note_drain(&opts, &mut events);
        }
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn drain_crossing_clears_flood_flag() {
        let mut state = QueueState::new(false);
        let opts = opts(4, 2);
        let mut events = Vec::new();

        state.admit(records(4), &opts, &mut events);
        assert!(state.flooded);

        while state.backlog.len() > 1 {
            state.backlog.pop_front();
            state.note_drain(&opts, &mut events);
        }
        assert!(!state.flooded);

        // Flood fires again on the next rising edge.
        state.admit(records(3), &opts, &mut events);
        let floods = events
            .iter()
            .filter(|e| matches!(e, QueueEvent::Flooded))
            .count();
        assert_eq!(floods, 2);
    }

    #[test]
    fn take_results_honors_cleanup_policy() {
        let mut state = QueueState::new(false);
        state.results.push(
            TaskRecord::new(
                Arc::new(serde_json::json!(1)),
                None,
                Arc::new(IdentityWorker),
            )
            .into_report(Ok(serde_json::json!(1))),
        );

        let copied = state.take_results(false);
        assert_eq!(copied.len(), 1);
        assert_eq!(state.results.len(), 1);

        let drained = state.take_results(true);
        assert_eq!(drained.len(), 1);
        assert!(state.results.is_empty());
    }
}
