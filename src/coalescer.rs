//! Load coalescing.
//!
//! Update requests can arrive much faster than the index can be rebuilt. The
//! coalescer keeps at most one request waiting, runs the pipeline at most once
//! per settle signal, and resolves every superseded request as abandoned.
//!
//! ```text
//! Idle        --submit--> Coalescing   (run)
//! Coalescing  --settle--> Idle
//! Coalescing  --submit--> NeedsReload  (queue)
//! NeedsReload --settle--> Coalescing   (run latest queued)
//! NeedsReload --submit--> NeedsReload  (replace queued, abandon previous)
//! ```
//!
//! The coalescer never runs the pipeline itself. Transitions that must start a
//! run hand the pending load back to the caller, which executes it and answers
//! through the load's [`Responder`].

use crate::error::Result;
use crate::protocol::LoadDataResult;
use futures::channel::oneshot;

/// Receiving half of a load response.
pub type LoadReceiver = oneshot::Receiver<Result<LoadDataResult>>;

/// Coalescer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoalescerState {
    /// Nothing running and nothing queued.
    #[default]
    Idle,
    /// A run was started and its result has not been settled yet.
    Coalescing,
    /// Like `Coalescing`, with a newer request queued behind it.
    NeedsReload,
}

/// Answers a single load exactly once.
///
/// A responder dropped without an answer resolves its receiver as abandoned,
/// so a load can never be left waiting forever.
#[derive(Debug)]
pub struct Responder {
    tx: Option<oneshot::Sender<Result<LoadDataResult>>>,
}

impl Responder {
    /// Creates a responder together with the receiver it will answer.
    pub fn channel() -> (Self, LoadReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Delivers the outcome. Returns `false` when the receiver is gone.
    pub fn respond(mut self, outcome: Result<LoadDataResult>) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Resolves the load as superseded.
    pub fn abandon(self) -> bool {
        self.respond(Ok(LoadDataResult::abandoned()))
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ok(LoadDataResult::abandoned()));
        }
    }
}

/// A request together with the responder waiting on it.
#[derive(Debug)]
pub struct PendingLoad<R> {
    pub request: R,
    pub responder: Responder,
}

impl<R> PendingLoad<R> {
    pub fn into_parts(self) -> (R, Responder) {
        (self.request, self.responder)
    }
}

/// Counters for monitoring how much work coalescing saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Requests submitted
    pub submitted: u64,
    /// Pipeline runs handed out
    pub runs: u64,
    /// Requests resolved as abandoned
    pub abandoned: u64,
}

/// Serializes update requests so that at most one rebuild is in flight.
#[derive(Debug)]
pub struct LoadCoalescer<R> {
    state: CoalescerState,
    pending: Option<PendingLoad<R>>,
    stats: CoalescerStats,
}

impl<R> LoadCoalescer<R> {
    pub fn new() -> Self {
        Self {
            state: CoalescerState::Idle,
            pending: None,
            stats: CoalescerStats::default(),
        }
    }

    pub fn state(&self) -> CoalescerState {
        self.state
    }

    /// True while a request is queued behind the current run.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.stats
    }

    /// Submits a request.
    ///
    /// Any request still queued is abandoned first. Returns the load to run
    /// now when the coalescer was idle, `None` when the request was queued.
    pub fn submit(&mut self, request: R, responder: Responder) -> Option<PendingLoad<R>> {
        self.stats.submitted += 1;

        if let Some(previous) = self.pending.take() {
            self.stats.abandoned += 1;
            log::debug!("Abandoning queued load superseded by a newer request");
            previous.responder.abandon();
        }
        self.pending = Some(PendingLoad { request, responder });

        match self.state {
            CoalescerState::Idle => {
                self.transition(CoalescerState::Coalescing);
                self.start_run()
            }
            CoalescerState::Coalescing | CoalescerState::NeedsReload => {
                self.transition(CoalescerState::NeedsReload);
                None
            }
        }
    }

    /// Signals that the last delivered result has been consumed.
    ///
    /// Returns the queued load to run now, if one was waiting.
    pub fn settle(&mut self) -> Option<PendingLoad<R>> {
        match self.state {
            CoalescerState::Idle => {
                log::debug!("Ignoring settle while idle");
                None
            }
            CoalescerState::Coalescing => {
                self.transition(CoalescerState::Idle);
                None
            }
            CoalescerState::NeedsReload => {
                if self.pending.is_some() {
                    self.transition(CoalescerState::Coalescing);
                    self.start_run()
                } else {
                    self.transition(CoalescerState::Idle);
                    None
                }
            }
        }
    }

    /// Abandons any queued load.
    ///
    /// A queued load is the only thing that moves the coalescer into
    /// `NeedsReload`, so without it the state falls back to `Coalescing`.
    pub fn shutdown(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.stats.abandoned += 1;
            log::debug!("Abandoning queued load on shutdown");
            pending.responder.abandon();
        }
        if self.state == CoalescerState::NeedsReload {
            self.transition(CoalescerState::Coalescing);
        }
    }

    fn start_run(&mut self) -> Option<PendingLoad<R>> {
        let pending = self.pending.take();
        if pending.is_some() {
            self.stats.runs += 1;
        }
        pending
    }

    fn transition(&mut self, next: CoalescerState) {
        if self.state != next {
            log::debug!("Coalescer {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}

impl<R> Default for LoadCoalescer<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(
        coalescer: &mut LoadCoalescer<&'static str>,
        request: &'static str,
    ) -> (Option<PendingLoad<&'static str>>, LoadReceiver) {
        let (responder, rx) = Responder::channel();
        (coalescer.submit(request, responder), rx)
    }

    fn finish(pending: PendingLoad<&'static str>) {
        pending.responder.respond(Ok(LoadDataResult::loaded(None)));
    }

    fn resolved(rx: &mut LoadReceiver) -> Option<LoadDataResult> {
        rx.try_recv()
            .expect("sender dropped without answer")
            .map(|outcome| outcome.expect("load failed"))
    }

    #[test]
    fn test_idle_submit_runs_immediately() {
        let mut coalescer = LoadCoalescer::new();
        let (run, _rx) = submit(&mut coalescer, "a");

        assert_eq!(run.map(|p| p.request), Some("a"));
        assert_eq!(coalescer.state(), CoalescerState::Coalescing);
        assert!(!coalescer.has_pending());
    }

    #[test]
    fn test_transition_table() {
        let mut coalescer = LoadCoalescer::new();

        let (run, _a) = submit(&mut coalescer, "a");
        finish(run.unwrap());
        assert_eq!(coalescer.state(), CoalescerState::Coalescing);

        let (run, _b) = submit(&mut coalescer, "b");
        assert!(run.is_none());
        assert_eq!(coalescer.state(), CoalescerState::NeedsReload);

        let (run, _c) = submit(&mut coalescer, "c");
        assert!(run.is_none());
        assert_eq!(coalescer.state(), CoalescerState::NeedsReload);

        let run = coalescer.settle().expect("queued load should run");
        assert_eq!(run.request, "c");
        assert_eq!(coalescer.state(), CoalescerState::Coalescing);
        finish(run);

        assert!(coalescer.settle().is_none());
        assert_eq!(coalescer.state(), CoalescerState::Idle);
    }

    #[test]
    fn test_settle_while_idle_is_ignored() {
        let mut coalescer: LoadCoalescer<&str> = LoadCoalescer::new();
        assert!(coalescer.settle().is_none());
        assert_eq!(coalescer.state(), CoalescerState::Idle);
    }

    #[test]
    fn test_burst_runs_once_per_settle() {
        let mut coalescer = LoadCoalescer::new();
        let mut receivers = Vec::new();
        let mut runs = Vec::new();

        for request in ["r0", "r1", "r2", "r3", "r4"] {
            let (run, rx) = submit(&mut coalescer, request);
            runs.extend(run);
            receivers.push(rx);
        }
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].request, "r0");
        finish(runs.pop().unwrap());

        let second = coalescer.settle().expect("latest request should run");
        assert_eq!(second.request, "r4");
        finish(second);
        assert!(coalescer.settle().is_none());

        let outcomes: Vec<_> = receivers.iter_mut().map(|rx| resolved(rx).unwrap()).collect();
        assert!(!outcomes[0].abandoned);
        assert!(outcomes[1..4].iter().all(|r| r.abandoned));
        assert!(!outcomes[4].abandoned);
        assert_eq!(
            coalescer.stats(),
            CoalescerStats {
                submitted: 5,
                runs: 2,
                abandoned: 3
            }
        );
    }

    #[test]
    fn test_superseded_queued_request_is_abandoned_once() {
        let mut coalescer = LoadCoalescer::new();
        let (run, _busy) = submit(&mut coalescer, "busy");
        finish(run.unwrap());

        let (_, mut a) = submit(&mut coalescer, "a");
        assert!(resolved(&mut a).is_none());

        let (_, mut b) = submit(&mut coalescer, "b");
        assert!(resolved(&mut a).unwrap().abandoned);
        assert!(resolved(&mut b).is_none());

        let run = coalescer.settle().unwrap();
        assert_eq!(run.request, "b");
    }

    #[test]
    fn test_shutdown_abandons_queued_load() {
        let mut coalescer = LoadCoalescer::new();
        let (run, _first) = submit(&mut coalescer, "first");
        finish(run.unwrap());
        let (_, mut queued) = submit(&mut coalescer, "queued");

        coalescer.shutdown();

        assert!(resolved(&mut queued).unwrap().abandoned);
        assert_eq!(coalescer.state(), CoalescerState::Coalescing);
        assert!(coalescer.settle().is_none());
        assert_eq!(coalescer.state(), CoalescerState::Idle);
    }

    #[test]
    fn test_dropped_responder_resolves_as_abandoned() {
        let (responder, mut rx) = Responder::channel();
        drop(responder);
        assert!(resolved(&mut rx).unwrap().abandoned);
    }

    #[test]
    fn test_responder_answers_exactly_once() {
        let (responder, mut rx) = Responder::channel();
        assert!(responder.respond(Ok(LoadDataResult::loaded(None))));

        assert!(!resolved(&mut rx).unwrap().abandoned);
        // The channel is spent: nothing else can arrive.
        assert!(rx.try_recv().is_err());
    }
}
