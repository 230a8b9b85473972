//! Remote player channel
//!
//! Everything the engine says to a remote player goes out through one
//! unbounded outbound stream. The transport answers requests from its own
//! threads through [`RemotePlayer::answer`] and [`RemotePlayer::acknowledge`].

use crate::choice::{
    ChoiceCompleter, ChoiceHandle, ChoiceOutcome, PlayerChannel, Scene, Severity, StateUpdate,
    Timer, TimerCallback,
};
use crate::core::PlayerId;
use crate::{EngineError, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Messages flowing from the engine to a remote player
#[derive(Debug, Clone, Serialize)]
pub enum Outbound {
    ChoiceRequest {
        id: u64,
        prompt: String,
        options: Vec<String>,
        optional: bool,
    },
    Message {
        text: String,
        severity: Severity,
    },
    Scene(Scene),
    TimerStarted {
        millis: u64,
    },
    TimerStopped,
    /// Must be acknowledged with the same id
    Update {
        id: u64,
        update: StateUpdate,
    },
}

/// What a pending id was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Choice,
    Update,
}

pub struct RemotePlayer {
    player: PlayerId,
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Mutex<FxHashMap<u64, (PendingKind, ChoiceCompleter)>>,
    next_id: AtomicU64,
    connected: AtomicBool,
    shut_down: AtomicBool,
    timer: Timer,
    choice_timeout: Option<Duration>,
    ack_timeout: Duration,
}

impl RemotePlayer {
    /// A connected player and the receiving end of their outbound stream
    pub fn new(
        player: PlayerId,
        choice_timeout: Option<Duration>,
        ack_timeout: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let remote = RemotePlayer {
            player,
            outbound: tx,
            pending: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(true),
            shut_down: AtomicBool::new(false),
            timer: Timer::new(),
            choice_timeout,
            ack_timeout,
        };
        (Arc::new(remote), rx)
    }

    fn send(&self, message: Outbound) {
        if self.outbound.send(message).is_err() {
            // Receiver gone: the transport dropped this player
            self.disconnect();
        }
    }

    /// Register a pending request and return its id with the handle
    fn register(
        &self,
        kind: PendingKind,
        option_count: usize,
        optional: bool,
        timeout: Option<Duration>,
    ) -> (u64, ChoiceHandle) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (handle, completer) = ChoiceHandle::pending(option_count, optional, timeout);
        let mut pending = self.pending.lock();
        pending.retain(|_, (_, c)| !c.is_complete());
        pending.insert(id, (kind, completer));
        (id, handle)
    }

    /// Answer choice request `id`. Returns Ok(false) if the request was
    /// already decided (answered, cancelled or timed out). An invalid answer
    /// leaves the request open.
    pub fn answer(&self, id: u64, choice: Option<usize>) -> Result<bool> {
        let mut pending = self.pending.lock();
        match pending.get(&id) {
            Some((PendingKind::Choice, completer)) => {
                completer.validate(choice)?;
                let decided = completer.answer(choice);
                pending.remove(&id);
                Ok(decided)
            }
            Some((PendingKind::Update, _)) => Err(EngineError::InvalidChoice(format!(
                "request {} is an update, acknowledge it instead",
                id
            ))),
            None => Ok(false),
        }
    }

    /// Acknowledge update `id`. Ids of choice requests are left pending.
    pub fn acknowledge(&self, id: u64) -> bool {
        let mut pending = self.pending.lock();
        match pending.get(&id) {
            Some((PendingKind::Update, completer)) => {
                let decided = completer.answer(None);
                pending.remove(&id);
                decided
            }
            _ => false,
        }
    }

    /// The player left: cancel everything pending. Later requests come back cancelled.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.timer.stop();
        self.cancel_pending();
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .values()
            .filter(|(_, c)| !c.is_complete())
            .count()
    }
}

impl PlayerChannel for RemotePlayer {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn send_choice_request(&self, prompt: &str, options: &[String], optional: bool) -> ChoiceHandle {
        if self.shut_down.load(Ordering::SeqCst) {
            return ChoiceHandle::interrupted();
        }
        if !self.is_connected() {
            return ChoiceHandle::cancelled();
        }
        let (id, handle) =
            self.register(PendingKind::Choice, options.len(), optional, self.choice_timeout);
        self.send(Outbound::ChoiceRequest {
            id,
            prompt: prompt.to_string(),
            options: options.to_vec(),
            optional,
        });
        handle
    }

    fn show_message(&self, text: &str, severity: Severity) {
        if self.is_connected() {
            self.send(Outbound::Message {
                text: text.to_string(),
                severity,
            });
        }
    }

    fn start_timer(&self, duration: Duration, on_expire: TimerCallback) {
        self.timer.start(duration, on_expire);
        if self.is_connected() {
            self.send(Outbound::TimerStarted {
                millis: duration.as_millis() as u64,
            });
        }
    }

    fn stop_timer(&self) {
        if self.timer.is_running() && self.is_connected() {
            self.send(Outbound::TimerStopped);
        }
        self.timer.stop();
    }

    fn select_scene(&self, scene: Scene) {
        if self.is_connected() {
            self.send(Outbound::Scene(scene));
        }
    }

    fn update_sync(&self, update: StateUpdate) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(EngineError::Interrupted);
        }
        if !self.is_connected() {
            return Ok(());
        }
        let (id, handle) = self.register(PendingKind::Update, 0, true, Some(self.ack_timeout));
        self.send(Outbound::Update { id, update });
        match handle.get()? {
            ChoiceOutcome::Answered(_) => Ok(()),
            // An unacknowledged update is not worth stopping the match for
            ChoiceOutcome::Cancelled | ChoiceOutcome::TimedOut => Ok(()),
        }
    }

    fn cancel_pending(&self) {
        for (_, (_, completer)) in self.pending.lock().drain() {
            completer.cancel();
        }
    }

    fn interrupt(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.timer.stop();
        for (_, (_, completer)) in self.pending.lock().drain() {
            completer.interrupt();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn remote() -> (Arc<RemotePlayer>, mpsc::UnboundedReceiver<Outbound>) {
        RemotePlayer::new(PlayerId::new(0), Some(Duration::from_secs(5)), Duration::from_secs(5))
    }

    fn request_id(message: Outbound) -> u64 {
        match message {
            Outbound::ChoiceRequest { id, .. } | Outbound::Update { id, .. } => id,
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_answer_round_trip() {
        let (player, mut rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into(), "b".into()], false);
        let id = request_id(rx.blocking_recv().unwrap());

        let transport = Arc::clone(&player);
        let answering = thread::spawn(move || transport.answer(id, Some(1)).unwrap());
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(1)));
        assert!(answering.join().unwrap());

        // The request is gone: a second answer is ignored
        assert!(!player.answer(id, Some(0)).unwrap());
    }

    #[test]
    fn test_invalid_answer_keeps_request_open() {
        let (player, mut rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into()], false);
        let id = request_id(rx.blocking_recv().unwrap());
        assert!(player.answer(id, Some(4)).is_err());
        assert!(player.answer(id, Some(0)).unwrap());
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(0)));
    }

    #[test]
    fn test_acknowledge_only_completes_updates() {
        let (player, mut rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into(), "b".into()], false);
        let id = request_id(rx.blocking_recv().unwrap());

        assert!(!player.acknowledge(id));
        assert_eq!(player.pending_count(), 1);
        assert!(player.answer(id, Some(1)).unwrap());
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(1)));
    }

    #[test]
    fn test_update_waits_for_its_ack() {
        let (player, mut rx) = remote();
        let engine = {
            let player = Arc::clone(&player);
            thread::spawn(move || player.update_sync(StateUpdate::Finished(Arc::new(Default::default()))))
        };
        let id = request_id(rx.blocking_recv().unwrap());
        assert!(player.answer(id, None).is_err());
        assert!(player.acknowledge(id));
        engine.join().unwrap().unwrap();
    }

    #[test]
    fn test_disconnect_after_invalid_answer_cancels() {
        let (player, mut rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into()], false);
        let id = request_id(rx.blocking_recv().unwrap());
        assert!(player.answer(id, Some(3)).is_err());
        player.disconnect();
        assert!(handle.get().unwrap().is_cancelled());
    }

    #[test]
    fn test_disconnect_cancels_pending_and_future_requests() {
        let (player, _rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into()], true);
        player.disconnect();
        assert!(handle.get().unwrap().is_cancelled());
        assert!(!player.is_connected());

        let later = player.send_choice_request("again", &["a".into()], true);
        assert!(later.get().unwrap().is_cancelled());
    }

    #[test]
    fn test_shutdown_interrupts() {
        let (player, _rx) = remote();
        let handle = player.send_choice_request("pick", &["a".into()], true);
        player.interrupt();
        assert!(handle.get().unwrap_err().is_interrupted());
        assert!(player
            .update_sync(StateUpdate::Finished(Arc::new(Default::default())))
            .unwrap_err()
            .is_interrupted());
    }

    #[test]
    fn test_dropped_receiver_disconnects() {
        let (player, rx) = remote();
        drop(rx);
        player.show_message("hello", Severity::Info);
        assert!(!player.is_connected());
    }
}
