//! Scripted channel for tests and replays
//!
//! Answers come from a fixed script; every prompt, message and timer call is
//! recorded so tests can assert on what the player saw.

use crate::choice::{ChoiceHandle, PlayerChannel, Scene, Severity, StateUpdate, TimerCallback};
use crate::core::PlayerId;
use crate::{EngineError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted reaction to a choice request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    /// Pick the option at this index
    Pick(usize),
    /// Pick the first option whose label starts with this text
    Label(String),
    Decline,
    Cancel,
    TimeOut,
    /// Disconnect: this and every later request is cancelled
    Disconnect,
    Interrupt,
}

impl Scripted {
    pub fn label(text: &str) -> Self {
        Scripted::Label(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPrompt {
    pub prompt: String,
    pub options: Vec<String>,
    pub optional: bool,
}

#[derive(Debug, Default)]
struct Recording {
    prompts: Vec<RecordedPrompt>,
    messages: Vec<(String, Severity)>,
    scenes: Vec<Scene>,
    updates: usize,
}

pub struct ScriptedChannel {
    player: PlayerId,
    script: Mutex<VecDeque<Scripted>>,
    recording: Mutex<Recording>,
    connected: AtomicBool,
    interrupted: AtomicBool,
    timers_started: AtomicUsize,
    timers_stopped: AtomicUsize,
    timer_running: AtomicBool,
    expire_timers: AtomicBool,
}

impl ScriptedChannel {
    pub fn new(player: PlayerId, script: Vec<Scripted>) -> Self {
        ScriptedChannel {
            player,
            script: Mutex::new(script.into()),
            recording: Mutex::new(Recording::default()),
            connected: AtomicBool::new(true),
            interrupted: AtomicBool::new(false),
            timers_started: AtomicUsize::new(0),
            timers_stopped: AtomicUsize::new(0),
            timer_running: AtomicBool::new(false),
            expire_timers: AtomicBool::new(false),
        }
    }

    /// A channel with an empty script: optional requests are declined and
    /// mandatory ones get the first option
    pub fn passive(player: PlayerId) -> Self {
        Self::new(player, Vec::new())
    }

    /// Every timer started from now on fires as soon as it starts
    pub fn expire_timers(&self) {
        self.expire_timers.store(true, Ordering::SeqCst);
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().push_back(step);
    }

    pub fn remaining_script(&self) -> usize {
        self.script.lock().len()
    }

    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.recording.lock().prompts.clone()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.recording.lock().messages.clone()
    }

    pub fn scenes(&self) -> Vec<Scene> {
        self.recording.lock().scenes.clone()
    }

    pub fn updates(&self) -> usize {
        self.recording.lock().updates
    }

    pub fn timers_started(&self) -> usize {
        self.timers_started.load(Ordering::SeqCst)
    }

    pub fn timers_stopped(&self) -> usize {
        self.timers_stopped.load(Ordering::SeqCst)
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running.load(Ordering::SeqCst)
    }
}

impl PlayerChannel for ScriptedChannel {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn send_choice_request(&self, prompt: &str, options: &[String], optional: bool) -> ChoiceHandle {
        self.recording.lock().prompts.push(RecordedPrompt {
            prompt: prompt.to_string(),
            options: options.to_vec(),
            optional,
        });
        if self.interrupted.load(Ordering::SeqCst) {
            return ChoiceHandle::interrupted();
        }
        if !self.is_connected() {
            return ChoiceHandle::cancelled();
        }

        let step = self.script.lock().pop_front();
        let count = options.len();
        match step {
            Some(Scripted::Pick(index)) => ChoiceHandle::answered(count, optional, Some(index)),
            Some(Scripted::Label(text)) => {
                let index = options.iter().position(|o| o.starts_with(&text));
                ChoiceHandle::answered(count, optional || index.is_none(), index)
            }
            Some(Scripted::Decline) => ChoiceHandle::answered(count, optional, None),
            Some(Scripted::Cancel) => ChoiceHandle::cancelled(),
            Some(Scripted::TimeOut) => ChoiceHandle::timed_out(),
            Some(Scripted::Disconnect) => {
                self.connected.store(false, Ordering::SeqCst);
                ChoiceHandle::cancelled()
            }
            Some(Scripted::Interrupt) => {
                self.interrupted.store(true, Ordering::SeqCst);
                ChoiceHandle::interrupted()
            }
            None if optional => ChoiceHandle::answered(count, optional, None),
            None => ChoiceHandle::answered(count, optional, Some(0)),
        }
    }

    fn show_message(&self, text: &str, severity: Severity) {
        self.recording
            .lock()
            .messages
            .push((text.to_string(), severity));
    }

    fn start_timer(&self, _duration: Duration, on_expire: TimerCallback) {
        self.timers_started.fetch_add(1, Ordering::SeqCst);
        if self.expire_timers.load(Ordering::SeqCst) {
            on_expire();
        } else {
            self.timer_running.store(true, Ordering::SeqCst);
        }
    }

    fn stop_timer(&self) {
        self.timers_stopped.fetch_add(1, Ordering::SeqCst);
        self.timer_running.store(false, Ordering::SeqCst);
    }

    fn select_scene(&self, scene: Scene) {
        self.recording.lock().scenes.push(scene);
    }

    fn update_sync(&self, _update: StateUpdate) -> Result<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(EngineError::Interrupted);
        }
        self.recording.lock().updates += 1;
        Ok(())
    }

    fn cancel_pending(&self) {}

    fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{ask, ChoiceOutcome};

    #[test]
    fn test_script_is_replayed_in_order() {
        let channel = ScriptedChannel::new(
            PlayerId::new(0),
            vec![Scripted::Pick(1), Scripted::label("gr"), Scripted::Cancel],
        );
        let options = vec!["run".to_string(), "grab".to_string(), "shoot".to_string()];

        let first = ask(&channel, "action", &options, false).unwrap();
        assert_eq!(first, ChoiceOutcome::Answered(Some("grab".to_string())));
        let second = ask(&channel, "action", &options, false).unwrap();
        assert_eq!(second, ChoiceOutcome::Answered(Some("grab".to_string())));
        assert!(ask(&channel, "action", &options, false).unwrap().is_cancelled());

        // Exhausted script: optional declines, mandatory takes the first option
        assert_eq!(ask(&channel, "x", &options, true).unwrap(), ChoiceOutcome::Answered(None));
        assert_eq!(
            ask(&channel, "x", &options, false).unwrap(),
            ChoiceOutcome::Answered(Some("run".to_string()))
        );
        assert_eq!(channel.prompts().len(), 5);
    }

    #[test]
    fn test_disconnect_sticks() {
        let channel = ScriptedChannel::new(PlayerId::new(1), vec![Scripted::Disconnect]);
        let options = vec!["a".to_string()];
        assert!(ask(&channel, "x", &options, true).unwrap().is_cancelled());
        assert!(!channel.is_connected());
        assert!(ask(&channel, "y", &options, true).unwrap().is_cancelled());
    }

    #[test]
    fn test_interrupt_is_an_error() {
        let channel = ScriptedChannel::new(PlayerId::new(0), vec![Scripted::Interrupt]);
        let err = ask(&channel, "x", &["a".to_string()], true).unwrap_err();
        assert!(err.is_interrupted());
    }
}
