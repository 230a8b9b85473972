//! At-most-once choice handle
//!
//! A handle and its completer share one slot. The first answer, cancellation
//! or interruption that reaches the slot decides the outcome; a wait that
//! runs past its deadline completes the slot as timed out. Anything arriving
//! after that is ignored.

use crate::{EngineError, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of asking a player something
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome<T> {
    Answered(T),
    /// The player disconnected or was removed while the request was pending
    Cancelled,
    /// Nobody answered before the deadline
    TimedOut,
}

impl<T> ChoiceOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ChoiceOutcome<U> {
        match self {
            ChoiceOutcome::Answered(v) => ChoiceOutcome::Answered(f(v)),
            ChoiceOutcome::Cancelled => ChoiceOutcome::Cancelled,
            ChoiceOutcome::TimedOut => ChoiceOutcome::TimedOut,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChoiceOutcome::Cancelled)
    }
}

impl<T> ChoiceOutcome<Option<T>> {
    /// The selected value; declining and timing out both read as no selection
    pub fn selected(self) -> Option<T> {
        match self {
            ChoiceOutcome::Answered(v) => v,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Answered(Option<usize>),
    Cancelled,
    TimedOut,
    Interrupted,
}

#[derive(Debug, Default)]
struct Slot {
    state: Mutex<Option<Completion>>,
    ready: Condvar,
}

impl Slot {
    /// Store `completion` unless the slot is already complete
    fn complete(&self, completion: Completion) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(completion);
        self.ready.notify_all();
        true
    }
}

/// Engine side: blocks until the request completes
#[derive(Debug)]
pub struct ChoiceHandle {
    slot: Arc<Slot>,
    option_count: usize,
    optional: bool,
    timeout: Option<Duration>,
}

/// Transport side: completes the request from any thread
#[derive(Debug, Clone)]
pub struct ChoiceCompleter {
    slot: Arc<Slot>,
    option_count: usize,
    optional: bool,
}

impl ChoiceHandle {
    /// A new pending request over `option_count` options
    pub fn pending(
        option_count: usize,
        optional: bool,
        timeout: Option<Duration>,
    ) -> (ChoiceHandle, ChoiceCompleter) {
        let slot = Arc::new(Slot::default());
        let handle = ChoiceHandle {
            slot: Arc::clone(&slot),
            option_count,
            optional,
            timeout,
        };
        let completer = ChoiceCompleter {
            slot,
            option_count,
            optional,
        };
        (handle, completer)
    }

    /// A handle that is already answered
    pub fn answered(option_count: usize, optional: bool, choice: Option<usize>) -> Self {
        let (handle, completer) = Self::pending(option_count, optional, None);
        completer.slot.complete(Completion::Answered(choice));
        handle
    }

    pub fn cancelled() -> Self {
        let (handle, completer) = Self::pending(0, true, None);
        completer.cancel();
        handle
    }

    pub fn timed_out() -> Self {
        let (handle, completer) = Self::pending(0, true, None);
        completer.slot.complete(Completion::TimedOut);
        handle
    }

    pub fn interrupted() -> Self {
        let (handle, completer) = Self::pending(0, true, None);
        completer.interrupt();
        handle
    }

    pub fn option_count(&self) -> usize {
        self.option_count
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Block until the request completes or the deadline passes.
    ///
    /// Returns `Err(Interrupted)` on shutdown and `Err(InvalidChoice)` for an
    /// answer that does not fit the request.
    pub fn get(self) -> Result<ChoiceOutcome<Option<usize>>> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let completion = {
            let mut state = self.slot.state.lock();
            loop {
                if let Some(done) = *state {
                    break done;
                }
                match deadline {
                    Some(deadline) => {
                        if self.slot.ready.wait_until(&mut state, deadline).timed_out()
                            && state.is_none()
                        {
                            *state = Some(Completion::TimedOut);
                        }
                    }
                    None => self.slot.ready.wait(&mut state),
                }
            }
        };

        match completion {
            Completion::Answered(Some(index)) if index >= self.option_count => Err(
                EngineError::InvalidChoice(format!(
                    "option {} out of {} offered",
                    index, self.option_count
                )),
            ),
            Completion::Answered(None) if !self.optional => Err(EngineError::InvalidChoice(
                "a selection is required".to_string(),
            )),
            Completion::Answered(choice) => Ok(ChoiceOutcome::Answered(choice)),
            Completion::Cancelled => Ok(ChoiceOutcome::Cancelled),
            Completion::TimedOut => Ok(ChoiceOutcome::TimedOut),
            Completion::Interrupted => Err(EngineError::Interrupted),
        }
    }
}

impl ChoiceCompleter {
    /// Check an answer against the request before completing with it
    pub fn validate(&self, choice: Option<usize>) -> Result<()> {
        match choice {
            Some(index) if index >= self.option_count => Err(EngineError::InvalidChoice(format!(
                "option {} out of {} offered",
                index, self.option_count
            ))),
            None if !self.optional => Err(EngineError::InvalidChoice(
                "a selection is required".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns true if this answer decided the request
    pub fn answer(&self, choice: Option<usize>) -> bool {
        self.slot.complete(Completion::Answered(choice))
    }

    pub fn cancel(&self) -> bool {
        self.slot.complete(Completion::Cancelled)
    }

    pub fn interrupt(&self) -> bool {
        self.slot.complete(Completion::Interrupted)
    }

    pub fn is_complete(&self) -> bool {
        self.slot.state.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_completion_wins() {
        let (handle, completer) = ChoiceHandle::pending(3, false, None);
        assert!(completer.answer(Some(2)));
        assert!(!completer.cancel());
        assert!(!completer.answer(Some(0)));
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(2)));
    }

    #[test]
    fn test_answer_from_another_thread() {
        let (handle, completer) = ChoiceHandle::pending(2, false, Some(Duration::from_secs(5)));
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.answer(Some(1))
        });
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::Answered(Some(1)));
        assert!(sender.join().unwrap());
    }

    #[test]
    fn test_timeout_blocks_late_answers() {
        let (handle, completer) = ChoiceHandle::pending(2, true, Some(Duration::from_millis(10)));
        assert_eq!(handle.get().unwrap(), ChoiceOutcome::TimedOut);
        assert!(completer.is_complete());
        assert!(!completer.answer(Some(0)));
    }

    #[test]
    fn test_cancel_and_interrupt() {
        let (handle, completer) = ChoiceHandle::pending(2, true, None);
        completer.cancel();
        assert!(handle.get().unwrap().is_cancelled());

        let err = ChoiceHandle::interrupted().get().unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_invalid_answers() {
        let (handle, completer) = ChoiceHandle::pending(2, false, None);
        assert!(completer.validate(Some(2)).is_err());
        assert!(completer.validate(None).is_err());
        assert!(completer.validate(Some(1)).is_ok());
        completer.answer(Some(5));
        assert!(matches!(handle.get(), Err(EngineError::InvalidChoice(_))));
    }

    #[test]
    fn test_selected_treats_timeout_as_decline() {
        assert_eq!(ChoiceOutcome::<Option<u8>>::TimedOut.selected(), None);
        assert_eq!(ChoiceOutcome::Answered(Some(3)).selected(), Some(3));
    }
}
