//! Choice protocol: asking players questions and waiting for the answer
//!
//! Engine code sends a request through a [`PlayerChannel`] and blocks on the
//! returned [`ChoiceHandle`]. The outcome is explicit: answered, cancelled
//! (the player went away) or timed out. Shutdown surfaces as
//! [`EngineError::Interrupted`](crate::EngineError::Interrupted).

pub mod channel;
pub mod handle;
pub mod remote;
pub mod scripted;
pub mod timer;

pub use channel::{ask, ask_required, PlayerChannel, Scene, Severity, StateUpdate};
pub use handle::{ChoiceCompleter, ChoiceHandle, ChoiceOutcome};
pub use remote::{Outbound, RemotePlayer};
pub use scripted::{RecordedPrompt, Scripted, ScriptedChannel};
pub use timer::{Timer, TimerCallback, TimerGuard};
