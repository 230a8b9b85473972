//! Cancellable one-shot timers

use crate::choice::PlayerChannel;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Default)]
struct TimerState {
    /// Bumped on every start and stop; a waiting thread only fires for its own generation
    generation: u64,
    armed: bool,
}

#[derive(Debug, Default)]
struct TimerInner {
    state: Mutex<TimerState>,
    changed: Condvar,
}

/// A one-shot timer running its callback on a helper thread.
/// Starting again replaces the previous countdown.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, duration: Duration, callback: TimerCallback) {
        let generation = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.armed = true;
            self.inner.changed.notify_all();
            state.generation
        };

        let inner = Arc::clone(&self.inner);
        let deadline = Instant::now() + duration;
        let spawned = thread::Builder::new()
            .name("match-timer".to_string())
            .spawn(move || {
                let fire = {
                    let mut state = inner.state.lock();
                    loop {
                        if state.generation != generation || !state.armed {
                            break false;
                        }
                        if inner.changed.wait_until(&mut state, deadline).timed_out() {
                            let current = state.generation == generation && state.armed;
                            if current {
                                state.armed = false;
                            }
                            break current;
                        }
                    }
                };
                if fire {
                    callback();
                }
            });
        if spawned.is_err() {
            // Without a helper thread the countdown can never fire
            self.inner.state.lock().armed = false;
        }
    }

    /// Disarm the timer. Safe to call when nothing is running.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.armed = false;
        self.inner.changed.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().armed
    }
}

/// Stops a channel's timer when dropped, so every exit path of the scope
/// that started it (return, `?`, cancellation) disarms it.
pub struct TimerGuard<'a> {
    channel: &'a dyn PlayerChannel,
}

impl<'a> TimerGuard<'a> {
    pub fn start(channel: &'a dyn PlayerChannel, duration: Duration, on_expire: TimerCallback) -> Self {
        channel.start_timer(duration, on_expire);
        TimerGuard { channel }
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.channel.stop_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_timer_fires_once() {
        let timer = Timer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        timer.start(
            Duration::from_millis(10),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        thread::sleep(Duration::from_millis(200));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let timer = Timer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        timer.start(
            Duration::from_millis(50),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(timer.is_running());
        timer.stop();
        thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_replaces_countdown() {
        let timer = Timer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            timer.start(
                Duration::from_millis(30),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        thread::sleep(Duration::from_millis(200));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
