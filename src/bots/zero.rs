//! Zero bot: first option on mandatory requests, declines optional ones
//!
//! Deterministic and fast. The turn menu lists "end turn" first, so a match
//! of zero bots spawns everyone and then passes turns until a limit stops it.

use crate::bots::Strategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBot;

impl Strategy for ZeroBot {
    fn choose(&mut self, _prompt: &str, options: &[String], optional: bool) -> Option<usize> {
        if optional || options.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bot_picks_first() {
        let mut bot = ZeroBot;
        let options = vec!["end turn".to_string(), "run (move 3)".to_string()];
        assert_eq!(bot.choose("What do you want to do?", &options, false), Some(0));
        assert_eq!(bot.choose("Move to", &options, true), None);
        assert_eq!(bot.choose("Discard", &[], false), None);
    }
}
