//! Match events, snapshots and results
//!
//! Controllers publish events on an in-process bus. Players receive immutable
//! snapshots, never references into the live match state.

use crate::core::{AmmoPool, BoardSide, PlayerId, PlayerName};
use crate::map::SquareId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    TurnStarted { turn: u32, player: PlayerId },
    TurnEnded { turn: u32, player: PlayerId },
    Spawned { player: PlayerId, square: SquareId },
    ActionPerformed { player: PlayerId, action: String },
    Damaged { shooter: PlayerId, target: PlayerId, amount: u8 },
    Marked { shooter: PlayerId, target: PlayerId, amount: u8 },
    Killed { killer: PlayerId, victim: PlayerId, overkill: bool },
    Scored { player: PlayerId, points: u32 },
    FrenzyStarted,
    Disconnected { player: PlayerId },
    MatchEnded { reason: EndReason },
}

/// Broadcast bus for match events. Publishing with no subscriber is fine.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MatchEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        EventBus { sender }
    }

    pub fn publish(&self, event: MatchEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: PlayerName,
    pub score: u32,
    pub damage: Vec<PlayerId>,
    pub marks: u32,
    pub deaths: u32,
    pub side: BoardSide,
    pub position: Option<SquareId>,
    pub ammo: AmmoPool,
    pub loaded_weapons: usize,
    pub unloaded_weapons: usize,
    pub power_ups: usize,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub turn: u32,
    pub current: Option<PlayerId>,
    pub frenzy: bool,
    pub skulls: u8,
    /// Killshot track, one entry per kill or overkill token
    pub track: Vec<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndReason {
    /// Every player played their frenzy turn
    #[default]
    Completed,
    TurnLimit,
    NotEnoughPlayers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub name: PlayerName,
    pub score: u32,
    pub kills: u32,
    pub overkills: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Best score first; equal scores keep seat order
    pub standings: Vec<Standing>,
    pub turns_played: u32,
    pub end_reason: EndReason,
}

impl MatchResult {
    pub fn winner(&self) -> Option<PlayerId> {
        self.standings.first().map(|s| s.player)
    }

    pub fn score_of(&self, player: PlayerId) -> Option<u32> {
        self.standings
            .iter()
            .find(|s| s.player == player)
            .map(|s| s.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_delivers_to_subscribers() {
        let bus = EventBus::new();
        bus.publish(MatchEvent::FrenzyStarted);

        let mut rx = bus.subscribe();
        bus.publish(MatchEvent::TurnStarted {
            turn: 1,
            player: PlayerId::new(0),
        });
        assert_eq!(
            rx.try_recv().unwrap(),
            MatchEvent::TurnStarted {
                turn: 1,
                player: PlayerId::new(0)
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_result_lookup() {
        let result = MatchResult {
            standings: vec![Standing {
                player: PlayerId::new(2),
                name: PlayerName::from("Banshee"),
                score: 12,
                kills: 1,
                overkills: 0,
            }],
            turns_played: 10,
            end_reason: EndReason::TurnLimit,
        };
        assert_eq!(result.winner(), Some(PlayerId::new(2)));
        assert_eq!(result.score_of(PlayerId::new(2)), Some(12));
        assert_eq!(result.score_of(PlayerId::new(0)), None);
    }
}
