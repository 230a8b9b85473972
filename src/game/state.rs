//! Match state
//!
//! The match owns everything a game session mutates. Only the engine thread
//! touches it; players see it through [`MatchSnapshot`]s.

use crate::choice::{PlayerChannel, Severity};
use crate::core::{
    ActionCard, ActionCardKind, AmmoTile, CardCatalog, Player, PlayerId, PlayerName, PowerUpCard,
    WeaponId,
};
use crate::game::logger::log_verbose;
use crate::game::{
    EndReason, EventBus, MatchConfig, MatchEvent, MatchLogger, MatchResult, MatchSnapshot,
    PlayerSnapshot, PlayerTurn, Standing,
};
use crate::map::{self, Board, SquareKind, SPAWN_DISPLAY_SIZE};
use crate::stacks::CardStack;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Kill,
    Overkill,
}

/// One token on the killshot track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackToken {
    pub player: PlayerId,
    pub kind: TokenKind,
}

pub struct Match {
    config: MatchConfig,
    catalog: Arc<CardCatalog>,
    players: Vec<Player>,
    channels: Vec<Arc<dyn PlayerChannel>>,
    board: Box<dyn Board>,
    pub(crate) ammo_tiles: CardStack<AmmoTile>,
    pub(crate) weapons: CardStack<WeaponId>,
    pub(crate) power_ups: CardStack<PowerUpCard>,
    frenzy: bool,
    /// Killshot track, append-only
    track: Vec<TrackToken>,
    turn_number: u32,
    current_turn: Option<PlayerTurn>,
    /// Set by final scoring, cleared by per-turn scoring
    pub(crate) final_scored: bool,
    logger: MatchLogger,
    events: EventBus,
}

impl Match {
    /// Set up a match. Seats follow roster order and every channel must
    /// belong to its seat.
    pub fn new(
        config: MatchConfig,
        catalog: Arc<CardCatalog>,
        roster: Vec<(PlayerName, Arc<dyn PlayerChannel>)>,
    ) -> Result<Self> {
        config.validate()?;
        config.validate_roster(roster.len())?;
        let board = map::board_for(config.board_id)?;
        Self::with_board(config, catalog, roster, board)
    }

    /// Set up a match on a caller-provided board
    pub fn with_board(
        config: MatchConfig,
        catalog: Arc<CardCatalog>,
        roster: Vec<(PlayerName, Arc<dyn PlayerChannel>)>,
        board: Box<dyn Board>,
    ) -> Result<Self> {
        let mut players = Vec::with_capacity(roster.len());
        let mut channels = Vec::with_capacity(roster.len());
        for (seat, (name, channel)) in roster.into_iter().enumerate() {
            let id = PlayerId::new(seat as u32);
            if channel.player() != id {
                return Err(EngineError::Config(format!(
                    "channel for seat {} belongs to {}",
                    id,
                    channel.player()
                )));
            }
            players.push(Player::new(id, name));
            channels.push(channel);
        }

        let seed = config.seed;
        let logger = MatchLogger::with_verbosity(config.verbosity);
        Ok(Match {
            ammo_tiles: CardStack::new(catalog.ammo_tiles().to_vec(), seed),
            weapons: CardStack::new(catalog.weapon_ids(), seed.wrapping_add(1)),
            power_ups: CardStack::new(catalog.power_ups().to_vec(), seed.wrapping_add(2)),
            config,
            catalog,
            players,
            channels,
            board,
            frenzy: false,
            track: Vec::new(),
            turn_number: 0,
            current_turn: None,
            final_scored: false,
            logger,
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(id.index())
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(id.index())
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn channel(&self, id: PlayerId) -> Result<Arc<dyn PlayerChannel>> {
        self.channels
            .get(id.index())
            .cloned()
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn channels(&self) -> &[Arc<dyn PlayerChannel>] {
        &self.channels
    }

    /// Send one message to a player
    pub fn notify(&self, id: PlayerId, text: &str, severity: Severity) {
        if let Some(channel) = self.channels.get(id.index()) {
            channel.show_message(text, severity);
        }
    }

    pub fn board(&self) -> &dyn Board {
        self.board.as_ref()
    }

    pub fn board_mut(&mut self) -> &mut dyn Board {
        self.board.as_mut()
    }

    pub fn logger(&self) -> &MatchLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut MatchLogger {
        &mut self.logger
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_frenzy(&self) -> bool {
        self.frenzy
    }

    pub fn skulls(&self) -> u8 {
        self.config.skulls
    }

    pub fn track(&self) -> &[TrackToken] {
        &self.track
    }

    pub fn kill_tokens(&self) -> usize {
        self.track
            .iter()
            .filter(|t| t.kind == TokenKind::Kill)
            .count()
    }

    pub(crate) fn push_token(&mut self, player: PlayerId, kind: TokenKind) {
        self.track.push(TrackToken { player, kind });
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn current_turn(&self) -> Option<&PlayerTurn> {
        self.current_turn.as_ref()
    }

    pub(crate) fn current_turn_mut(&mut self) -> Option<&mut PlayerTurn> {
        self.current_turn.as_mut()
    }

    /// Start a new turn for `owner`, replacing the previous one
    pub(crate) fn begin_turn(&mut self, owner: PlayerId) -> Result<()> {
        let max_actions = self.player(owner)?.action_card.max_actions;
        let needs_spawn = self.board.position(owner).is_none();
        self.turn_number += 1;
        self.current_turn = Some(PlayerTurn::new(owner, max_actions, needs_spawn));
        Ok(())
    }

    pub(crate) fn take_turn(&mut self) -> Option<PlayerTurn> {
        self.current_turn.take()
    }

    /// Fail with a rule violation unless `player` owns the current turn
    pub fn require_turn_owner(&self, player: PlayerId) -> Result<()> {
        match &self.current_turn {
            Some(turn) if turn.owner() == player && !turn.is_over() => Ok(()),
            _ => Err(EngineError::RuleViolation(format!(
                "{} is acting out of turn",
                player
            ))),
        }
    }

    /// Deal damage from `shooter` to `target`. Returns the markers placed.
    pub fn apply_damage(&mut self, shooter: PlayerId, target: PlayerId, amount: u8) -> Result<u8> {
        if shooter == target {
            return Err(EngineError::RuleViolation(format!(
                "{} cannot damage themselves",
                shooter
            )));
        }
        self.player(shooter)?;
        let frenzy = self.frenzy;
        let victim = self.player_mut(target)?;
        let placed = victim.board.add_damage(shooter, amount);
        if !frenzy {
            victim.action_card = ActionCard::for_damage(victim.board.damage_count());
        }
        if placed > 0 {
            if let Some(turn) = self.current_turn.as_mut() {
                turn.record_damaged(target);
            }
            self.events.publish(MatchEvent::Damaged {
                shooter,
                target,
                amount: placed,
            });
            log_verbose!(self.logger, action, "{} deals {} damage to {}", shooter, placed, target);
        }
        Ok(placed)
    }

    /// Put marks from `shooter` on `target`. Returns the marks placed.
    pub fn apply_marks(&mut self, shooter: PlayerId, target: PlayerId, amount: u8) -> Result<u8> {
        if shooter == target {
            return Err(EngineError::RuleViolation(format!(
                "{} cannot mark themselves",
                shooter
            )));
        }
        self.player(shooter)?;
        let placed = self.player_mut(target)?.board.add_marks(shooter, amount);
        if placed > 0 {
            self.events.publish(MatchEvent::Marked {
                shooter,
                target,
                amount: placed,
            });
            log_verbose!(self.logger, action, "{} puts {} mark(s) on {}", shooter, placed, target);
        }
        Ok(placed)
    }

    /// Draw a power-up, reshuffling discards when needed
    pub fn draw_power_up(&mut self) -> Option<PowerUpCard> {
        self.power_ups.draw()
    }

    pub fn discard_power_up(&mut self, card: PowerUpCard) {
        self.power_ups.discard(card);
    }

    /// Put a tile on every empty ammo square and fill every spawn display
    pub fn refill_board(&mut self) {
        for id in self.board.squares() {
            let Some(square) = self.board.square_mut(id) else {
                continue;
            };
            match &mut square.kind {
                SquareKind::Ammo { tile } => {
                    if tile.is_none() {
                        *tile = self.ammo_tiles.draw();
                    }
                }
                SquareKind::Spawn { weapons, .. } => {
                    while weapons.len() < SPAWN_DISPLAY_SIZE {
                        match self.weapons.draw() {
                            Some(weapon) => weapons.push(weapon),
                            None => break,
                        }
                    }
                }
            }
        }
    }

    /// Turn on frenzy after `trigger`'s turn. Players whose last turn comes
    /// before the first player's get the double-action card.
    pub(crate) fn start_frenzy(&mut self, trigger: PlayerId) {
        if self.frenzy {
            return;
        }
        self.frenzy = true;
        for player in &mut self.players {
            let kind = if player.id > trigger {
                ActionCardKind::FrenzyDouble
            } else {
                ActionCardKind::FrenzySingle
            };
            player.action_card = ActionCard::of_kind(kind);
            // Boards still carrying damage flip after their next death
            let _ = player.board.flip_to_frenzy();
        }
        self.events.publish(MatchEvent::FrenzyStarted);
        self.logger.normal("Final frenzy begins");
    }

    /// Record a disconnect noticed on the player's channel
    pub(crate) fn refresh_connections(&mut self) {
        for (player, channel) in self.players.iter_mut().zip(&self.channels) {
            if player.connected && !channel.is_connected() {
                player.connected = false;
                self.events.publish(MatchEvent::Disconnected { player: player.id });
                self.logger.normal(&format!("{} disconnected", player.id));
            }
        }
    }

    pub fn connected_players(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            turn: self.turn_number,
            current: self.current_turn.as_ref().map(|t| t.owner()),
            frenzy: self.frenzy,
            skulls: self.config.skulls,
            track: self.track.iter().map(|t| t.player).collect(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    score: p.score,
                    damage: p.board.damage().to_vec(),
                    marks: p.board.total_marks(),
                    deaths: p.board.deaths(),
                    side: p.board.side(),
                    position: self.board.position(p.id),
                    ammo: p.ammo,
                    loaded_weapons: p.weapons.iter().filter(|w| w.loaded).count(),
                    unloaded_weapons: p.weapons.iter().filter(|w| !w.loaded).count(),
                    power_ups: p.power_ups.len(),
                    connected: p.connected,
                })
                .collect(),
        }
    }

    pub fn result(&self, end_reason: EndReason) -> MatchResult {
        let mut standings: Vec<Standing> = self
            .players
            .iter()
            .map(|p| Standing {
                player: p.id,
                name: p.name.clone(),
                score: p.score,
                kills: p.kills,
                overkills: p.overkills,
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        MatchResult {
            standings,
            turns_played: self.turn_number,
            end_reason,
        }
    }
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("players", &self.players.len())
            .field("turn", &self.turn_number)
            .field("frenzy", &self.frenzy)
            .field("track", &self.track)
            .finish()
    }
}
