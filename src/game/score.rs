//! Scoring: per-turn board payouts and end-of-match killshot bonuses

use crate::core::{PlayerBoard, PlayerId, REGULAR_POINTS};
use crate::game::{Match, MatchEvent, TokenKind};
use crate::Result;
use rustc_hash::FxHashMap;

/// Points gained by each player, in seat order, zero entries omitted
pub type Payout = Vec<(PlayerId, u32)>;

/// Value of slot `index` in a point table; slots past the end are worth 1
fn slot_value(values: &[u32], index: usize) -> u32 {
    values.get(index).copied().unwrap_or(1)
}

/// Rank `contributions` (damage per shooter, in first-damage order) and hand
/// out `values`. Tied contributors split the sum of the slots they occupy;
/// the remainder goes one point each in first-damage order. `first_blood`
/// gets one extra point.
pub fn distribute(
    contributions: &[(PlayerId, usize)],
    values: &[u32],
    first_blood: Option<PlayerId>,
) -> FxHashMap<PlayerId, u32> {
    let mut ranked = contributions.to_vec();
    // Stable: ties keep first-damage order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut points: FxHashMap<PlayerId, u32> = FxHashMap::default();
    let mut slot = 0;
    for group in ranked.chunk_by(|a, b| a.1 == b.1) {
        let k = group.len();
        let total: u32 = (slot..slot + k).map(|i| slot_value(values, i)).sum();
        let share = total / k as u32;
        let remainder = (total % k as u32) as usize;
        for (i, (player, _)) in group.iter().enumerate() {
            let bonus = if i < remainder { 1 } else { 0 };
            *points.entry(*player).or_insert(0) += share + bonus;
        }
        slot += k;
    }

    if let Some(player) = first_blood {
        *points.entry(player).or_insert(0) += 1;
    }
    points
}

/// Points a board pays out right now
pub fn board_payout(board: &PlayerBoard) -> FxHashMap<PlayerId, u32> {
    let first_blood = if board.awards_first_blood() {
        board.first_blood()
    } else {
        None
    };
    distribute(&board.contributions(), &board.point_values(), first_blood)
}

/// Killshot bonuses from final token counts.
///
/// `tokens` is (player, tokens, first track position). Among players with
/// the same token count only the earliest on the track stays in the running.
pub fn killshot_bonus(tokens: &[(PlayerId, u32, usize)]) -> Vec<(PlayerId, u32)> {
    let mut candidates: Vec<(PlayerId, u32, usize)> = Vec::new();
    for &(player, count, position) in tokens {
        match candidates.iter_mut().find(|(_, c, _)| *c == count) {
            Some(existing) if position < existing.2 => *existing = (player, count, position),
            Some(_) => {}
            None => candidates.push((player, count, position)),
        }
    }
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    candidates
        .iter()
        .enumerate()
        .map(|(i, (player, _, _))| (*player, slot_value(&REGULAR_POINTS, i)))
        .collect()
}

pub struct ScoreManager;

impl ScoreManager {
    /// Score every board that died during the turn that just ended.
    ///
    /// Dead boards are left dead; respawn resets them afterwards.
    pub fn per_turn(game: &mut Match) -> Result<Payout> {
        game.final_scored = false;

        let dead: Vec<PlayerId> = game
            .players()
            .iter()
            .filter(|p| p.board.is_dead())
            .map(|p| p.id)
            .collect();
        if dead.is_empty() {
            return Ok(Vec::new());
        }

        let mut gained: FxHashMap<PlayerId, u32> = FxHashMap::default();
        let mut kills_this_turn: FxHashMap<PlayerId, u32> = FxHashMap::default();

        for victim in dead {
            let board = &game.player(victim)?.board;
            let payout = board_payout(board);
            let killer = board.killer();
            let overkiller = board.overkiller();

            for (player, points) in payout {
                *gained.entry(player).or_insert(0) += points;
            }

            if let Some(killer) = killer {
                game.player_mut(killer)?.kills += 1;
                game.push_token(killer, TokenKind::Kill);
                *kills_this_turn.entry(killer).or_insert(0) += 1;
                game.events().publish(MatchEvent::Killed {
                    killer,
                    victim,
                    overkill: false,
                });
                game.logger()
                    .score(&format!("{} killed {}", killer, victim));
            }
            if let Some(overkiller) = overkiller {
                game.player_mut(overkiller)?.overkills += 1;
                game.push_token(overkiller, TokenKind::Overkill);
                game.apply_marks(victim, overkiller, 1)?;
                game.events().publish(MatchEvent::Killed {
                    killer: overkiller,
                    victim,
                    overkill: true,
                });
                game.logger()
                    .score(&format!("{} overkilled {}", overkiller, victim));
            }
        }

        let total_kills: u32 = kills_this_turn.values().sum();
        if total_kills > 1 {
            for (player, kills) in &kills_this_turn {
                if *kills > 1 {
                    *gained.entry(*player).or_insert(0) += 1;
                }
            }
        }

        Self::award(game, gained)
    }

    /// End-of-match scoring: boards still carrying damage pay out, then the
    /// killshot track bonuses. Returns None when final scoring already ran
    /// with no turn scored since.
    pub fn final_scoring(game: &mut Match) -> Result<Option<Payout>> {
        if game.final_scored {
            return Ok(None);
        }

        let mut gained: FxHashMap<PlayerId, u32> = FxHashMap::default();
        for player in game.players() {
            if player.board.damage_count() == 0 {
                continue;
            }
            for (shooter, points) in board_payout(&player.board) {
                *gained.entry(shooter).or_insert(0) += points;
            }
        }

        // (player, tokens on the track, first position)
        let mut tokens: Vec<(PlayerId, u32, usize)> = Vec::new();
        for (position, token) in game.track().iter().enumerate() {
            match tokens.iter_mut().find(|(p, _, _)| *p == token.player) {
                Some(entry) => entry.1 += 1,
                None => tokens.push((token.player, 1, position)),
            }
        }
        for (player, points) in killshot_bonus(&tokens) {
            *gained.entry(player).or_insert(0) += points;
        }

        let payout = Self::award(game, gained)?;
        game.final_scored = true;
        Ok(Some(payout))
    }

    fn award(game: &mut Match, gained: FxHashMap<PlayerId, u32>) -> Result<Payout> {
        let mut payout: Payout = gained.into_iter().filter(|(_, p)| *p > 0).collect();
        payout.sort_by_key(|(player, _)| *player);
        for &(player, points) in &payout {
            game.player_mut(player)?.add_points(points);
            game.events().publish(MatchEvent::Scored { player, points });
            game.logger()
                .score(&format!("{} scores {} point(s)", player, points));
        }
        Ok(payout)
    }
}
