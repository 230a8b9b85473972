//! Basic action resolvers
//!
//! An action is a list of basic steps; each step gets its own single-use
//! resolver from the factory. Expected failures (nothing to grab, cannot
//! pay) produce one message and `NotCompleted`.

use crate::choice::{ask, ask_required, ChoiceOutcome, Scene, Severity, TimerGuard};
use crate::core::{Action, OwnedWeapon, PlayerId, PowerUpCard, PowerUpKind, WeaponId};
use crate::game::logger::log_verbose;
use crate::game::payment::pay_or_notify;
use crate::game::{Match, PowerUpContext, Resolution, Resolver, ResolverFactory};
use crate::map::{SquareId, SquareKind};
use crate::{EngineError, Result};
use std::sync::Arc;

/// Runs the steps of one action in order. The action counts as performed
/// when at least one step completed.
pub struct ActionResolver {
    action: Action,
}

impl ActionResolver {
    pub fn new(action: Action) -> Self {
        ActionResolver { action }
    }
}

impl Resolver for ActionResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        game.require_turn_owner(user)?;
        log_verbose!(game.logger(), action, "{} starts {}", user, self.action);
        let mut performed = false;
        for step in self.action.steps.iter().copied() {
            match ResolverFactory::for_step(step).resolve(game, user)? {
                Resolution::Completed => performed = true,
                Resolution::NotCompleted => {}
                Resolution::Cancelled => return Ok(Resolution::Cancelled),
            }
        }
        Ok(if performed {
            Resolution::Completed
        } else {
            Resolution::NotCompleted
        })
    }
}

/// Move up to `max` squares. Staying put is allowed and does not count.
pub struct MoveResolver {
    max: u8,
}

impl MoveResolver {
    pub fn new(max: u8) -> Self {
        MoveResolver { max }
    }
}

impl Resolver for MoveResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let Some(from) = game.board().position(user) else {
            return Err(EngineError::RuleViolation(format!("{} is not on the board", user)));
        };
        let squares: Vec<SquareId> = game
            .board()
            .reachable(from, self.max)
            .into_iter()
            .filter(|sq| *sq != from)
            .collect();
        let channel = game.channel(user)?;
        match ask(channel.as_ref(), "Move to", &squares, true)? {
            ChoiceOutcome::Answered(Some(to)) => {
                game.board_mut().place(user, to)?;
                log_verbose!(game.logger(), action, "{} moves to {}", user, to);
                Ok(Resolution::Completed)
            }
            ChoiceOutcome::Cancelled => Ok(Resolution::Cancelled),
            _ => Ok(Resolution::NotCompleted),
        }
    }
}

/// Pick up whatever the player's square offers
pub struct GrabResolver;

impl GrabResolver {
    fn grab_ammo(game: &mut Match, user: PlayerId, square: SquareId) -> Result<Resolution> {
        let tile = match game.board_mut().square_mut(square).map(|s| &mut s.kind) {
            Some(SquareKind::Ammo { tile }) => tile.take(),
            _ => None,
        };
        let Some(tile) = tile else {
            game.notify(user, "There is nothing to grab here", Severity::Info);
            return Ok(Resolution::NotCompleted);
        };

        let player = game.player_mut(user)?;
        for color in &tile.ammo {
            // Cubes beyond the cap are lost
            player.ammo.add(*color);
        }
        let draws_power_up = tile.power_up;
        log_verbose!(game.logger(), action, "{} grabs {}", user, tile);
        game.ammo_tiles.discard(tile);

        if !draws_power_up {
            return Ok(Resolution::Completed);
        }
        let Some(drawn) = game.draw_power_up() else {
            return Ok(Resolution::Completed);
        };
        if !game.player(user)?.power_ups_full() {
            game.player_mut(user)?.power_ups.push(drawn);
            game.notify(user, &format!("You drew {}", drawn), Severity::Info);
            return Ok(Resolution::Completed);
        }

        // Hand is full: drop one of the four
        let mut options: Vec<PowerUpCard> = vec![drawn];
        options.extend(game.player(user)?.power_ups.iter().copied());
        let channel = game.channel(user)?;
        match ask_required(channel.as_ref(), "Too many power-ups: discard one", &options)? {
            ChoiceOutcome::Answered(discarded) if discarded.id != drawn.id => {
                let hand = &mut game.player_mut(user)?.power_ups;
                hand.retain(|c| c.id != discarded.id);
                hand.push(drawn);
                game.discard_power_up(discarded);
                Ok(Resolution::Completed)
            }
            ChoiceOutcome::Answered(_) => {
                game.discard_power_up(drawn);
                Ok(Resolution::Completed)
            }
            _ => {
                game.discard_power_up(drawn);
                Ok(Resolution::Cancelled)
            }
        }
    }

    fn grab_weapon(game: &mut Match, user: PlayerId, square: SquareId, display: Vec<WeaponId>) -> Result<Resolution> {
        if display.is_empty() {
            game.notify(user, "No weapons left to buy here", Severity::Info);
            return Ok(Resolution::NotCompleted);
        }
        let channel = game.channel(user)?;
        let wanted = match ask(channel.as_ref(), "Buy a weapon", &display, true)? {
            ChoiceOutcome::Answered(Some(weapon)) => weapon,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            _ => return Ok(Resolution::NotCompleted),
        };
        let cost = game
            .catalog()
            .weapon(&wanted)
            .map(|w| w.purchase_cost())
            .ok_or_else(|| EngineError::RuleViolation(format!("unknown weapon '{}'", wanted)))?;

        let dropped = if game.player(user)?.weapons_full() {
            let held: Vec<WeaponId> = game.player(user)?.weapons.iter().map(|w| w.id.clone()).collect();
            match ask_required(channel.as_ref(), "Drop a weapon", &held)? {
                ChoiceOutcome::Answered(weapon) => Some(weapon),
                _ => return Ok(Resolution::Cancelled),
            }
        } else {
            None
        };

        if !pay_or_notify(game, user, &cost, wanted.as_str())? {
            return Ok(Resolution::NotCompleted);
        }

        let player = game.player_mut(user)?;
        if let Some(dropped) = &dropped {
            player.weapons.retain(|w| &w.id != dropped);
        }
        player.weapons.push(OwnedWeapon::loaded(wanted.clone()));
        if let Some(SquareKind::Spawn { weapons, .. }) = game.board_mut().square_mut(square).map(|s| &mut s.kind) {
            weapons.retain(|w| w != &wanted);
            if let Some(dropped) = dropped {
                weapons.push(dropped);
            }
        }
        log_verbose!(game.logger(), action, "{} buys {}", user, wanted);
        Ok(Resolution::Completed)
    }
}

impl Resolver for GrabResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let Some(square) = game.board().position(user) else {
            return Err(EngineError::RuleViolation(format!("{} is not on the board", user)));
        };
        let display = match game.board().square(square).map(|s| &s.kind) {
            Some(SquareKind::Ammo { .. }) => None,
            Some(SquareKind::Spawn { weapons, .. }) => Some(weapons.clone()),
            None => return Err(EngineError::RuleViolation(format!("unknown square {}", square))),
        };
        match display {
            None => Self::grab_ammo(game, user, square),
            Some(display) => Self::grab_weapon(game, user, square, display),
        }
    }
}

/// Reload unloaded weapons until the player stops
pub struct ReloadResolver;

impl Resolver for ReloadResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let channel = game.channel(user)?;
        let mut reloaded = false;
        // Weapons the player could not pay for are not offered again
        let mut unaffordable: Vec<WeaponId> = Vec::new();

        loop {
            let offered: Vec<WeaponId> = game
                .player(user)?
                .unloaded_weapons()
                .into_iter()
                .filter(|w| !unaffordable.contains(w))
                .collect();
            if offered.is_empty() {
                break;
            }
            let weapon = match ask(channel.as_ref(), "Reload a weapon", &offered, true)? {
                ChoiceOutcome::Answered(Some(weapon)) => weapon,
                ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
                _ => break,
            };
            let cost = game
                .catalog()
                .weapon(&weapon)
                .map(|w| w.reload_cost)
                .ok_or_else(|| EngineError::RuleViolation(format!("unknown weapon '{}'", weapon)))?;
            if pay_or_notify(game, user, &cost, weapon.as_str())? {
                game.player_mut(user)?.set_loaded(&weapon, true);
                log_verbose!(game.logger(), action, "{} reloads {}", user, weapon);
                reloaded = true;
            } else {
                unaffordable.push(weapon);
            }
        }

        Ok(if reloaded {
            Resolution::Completed
        } else {
            Resolution::NotCompleted
        })
    }
}

/// Fire one loaded weapon, then open the revenge windows
pub struct ShootResolver;

impl Resolver for ShootResolver {
    fn resolve(&mut self, game: &mut Match, user: PlayerId) -> Result<Resolution> {
        let loaded = game.player(user)?.loaded_weapons();
        if loaded.is_empty() {
            game.notify(user, "You have no loaded weapon", Severity::Info);
            return Ok(Resolution::NotCompleted);
        }
        let channel = game.channel(user)?;
        let weapon_id = match ask(channel.as_ref(), "Shoot with", &loaded, true)? {
            ChoiceOutcome::Answered(Some(weapon)) => weapon,
            ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
            _ => return Ok(Resolution::NotCompleted),
        };
        let weapon = game
            .catalog()
            .weapon(&weapon_id)
            .cloned()
            .ok_or_else(|| EngineError::RuleViolation(format!("unknown weapon '{}'", weapon_id)))?;

        let mut firing = ResolverFactory::for_weapon(&weapon);
        let resolution = firing.resolve(game, user)?;
        let damaged = firing.damaged().to_vec();
        if resolution == Resolution::Cancelled {
            return Ok(Resolution::Cancelled);
        }
        if resolution == Resolution::Completed {
            game.player_mut(user)?.set_loaded(&weapon_id, false);
            log_verbose!(game.logger(), action, "{} fires {}", user, weapon.name);
        }

        if !damaged.is_empty()
            && game.player(user)?.has_power_up(PowerUpKind::TargetingScope)
            && offer_scope(game, user, &damaged)? == Resolution::Cancelled
        {
            return Ok(Resolution::Cancelled);
        }
        revenge_windows(game, user, &damaged)?;
        Ok(resolution)
    }
}

/// Let the shooter spend a Targeting Scope on a player just hit
fn offer_scope(game: &mut Match, user: PlayerId, damaged: &[PlayerId]) -> Result<Resolution> {
    let scopes: Vec<PowerUpCard> = game
        .player(user)?
        .power_ups
        .iter()
        .filter(|c| c.kind == PowerUpKind::TargetingScope)
        .copied()
        .collect();
    let channel = game.channel(user)?;
    let card = match ask(channel.as_ref(), "Use a Targeting Scope?", &scopes, true)? {
        ChoiceOutcome::Answered(Some(card)) => card,
        ChoiceOutcome::Cancelled => return Ok(Resolution::Cancelled),
        _ => return Ok(Resolution::NotCompleted),
    };
    let context = PowerUpContext::WhileShooting {
        damaged: damaged.to_vec(),
    };
    let Some(mut scope) = ResolverFactory::for_power_up(card.kind, context) else {
        return Ok(Resolution::NotCompleted);
    };
    let resolution = scope.resolve(game, user)?;
    if resolution.is_completed() {
        spend_power_up(game, user, card)?;
    }
    Ok(resolution)
}

/// Offer each damaged player holding a Tagback Grenade a timed chance to
/// mark the shooter. Declining, cancelling or running out of time moves on.
pub fn revenge_windows(game: &mut Match, shooter: PlayerId, damaged: &[PlayerId]) -> Result<()> {
    let window = game.config().revenge_timeout;
    for &victim in damaged {
        let player = game.player(victim)?;
        if !player.connected {
            continue;
        }
        let grenades: Vec<PowerUpCard> = player
            .power_ups
            .iter()
            .filter(|c| c.kind == PowerUpKind::TagbackGrenade)
            .copied()
            .collect();
        if grenades.is_empty() {
            continue;
        }

        let channel = game.channel(victim)?;
        channel.select_scene(Scene::Revenge);
        let outcome = {
            let expiring = Arc::clone(&channel);
            let _timer = TimerGuard::start(
                channel.as_ref(),
                window,
                Box::new(move || expiring.cancel_pending()),
            );
            ask(
                channel.as_ref(),
                &format!("{} hit you: use a Tagback Grenade?", shooter),
                &grenades,
                true,
            )?
        };
        if let ChoiceOutcome::Answered(Some(card)) = outcome {
            let context = PowerUpContext::Revenge { shooter };
            if let Some(mut tagback) = ResolverFactory::for_power_up(card.kind, context) {
                if tagback.resolve(game, victim)?.is_completed() {
                    spend_power_up(game, victim, card)?;
                    log_verbose!(game.logger(), action, "{} tags back {}", victim, shooter);
                }
            }
        }
        channel.select_scene(Scene::Board);
    }
    Ok(())
}

/// Remove a played power-up from the hand and discard it
pub(crate) fn spend_power_up(game: &mut Match, user: PlayerId, card: PowerUpCard) -> Result<()> {
    let hand = &mut game.player_mut(user)?.power_ups;
    if let Some(index) = hand.iter().position(|c| c.id == card.id) {
        hand.remove(index);
        game.discard_power_up(card);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Scripted;
    use crate::core::{AmmoColor, AmmoPool, AmmoTile, BasicStep, CardId};
    use crate::game::testing::{p, place, scripted_match, sq};
    use smallvec::smallvec;

    fn power_up(id: u32, kind: PowerUpKind) -> PowerUpCard {
        PowerUpCard {
            id: CardId::new(100 + id),
            kind,
            color: AmmoColor::Red,
        }
    }

    fn put_tile(game: &mut Match, square: u32, tile: AmmoTile) {
        if let Some(SquareKind::Ammo { tile: slot }) = game.board_mut().square_mut(sq(square)).map(|s| &mut s.kind) {
            *slot = Some(tile);
        }
    }

    #[test]
    fn test_actions_out_of_turn_are_rejected() {
        let (mut game, channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 4), (1, 5)]);
        let run = Action::new("run", &[BasicStep::Move(3)]);

        let err = ActionResolver::new(run.clone()).resolve(&mut game, p(0)).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation(_)));

        game.begin_turn(p(1)).unwrap();
        let err = ActionResolver::new(run).resolve(&mut game, p(0)).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation(_)));
        assert!(channels[0].prompts().is_empty());
        assert_eq!(game.board().position(p(0)), Some(sq(4)));
    }

    #[test]
    fn test_move_only_counts_when_position_changes() {
        let (mut game, _channels) = scripted_match(vec![vec![Scripted::Decline, Scripted::label("S6")], vec![], vec![]]);
        place(&mut game, &[(0, 4)]);
        let mut step = MoveResolver::new(2);
        assert_eq!(step.resolve(&mut game, p(0)).unwrap(), Resolution::NotCompleted);
        assert_eq!(step.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);
        assert_eq!(game.board().position(p(0)), Some(sq(6)));
    }

    #[test]
    fn test_grab_ammo_tile() {
        let (mut game, _channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 5)]);
        put_tile(
            &mut game,
            5,
            AmmoTile {
                id: CardId::new(900),
                ammo: smallvec![AmmoColor::Red, AmmoColor::Blue],
                power_up: true,
            },
        );
        let discarded_before = game.ammo_tiles.discarded();
        assert_eq!(GrabResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);

        let player = game.player(p(0)).unwrap();
        assert_eq!(player.ammo.red, 2);
        assert_eq!(player.ammo.blue, 2);
        assert_eq!(player.power_ups.len(), 1);
        assert_eq!(game.ammo_tiles.discarded(), discarded_before + 1);
    }

    #[test]
    fn test_grab_on_empty_square() {
        let (mut game, channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 5)]);
        assert_eq!(GrabResolver.resolve(&mut game, p(0)).unwrap(), Resolution::NotCompleted);
        assert_eq!(channels[0].messages().len(), 1);
    }

    #[test]
    fn test_full_hand_cancel_discards_the_drawn_card() {
        let (mut game, _channels) = scripted_match(vec![vec![Scripted::Cancel], vec![], vec![]]);
        place(&mut game, &[(0, 5)]);
        put_tile(
            &mut game,
            5,
            AmmoTile {
                id: CardId::new(901),
                ammo: smallvec![AmmoColor::Yellow],
                power_up: true,
            },
        );
        let hand = vec![
            power_up(0, PowerUpKind::Newton),
            power_up(1, PowerUpKind::Newton),
            power_up(2, PowerUpKind::Teleporter),
        ];
        game.player_mut(p(0)).unwrap().power_ups = hand.clone();
        let discarded_before = game.power_ups.discarded();

        assert_eq!(GrabResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Cancelled);
        assert_eq!(game.player(p(0)).unwrap().power_ups, hand);
        assert_eq!(game.power_ups.discarded(), discarded_before + 1);
    }

    #[test]
    fn test_buy_weapon_at_spawn() {
        let (mut game, _channels) = scripted_match(vec![vec![Scripted::label("lock_rifle")], vec![], vec![]]);
        // Blue spawn
        place(&mut game, &[(0, 2)]);
        if let Some(SquareKind::Spawn { weapons, .. }) = game.board_mut().square_mut(sq(2)).map(|s| &mut s.kind) {
            *weapons = vec![WeaponId::from("lock_rifle"), WeaponId::from("zx2")];
        }
        assert_eq!(GrabResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);
        let player = game.player(p(0)).unwrap();
        assert_eq!(player.loaded_weapons(), vec![WeaponId::from("lock_rifle")]);
        // Purchase cost of BB is one blue cube
        assert_eq!(player.ammo.blue, 0);
        match &game.board().square(sq(2)).unwrap().kind {
            SquareKind::Spawn { weapons, .. } => assert_eq!(weapons, &vec![WeaponId::from("zx2")]),
            other => panic!("expected a spawn square, got {:?}", other),
        }
    }

    #[test]
    fn test_reload_loop_notifies_once() {
        let (mut game, channels) = scripted_match(vec![
            vec![Scripted::label("sledgehammer"), Scripted::label("lock_rifle")],
            vec![],
            vec![],
        ]);
        {
            let player = game.player_mut(p(0)).unwrap();
            player.ammo = AmmoPool { red: 0, blue: 1, yellow: 1 };
            player.weapons = vec![
                OwnedWeapon { id: WeaponId::from("sledgehammer"), loaded: false },
                OwnedWeapon { id: WeaponId::from("lock_rifle"), loaded: false },
            ];
        }
        assert_eq!(ReloadResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);

        let player = game.player(p(0)).unwrap();
        assert_eq!(player.loaded_weapons(), vec![WeaponId::from("sledgehammer")]);
        assert_eq!(player.unloaded_weapons(), vec![WeaponId::from("lock_rifle")]);
        assert_eq!(channels[0].messages().len(), 1);
    }

    #[test]
    fn test_shoot_without_loaded_weapon() {
        let (mut game, channels) = scripted_match(vec![vec![], vec![], vec![]]);
        place(&mut game, &[(0, 4)]);
        assert_eq!(ShootResolver.resolve(&mut game, p(0)).unwrap(), Resolution::NotCompleted);
        assert_eq!(channels[0].messages().len(), 1);
        assert!(channels[0].prompts().is_empty());
    }

    #[test]
    fn test_shoot_unloads_and_opens_revenge_window() {
        let (mut game, channels) = scripted_match(vec![
            vec![Scripted::label("zx2"), Scripted::label("basic"), Scripted::label("P1")],
            vec![Scripted::Pick(0)],
            vec![],
        ]);
        place(&mut game, &[(0, 4), (1, 5), (2, 0)]);
        game.player_mut(p(0)).unwrap().weapons = vec![OwnedWeapon::loaded(WeaponId::from("zx2"))];
        game.player_mut(p(1)).unwrap().power_ups = vec![power_up(7, PowerUpKind::TagbackGrenade)];

        assert_eq!(ShootResolver.resolve(&mut game, p(0)).unwrap(), Resolution::Completed);
        assert_eq!(game.player(p(0)).unwrap().unloaded_weapons(), vec![WeaponId::from("zx2")]);
        assert_eq!(game.player(p(1)).unwrap().board.damage_count(), 1);
        assert_eq!(game.player(p(1)).unwrap().board.marks_from(p(0)), 2);

        // The grenade marked the shooter and was spent
        assert_eq!(game.player(p(0)).unwrap().board.marks_from(p(1)), 1);
        assert!(game.player(p(1)).unwrap().power_ups.is_empty());
        assert_eq!(channels[1].scenes(), vec![Scene::Revenge, Scene::Board]);
        assert_eq!(channels[1].timers_started(), 1);
        assert_eq!(channels[1].timers_stopped(), 1);
    }

    #[test]
    fn test_cancelled_revenge_window_moves_on() {
        let (mut game, channels) = scripted_match(vec![
            vec![],
            vec![Scripted::Cancel],
            vec![],
        ]);
        place(&mut game, &[(0, 4), (1, 5)]);
        game.player_mut(p(1)).unwrap().power_ups = vec![power_up(3, PowerUpKind::TagbackGrenade)];
        revenge_windows(&mut game, p(0), &[p(1)]).unwrap();
        assert_eq!(game.player(p(1)).unwrap().power_ups.len(), 1);
        assert!(!channels[1].timer_running());
    }
}
