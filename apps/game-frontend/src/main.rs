#![deny(warnings)]

//! Minimal headless HUD: engine events are folded into an ECS resource
//! once per frame.

use bevy_ecs::prelude::*;
use vhs_core::{Catalog, GameConfig, Phase, RandomSource};
use vhs_runtime::{GameController, GameEvent, RecordingView};

/// Events published since the last frame.
#[derive(Resource, Default)]
struct Inbox(Vec<GameEvent>);

#[derive(Resource, Default, Debug)]
struct HudState {
    phase: Option<Phase>,
    day: u32,
    balance: u64,
    unique_sold: usize,
    total_sold: u32,
    counter: String,
    request: String,
    toast: String,
    buyable: usize,
    victory: Option<String>,
}

fn apply_events_system(mut inbox: ResMut<Inbox>, mut hud: ResMut<HudState>) {
    for event in inbox.0.drain(..) {
        match event {
            GameEvent::PhaseChanged { to, .. } => {
                hud.phase = Some(to);
                if to != Phase::Trading {
                    hud.counter.clear();
                    hud.request.clear();
                }
            }
            GameEvent::DayStarted { day, .. } => {
                hud.day = day;
                hud.toast.clear();
            }
            GameEvent::CustomerArrived(c) => {
                hud.counter = format!("Customer {} of {}", c.position, c.total);
                hud.request = format!("{} {}", c.avatar, c.request);
            }
            GameEvent::SaleCompleted { message, .. } | GameEvent::SaleRejected { message, .. } => {
                hud.toast = message
            }
            GameEvent::CustomerSkipped { .. } => hud.toast = "Next!".into(),
            GameEvent::StatsUpdated(s) => {
                hud.balance = s.balance;
                hud.unique_sold = s.unique_sold;
                hud.total_sold = s.total_sold;
                hud.day = s.day;
            }
            GameEvent::TitlePurchased { title, .. } => hud.toast = format!("Bought {title}"),
            GameEvent::Listing { entries } => {
                hud.buyable = entries.iter().filter(|e| e.purchasable).count()
            }
            GameEvent::VictoryReached(v) => hud.victory = Some(v.message),
            GameEvent::GameRestarted => *hud = HudState::default(),
        }
    }
}

fn render(hud: &HudState) -> String {
    let phase = hud.phase.map_or_else(|| "-".to_string(), |p| p.to_string());
    format!(
        "day={} phase={} balance={} unique={} total={} | {} {} | {}",
        hud.day, phase, hud.balance, hud.unique_sold, hud.total_sold, hud.counter, hud.request, hud.toast
    )
}

/// Move pending engine events into the world and run one tick.
fn frame<R: RandomSource>(
    world: &mut World,
    schedule: &mut Schedule,
    game: &mut GameController<RecordingView, R>,
) {
    let events = game.view_mut().drain();
    world.resource_mut::<Inbox>().0.extend(events);
    schedule.run(world);
}

fn new_world() -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(Inbox::default());
    world.insert_resource(HudState::default());
    let mut schedule = Schedule::default();
    schedule.add_systems(apply_events_system);
    (world, schedule)
}

fn main() -> anyhow::Result<()> {
    let (mut world, mut schedule) = new_world();
    let mut game = GameController::new(
        Catalog::builtin()?,
        GameConfig::default(),
        RecordingView::default(),
    )?;

    // One day of play: offer the first matching tape, otherwise wave the customer on.
    game.start_day()?;
    frame(&mut world, &mut schedule, &mut game);
    println!("{}", render(world.resource::<HudState>()));
    while let Some(customer) = game.state().active_customer() {
        let slot = game
            .state()
            .shelf()
            .slots()
            .iter()
            .position(|s| s.as_ref().is_some_and(|t| customer.wants(&t.id)));
        match slot {
            Some(slot) => game.offer(slot)?,
            None => game.skip_customer()?,
        }
        frame(&mut world, &mut schedule, &mut game);
        println!("{}", render(world.resource::<HudState>()));
    }
    let hud = world.resource::<HudState>();
    println!(
        "game-frontend: day over | balance={} buyable={}",
        hud.balance, hud.buyable
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vhs_core::SequenceRandom;

    #[test]
    fn smoke_initializes_and_ticks_once() {
        let (mut world, mut schedule) = new_world();
        let config = GameConfig {
            rng_seed: Some(3),
            ..GameConfig::default()
        };
        let mut game =
            GameController::new(Catalog::builtin().unwrap(), config, RecordingView::default())
                .unwrap();
        game.start_day().unwrap();
        frame(&mut world, &mut schedule, &mut game);
        let hud = world.resource::<HudState>();
        assert_eq!(hud.phase, Some(Phase::Trading));
        assert_eq!(hud.day, 1);
        assert!(hud.counter.starts_with("Customer 1 of "));
        assert!(world.resource::<Inbox>().0.is_empty());
    }

    #[test]
    fn skipping_everyone_reaches_the_shop() {
        let (mut world, mut schedule) = new_world();
        let mut game = GameController::with_rng(
            Catalog::builtin().unwrap(),
            GameConfig::default(),
            RecordingView::default(),
            SequenceRandom::default(),
        );
        game.start_day().unwrap();
        while game.state().active_customer().is_some() {
            game.skip_customer().unwrap();
        }
        frame(&mut world, &mut schedule, &mut game);
        let hud = world.resource::<HudState>();
        assert_eq!(hud.phase, Some(Phase::Shopping));
        assert_eq!(hud.toast, "Next!");
        assert!(hud.counter.is_empty());
        // full shelf: nothing can be bought
        assert_eq!(hud.buyable, 0);
    }
}
