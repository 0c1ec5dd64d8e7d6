#![deny(warnings)]

//! Headless autoplayer: runs the shop for a number of days and prints the
//! event feed, either as text or as JSON lines.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vhs_core::{Catalog, GameConfig, Phase, TitleId};
use vhs_econ::ListingEntry;
use vhs_runtime::{GameController, GameEvent, GameView};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    days: Option<u32>,
    json: bool,
    version: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--catalog" => args.catalog = it.next().map(PathBuf::from),
            "--seed" => {
                let v = it.next().context("--seed needs a value")?;
                args.seed = Some(v.parse().with_context(|| format!("invalid seed: {v}"))?);
            }
            "--days" => {
                let v = it.next().context("--days needs a value")?;
                args.days = Some(v.parse().with_context(|| format!("invalid day count: {v}"))?);
            }
            "--json" => args.json = true,
            "--version" | "-V" => args.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Prints the event feed to stdout.
struct ConsoleView {
    json: bool,
}

impl GameView for ConsoleView {
    fn on_event(&mut self, event: &GameEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(%e, "event not serializable"),
            }
        } else if let Some(line) = describe(event) {
            println!("{line}");
        }
    }
}

fn describe(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::DayStarted { day, customers } => format!("Day {day}: {customers} customers"),
        GameEvent::CustomerArrived(c) => {
            format!("  [{}/{}] {} \"{}\"", c.position, c.total, c.avatar, c.request)
        }
        GameEvent::SaleCompleted { title, price, .. } => format!("    sold {title} for {price}"),
        GameEvent::SaleRejected { title, message, .. } => {
            format!("    offered {title}: \"{message}\"")
        }
        GameEvent::CustomerSkipped { .. } => "    skipped".to_string(),
        GameEvent::PhaseChanged {
            to: Phase::Shopping,
            ..
        } => "  closed for the night, restocking".to_string(),
        GameEvent::TitlePurchased { title, price, slot } => {
            format!("  bought {title} for {price} into slot {slot}")
        }
        GameEvent::VictoryReached(v) => format!("*** {} ***", v.message),
        _ => return None,
    };
    Some(line)
}

/// Offer a matching title to every customer, skip the rest.
fn serve_customers<V: GameView>(game: &mut GameController<V>) -> Result<()> {
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
    }
    Ok(())
}

/// Fill empty slots with requested titles, unsold and cheap ones first.
fn restock<V: GameView>(game: &mut GameController<V>) -> Result<()> {
    let sold = game.state().unique_sold().clone();
    let wanted: BTreeSet<TitleId> = game
        .catalog()
        .requests
        .iter()
        .flat_map(|r| r.linked_titles.iter().cloned())
        .collect();
    loop {
        let mut candidates: Vec<ListingEntry> = game
            .listing()
            .into_iter()
            .filter(|e| e.purchasable && wanted.contains(&e.title.id))
            .collect();
        candidates.sort_by_key(|e| (sold.contains(&e.title.id), e.title.base_price));
        let Some(pick) = candidates.into_iter().next() else {
            break;
        };
        game.buy(&pick.title.id)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup; stdout carries the event feed.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    if args.version {
        println!(
            "vhs-trader {} ({}, built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GameConfig::from_yaml_str(&text)?
        }
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    let catalog = match &args.catalog {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            Catalog::from_yaml_str(&text)?
        }
        None => Catalog::builtin()?,
    };
    info!(
        titles = catalog.titles.len(),
        requests = catalog.requests.len(),
        genres = ?catalog.genres(),
        "catalog ready"
    );

    let days = args.days.unwrap_or(30);
    let mut game = GameController::new(catalog, config, ConsoleView { json: args.json })?;
    for _ in 0..days {
        game.start_day()?;
        serve_customers(&mut game)?;
        if game.state().phase() == Phase::Victory {
            break;
        }
        restock(&mut game)?;
        game.close_shop()?;
    }

    let snap = game.snapshot();
    if args.json {
        println!("{}", serde_json::to_string(&snap)?);
    } else {
        println!(
            "Result | day: {} | balance: {} | unique sold: {} | total sold: {} | victory: {}",
            snap.stats.day,
            snap.stats.balance,
            snap.stats.unique_sold,
            snap.stats.total_sold,
            snap.victory.as_ref().map_or("no", |_| "yes")
        );
    }
    Ok(())
}
