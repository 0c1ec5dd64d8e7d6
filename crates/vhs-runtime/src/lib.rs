#![deny(warnings)]

//! Day/evening game engine for VHS Trader.
//!
//! [`step`] is a pure transition: it takes the current [`GameState`] and an
//! [`Action`] and returns the next state together with the events the
//! presentation layer should react to. A rejected action returns an error
//! and leaves the input state untouched. Presentation delays (the pause
//! after a sale or a refusal) belong to the view; the engine advances to the
//! next customer immediately and reports what happened through events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};
use vhs_core::{Catalog, GameConfig, GameError, Phase, RandomSource, Shelf, TitleId};
use vhs_customers::{draw_customer_count, generate_day, CustomerInstance};
use vhs_econ::{purchase, sale_price, ListingEntry};

mod controller;

pub use controller::{GameController, GameView, NullView, RecordingView, SlotView, Snapshot};

/// Canned phrases a customer leaves with after a wrong offer.
pub const REJECTIONS: [&str; 5] = [
    "No, that's not it... I'll look somewhere else.",
    "Hmm, doesn't fit. Goodbye!",
    "That's not what I was looking for. Good luck!",
    "No, thanks. I'll keep looking.",
    "Not what I wanted. All the best!",
];

/// Player commands accepted by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    StartDay,
    Offer { slot: usize },
    SkipCustomer,
    EndDay,
    Buy { title: TitleId },
    CloseShop,
    Restart,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartDay => "start day",
            Action::Offer { .. } => "offer",
            Action::SkipCustomer => "skip customer",
            Action::EndDay => "end day",
            Action::Buy { .. } => "buy",
            Action::CloseShop => "close shop",
            Action::Restart => "restart",
        }
    }
}

/// Which milestone ended the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryReason {
    UniqueTitles,
    TotalSales,
}

/// Final result reported when a milestone is reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victory {
    pub reason: VictoryReason,
    /// Count that triggered the milestone.
    pub count: usize,
    pub balance: u64,
    pub day: u32,
    pub message: String,
}

impl Victory {
    fn new(reason: VictoryReason, count: usize, balance: u64, day: u32) -> Self {
        let headline = match reason {
            VictoryReason::UniqueTitles => format!("You sold {count} different titles!"),
            VictoryReason::TotalSales => format!("You sold {count} tapes!"),
        };
        Self {
            reason,
            count,
            balance,
            day,
            message: format!("{headline} Your balance: {balance}. Days: {day}."),
        }
    }
}

/// Unique-title milestone first, then total sales.
pub fn evaluate_win(
    unique_sold: usize,
    total_sold: u32,
    config: &GameConfig,
) -> Option<(VictoryReason, usize)> {
    if unique_sold >= config.unique_sales_goal {
        Some((VictoryReason::UniqueTitles, unique_sold))
    } else if total_sold >= config.total_sales_goal {
        Some((VictoryReason::TotalSales, total_sold as usize))
    } else {
        None
    }
}

/// Header counters shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub balance: u64,
    pub unique_sold: usize,
    pub total_sold: u32,
    pub day: u32,
}

/// The customer at the counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerView {
    /// 1-based position in today's queue.
    pub position: usize,
    pub total: usize,
    pub avatar: String,
    pub request: String,
}

/// State-change feed consumed by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    DayStarted {
        day: u32,
        customers: usize,
    },
    CustomerArrived(CustomerView),
    SaleCompleted {
        slot: usize,
        title: TitleId,
        price: u64,
        message: String,
    },
    SaleRejected {
        slot: usize,
        title: TitleId,
        message: String,
    },
    CustomerSkipped {
        position: usize,
    },
    StatsUpdated(Stats),
    TitlePurchased {
        slot: usize,
        title: TitleId,
        price: u64,
    },
    Listing {
        entries: Vec<ListingEntry>,
    },
    VictoryReached(Victory),
    GameRestarted,
}

/// One game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameState {
    balance: u64,
    day: u32,
    total_sold: u32,
    unique_sold: BTreeSet<TitleId>,
    phase: Phase,
    shelf: Shelf,
    queue: Vec<CustomerInstance>,
    customer_index: usize,
    victory: Option<Victory>,
}

/// Result of a successful [`step`].
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

/// Apply `action` to `state`. The input state is never modified.
pub fn step<R: RandomSource>(
    state: &GameState,
    action: &Action,
    catalog: &Catalog,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Transition, GameError> {
    let mut next = state.clone();
    let mut events = Vec::new();
    match action {
        Action::StartDay => {
            next.require(Phase::AwaitingStart, action)?;
            next.start_day(catalog, config, rng, &mut events);
        }
        Action::Offer { slot } => next.offer(*slot, config, rng, &mut events)?,
        Action::SkipCustomer => next.skip_customer(&mut events)?,
        Action::EndDay => {
            next.require(Phase::Trading, action)?;
            info!(day = next.day, "day ended early");
            next.close_day(&mut events);
        }
        Action::Buy { title } => {
            next.require(Phase::Shopping, action)?;
            next.buy(title, catalog, &mut events)?;
        }
        Action::CloseShop => {
            next.require(Phase::Shopping, action)?;
            next.close_shop(&mut events);
        }
        Action::Restart => {
            next = GameState::new(config, catalog, rng);
            events.push(GameEvent::GameRestarted);
            events.push(GameEvent::StatsUpdated(next.stats()));
        }
    }
    Ok(Transition {
        state: next,
        events,
    })
}

impl GameState {
    /// Fresh session: starting balance, day 1, a randomly stocked shelf.
    pub fn new<R: RandomSource>(config: &GameConfig, catalog: &Catalog, rng: &mut R) -> Self {
        Self {
            balance: config.starting_balance,
            day: 1,
            total_sold: 0,
            unique_sold: BTreeSet::new(),
            phase: Phase::AwaitingStart,
            shelf: Shelf::stocked(rng, catalog),
            queue: Vec::new(),
            customer_index: 0,
            victory: None,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn total_sold(&self) -> u32 {
        self.total_sold
    }

    pub fn unique_sold(&self) -> &BTreeSet<TitleId> {
        &self.unique_sold
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn queue(&self) -> &[CustomerInstance] {
        &self.queue
    }

    pub fn customer_index(&self) -> usize {
        self.customer_index
    }

    pub fn victory(&self) -> Option<&Victory> {
        self.victory.as_ref()
    }

    /// Customer currently at the counter; only while trading.
    pub fn active_customer(&self) -> Option<&CustomerInstance> {
        if self.phase != Phase::Trading {
            return None;
        }
        self.queue.get(self.customer_index)
    }

    pub fn customer_view(&self) -> Option<CustomerView> {
        self.active_customer().map(|c| CustomerView {
            position: self.customer_index + 1,
            total: self.queue.len(),
            avatar: c.avatar.clone(),
            request: c.request.text.clone(),
        })
    }

    pub fn stats(&self) -> Stats {
        Stats {
            balance: self.balance,
            unique_sold: self.unique_sold.len(),
            total_sold: self.total_sold,
            day: self.day,
        }
    }

    fn require(&self, phase: Phase, action: &Action) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                action: action.name(),
                phase: self.phase,
            })
        }
    }

    fn set_phase(&mut self, to: Phase, events: &mut Vec<GameEvent>) {
        if self.phase != to {
            events.push(GameEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }

    fn start_day<R: RandomSource>(
        &mut self,
        catalog: &Catalog,
        config: &GameConfig,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let count = draw_customer_count(rng, config.min_customers, config.max_customers);
        self.queue = generate_day(rng, count, &self.shelf.owned_ids(), catalog);
        self.customer_index = 0;
        info!(day = self.day, customers = self.queue.len(), "day started");
        self.set_phase(Phase::Trading, events);
        events.push(GameEvent::DayStarted {
            day: self.day,
            customers: self.queue.len(),
        });
        self.announce_customer(events);
    }

    fn offer<R: RandomSource>(
        &mut self,
        slot: usize,
        config: &GameConfig,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let customer = self.active_customer().ok_or(GameError::NoActiveCustomer)?;
        let title = self
            .shelf
            .get(slot)
            .ok_or(GameError::InvalidSlotSelection(slot))?;
        let matched = customer.wants(&title.id);
        let title_id = title.id.clone();

        if !matched {
            let message = rng.choose(&REJECTIONS).copied().unwrap_or(REJECTIONS[0]);
            debug!(slot, title = %title_id, "offer rejected");
            events.push(GameEvent::SaleRejected {
                slot,
                title: title_id,
                message: message.to_string(),
            });
            self.advance(events);
            return Ok(());
        }

        let sold = self.shelf.remove(slot)?;
        let price = sale_price(&sold);
        self.balance = self.balance.saturating_add(price);
        self.total_sold = self.total_sold.saturating_add(1);
        self.unique_sold.insert(sold.id.clone());
        debug!(slot, title = %sold.id, price, balance = self.balance, "sale completed");
        events.push(GameEvent::SaleCompleted {
            slot,
            title: sold.id,
            price,
            message: format!("Great! Exactly what I was looking for! Here's {price}."),
        });
        events.push(GameEvent::StatsUpdated(self.stats()));

        if let Some((reason, count)) =
            evaluate_win(self.unique_sold.len(), self.total_sold, config)
        {
            let victory = Victory::new(reason, count, self.balance, self.day);
            info!(?reason, count, balance = self.balance, day = self.day, "victory");
            self.set_phase(Phase::Victory, events);
            events.push(GameEvent::VictoryReached(victory.clone()));
            self.victory = Some(victory);
            return Ok(());
        }
        self.advance(events);
        Ok(())
    }

    fn skip_customer(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.active_customer().is_none() {
            return Err(GameError::NoActiveCustomer);
        }
        events.push(GameEvent::CustomerSkipped {
            position: self.customer_index + 1,
        });
        self.advance(events);
        Ok(())
    }

    fn advance(&mut self, events: &mut Vec<GameEvent>) {
        self.customer_index += 1;
        if self.customer_index >= self.queue.len() {
            info!(day = self.day, "queue exhausted");
            self.close_day(events);
        } else {
            self.announce_customer(events);
        }
    }

    fn announce_customer(&mut self, events: &mut Vec<GameEvent>) {
        match self.customer_view() {
            Some(view) => events.push(GameEvent::CustomerArrived(view)),
            None => self.close_day(events),
        }
    }

    fn close_day(&mut self, events: &mut Vec<GameEvent>) {
        self.queue.clear();
        self.customer_index = 0;
        self.set_phase(Phase::Closed, events);
        self.set_phase(Phase::Shopping, events);
    }

    fn buy(
        &mut self,
        id: &TitleId,
        catalog: &Catalog,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let title = catalog
            .title(id)
            .ok_or_else(|| GameError::UnknownTitle(id.clone()))?;
        let bought = purchase(&mut self.shelf, self.balance, title)?;
        self.balance = bought.balance;
        events.push(GameEvent::TitlePurchased {
            slot: bought.slot,
            title: id.clone(),
            price: bought.price,
        });
        events.push(GameEvent::StatsUpdated(self.stats()));
        Ok(())
    }

    fn close_shop(&mut self, events: &mut Vec<GameEvent>) {
        self.day += 1;
        info!(day = self.day, balance = self.balance, "shop closed, next day");
        self.set_phase(Phase::AwaitingStart, events);
        events.push(GameEvent::StatsUpdated(self.stats()));
    }
}
