//! Session orchestration and the view-update interface.

use crate::{step, Action, CustomerView, GameEvent, GameState, Stats, Transition, Victory};
use serde::Serialize;
use tracing::{debug, info, warn};
use vhs_core::{
    Catalog, ConfigError, GameConfig, GameError, Phase, RandomSource, SeededRandom, TitleId,
};
use vhs_econ::{list_purchasable, sale_price, ListingEntry, PriceBand, ShopFilter};

/// Receives every event the engine produces, in order.
pub trait GameView {
    fn on_event(&mut self, event: &GameEvent);
}

/// Discards events.
#[derive(Debug, Default)]
pub struct NullView;

impl GameView for NullView {
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Keeps every event; handy for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<GameEvent>,
}

impl RecordingView {
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl GameView for RecordingView {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

/// One shelf position as shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub slot: usize,
    pub title: Option<TitleId>,
    pub label: Option<String>,
    pub sale_price: Option<u64>,
}

/// Everything a renderer needs to redraw the screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub stats: Stats,
    pub shelf: Vec<SlotView>,
    pub empty_slots: usize,
    pub customer: Option<CustomerView>,
    pub filter: ShopFilter,
    pub victory: Option<Victory>,
}

/// Holds the current session and turns player commands into transitions.
pub struct GameController<V: GameView = NullView, R: RandomSource = SeededRandom> {
    catalog: Catalog,
    config: GameConfig,
    state: GameState,
    filter: ShopFilter,
    rng: R,
    view: V,
}

impl<V: GameView> GameController<V, SeededRandom> {
    /// Validate `config` and start a session seeded from it.
    pub fn new(catalog: Catalog, config: GameConfig, view: V) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = SeededRandom::from_config(config.rng_seed);
        info!(seed = rng.seed(), "new game");
        Ok(Self::with_rng(catalog, config, view, rng))
    }
}

impl<V: GameView, R: RandomSource> GameController<V, R> {
    pub fn with_rng(catalog: Catalog, config: GameConfig, view: V, mut rng: R) -> Self {
        let state = GameState::new(&config, &catalog, &mut rng);
        Self {
            catalog,
            config,
            state,
            filter: ShopFilter::default(),
            rng,
            view,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn filter(&self) -> &ShopFilter {
        &self.filter
    }

    /// Run `action` against the current state and publish the resulting events.
    pub fn dispatch(&mut self, action: Action) -> Result<(), GameError> {
        match step(
            &self.state,
            &action,
            &self.catalog,
            &self.config,
            &mut self.rng,
        ) {
            Ok(Transition { state, events }) => {
                self.state = state;
                for event in &events {
                    self.view.on_event(event);
                }
                if self.state.phase() == Phase::Shopping {
                    self.publish_listing();
                }
                Ok(())
            }
            Err(err) => {
                match err {
                    GameError::WrongPhase { .. } => {
                        warn!(action = action.name(), %err, "action rejected")
                    }
                    _ => debug!(action = action.name(), %err, "action rejected"),
                }
                Err(err)
            }
        }
    }

    pub fn start_day(&mut self) -> Result<(), GameError> {
        self.dispatch(Action::StartDay)
    }

    pub fn offer(&mut self, slot: usize) -> Result<(), GameError> {
        self.dispatch(Action::Offer { slot })
    }

    pub fn skip_customer(&mut self) -> Result<(), GameError> {
        self.dispatch(Action::SkipCustomer)
    }

    pub fn end_day(&mut self) -> Result<(), GameError> {
        self.dispatch(Action::EndDay)
    }

    pub fn buy(&mut self, title: &TitleId) -> Result<(), GameError> {
        self.dispatch(Action::Buy {
            title: title.clone(),
        })
    }

    pub fn close_shop(&mut self) -> Result<(), GameError> {
        self.dispatch(Action::CloseShop)
    }

    /// Throw the session away and start over; also acknowledges a victory.
    pub fn restart(&mut self) -> Result<(), GameError> {
        self.filter = ShopFilter::default();
        self.dispatch(Action::Restart)
    }

    pub fn set_genre_filter(&mut self, genre: Option<String>) {
        self.filter.genre = genre;
        self.filter_changed();
    }

    pub fn set_price_filter(&mut self, price: Option<PriceBand>) {
        self.filter.price = price;
        self.filter_changed();
    }

    /// Evening catalog under the current filter.
    pub fn listing(&self) -> Vec<ListingEntry> {
        let shelf = self.state.shelf();
        list_purchasable(
            &self.catalog,
            &shelf.owned_ids(),
            self.state.balance(),
            shelf.empty_slots(),
            &self.filter,
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        let shelf = self
            .state
            .shelf()
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, title)| SlotView {
                slot,
                title: title.as_ref().map(|t| t.id.clone()),
                label: title.as_ref().map(|t| t.display_name.clone()),
                sale_price: title.as_ref().map(sale_price),
            })
            .collect();
        Snapshot {
            phase: self.state.phase(),
            stats: self.state.stats(),
            shelf,
            empty_slots: self.state.shelf().empty_slots(),
            customer: self.state.customer_view(),
            filter: self.filter.clone(),
            victory: self.state.victory().cloned(),
        }
    }

    fn filter_changed(&mut self) {
        debug!(genre = ?self.filter.genre, price = ?self.filter.price, "shop filter changed");
        if self.state.phase() == Phase::Shopping {
            self.publish_listing();
        }
    }

    fn publish_listing(&mut self) {
        let entries = self.listing();
        self.view.on_event(&GameEvent::Listing { entries });
    }
}
