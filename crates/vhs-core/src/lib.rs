#![deny(warnings)]

//! Core domain models and invariants for VHS Trader.
//!
//! This crate defines the serializable catalog types shared across the
//! game, the fixed-size shelf, the injectable random source, and the
//! validation helpers that run once before any session begins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

mod rng;
mod shelf;

pub use rng::{RandomSource, SeededRandom, SequenceRandom};
pub use shelf::{Shelf, SHELF_SLOTS};

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.yaml");

/// Unique identifier for a catalog title, e.g. "terminator".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TitleId(pub String);

impl TitleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TitleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A cassette title that can be stocked and sold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Catalog key.
    pub id: TitleId,
    /// Name printed on the shelf label.
    pub display_name: String,
    /// Original release name.
    pub original_name: String,
    /// Release year.
    pub year: i32,
    /// Genre tags, matched exactly by the shop filter.
    #[serde(default)]
    pub genres: BTreeSet<String>,
    /// Blurb shown on the title card.
    #[serde(default)]
    pub description: String,
    /// Wholesale price paid in the evening shop (> 0).
    pub base_price: u32,
    /// Opaque cover asset handle; resolving it is up to the presentation layer.
    #[serde(default)]
    pub cover: String,
}

impl Title {
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }
}

/// A scripted customer want, satisfied by any of its linked titles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTemplate {
    /// Phrase shown to the player.
    pub text: String,
    /// Titles that satisfy this request (non-empty).
    pub linked_titles: BTreeSet<TitleId>,
}

impl RequestTemplate {
    pub fn is_satisfied_by(&self, id: &TitleId) -> bool {
        self.linked_titles.contains(id)
    }

    /// True when at least one linked title is in `ids`.
    pub fn links_any(&self, ids: &BTreeSet<TitleId>) -> bool {
        !self.linked_titles.is_disjoint(ids)
    }
}

/// Static universe of titles and customer requests; read-only at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub titles: Vec<Title>,
    pub requests: Vec<RequestTemplate>,
}

impl Catalog {
    /// Catalog bundled with the crate, validated.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a YAML catalog with `titles` and `requests` lists.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Parse(e.to_string()))?;
        validate_catalog(&catalog)?;
        debug!(
            titles = catalog.titles.len(),
            requests = catalog.requests.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn title(&self, id: &TitleId) -> Option<&Title> {
        self.titles.iter().find(|t| &t.id == id)
    }

    /// Sorted, de-duplicated union of every genre tag.
    pub fn genres(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self.titles.iter().flat_map(|t| &t.genres).collect();
        all.into_iter().cloned().collect()
    }

    /// Indices of request templates linked to at least one of `ids`.
    pub fn requests_linked_to(&self, ids: &BTreeSet<TitleId>) -> Vec<usize> {
        self.requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.links_any(ids))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Phase of the day/evening cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Morning: waiting for the player to open the shop.
    AwaitingStart,
    /// Customers are being served.
    Trading,
    /// The day is over; transient hand-off to the evening shop.
    Closed,
    /// Evening restock.
    Shopping,
    /// A sales milestone was reached; only a restart is accepted.
    Victory,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::AwaitingStart => "awaiting start",
            Phase::Trading => "trading",
            Phase::Closed => "closed",
            Phase::Shopping => "shopping",
            Phase::Victory => "victory",
        };
        f.write_str(s)
    }
}

/// Recoverable gameplay errors. A failed action never changes game state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Shelf is full.
    #[error("no empty shelf slot")]
    NoEmptySlot,
    /// Purchase price exceeds the balance.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: u64, balance: u64 },
    /// Slot is out of range or empty.
    #[error("invalid slot selection: {0}")]
    InvalidSlotSelection(usize),
    /// Offer or skip outside of trading.
    #[error("no active customer")]
    NoActiveCustomer,
    /// Title is already on the shelf.
    #[error("title already owned: {0}")]
    AlreadyOwned(TitleId),
    /// Title is not in the catalog.
    #[error("unknown title: {0}")]
    UnknownTitle(TitleId),
    /// Action is not accepted in the current phase.
    #[error("{action} is not allowed while {phase}")]
    WrongPhase { action: &'static str, phase: Phase },
}

/// Catalog validation errors, reported once at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("duplicate title id: {0}")]
    DuplicateTitle(TitleId),
    #[error("title {0} must have a positive base price")]
    NonPositivePrice(TitleId),
    #[error("title {0:?} has an empty id or name")]
    EmptyName(TitleId),
    #[error("title {0}: year {1} is out of supported range [1900, 2100]")]
    YearOutOfRange(TitleId, i32),
    #[error("request #{0} has empty text")]
    EmptyRequestText(usize),
    #[error("request #{0} links no titles")]
    EmptyRequestLinks(usize),
    #[error("request #{request} links unknown title {title}")]
    UnknownLinkedTitle { request: usize, title: TitleId },
    #[error("catalog has {titles} titles, at least {required} are needed to stock the shelf")]
    CatalogTooSmall { titles: usize, required: usize },
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Validate a single title.
pub fn validate_title(title: &Title) -> Result<(), ValidationError> {
    if title.id.0.trim().is_empty() || title.display_name.trim().is_empty() {
        return Err(ValidationError::EmptyName(title.id.clone()));
    }
    if title.base_price == 0 {
        return Err(ValidationError::NonPositivePrice(title.id.clone()));
    }
    if !(1900..=2100).contains(&title.year) {
        return Err(ValidationError::YearOutOfRange(title.id.clone(), title.year));
    }
    Ok(())
}

/// Validate the catalog, including cross-references from requests to titles.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&TitleId> = BTreeSet::new();
    for t in &catalog.titles {
        validate_title(t)?;
        if !ids.insert(&t.id) {
            return Err(ValidationError::DuplicateTitle(t.id.clone()));
        }
    }
    if catalog.titles.len() < SHELF_SLOTS {
        return Err(ValidationError::CatalogTooSmall {
            titles: catalog.titles.len(),
            required: SHELF_SLOTS,
        });
    }
    for (i, r) in catalog.requests.iter().enumerate() {
        if r.text.trim().is_empty() {
            return Err(ValidationError::EmptyRequestText(i));
        }
        if r.linked_titles.is_empty() {
            return Err(ValidationError::EmptyRequestLinks(i));
        }
        if let Some(missing) = r.linked_titles.iter().find(|id| !ids.contains(id)) {
            return Err(ValidationError::UnknownLinkedTitle {
                request: i,
                title: missing.clone(),
            });
        }
    }
    Ok(())
}

/// Game tuning parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Balance at game start and after every restart.
    pub starting_balance: u64,
    /// Fewest customers per day.
    pub min_customers: usize,
    /// Most customers per day.
    pub max_customers: usize,
    /// Distinct titles sold that win the game.
    pub unique_sales_goal: usize,
    /// Total sales that win the game.
    pub total_sales_goal: u32,
    /// Seed for deterministic RNG; drawn from entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: 500,
            min_customers: 5,
            max_customers: 8,
            unique_sales_goal: 50,
            total_sales_goal: 100,
            rng_seed: None,
        }
    }
}

/// Upper bound on `max_customers`.
pub const MAX_CUSTOMERS_PER_DAY: usize = 100;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid customers-per-day range [{min}, {max}]")]
    InvalidCustomerRange { min: usize, max: usize },
    #[error("sales goals must be > 0")]
    ZeroGoal,
    #[error("at most {limit} customers per day, got {max}")]
    TooManyCustomers { max: usize, limit: usize },
}

impl GameConfig {
    /// Parse from YAML; missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_customers == 0 || self.min_customers > self.max_customers {
            return Err(ConfigError::InvalidCustomerRange {
                min: self.min_customers,
                max: self.max_customers,
            });
        }
        if self.max_customers > MAX_CUSTOMERS_PER_DAY {
            return Err(ConfigError::TooManyCustomers {
                max: self.max_customers,
                limit: MAX_CUSTOMERS_PER_DAY,
            });
        }
        if self.unique_sales_goal == 0 || self.total_sales_goal == 0 {
            return Err(ConfigError::ZeroGoal);
        }
        Ok(())
    }
}
