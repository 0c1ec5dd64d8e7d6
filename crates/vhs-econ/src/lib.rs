#![deny(warnings)]

//! Shop economics: pricing and the evening restock for VHS Trader.
//!
//! This module provides validated utilities for:
//! - Resale pricing (always twice the wholesale price)
//! - Price bands and genre filters over the catalog
//! - Annotated purchasable listings and the purchase itself

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use vhs_core::{Catalog, GameError, Shelf, Title, TitleId};

/// Resale markup over the wholesale price.
pub const SALE_MULTIPLIER: u64 = 2;

/// Price a customer pays for `title`.
///
/// Example:
/// a title bought for 150 sells for 300.
pub fn sale_price(title: &Title) -> u64 {
    u64::from(title.base_price) * SALE_MULTIPLIER
}

/// Wholesale price bands used by the shop filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBand {
    /// base price <= 100
    Cheap,
    /// 100 < base price <= 300
    Medium,
    /// base price > 300
    Expensive,
}

impl PriceBand {
    pub const ALL: [PriceBand; 3] = [PriceBand::Cheap, PriceBand::Medium, PriceBand::Expensive];

    pub fn contains(self, base_price: u32) -> bool {
        match self {
            PriceBand::Cheap => base_price <= 100,
            PriceBand::Medium => base_price > 100 && base_price <= 300,
            PriceBand::Expensive => base_price > 300,
        }
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceBand::Cheap => "cheap",
            PriceBand::Medium => "medium",
            PriceBand::Expensive => "expensive",
        };
        f.write_str(s)
    }
}

/// Unrecognized price band name.
#[derive(Debug, Error, PartialEq)]
#[error("unknown price band: {0}")]
pub struct ParseBandError(pub String);

impl FromStr for PriceBand {
    type Err = ParseBandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cheap" => Ok(PriceBand::Cheap),
            "medium" => Ok(PriceBand::Medium),
            "expensive" => Ok(PriceBand::Expensive),
            other => Err(ParseBandError(other.to_string())),
        }
    }
}

/// Optional catalog filters; `None` means no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopFilter {
    pub genre: Option<String>,
    pub price: Option<PriceBand>,
}

impl ShopFilter {
    pub fn matches(&self, title: &Title) -> bool {
        let genre_ok = self.genre.as_deref().map_or(true, |g| title.has_genre(g));
        let price_ok = self.price.map_or(true, |b| b.contains(title.base_price));
        genre_ok && price_ok
    }
}

/// Why a listed title cannot be bought right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseBlock {
    InsufficientFunds,
    NoEmptySlot,
}

/// One row of the evening catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub title: Title,
    pub purchasable: bool,
    pub blocked: Option<PurchaseBlock>,
}

/// Funds are checked before shelf space.
pub fn purchase_block(balance: u64, base_price: u32, empty_slots: usize) -> Option<PurchaseBlock> {
    if balance < u64::from(base_price) {
        Some(PurchaseBlock::InsufficientFunds)
    } else if empty_slots == 0 {
        Some(PurchaseBlock::NoEmptySlot)
    } else {
        None
    }
}

/// Unowned catalog titles passing `filter`, in catalog order, annotated
/// with whether they can be bought.
pub fn list_purchasable(
    catalog: &Catalog,
    owned: &BTreeSet<TitleId>,
    balance: u64,
    empty_slots: usize,
    filter: &ShopFilter,
) -> Vec<ListingEntry> {
    catalog
        .titles
        .iter()
        .filter(|t| !owned.contains(&t.id))
        .filter(|t| filter.matches(t))
        .map(|t| {
            let blocked = purchase_block(balance, t.base_price, empty_slots);
            ListingEntry {
                title: t.clone(),
                purchasable: blocked.is_none(),
                blocked,
            }
        })
        .collect()
}

/// Outcome of a successful purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Slot the title was placed in.
    pub slot: usize,
    /// Amount deducted.
    pub price: u64,
    /// Balance after the purchase.
    pub balance: u64,
}

/// Buy `title` onto the shelf. On failure neither the shelf nor the balance
/// changes.
pub fn purchase(shelf: &mut Shelf, balance: u64, title: &Title) -> Result<Purchase, GameError> {
    if shelf.is_owned(&title.id) {
        return Err(GameError::AlreadyOwned(title.id.clone()));
    }
    let price = u64::from(title.base_price);
    let remaining = balance
        .checked_sub(price)
        .ok_or(GameError::InsufficientFunds { price, balance })?;
    let slot = shelf.place(title.clone())?;
    debug!(title = %title.id, slot, price, remaining, "title purchased");
    Ok(Purchase {
        slot,
        price,
        balance: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vhs_core::{RequestTemplate, SHELF_SLOTS};

    fn title(id: &str, price: u32, genres: &[&str]) -> Title {
        Title {
            id: TitleId::new(id),
            display_name: id.to_string(),
            original_name: id.to_string(),
            year: 1990,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            description: String::new(),
            base_price: price,
            cover: String::new(),
        }
    }

    fn catalog() -> Catalog {
        let titles = vec![
            title("cheap-horror", 60, &["horror"]),
            title("edge-cheap", 100, &["comedy"]),
            title("edge-medium", 101, &["comedy", "horror"]),
            title("medium-action", 300, &["action"]),
            title("pricey-drama", 301, &["drama"]),
            title("epic", 500, &["drama", "romance"]),
        ];
        let requests = vec![RequestTemplate {
            text: "scare me".into(),
            linked_titles: [TitleId::new("cheap-horror")].into(),
        }];
        Catalog { titles, requests }
    }

    fn ids(entries: &[ListingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.id.as_str()).collect()
    }

    #[test]
    fn sale_price_doubles_base() {
        assert_eq!(sale_price(&title("t", 150, &[])), 300);
    }

    #[test]
    fn price_band_edges() {
        assert!(PriceBand::Cheap.contains(100));
        assert!(!PriceBand::Cheap.contains(101));
        assert!(PriceBand::Medium.contains(101));
        assert!(PriceBand::Medium.contains(300));
        assert!(PriceBand::Expensive.contains(301));
        assert_eq!("Medium".parse::<PriceBand>(), Ok(PriceBand::Medium));
        assert!("free".parse::<PriceBand>().is_err());
    }

    #[test]
    fn listing_excludes_owned_and_applies_filters() {
        let c = catalog();
        let owned: BTreeSet<TitleId> = [TitleId::new("epic")].into();
        let all = list_purchasable(&c, &owned, 1000, 3, &ShopFilter::default());
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|e| e.purchasable));

        let horror = ShopFilter {
            genre: Some("horror".into()),
            price: None,
        };
        assert_eq!(
            ids(&list_purchasable(&c, &owned, 1000, 3, &horror)),
            vec!["cheap-horror", "edge-medium"]
        );

        let expensive = ShopFilter {
            genre: None,
            price: Some(PriceBand::Expensive),
        };
        assert_eq!(
            ids(&list_purchasable(&c, &owned, 1000, 3, &expensive)),
            vec!["pricey-drama"]
        );
    }

    #[test]
    fn funds_block_takes_precedence() {
        let c = catalog();
        let listing = list_purchasable(&c, &BTreeSet::new(), 100, 0, &ShopFilter::default());
        let by_id = |id: &str| listing.iter().find(|e| e.title.id.as_str() == id).unwrap();
        assert_eq!(by_id("cheap-horror").blocked, Some(PurchaseBlock::NoEmptySlot));
        assert_eq!(by_id("epic").blocked, Some(PurchaseBlock::InsufficientFunds));
        assert!(!by_id("epic").purchasable);
    }

    #[test]
    fn insufficient_funds_leaves_state_untouched() {
        let mut shelf = Shelf::new();
        let t = title("t150", 150, &[]);
        let err = purchase(&mut shelf, 100, &t).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientFunds {
                price: 150,
                balance: 100
            }
        );
        assert_eq!(shelf, Shelf::new());
    }

    #[test]
    fn purchase_places_and_deducts() {
        let mut shelf = Shelf::new();
        let t = title("t", 120, &[]);
        let p = purchase(&mut shelf, 500, &t).unwrap();
        assert_eq!(p.balance, 380);
        assert_eq!(p.price, 120);
        assert_eq!(shelf.get(p.slot).map(|x| &x.id), Some(&t.id));
        assert_eq!(
            purchase(&mut shelf, 380, &t),
            Err(GameError::AlreadyOwned(t.id.clone()))
        );
    }

    #[test]
    fn full_shelf_blocks_purchase() {
        let mut shelf = Shelf::new();
        for i in 0..SHELF_SLOTS {
            shelf.place(title(&format!("s{i}"), 10, &[])).unwrap();
        }
        let before = shelf.clone();
        assert_eq!(
            purchase(&mut shelf, 1000, &title("x", 10, &[])),
            Err(GameError::NoEmptySlot)
        );
        assert_eq!(shelf, before);
    }

    proptest! {
        #[test]
        fn filters_are_idempotent(balance in 0u64..1000, empty in 0usize..=SHELF_SLOTS,
                                  genre in proptest::option::of(proptest::sample::select(vec!["horror", "drama", "comedy"])),
                                  band in proptest::option::of(0usize..3)) {
            let c = catalog();
            let f = ShopFilter { genre: genre.map(String::from), price: band.map(|i| PriceBand::ALL[i]) };
            let owned = BTreeSet::new();
            let a = list_purchasable(&c, &owned, balance, empty, &f);
            let b = list_purchasable(&c, &owned, balance, empty, &f);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn balance_never_negative(balance in 0u64..600, price in 1u32..700) {
            let mut shelf = Shelf::new();
            match purchase(&mut shelf, balance, &title("t", price, &[])) {
                Ok(p) => prop_assert_eq!(p.balance + u64::from(price), balance),
                Err(e) => {
                    let funds = matches!(e, GameError::InsufficientFunds { .. });
                    prop_assert!(funds, "unexpected error {:?}", e);
                }
            }
        }
    }
}
