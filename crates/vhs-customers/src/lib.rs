#![deny(warnings)]

//! Daily customer generation.
//!
//! A day's queue is biased toward what is on the shelf: about half of the
//! requests are drawn from templates that some shelved title satisfies,
//! the rest from the whole catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;
use vhs_core::{Catalog, RandomSource, RequestTemplate, TitleId};

/// Avatar tags handed to customers, repeats allowed.
pub const AVATARS: [&str; 10] = [
    "🧑", "👩", "👨", "🧔", "👱", "👵", "👴", "🧒", "👩‍🦰", "🧑‍🎤",
];

/// A request template paired with the avatar shown for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInstance {
    pub request: RequestTemplate,
    pub avatar: String,
}

impl CustomerInstance {
    pub fn wants(&self, id: &TitleId) -> bool {
        self.request.is_satisfied_by(id)
    }
}

/// Number of customers for a day, uniform in `[min, max]`.
pub fn draw_customer_count<R: RandomSource>(rng: &mut R, min: usize, max: usize) -> usize {
    rng.range_inclusive(min, max)
}

/// How many of `count` requests are drawn from shelf-linked templates.
pub fn linked_quota(count: usize) -> usize {
    count.div_ceil(2)
}

/// Pick template indices for a day of `count` customers, in final order.
///
/// First pass: shuffle the templates linked to `shelf_ids` and take up to
/// [`linked_quota`] of them. Second pass: shuffle every template and take
/// unused ones until `count` are chosen. The selection is shuffled once
/// more. Returns fewer than `count` when the catalog runs out.
pub fn select_requests<R: RandomSource>(
    rng: &mut R,
    count: usize,
    shelf_ids: &BTreeSet<TitleId>,
    catalog: &Catalog,
) -> Vec<usize> {
    let quota = linked_quota(count);
    let mut chosen: Vec<usize> = Vec::with_capacity(count.min(catalog.requests.len()));
    let mut used: BTreeSet<usize> = BTreeSet::new();

    let mut linked = catalog.requests_linked_to(shelf_ids);
    rng.shuffle(&mut linked);
    for idx in linked {
        if chosen.len() >= quota {
            break;
        }
        if used.insert(idx) {
            chosen.push(idx);
        }
    }
    let linked_taken = chosen.len();

    let mut all: Vec<usize> = (0..catalog.requests.len()).collect();
    rng.shuffle(&mut all);
    for idx in all {
        if chosen.len() >= count {
            break;
        }
        if used.insert(idx) {
            chosen.push(idx);
        }
    }

    rng.shuffle(&mut chosen);
    debug!(
        count,
        linked = linked_taken,
        selected = chosen.len(),
        "customer requests selected"
    );
    chosen
}

/// Build the day's customer queue.
pub fn generate_day<R: RandomSource>(
    rng: &mut R,
    count: usize,
    shelf_ids: &BTreeSet<TitleId>,
    catalog: &Catalog,
) -> Vec<CustomerInstance> {
    select_requests(rng, count, shelf_ids, catalog)
        .into_iter()
        .map(|idx| {
            let avatar = rng.choose(&AVATARS).copied().unwrap_or(AVATARS[0]);
            CustomerInstance {
                request: catalog.requests[idx].clone(),
                avatar: avatar.to_string(),
            }
        })
        .collect()
}
