//! # Ledger Rules
//!
//! Pure decision tables shared by every storage plugin, so the memory
//! and SQLite stores execute identical reaction and purchase semantics
//! inside their own atomic units.

use crate::error::{CoreError, Result};
use crate::models::ReactionKind;
use uuid::Uuid;

/// What a reaction application does to the (user, post) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    /// No prior record: insert one with the requested kind.
    Insert,
    /// Prior record of the same kind: toggle-off, delete the record.
    Remove,
    /// Prior record of the other kind: overwrite it with the requested kind.
    Switch { from: ReactionKind },
}

/// Resolves the transition for a requested reaction given the existing
/// record, if any. Repeating the same kind is a toggle-off: it is the
/// only contract that keeps client and server state reconcilable.
pub fn reaction_transition(
    existing: Option<ReactionKind>,
    requested: ReactionKind,
) -> ReactionTransition {
    match existing {
        None => ReactionTransition::Insert,
        Some(prior) if prior == requested => ReactionTransition::Remove,
        Some(prior) => ReactionTransition::Switch { from: prior },
    }
}

impl ReactionTransition {
    /// Counter deltas `(likes, dislikes)` this transition applies to the
    /// post, given the requested kind. A switch moves one unit between
    /// the counters; insert/remove touch exactly one of them.
    pub fn counter_deltas(&self, requested: ReactionKind) -> (i64, i64) {
        let unit = |kind: ReactionKind, amount: i64| match kind {
            ReactionKind::Like => (amount, 0),
            ReactionKind::Dislike => (0, amount),
        };
        match self {
            ReactionTransition::Insert => unit(requested, 1),
            ReactionTransition::Remove => unit(requested, -1),
            ReactionTransition::Switch { from } => {
                let (l1, d1) = unit(*from, -1);
                let (l2, d2) = unit(requested, 1);
                (l1 + l2, d1 + d2)
            }
        }
    }

    /// The reaction kind that survives the transition, if any.
    pub fn surviving(&self, requested: ReactionKind) -> Option<ReactionKind> {
        match self {
            ReactionTransition::Remove => None,
            _ => Some(requested),
        }
    }
}

/// Validates a purchase and returns the post-debit balance.
///
/// Order matters: ownership is checked before funds, so buying an item
/// twice reports `AlreadyOwned` even when the balance ran dry since.
/// Neither failure touches the balance or the purchase set.
pub fn check_purchase(
    item_id: Uuid,
    balance: i64,
    price: i64,
    already_owned: bool,
) -> Result<i64> {
    if already_owned {
        return Err(CoreError::AlreadyOwned(item_id));
    }
    if balance < price {
        return Err(CoreError::InsufficientFunds { price, balance });
    }
    Ok(balance - price)
}
