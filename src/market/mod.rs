//! Marketplace entities, store contract, and the offer lifecycle engine.

mod engine;
mod memory;
mod store;
mod types;

pub use engine::OfferEngine;
pub use memory::MemoryStore;
pub use store::{ListingTxn, MarketStore};
pub use types::{
    Condition, Listing, ListingDraft, ListingId, Offer, OfferId, OfferStatus, UserId,
};
