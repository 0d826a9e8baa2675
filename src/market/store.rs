//! Durable store contract for listings and offers.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{Listing, ListingId, Offer, OfferId, OfferStatus};

/// All writes to one listing and its offers, applied atomically.
///
/// `listing.version` must equal the version the caller read; the store
/// rejects the transaction with a `Conflict` error when another writer got
/// there first, and bumps the stored version on success. This is what
/// serializes concurrent writers to the same listing without blocking
/// writers to unrelated listings.
#[derive(Debug, Clone)]
pub struct ListingTxn {
    /// The updated listing row, carrying the version that was read.
    pub listing: Listing,
    /// A new offer to persist alongside the listing update.
    pub insert_offer: Option<Offer>,
    /// Status transitions for existing offers of this listing.
    pub status_updates: Vec<(OfferId, OfferStatus)>,
}

impl ListingTxn {
    /// A transaction that only rewrites the listing row.
    pub fn listing_only(listing: Listing) -> Self {
        Self {
            listing,
            insert_offer: None,
            status_updates: Vec::new(),
        }
    }
}

/// Contract the offer engine requires from its durable store.
///
/// Implementations must apply [`commit`](Self::commit) atomically per
/// listing, signal serialization failures as
/// [`TradepostError::Conflict`](crate::error::TradepostError::Conflict),
/// and cascade-delete a listing's offers when the listing is deleted.
/// Operations against different listings must never contend.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Fetch a listing by id.
    async fn listing(&self, id: ListingId) -> Result<Option<Listing>>;

    /// Fetch an offer by id.
    async fn offer(&self, id: OfferId) -> Result<Option<Offer>>;

    /// Fetch every offer for a listing, in creation order.
    async fn offers_for_listing(&self, id: ListingId) -> Result<Vec<Offer>>;

    /// Persist a brand-new listing.
    async fn insert_listing(&self, listing: Listing) -> Result<()>;

    /// Delete a listing and, by cascade, all of its offers.
    async fn delete_listing(&self, id: ListingId) -> Result<()>;

    /// Atomically apply all writes in `txn`, guarded by its version.
    async fn commit(&self, txn: ListingTxn) -> Result<()>;
}
