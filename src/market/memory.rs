//! In-process implementation of the market store.
//!
//! Backs tests and single-instance deployments. Listings carry a version
//! counter bumped on every commit; a commit whose version no longer matches
//! is rejected as a conflict, which gives per-listing serializability
//! without any lock shared across listings.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{Result, TradepostError};

use super::store::{ListingTxn, MarketStore};
use super::types::{Listing, ListingId, Offer, OfferId};

/// In-memory market store with per-listing optimistic locking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    listings: DashMap<ListingId, Listing>,
    offers: DashMap<OfferId, Offer>,
    /// Offer ids per listing, in creation order.
    by_listing: DashMap<ListingId, Vec<OfferId>>,
    /// One commit lock per listing; never held across listings.
    commit_locks: DashMap<ListingId, Arc<Mutex<()>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn commit_lock(&self, id: ListingId) -> Arc<Mutex<()>> {
        self.commit_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn listing(&self, id: ListingId) -> Result<Option<Listing>> {
        Ok(self.listings.get(&id).map(|l| l.clone()))
    }

    async fn offer(&self, id: OfferId) -> Result<Option<Offer>> {
        Ok(self.offers.get(&id).map(|o| o.clone()))
    }

    async fn offers_for_listing(&self, id: ListingId) -> Result<Vec<Offer>> {
        let ids = match self.by_listing.get(&id) {
            Some(ids) => ids.clone(),
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|oid| self.offers.get(oid).map(|o| o.clone()))
            .collect())
    }

    async fn insert_listing(&self, listing: Listing) -> Result<()> {
        let id = listing.id;
        self.by_listing.entry(id).or_default();
        self.listings.insert(id, listing);
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<()> {
        let lock = self.commit_lock(id);
        let _guard = lock.lock();

        if self.listings.remove(&id).is_none() {
            return Err(TradepostError::NotFound("listing"));
        }
        // Cascade: every offer on the listing goes with it.
        if let Some((_, offer_ids)) = self.by_listing.remove(&id) {
            for oid in offer_ids {
                self.offers.remove(&oid);
            }
        }
        self.commit_locks.remove(&id);
        Ok(())
    }

    async fn commit(&self, txn: ListingTxn) -> Result<()> {
        let id = txn.listing.id;
        let lock = self.commit_lock(id);
        let _guard = lock.lock();

        {
            let stored = self
                .listings
                .get(&id)
                .ok_or(TradepostError::NotFound("listing"))?;
            if stored.version != txn.listing.version {
                return Err(TradepostError::Conflict(format!(
                    "listing {} was modified concurrently (expected version {}, found {})",
                    id, txn.listing.version, stored.version
                )));
            }
        }

        for (oid, status) in txn.status_updates {
            if let Some(mut offer) = self.offers.get_mut(&oid) {
                offer.status = status;
            }
        }

        if let Some(offer) = txn.insert_offer {
            self.by_listing.entry(id).or_default().push(offer.id);
            self.offers.insert(offer.id, offer);
        }

        // The version-bumped listing row goes last: a reader that observes
        // the new version must also observe every offer write of this
        // commit, otherwise an acceptance could recompute aggregates
        // without a just-created offer and still pass the version check.
        let mut updated = txn.listing;
        updated.version += 1;
        self.listings.insert(id, updated);

        Ok(())
    }
}
