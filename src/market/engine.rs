//! Offer lifecycle engine.
//!
//! All listing writes flow through version-guarded transactions against the
//! store. Each operation re-reads, re-validates, and rebuilds its writes on
//! a conflict, up to a small bounded number of retries, then surfaces the
//! conflict to the caller. Operations against different listings never
//! block each other; contention is per listing only.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::config::EngineSettings;
use crate::error::{Result, TradepostError};

use super::store::{ListingTxn, MarketStore};
use super::types::{
    Listing, ListingDraft, ListingId, Offer, OfferId, OfferStatus, UserId,
};

/// Conflicted commits retried before the conflict is surfaced.
const DEFAULT_COMMIT_RETRIES: u32 = 1;

/// Orchestrates offer creation and acceptance while keeping listing
/// aggregates consistent under concurrent access.
///
/// The engine owns no durable state; it holds working copies only for the
/// duration of one operation.
pub struct OfferEngine {
    store: Arc<dyn MarketStore>,
    commit_retries: u32,
}

impl OfferEngine {
    /// Create an engine with the default retry bound.
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self {
            store,
            commit_retries: DEFAULT_COMMIT_RETRIES,
        }
    }

    /// Create an engine from configuration.
    pub fn with_settings(store: Arc<dyn MarketStore>, settings: &EngineSettings) -> Self {
        Self {
            store,
            commit_retries: settings.commit_retries,
        }
    }

    /// Create a new listing for a seller.
    pub async fn create_listing(&self, seller_id: UserId, draft: ListingDraft) -> Result<Listing> {
        draft.validate()?;

        let listing = Listing {
            id: ListingId::new(),
            seller_id,
            title: draft.title,
            price: draft.price,
            condition: draft.condition,
            details: draft.details,
            active: true,
            total_offers: 0,
            max_offer: Decimal::ZERO,
            version: 0,
            created_at: Utc::now(),
        };
        self.store.insert_listing(listing.clone()).await?;

        debug!(listing = %listing.id, seller = %seller_id, "Listing created");
        Ok(listing)
    }

    /// Update a listing's seller-editable fields.
    ///
    /// The active flag, aggregates, and offer set are untouched.
    pub async fn update_listing(
        &self,
        listing_id: ListingId,
        acting_user_id: UserId,
        draft: ListingDraft,
    ) -> Result<Listing> {
        draft.validate()?;

        let mut attempt = 0;
        loop {
            let mut listing = self
                .store
                .listing(listing_id)
                .await?
                .ok_or(TradepostError::NotFound("listing"))?;
            if listing.seller_id != acting_user_id {
                return Err(TradepostError::Forbidden(
                    "only the seller may edit this listing".to_string(),
                ));
            }

            listing.title = draft.title.clone();
            listing.price = draft.price;
            listing.condition = draft.condition;
            listing.details = draft.details.clone();

            match self.store.commit(ListingTxn::listing_only(listing.clone())).await {
                Ok(()) => return Ok(listing),
                Err(e) => self.handle_conflict(e, &mut attempt, listing_id)?,
            }
        }
    }

    /// Delete a listing; the store cascade-deletes its offers.
    pub async fn delete_listing(
        &self,
        listing_id: ListingId,
        acting_user_id: UserId,
    ) -> Result<()> {
        let listing = self
            .store
            .listing(listing_id)
            .await?
            .ok_or(TradepostError::NotFound("listing"))?;
        if listing.seller_id != acting_user_id {
            return Err(TradepostError::Forbidden(
                "only the seller may delete this listing".to_string(),
            ));
        }

        self.store.delete_listing(listing_id).await?;
        debug!(listing = %listing_id, "Listing deleted");
        Ok(())
    }

    /// Submit a new offer on a listing.
    ///
    /// Persists the offer and updates the listing aggregates in one atomic
    /// commit: `total_offers` increments by one, `max_offer` rises to the
    /// new amount if it exceeds the maximum seen so far. Two concurrent
    /// creations against one listing are both reflected in the final
    /// aggregates; the loser of the version race re-reads and retries.
    pub async fn create_offer(
        &self,
        listing_id: ListingId,
        buyer_id: UserId,
        amount: Decimal,
    ) -> Result<Offer> {
        let mut attempt = 0;
        loop {
            let mut listing = self
                .store
                .listing(listing_id)
                .await?
                .ok_or(TradepostError::NotFound("listing"))?;
            if listing.seller_id == buyer_id {
                return Err(TradepostError::Forbidden(
                    "you cannot make an offer on your own listing".to_string(),
                ));
            }
            if !listing.active {
                return Err(TradepostError::InvalidState(
                    "this listing is no longer accepting offers".to_string(),
                ));
            }
            if amount <= Decimal::ZERO {
                return Err(TradepostError::Validation(
                    "offer amount must be greater than zero".to_string(),
                ));
            }

            let offer = Offer {
                id: OfferId::new(),
                listing_id,
                buyer_id,
                amount,
                status: OfferStatus::Pending,
                created_at: Utc::now(),
            };

            listing.total_offers += 1;
            if amount > listing.max_offer {
                listing.max_offer = amount;
            }

            let txn = ListingTxn {
                listing,
                insert_offer: Some(offer.clone()),
                status_updates: Vec::new(),
            };
            match self.store.commit(txn).await {
                Ok(()) => {
                    debug!(
                        offer = %offer.id,
                        listing = %listing_id,
                        %amount,
                        "Offer submitted"
                    );
                    return Ok(offer);
                }
                Err(e) => self.handle_conflict(e, &mut attempt, listing_id)?,
            }
        }
    }

    /// Accept a pending offer on behalf of the listing's seller.
    ///
    /// In one atomic commit: the target offer becomes `Accepted`, every
    /// other still-pending offer on the listing becomes `Rejected` (settled
    /// offers are untouched), the listing stops accepting offers, and the
    /// aggregates are recomputed from the full offer set read in the same
    /// transaction. The version guard ensures no offer created between the
    /// read and the commit can be missed; such a race re-reads and retries.
    pub async fn accept_offer(&self, offer_id: OfferId, acting_user_id: UserId) -> Result<()> {
        let mut attempt = 0;
        loop {
            let offer = self
                .store
                .offer(offer_id)
                .await?
                .ok_or(TradepostError::NotFound("offer"))?;
            let mut listing = self
                .store
                .listing(offer.listing_id)
                .await?
                .ok_or(TradepostError::NotFound("listing"))?;
            if listing.seller_id != acting_user_id {
                return Err(TradepostError::Forbidden(
                    "only the seller may accept offers on this listing".to_string(),
                ));
            }
            if !listing.active {
                return Err(TradepostError::InvalidState(
                    "this listing is closed".to_string(),
                ));
            }
            if offer.status != OfferStatus::Pending {
                return Err(TradepostError::InvalidState(
                    "only pending offers can be accepted".to_string(),
                ));
            }

            let siblings = self.store.offers_for_listing(offer.listing_id).await?;

            let mut status_updates = Vec::with_capacity(siblings.len());
            for o in &siblings {
                if o.id == offer.id {
                    status_updates.push((o.id, OfferStatus::Accepted));
                } else if o.status == OfferStatus::Pending {
                    status_updates.push((o.id, OfferStatus::Rejected));
                }
            }

            // Rebuild the aggregates from the full offer set rather than
            // trusting the incrementally maintained values.
            listing.active = false;
            listing.total_offers = siblings.len() as u64;
            listing.max_offer = siblings
                .iter()
                .map(|o| o.amount)
                .max()
                .unwrap_or(Decimal::ZERO);

            let txn = ListingTxn {
                listing: listing.clone(),
                insert_offer: None,
                status_updates,
            };
            match self.store.commit(txn).await {
                Ok(()) => {
                    debug!(
                        offer = %offer_id,
                        listing = %listing.id,
                        total_offers = listing.total_offers,
                        max_offer = %listing.max_offer,
                        "Offer accepted, listing closed"
                    );
                    return Ok(());
                }
                Err(e) => self.handle_conflict(e, &mut attempt, listing.id)?,
            }
        }
    }

    /// Swallow a conflict while retries remain; surface anything else.
    fn handle_conflict(
        &self,
        err: TradepostError,
        attempt: &mut u32,
        listing_id: ListingId,
    ) -> Result<()> {
        match err {
            TradepostError::Conflict(_) if *attempt < self.commit_retries => {
                *attempt += 1;
                trace!(
                    listing = %listing_id,
                    attempt = *attempt,
                    "Commit lost a version race, retrying"
                );
                Ok(())
            }
            TradepostError::Conflict(reason) => {
                warn!(listing = %listing_id, %reason, "Commit retries exhausted");
                Err(TradepostError::Conflict(reason))
            }
            other => Err(other),
        }
    }
}
