//! Marketplace entities and value types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TradepostError};

/// Longest accepted listing title.
const MAX_TITLE_LEN: usize = 200;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a listing.
    ListingId
);
id_type!(
    /// Identifier of an offer.
    OfferId
);
id_type!(
    /// Identifier of a user (seller or buyer).
    UserId
);

/// Physical condition of a listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LightlyUsed,
    ModeratelyUsed,
    HeavilyUsed,
    Damaged,
}

/// Lifecycle state of an offer.
///
/// `Pending` is the initial state; `Accepted` and `Rejected` are terminal.
/// An offer moves to `Accepted` only by being accepted directly, and to
/// `Rejected` only as a side effect of a sibling's acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    /// Whether this status is terminal.
    pub fn is_settled(&self) -> bool {
        !matches!(self, OfferStatus::Pending)
    }
}

/// A buyer's monetary offer on a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub listing_id: ListingId,
    pub buyer_id: UserId,
    /// Always positive; validated on creation.
    pub amount: Decimal,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

/// A marketplace listing together with its derived offer aggregates.
///
/// `total_offers` and `max_offer` are maintained by the offer engine:
/// incremented on each offer creation, recomputed from the full offer set
/// on acceptance. `version` is bumped by the store on every committed write
/// and backs its optimistic concurrency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: UserId,
    pub title: String,
    pub price: Decimal,
    pub condition: Condition,
    pub details: String,
    /// Whether the listing still accepts offers.
    pub active: bool,
    pub total_offers: u64,
    pub max_offer: Decimal,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// Seller-supplied listing fields, validated before they touch the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub price: Decimal,
    pub condition: Condition,
    pub details: String,
}

impl ListingDraft {
    /// Validate the draft against the listing field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TradepostError::Validation("title must not be empty".into()));
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(TradepostError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        // decimal(10,2) range from the schema
        let min_price = Decimal::new(1, 2);
        let max_price = Decimal::new(999_999_999_999, 2);
        if self.price < min_price || self.price > max_price {
            return Err(TradepostError::Validation(format!(
                "price must be between {} and {}",
                min_price, max_price
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> ListingDraft {
        ListingDraft {
            title: "Chrono Trigger".to_string(),
            price: dec!(59.99),
            condition: Condition::LightlyUsed,
            details: "Cartridge only".to_string(),
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert!(matches!(
            d.validate(),
            Err(TradepostError::Validation(_))
        ));
    }

    #[test]
    fn test_overlong_title_rejected() {
        let mut d = draft();
        d.title = "x".repeat(201);
        assert!(d.validate().is_err());

        d.title = "x".repeat(200);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_price_bounds() {
        let mut d = draft();

        d.price = dec!(0.00);
        assert!(d.validate().is_err());

        d.price = dec!(0.01);
        assert!(d.validate().is_ok());

        d.price = dec!(9999999999.99);
        assert!(d.validate().is_ok());

        d.price = dec!(10000000000.00);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_status_settled() {
        assert!(!OfferStatus::Pending.is_settled());
        assert!(OfferStatus::Accepted.is_settled());
        assert!(OfferStatus::Rejected.is_settled());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ListingId::new(), ListingId::new());
    }
}
