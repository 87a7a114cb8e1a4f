use super::BookingEngine;
use wayfare_core::error::Result;
use wayfare_core::types::{ItemKey, NewReview, Review, UserId};
use wayfare_core::{BookingError, StoreError};

/// Ratings accepted for a review.
const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

impl BookingEngine {
    /// Records a user's review of an item.
    ///
    /// # Errors
    ///
    /// - `Validation`: rating outside 1 to 5
    /// - `NotFound`: no such item
    /// - `AlreadyReviewed`: the user already reviewed this item
    #[tracing::instrument(skip(self, comment))]
    pub async fn add_review(
        &self,
        user_id: UserId,
        item: ItemKey,
        rating: u8,
        comment: &str,
    ) -> Result<Review> {
        if !RATING_RANGE.contains(&rating) {
            return Err(BookingError::Validation(format!(
                "Rating must be between 1 and 5, got {rating}"
            )));
        }
        self.load_item(item).await?;

        let review = NewReview {
            user_id,
            item,
            rating,
            comment: comment.trim().to_string(),
            created_at: self.clock.now(),
        };
        match self.store.insert_review(review).await {
            Ok(review) => {
                tracing::info!(review_id = %review.id, "Review added");
                Ok(review)
            }
            Err(StoreError::Conflict(_)) => {
                tracing::warn!("Duplicate review rejected");
                Err(BookingError::AlreadyReviewed { user_id, item })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reviews of an item, newest first.
    ///
    /// # Errors
    ///
    /// - `Store`: the query failed
    pub async fn reviews_for(&self, item: ItemKey) -> Result<Vec<Review>> {
        Ok(self.store.reviews_for(item).await?)
    }
}
