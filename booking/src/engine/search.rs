//! Transport and hotel search.

use super::BookingEngine;
use crate::search::{FLEXIBLE_DAYS, HotelSearch, TransportResults, TransportSearch, day_window};
use chrono::{DateTime, Utc};
use wayfare_core::error::Result;
use wayfare_core::types::InventoryItem;

impl BookingEngine {
    /// Bookable flights, trains or buses on a route.
    ///
    /// Sold-out items are never returned. With a date, departures on that day are
    /// returned; if there are none, departures up to [`FLEXIBLE_DAYS`] either side are
    /// returned and `flexible` is set. Carrier and bus type filters apply to both.
    ///
    /// # Errors
    ///
    /// - `Validation`: see [`TransportSearch::validate`]
    /// - `Store`: the query failed
    #[tracing::instrument(skip(self, search), fields(kind = %search.kind, date = ?search.date))]
    pub async fn search_transport(&self, search: &TransportSearch) -> Result<TransportResults> {
        search.validate()?;

        let Some(date) = search.date else {
            let items = self.available(search, None).await?;
            return Ok(TransportResults::sorted(items, search.sort, false));
        };

        let items = self.available(search, Some(day_window(date, 0))).await?;
        if !items.is_empty() {
            tracing::debug!(found = items.len(), "Departures found on the requested day");
            return Ok(TransportResults::sorted(items, search.sort, false));
        }

        let items = self
            .available(search, Some(day_window(date, FLEXIBLE_DAYS)))
            .await?;
        let flexible = !items.is_empty();
        if flexible {
            tracing::debug!(
                found = items.len(),
                "No departures on the requested day, showing nearby dates"
            );
        }
        Ok(TransportResults::sorted(items, search.sort, flexible))
    }

    async fn available(
        &self,
        search: &TransportSearch,
        departing: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<InventoryItem>> {
        let items = self
            .store
            .available_on_route(
                search.kind,
                search.origin.trim().to_string(),
                search.destination.trim().to_string(),
                departing,
            )
            .await?;
        Ok(items.into_iter().filter(|item| search.accepts(item)).collect())
    }

    /// Rooms in hotels whose city contains `search.city`, highest rated first.
    ///
    /// # Errors
    ///
    /// - `Validation`: see [`HotelSearch::validate`]
    /// - `Store`: the query failed
    #[tracing::instrument(skip(self))]
    pub async fn search_hotels(&self, search: &HotelSearch) -> Result<Vec<InventoryItem>> {
        search.validate()?;
        let rooms = self
            .store
            .rooms_in_city(search.city.trim().to_string(), search.min_stars.unwrap_or(1))
            .await?;
        tracing::debug!(found = rooms.len(), "Hotel search finished");
        Ok(rooms)
    }
}
