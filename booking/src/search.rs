//! Inventory search: bookable transport on a route and hotel rooms by city.
//!
//! Transport searches only return items with capacity left. A search for a date that
//! has no departures is widened to [`FLEXIBLE_DAYS`] either side; the results say so.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::types::{InventoryItem, ItemDetails, ItemKind, Money};

/// Days either side of the requested date searched when that day has no departures.
pub const FLEXIBLE_DAYS: i64 = 3;

/// Ordering of transport search results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Cheapest first (lowest fare class for trains)
    #[default]
    Price,
    /// Earliest departure first
    Departure,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Price => "price",
            Self::Departure => "departure",
        })
    }
}

impl FromStr for SortBy {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "departure" => Ok(Self::Departure),
            other => Err(BookingError::Validation(format!(
                "Unknown sort order '{other}'"
            ))),
        }
    }
}

/// A search for flights, trains or buses on a route.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use wayfare_booking::search::{SortBy, TransportSearch};
/// use wayfare_core::types::ItemKind;
///
/// let search = TransportSearch::new(ItemKind::Flight, "DEL", "BOM")
///     .on(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
///     .carrier("indigo")
///     .sort_by(SortBy::Departure);
/// assert_eq!(search.carrier.as_deref(), Some("indigo"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportSearch {
    /// Flight, train or bus
    pub kind: ItemKind,
    /// Departure airport, station or city
    pub origin: String,
    /// Arrival airport, station or city
    pub destination: String,
    /// Travel date; `None` searches every date
    pub date: Option<NaiveDate>,
    /// Case-insensitive fragment of the airline, train name or bus operator
    pub carrier: Option<String>,
    /// Bus type (Sleeper, Seater, ...), matched case-insensitively; buses only
    pub bus_type: Option<String>,
    /// Result ordering
    pub sort: SortBy,
}

impl TransportSearch {
    /// Searches every date on a route, cheapest first.
    #[must_use]
    pub fn new(kind: ItemKind, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            kind,
            origin: origin.into(),
            destination: destination.into(),
            date: None,
            carrier: None,
            bus_type: None,
            sort: SortBy::default(),
        }
    }

    /// Restricts the search to departures on `date`, widened when that day has none
    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Filters by airline, train name or bus operator
    #[must_use]
    pub fn carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = Some(carrier.into());
        self
    }

    /// Filters buses by type
    #[must_use]
    pub fn bus_type(mut self, bus_type: impl Into<String>) -> Self {
        self.bus_type = Some(bus_type.into());
        self
    }

    /// Sets the result ordering
    #[must_use]
    pub const fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    /// Checks the search can be run.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if the kind is a room, origin or destination is
    /// blank, or a bus type is given for anything but buses.
    pub fn validate(&self) -> Result<()> {
        if self.kind.vehicle_type().is_none() {
            return Err(BookingError::Validation(format!(
                "A {} has no route to search",
                self.kind
            )));
        }
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(BookingError::Validation(
                "Origin and destination are required".to_string(),
            ));
        }
        if self.bus_type.is_some() && self.kind != ItemKind::Bus {
            return Err(BookingError::Validation(format!(
                "Bus types do not apply to a {}",
                self.kind
            )));
        }
        Ok(())
    }

    /// Whether `item` passes the carrier and bus type filters
    #[must_use]
    pub fn accepts(&self, item: &InventoryItem) -> bool {
        let carrier_ok = filter(self.carrier.as_deref()).is_none_or(|wanted| {
            item.details
                .carrier()
                .is_some_and(|carrier| carrier.to_lowercase().contains(&wanted.to_lowercase()))
        });
        let bus_type_ok = filter(self.bus_type.as_deref()).is_none_or(|wanted| match &item.details {
            ItemDetails::Bus { bus_type, .. } => bus_type.eq_ignore_ascii_case(wanted),
            _ => false,
        });
        carrier_ok && bus_type_ok
    }
}

/// A blank filter is no filter.
fn filter(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Transport search results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransportResults {
    /// Matching items with capacity left, in the requested order
    pub items: Vec<InventoryItem>,
    /// The requested date had nothing and the results come from nearby dates
    pub flexible: bool,
}

impl TransportResults {
    /// Orders `items` and wraps them.
    #[must_use]
    pub fn sorted(mut items: Vec<InventoryItem>, sort: SortBy, flexible: bool) -> Self {
        let departure = |item: &InventoryItem| item.details.schedule().map(|s| s.departure);
        let price = |item: &InventoryItem| item.lowest_price().unwrap_or(Money::ZERO);
        match sort {
            SortBy::Price => items.sort_by_key(|item| (price(item), departure(item), item.id)),
            SortBy::Departure => items.sort_by_key(|item| (departure(item), price(item), item.id)),
        }
        Self { items, flexible }
    }
}

/// A search for hotel rooms by city.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotelSearch {
    /// Case-insensitive fragment of the city
    pub city: String,
    /// Minimum hotel star rating
    pub min_stars: Option<u8>,
}

impl HotelSearch {
    /// Searches every hotel in `city`.
    #[must_use]
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            min_stars: None,
        }
    }

    /// Keeps hotels rated at least `stars`
    #[must_use]
    pub const fn min_stars(mut self, stars: u8) -> Self {
        self.min_stars = Some(stars);
        self
    }

    /// Checks the search can be run.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if the city is blank or the star filter is
    /// outside 1 to 5.
    pub fn validate(&self) -> Result<()> {
        if self.city.trim().is_empty() {
            return Err(BookingError::Validation(
                "A city is required to search hotels".to_string(),
            ));
        }
        match self.min_stars {
            Some(stars) if !(1..=5).contains(&stars) => Err(BookingError::Validation(format!(
                "Star rating must be between 1 and 5, got {stars}"
            ))),
            _ => Ok(()),
        }
    }
}

/// `[start, end)` in UTC covering `date` and `spread` days either side.
#[must_use]
pub fn day_window(date: NaiveDate, spread: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = date
        .checked_sub_signed(Duration::days(spread))
        .unwrap_or(NaiveDate::MIN);
    let after_last = date
        .checked_add_signed(Duration::days(spread + 1))
        .unwrap_or(NaiveDate::MAX);
    (
        first.and_time(NaiveTime::MIN).and_utc(),
        after_last.and_time(NaiveTime::MIN).and_utc(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wayfare_core::types::{ItemId, Route, Schedule};
    use wayfare_testing::fixtures::{bus_details, flight_details, train_details};

    fn item(id: i64, details: ItemDetails) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(id),
            details,
            initial_capacity: 10,
            available_capacity: 10,
        }
    }

    fn flight(id: i64, airline: &str, day: u32, hour: u32, price: u64) -> InventoryItem {
        let departure = Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap();
        item(
            id,
            ItemDetails::Flight {
                flight_number: format!("FL-{id}"),
                airline: airline.to_string(),
                route: Route::new("DEL", "BOM"),
                schedule: Schedule::new(departure, departure + Duration::hours(2)),
                price: Money::from_minor(price),
            },
        )
    }

    #[test]
    fn day_window_spans_whole_days() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let (from, until) = day_window(date, 0);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());

        let (from, until) = day_window(date, FLEXIBLE_DAYS);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2026, 3, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn sort_by_price_then_departure() {
        let items = vec![
            flight(1, "IndiGo", 14, 18, 5000),
            flight(2, "Air India", 14, 6, 5000),
            flight(3, "Vistara", 14, 12, 4200),
        ];
        let ids = |sort: SortBy| -> Vec<i64> {
            TransportResults::sorted(items.clone(), sort, false)
                .items
                .iter()
                .map(|i| i.id.value())
                .collect()
        };
        assert_eq!(ids(SortBy::Price), vec![3, 2, 1]);
        assert_eq!(ids(SortBy::Departure), vec![2, 3, 1]);
    }

    #[test]
    fn carrier_and_bus_type_filters() {
        let search = TransportSearch::new(ItemKind::Flight, "DEL", "BOM").carrier(" indi ");
        assert!(search.accepts(&flight(1, "IndiGo", 14, 6, 5000)));
        assert!(!search.accepts(&flight(2, "Air India", 14, 6, 5000)));

        let blank = TransportSearch::new(ItemKind::Flight, "DEL", "BOM").carrier("  ");
        assert!(blank.accepts(&flight(2, "Air India", 14, 6, 5000)));

        let sleeper = TransportSearch::new(ItemKind::Bus, "Pune", "Goa").bus_type("sleeper");
        assert!(sleeper.accepts(&item(3, bus_details("Pune", "Goa"))));
        let seater = TransportSearch::new(ItemKind::Bus, "Pune", "Goa").bus_type("Seater");
        assert!(!seater.accepts(&item(3, bus_details("Pune", "Goa"))));

        let train = TransportSearch::new(ItemKind::Train, "NDLS", "MMCT").carrier("rajdhani");
        assert!(train.accepts(&item(4, train_details("NDLS", "MMCT"))));
    }

    #[test]
    fn invalid_searches_are_rejected() {
        for bad in [
            TransportSearch::new(ItemKind::Room, "Goa", "Goa"),
            TransportSearch::new(ItemKind::Bus, " ", "Goa"),
            TransportSearch::new(ItemKind::Flight, "DEL", "BOM").bus_type("Sleeper"),
        ] {
            assert!(matches!(bad.validate(), Err(BookingError::Validation(_))));
        }
        assert!(TransportSearch::new(ItemKind::Flight, "DEL", "BOM").validate().is_ok());
        assert!(item(9, flight_details("DEL", "BOM")).details.carrier().is_some());

        assert!(HotelSearch::new("  ").validate().is_err());
        assert!(HotelSearch::new("Goa").min_stars(0).validate().is_err());
        assert!(HotelSearch::new("Goa").min_stars(6).validate().is_err());
        assert!(HotelSearch::new("Goa").min_stars(4).validate().is_ok());
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("Departure".parse::<SortBy>().unwrap(), SortBy::Departure);
        assert_eq!(" price ".parse::<SortBy>().unwrap(), SortBy::Price);
        assert!("rating".parse::<SortBy>().is_err());
    }
}
