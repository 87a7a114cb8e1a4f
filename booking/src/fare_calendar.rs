//! Per-day cheapest fares for a route over a calendar month.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use wayfare_core::BookingError;
use wayfare_core::error::Result;
use wayfare_core::types::{InventoryItem, Money};

/// A calendar month, e.g. `2026-03`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarMonth {
    /// Year
    pub year: i32,
    /// Month, 1 to 12
    pub month: u32,
}

impl CalendarMonth {
    /// Validates and creates a month.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Validation` if `month` is not in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(BookingError::Validation(format!(
                "{year}-{month:02} is not a calendar month"
            )));
        }
        Ok(Self { year, month })
    }

    /// The first day of the month
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The month after this one
    #[must_use]
    pub const fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `[start, end)` of the month in UTC
    #[must_use]
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.first_day().and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self.next().first_day().and_time(chrono::NaiveTime::MIN).and_utc();
        (start, end)
    }

    /// Whether `date` falls in this month
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BookingError::Validation(format!("'{s}' is not a YYYY-MM month"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        Self::new(
            year.parse().map_err(|_| invalid())?,
            month.parse().map_err(|_| invalid())?,
        )
    }
}

/// Cheapest departure of one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareDay {
    /// Departure date (UTC)
    pub date: NaiveDate,
    /// Lowest unit price among that day's departures
    pub min_price: Money,
    /// Number of departures with capacity left
    pub count: usize,
}

/// Groups items by departure day, ascending.
///
/// Sold-out items and items without a schedule are skipped; days with nothing left
/// are omitted. Trains count at their cheapest fare class.
#[must_use]
pub fn summarize(items: &[InventoryItem]) -> Vec<FareDay> {
    let mut days: BTreeMap<NaiveDate, FareDay> = BTreeMap::new();

    for item in items.iter().filter(|item| item.available_capacity > 0) {
        let (Some(schedule), Some(price)) = (item.details.schedule(), item.lowest_price()) else {
            continue;
        };
        let date = schedule.departure.date_naive();
        days.entry(date)
            .and_modify(|day| {
                day.min_price = day.min_price.min(price);
                day.count += 1;
            })
            .or_insert(FareDay {
                date,
                min_price: price,
                count: 1,
            });
    }

    days.into_values().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use wayfare_core::types::{ItemDetails, ItemId, Route, Schedule};

    fn flight(id: i64, day: u32, hour: u32, price: u64, available: u32) -> InventoryItem {
        let departure = Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap();
        InventoryItem {
            id: ItemId::new(id),
            details: ItemDetails::Flight {
                flight_number: format!("AI-{id}"),
                airline: "Air India".to_string(),
                route: Route::new("DEL", "BOM"),
                schedule: Schedule::new(departure, departure + Duration::hours(2)),
                price: Money::from_minor(price),
            },
            initial_capacity: 60,
            available_capacity: available,
        }
    }

    #[test]
    fn groups_by_day_with_minimum_and_count() {
        let items = vec![
            flight(3, 12, 6, 480_000, 10),
            flight(1, 10, 6, 450_000, 10),
            flight(2, 10, 18, 420_000, 10),
            flight(4, 11, 9, 300_000, 0),
        ];
        let days = summarize(&items);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(days[0].min_price, Money::from_minor(420_000));
        assert_eq!(days[0].count, 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap());
        assert_eq!(days[1].count, 1);
    }

    #[test]
    fn month_parsing_and_range() {
        let month: CalendarMonth = "2026-12".parse().unwrap();
        let (start, end) = month.range();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(month.to_string(), "2026-12");

        assert!("2026-13".parse::<CalendarMonth>().is_err());
        assert!("March".parse::<CalendarMonth>().is_err());
        assert!(month.contains(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()));
    }
}
