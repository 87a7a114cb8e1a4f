//! Row types and conversions between database rows and domain types.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use wayfare_core::StoreError;
use wayfare_core::types::{
    Booking, BookingId, FareClass, InventoryItem, ItemDetails, ItemId, ItemKey,
    ItemKind, Money, ReservationCode, Review, ReviewId, Seat, SeatId, StayDates, UserId,
    VehicleRef, VehicleType,
};

pub(crate) const ITEM_COLUMNS: &str = "id, kind, details, initial_capacity, available_capacity";

pub(crate) const SEAT_COLUMNS: &str =
    "id, vehicle_type, vehicle_id, label, seat_row, seat_col, seat_class, is_booked, booking_id";

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, kind, ref_id, passenger_names, guest_count, \
     fare_class, check_in, check_out, status, total_price, code, seat_labels, created_at";

pub(crate) const REVIEW_COLUMNS: &str = "id, user_id, kind, ref_id, rating, comment, created_at";

fn decode_error(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(format!("Invalid {what} in database row: {detail}"))
}

pub(crate) fn to_i32(value: u32, what: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| decode_error(what, format!("{value} exceeds i32::MAX")))
}

pub(crate) fn to_u32(value: i32, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| decode_error(what, format!("{value} is negative")))
}

pub(crate) fn to_i64(value: Money) -> Result<i64, StoreError> {
    i64::try_from(value.minor())
        .map_err(|_| decode_error("price", format!("{value} exceeds i64::MAX")))
}

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    id: i64,
    kind: String,
    details: Json<ItemDetails>,
    initial_capacity: i32,
    available_capacity: i32,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let kind: ItemKind = row.kind.parse().map_err(|e| decode_error("kind", e))?;
        let details = row.details.0;
        if details.kind() != kind {
            return Err(decode_error(
                "details",
                format!("{} details stored on a {kind} row", details.kind()),
            ));
        }
        Ok(Self {
            id: ItemId::new(row.id),
            details,
            initial_capacity: to_u32(row.initial_capacity, "initial_capacity")?,
            available_capacity: to_u32(row.available_capacity, "available_capacity")?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SeatRow {
    id: i64,
    vehicle_type: String,
    vehicle_id: i64,
    label: String,
    seat_row: i32,
    seat_col: i32,
    seat_class: String,
    is_booked: bool,
    booking_id: Option<i64>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = StoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let vehicle_type: VehicleType = row
            .vehicle_type
            .parse()
            .map_err(|e| decode_error("vehicle_type", e))?;
        Ok(Self {
            id: SeatId::new(row.id),
            vehicle: VehicleRef::new(vehicle_type, ItemId::new(row.vehicle_id)),
            label: row.label,
            row: to_u32(row.seat_row, "seat_row")?,
            col: to_u32(row.seat_col, "seat_col")?,
            seat_class: row.seat_class,
            is_booked: row.is_booked,
            booking_id: row.booking_id.map(BookingId::new),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct BookingRow {
    id: i64,
    user_id: i64,
    kind: String,
    ref_id: i64,
    passenger_names: Json<Vec<String>>,
    guest_count: i32,
    fare_class: Option<String>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    status: String,
    total_price: i64,
    code: Option<String>,
    seat_labels: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let kind: ItemKind = row.kind.parse().map_err(|e| decode_error("kind", e))?;
        let stay = match (row.check_in, row.check_out) {
            (Some(check_in), Some(check_out)) => Some(StayDates {
                check_in,
                check_out,
            }),
            _ => None,
        };
        let code = row
            .code
            .as_deref()
            .map(ReservationCode::parse)
            .transpose()
            .map_err(|e| decode_error("code", e))?;
        let total_price = u64::try_from(row.total_price)
            .map_err(|_| decode_error("total_price", row.total_price))?;

        Ok(Self {
            id: BookingId::new(row.id),
            user_id: UserId::new(row.user_id),
            item: ItemKey::new(kind, ItemId::new(row.ref_id)),
            passenger_names: row.passenger_names.0,
            guest_count: to_u32(row.guest_count, "guest_count")?,
            fare_class: row.fare_class.map(FareClass::new),
            stay,
            status: row.status.parse().map_err(|e| decode_error("status", e))?,
            total_price: Money::from_minor(total_price),
            code,
            seat_labels: row.seat_labels.0,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReviewRow {
    id: i64,
    user_id: i64,
    kind: String,
    ref_id: i64,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let kind: ItemKind = row.kind.parse().map_err(|e| decode_error("kind", e))?;
        Ok(Self {
            id: ReviewId::new(row.id),
            user_id: UserId::new(row.user_id),
            item: ItemKey::new(kind, ItemId::new(row.ref_id)),
            rating: u8::try_from(row.rating).map_err(|_| decode_error("rating", row.rating))?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wayfare_core::types::BookingStatus;

    fn booking_row(code: Option<&str>, status: &str) -> BookingRow {
        BookingRow {
            id: 4,
            user_id: 9,
            kind: "room".to_string(),
            ref_id: 2,
            passenger_names: Json(vec!["Meera".to_string()]),
            guest_count: 1,
            fare_class: None,
            check_in: NaiveDate::from_ymd_opt(2026, 3, 10),
            check_out: NaiveDate::from_ymd_opt(2026, 3, 12),
            status: status.to_string(),
            total_price: 1_000_000,
            code: code.map(str::to_string),
            seat_labels: Json(Vec::new()),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn booking_row_decodes_stay_and_code() {
        let booking = Booking::try_from(booking_row(Some("AB12CD34"), "Confirmed")).unwrap();
        assert_eq!(booking.item.kind, ItemKind::Room);
        assert_eq!(booking.stay.unwrap().nights(), 2);
        assert_eq!(booking.code.unwrap().as_str(), "AB12CD34");
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn unknown_status_is_a_serialization_error() {
        let err = Booking::try_from(booking_row(None, "Expired")).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn capacity_conversions_reject_out_of_range_values() {
        assert!(to_u32(-1, "available_capacity").is_err());
        assert!(to_i32(u32::MAX, "capacity").is_err());
        assert_eq!(to_i32(12, "capacity").unwrap(), 12);
    }
}
