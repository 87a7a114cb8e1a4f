//! `PostgreSQL` booking store for Wayfare.
//!
//! This crate implements the store traits from `wayfare-core` on top of sqlx:
//!
//! - Capacity is decremented with a conditional `UPDATE ... WHERE available_capacity >= $n`,
//!   so concurrent reservations serialize on the item row and can never oversell
//! - Seats are claimed with `UPDATE ... WHERE NOT is_booked`, skipping seats another
//!   transaction already took
//! - Confirm and cancel lock the booking row with `SELECT ... FOR UPDATE`
//! - Releases are clamped with `LEAST(available_capacity + $n, initial_capacity)`
//!
//! Every ledger mutation runs inside a `sqlx::Transaction`; dropping a
//! [`PostgresTransaction`] without committing rolls it back.
//!
//! # Example
//!
//! ```no_run
//! use wayfare_postgres::PostgresBookingStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresBookingStore::connect("postgres://localhost/wayfare").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod rows;

use chrono::{DateTime, Utc};
use rows::{
    BOOKING_COLUMNS, BookingRow, ITEM_COLUMNS, ItemRow, REVIEW_COLUMNS, ReviewRow, SEAT_COLUMNS,
    SeatRow, to_i32, to_i64, to_u32,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use wayfare_core::StoreError;
use wayfare_core::store::{
    BookingLedger, BookingStore, CapacityLedger, ReserveOutcome, SeatMap, StoreFuture,
    StoreTransaction,
};
use wayfare_core::types::{
    Booking, BookingId, InventoryItem, ItemKey, ItemKind, NewInventoryItem, NewReview,
    ReservationCode, Review, Seat, SeatId, SeatSpec, UserId, VehicleRef,
};

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error, turning unique violations into `StoreError::Conflict`.
fn write_error(context: &str, table: &'static str, e: &sqlx::Error) -> StoreError {
    let is_unique_violation = e
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);

    if is_unique_violation {
        metrics::counter!("wayfare_store_conflicts_total", "table" => table).increment(1);
        StoreError::Conflict(format!("{context}: {e}"))
    } else {
        StoreError::Database(format!("{context}: {e}"))
    }
}

fn read_error(context: &str, e: &sqlx::Error) -> StoreError {
    StoreError::Database(format!("{context}: {e}"))
}

/// `PostgreSQL` implementation of [`BookingStore`].
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Connects to the database with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| read_error("Failed to connect", &e))?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if migrations fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Booking store migrations complete");
        Ok(())
    }
}

/// A transaction over the capacity ledger, seat map and booking ledger.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

impl CapacityLedger for PostgresTransaction {
    fn try_reserve(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ReserveOutcome> {
        Box::pin(async move {
            let quantity = to_i32(quantity, "quantity")?;

            // Row lock + re-check under READ COMMITTED: concurrent decrements queue
            // on the item row and each sees the previous one's result.
            let remaining: Option<(i32,)> = sqlx::query_as(
                r"
                UPDATE inventory_items
                SET available_capacity = available_capacity - $3
                WHERE kind = $1 AND id = $2 AND available_capacity >= $3
                RETURNING available_capacity
                ",
            )
            .bind(item.kind.as_str())
            .bind(item.id.value())
            .bind(quantity)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to reserve capacity", &e))?;

            if let Some((remaining,)) = remaining {
                return Ok(ReserveOutcome::Reserved {
                    remaining: to_u32(remaining, "available_capacity")?,
                });
            }

            let current: Option<(i32,)> = sqlx::query_as(
                "SELECT available_capacity FROM inventory_items WHERE kind = $1 AND id = $2",
            )
            .bind(item.kind.as_str())
            .bind(item.id.value())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to read capacity", &e))?;

            match current {
                Some((available,)) => Ok(ReserveOutcome::Insufficient {
                    available: to_u32(available, "available_capacity")?,
                }),
                None => Ok(ReserveOutcome::UnknownItem),
            }
        })
    }

    fn release(&mut self, item: ItemKey, quantity: u32) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                UPDATE inventory_items
                SET available_capacity = LEAST(available_capacity + $3, initial_capacity)
                WHERE kind = $1 AND id = $2
                ",
            )
            .bind(item.kind.as_str())
            .bind(item.id.value())
            .bind(to_i32(quantity, "quantity")?)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to release capacity", &e))?;
            Ok(())
        })
    }
}

impl SeatMap for PostgresTransaction {
    fn allocate_seats(
        &mut self,
        vehicle: VehicleRef,
        seat_ids: Vec<SeatId>,
        booking: BookingId,
    ) -> StoreFuture<'_, Vec<String>> {
        Box::pin(async move {
            let ids: Vec<i64> = seat_ids.iter().map(SeatId::value).collect();

            let mut claimed: Vec<(i32, i32, String)> = sqlx::query_as(
                r"
                UPDATE seats
                SET is_booked = TRUE, booking_id = $3
                WHERE id = ANY($4)
                  AND vehicle_type = $1
                  AND vehicle_id = $2
                  AND NOT is_booked
                RETURNING seat_row, seat_col, label
                ",
            )
            .bind(vehicle.vehicle_type.as_str())
            .bind(vehicle.vehicle_id.value())
            .bind(booking.value())
            .bind(ids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to allocate seats", &e))?;

            claimed.sort();
            Ok(claimed.into_iter().map(|(_, _, label)| label).collect())
        })
    }

    fn release_seats(&mut self, booking: BookingId) -> StoreFuture<'_, u32> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE seats SET is_booked = FALSE, booking_id = NULL WHERE booking_id = $1",
            )
            .bind(booking.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to release seats", &e))?;

            Ok(u32::try_from(result.rows_affected()).unwrap_or(u32::MAX))
        })
    }
}

impl BookingLedger for PostgresTransaction {
    fn next_booking_id(&mut self) -> StoreFuture<'_, BookingId> {
        Box::pin(async move {
            let (id,): (i64,) =
                sqlx::query_as("SELECT nextval(pg_get_serial_sequence('bookings', 'id'))")
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(|e| read_error("Failed to allocate booking id", &e))?;
            Ok(BookingId::new(id))
        })
    }

    fn insert_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO bookings (
                    id, user_id, kind, ref_id, passenger_names, guest_count, fare_class,
                    check_in, check_out, status, total_price, code, seat_labels, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ",
            )
            .bind(booking.id.value())
            .bind(booking.user_id.value())
            .bind(booking.item.kind.as_str())
            .bind(booking.item.id.value())
            .bind(Json(&booking.passenger_names))
            .bind(to_i32(booking.guest_count, "guest_count")?)
            .bind(booking.fare_class.as_ref().map(|c| c.as_str().to_string()))
            .bind(booking.stay.map(|s| s.check_in))
            .bind(booking.stay.map(|s| s.check_out))
            .bind(booking.status.as_str())
            .bind(to_i64(booking.total_price)?)
            .bind(booking.code.as_ref().map(|c| c.as_str().to_string()))
            .bind(Json(&booking.seat_labels))
            .bind(booking.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error("Failed to insert booking", "bookings", &e))?;
            Ok(())
        })
    }

    fn lock_booking(&mut self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let row: Option<BookingRow> = sqlx::query_as(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
            ))
            .bind(id.value())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| read_error("Failed to lock booking", &e))?;

            row.map(Booking::try_from).transpose()
        })
    }

    fn update_booking(&mut self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings
                SET status = $2, code = $3, seat_labels = $4
                WHERE id = $1
                ",
            )
            .bind(booking.id.value())
            .bind(booking.status.as_str())
            .bind(booking.code.as_ref().map(|c| c.as_str().to_string()))
            .bind(Json(&booking.seat_labels))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error("Failed to update booking", "bookings", &e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!(
                    "Failed to update booking {}: no such row",
                    booking.id
                )));
            }
            Ok(())
        })
    }

    fn code_exists(&mut self, code: ReservationCode) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM bookings WHERE code = $1)")
                    .bind(code.as_str())
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(|e| read_error("Failed to check reservation code", &e))?;
            Ok(exists)
        })
    }
}

impl StoreTransaction for PostgresTransaction {
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            self.tx
                .commit()
                .await
                .map_err(|e| read_error("Failed to commit transaction", &e))
        })
    }
}

impl BookingStore for PostgresBookingStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        Box::pin(async move {
            let tx = self
                .pool
                .begin()
                .await
                .map_err(|e| read_error("Failed to start transaction", &e))?;
            let tx: Box<dyn StoreTransaction> = Box::new(PostgresTransaction { tx });
            Ok(tx)
        })
    }

    fn create_item(&self, item: NewInventoryItem) -> StoreFuture<'_, InventoryItem> {
        Box::pin(async move {
            let kind = item.details.kind();
            let route = item.details.route();
            let schedule = item.details.schedule();
            let capacity = to_i32(item.capacity, "capacity")?;

            let row: ItemRow = sqlx::query_as(&format!(
                r"
                INSERT INTO inventory_items (
                    kind, origin, destination, departure, arrival, details,
                    initial_capacity, available_capacity
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(kind.as_str())
            .bind(route.map(|r| r.origin.clone()))
            .bind(route.map(|r| r.destination.clone()))
            .bind(schedule.map(|s| s.departure))
            .bind(schedule.map(|s| s.arrival))
            .bind(Json(&item.details))
            .bind(capacity)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("Failed to create inventory item", "inventory_items", &e))?;

            let created = InventoryItem::try_from(row)?;
            tracing::debug!(item = %created.key(), capacity = item.capacity, "Inventory item created");
            Ok(created)
        })
    }

    fn get_item(&self, key: ItemKey) -> StoreFuture<'_, Option<InventoryItem>> {
        Box::pin(async move {
            let row: Option<ItemRow> = sqlx::query_as(&format!(
                "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE kind = $1 AND id = $2"
            ))
            .bind(key.kind.as_str())
            .bind(key.id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error("Failed to load inventory item", &e))?;

            row.map(InventoryItem::try_from).transpose()
        })
    }

    fn items_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let rows: Vec<ItemRow> = sqlx::query_as(&format!(
                r"
                SELECT {ITEM_COLUMNS}
                FROM inventory_items
                WHERE kind = $1
                  AND lower(trim(origin)) = lower(trim($2))
                  AND lower(trim(destination)) = lower(trim($3))
                  AND departure >= $4
                  AND departure < $5
                ORDER BY departure, id
                "
            ))
            .bind(kind.as_str())
            .bind(&origin)
            .bind(&destination)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to search inventory", &e))?;

            rows.into_iter().map(InventoryItem::try_from).collect()
        })
    }

    fn available_on_route(
        &self,
        kind: ItemKind,
        origin: String,
        destination: String,
        departing: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let (from, until) = departing.unzip();
            let rows: Vec<ItemRow> = sqlx::query_as(&format!(
                r"
                SELECT {ITEM_COLUMNS}
                FROM inventory_items
                WHERE kind = $1
                  AND lower(trim(origin)) = lower(trim($2))
                  AND lower(trim(destination)) = lower(trim($3))
                  AND available_capacity > 0
                  AND ($4::timestamptz IS NULL OR departure >= $4)
                  AND ($5::timestamptz IS NULL OR departure < $5)
                ORDER BY departure, id
                "
            ))
            .bind(kind.as_str())
            .bind(&origin)
            .bind(&destination)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to search available inventory", &e))?;

            rows.into_iter().map(InventoryItem::try_from).collect()
        })
    }

    fn rooms_in_city(&self, city: String, min_stars: u8) -> StoreFuture<'_, Vec<InventoryItem>> {
        Box::pin(async move {
            let rows: Vec<ItemRow> = sqlx::query_as(&format!(
                r"
                SELECT {ITEM_COLUMNS}
                FROM inventory_items
                WHERE kind = 'room'
                  AND strpos(lower(details->>'city'), lower(trim($1))) > 0
                  AND COALESCE((details->>'star_rating')::int, 0) >= $2
                ORDER BY COALESCE((details->>'star_rating')::int, 0) DESC, id
                "
            ))
            .bind(&city)
            .bind(i32::from(min_stars))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to search rooms", &e))?;

            rows.into_iter().map(InventoryItem::try_from).collect()
        })
    }

    fn add_seats(&self, vehicle: VehicleRef, seats: Vec<SeatSpec>) -> StoreFuture<'_, Vec<Seat>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| read_error("Failed to start transaction", &e))?;

            let mut created = Vec::with_capacity(seats.len());
            for spec in seats {
                let row: SeatRow = sqlx::query_as(&format!(
                    r"
                    INSERT INTO seats (vehicle_type, vehicle_id, label, seat_row, seat_col, seat_class)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {SEAT_COLUMNS}
                    "
                ))
                .bind(vehicle.vehicle_type.as_str())
                .bind(vehicle.vehicle_id.value())
                .bind(&spec.label)
                .bind(to_i32(spec.row, "seat_row")?)
                .bind(to_i32(spec.col, "seat_col")?)
                .bind(&spec.seat_class)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| write_error("Failed to add seat", "seats", &e))?;
                created.push(Seat::try_from(row)?);
            }

            tx.commit()
                .await
                .map_err(|e| read_error("Failed to commit transaction", &e))?;
            Ok(created)
        })
    }

    fn list_seats(&self, vehicle: VehicleRef) -> StoreFuture<'_, Vec<Seat>> {
        Box::pin(async move {
            let rows: Vec<SeatRow> = sqlx::query_as(&format!(
                r"
                SELECT {SEAT_COLUMNS}
                FROM seats
                WHERE vehicle_type = $1 AND vehicle_id = $2
                ORDER BY seat_row, seat_col, id
                "
            ))
            .bind(vehicle.vehicle_type.as_str())
            .bind(vehicle.vehicle_id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to list seats", &e))?;

            rows.into_iter().map(Seat::try_from).collect()
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let row: Option<BookingRow> = sqlx::query_as(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
            ))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error("Failed to load booking", &e))?;

            row.map(Booking::try_from).transpose()
        })
    }

    fn find_by_code(&self, code: ReservationCode) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let row: Option<BookingRow> = sqlx::query_as(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE code = $1"
            ))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error("Failed to find booking by code", &e))?;

            row.map(Booking::try_from).transpose()
        })
    }

    fn bookings_for_user(&self, user: UserId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let rows: Vec<BookingRow> = sqlx::query_as(&format!(
                r"
                SELECT {BOOKING_COLUMNS}
                FROM bookings
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                "
            ))
            .bind(user.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to list bookings", &e))?;

            rows.into_iter().map(Booking::try_from).collect()
        })
    }

    fn insert_review(&self, review: NewReview) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            let row: ReviewRow = sqlx::query_as(&format!(
                r"
                INSERT INTO reviews (user_id, kind, ref_id, rating, comment, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {REVIEW_COLUMNS}
                "
            ))
            .bind(review.user_id.value())
            .bind(review.item.kind.as_str())
            .bind(review.item.id.value())
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .bind(review.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("Failed to insert review", "reviews", &e))?;

            Review::try_from(row)
        })
    }

    fn reviews_for(&self, item: ItemKey) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
                r"
                SELECT {REVIEW_COLUMNS}
                FROM reviews
                WHERE kind = $1 AND ref_id = $2
                ORDER BY created_at DESC, id DESC
                "
            ))
            .bind(item.kind.as_str())
            .bind(item.id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to list reviews", &e))?;

            rows.into_iter().map(Review::try_from).collect()
        })
    }
}
