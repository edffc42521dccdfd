// SQLite-backed repository for rooms and bookings. Runtime queries only;
// the schema is created on startup and relies on the booking_id unique
// index as the backstop for concurrent id allocation.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::Result;
use crate::models::{Booking, BookingFilter, BookingStatus, PaymentMode, PaymentStatus, Room, RoomCategory};

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub category: RoomCategory,
    pub price: i64,
    pub description: String,
    pub max_guests: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub room_id: i64,
    pub room_type: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guests: i64,
    pub amount: i64,
    pub payment_mode: PaymentMode,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS rooms (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    category     TEXT NOT NULL,
    price        INTEGER NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    max_guests   INTEGER NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookings (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id     TEXT NOT NULL UNIQUE,
    customer_name  TEXT NOT NULL,
    email          TEXT NOT NULL,
    phone          TEXT NOT NULL,
    room_id        INTEGER NOT NULL REFERENCES rooms(id),
    room_type      TEXT NOT NULL,
    check_in       TEXT NOT NULL,
    check_out      TEXT NOT NULL,
    nights         INTEGER NOT NULL,
    guests         INTEGER NOT NULL,
    amount         INTEGER NOT NULL,
    payment_mode   TEXT NOT NULL,
    payment_status TEXT NOT NULL,
    booking_status TEXT NOT NULL,
    notes          TEXT,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookings_email ON bookings(email);
CREATE INDEX IF NOT EXISTS idx_bookings_dates ON bookings(check_in, check_out);
CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(booking_status);
"#;

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Store { pool };
        store.init_schema().await?;
        Ok(store)
    }

    // A fresh in-memory database. One connection only: every pooled
    // connection to sqlite::memory: would otherwise see its own database.
    pub async fn memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Store { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- rooms ----

    pub async fn create_room(&self, room: NewRoom) -> Result<Room> {
        let result = sqlx::query(
            "INSERT INTO rooms (name, category, price, description, max_guests, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&room.name)
        .bind(room.category)
        .bind(room.price)
        .bind(&room.description)
        .bind(room.max_guests)
        .bind(room.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let created = self.room(result.last_insert_rowid()).await?;
        created.ok_or_else(|| crate::error::Error::Storage("room vanished after insert".into()))
    }

    pub async fn room(&self, id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn active_room(&self, id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ? AND is_active = 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn list_active_rooms(&self) -> Result<Vec<Room>> {
        let rooms =
            sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE is_active = 1 ORDER BY price ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rooms)
    }

    // ---- bookings ----

    pub async fn create_booking(&self, new: NewBooking) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO bookings (booking_id, customer_name, email, phone, room_id, room_type, \
             check_in, check_out, nights, guests, amount, payment_mode, payment_status, \
             booking_status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.booking_id)
        .bind(&new.customer_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.room_id)
        .bind(new.room_type)
        .bind(new.check_in)
        .bind(new.check_out)
        .bind(new.nights)
        .bind(new.guests)
        .bind(new.amount)
        .bind(new.payment_mode)
        .bind(PaymentStatus::PendingPayment)
        .bind(BookingStatus::Enquiry)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(booking)
    }

    pub async fn booking(&self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    pub async fn booking_by_code(&self, booking_id: &str) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    pub async fn booking_id_exists(&self, booking_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    // Half-open overlap: [check_in, check_out) conflicts with a stored stay
    // iff check_in < stored.check_out AND check_out > stored.check_in.
    // Enquiries and cancelled bookings never block a room.
    pub async fn conflicting_bookings(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE room_id = ? \
             AND booking_status IN ('Confirmed', 'Checked In') \
             AND check_in < ? AND check_out > ?",
        )
        .bind(room_id)
        .bind(check_out)
        .bind(check_in)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn set_booking_status(&self, id: i64, status: BookingStatus) -> Result<()> {
        sqlx::query("UPDATE bookings SET booking_status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_statuses(
        &self,
        id: i64,
        booking_status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE bookings SET booking_status = ?, payment_status = ? WHERE id = ?")
            .bind(booking_status)
            .bind(payment_status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<(Vec<Booking>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM bookings WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let offset = i64::from(filter.page() - 1) * i64::from(filter.limit());
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE 1=1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(i64::from(filter.limit()));
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let bookings = qb
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    // Unpaginated variant backing the CSV export.
    pub async fn filtered_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE 1=1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        let bookings = qb
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    // ---- dashboard aggregates ----

    pub async fn count_bookings(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: BookingStatus) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE booking_status = ?")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_active_confirmed(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE booking_status IN ('Confirmed', 'Checked In')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // Revenue counts bookings whose payment is settled or committed.
    pub async fn total_revenue(&self) -> Result<i64> {
        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM bookings \
             WHERE payment_status IN ('Paid', 'Confirmed')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }

    pub async fn recent_bookings(&self, limit: i64) -> Result<Vec<Booking>> {
        let bookings =
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(bookings)
    }

    pub async fn upcoming_check_ins(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings \
             WHERE check_in >= ? AND check_in <= ? \
             AND booking_status IN ('Confirmed', 'Checked In') \
             ORDER BY check_in ASC LIMIT ?",
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &BookingFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND booking_status = ");
        qb.push_bind(status.as_str());
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ");
        qb.push_bind(payment_status.as_str());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND check_in >= ");
        qb.push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND check_in <= ");
        qb.push_bind(to);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (booking_id LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR customer_name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR phone LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}
