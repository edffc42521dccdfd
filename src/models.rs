// Domain entities and wire types: rooms, bookings, the status vocabulary,
// and the request/response shapes used by the public API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RoomCategory {
    #[serde(rename = "Pocket Friendly")]
    #[sqlx(rename = "Pocket Friendly")]
    PocketFriendly,
    #[serde(rename = "Ordinary / Basic Room")]
    #[sqlx(rename = "Ordinary / Basic Room")]
    OrdinaryBasic,
    #[serde(rename = "Budget / Economy Room")]
    #[sqlx(rename = "Budget / Economy Room")]
    BudgetEconomy,
    #[serde(rename = "Standard Room")]
    #[sqlx(rename = "Standard Room")]
    Standard,
}

impl RoomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomCategory::PocketFriendly => "Pocket Friendly",
            RoomCategory::OrdinaryBasic => "Ordinary / Basic Room",
            RoomCategory::BudgetEconomy => "Budget / Economy Room",
            RoomCategory::Standard => "Standard Room",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum PaymentMode {
    #[serde(rename = "Pay at Hotel")]
    #[sqlx(rename = "Pay at Hotel")]
    PayAtHotel,
    #[serde(rename = "Bank Transfer")]
    #[sqlx(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::PayAtHotel => "Pay at Hotel",
            PaymentMode::BankTransfer => "Bank Transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum PaymentStatus {
    #[serde(rename = "Pending Payment")]
    #[sqlx(rename = "Pending Payment")]
    PendingPayment,
    Paid,
    Confirmed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::PendingPayment => "Pending Payment",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Confirmed => "Confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum BookingStatus {
    Enquiry,
    Confirmed,
    #[serde(rename = "Checked In")]
    #[sqlx(rename = "Checked In")]
    CheckedIn,
    #[serde(rename = "Checked Out")]
    #[sqlx(rename = "Checked Out")]
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Enquiry => "Enquiry",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::CheckedIn => "Checked In",
            BookingStatus::CheckedOut => "Checked Out",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    // Checked-out and cancelled bookings are read-only afterward.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    // Only these statuses block a room's availability.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::CheckedIn)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub category: RoomCategory,
    /// Price per night in whole rupees.
    pub price: i64,
    pub description: String,
    pub max_guests: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: i64,
    /// Externally visible code, e.g. `NJP82914407123`. Unique across all bookings.
    pub booking_id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub room_id: i64,
    /// Room category frozen at creation time; never updated afterward.
    pub room_type: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guests: i64,
    /// Derived `price * nights`, in whole rupees.
    pub amount: i64,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Public enquiry submission body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(email(message = "email address is invalid"))]
    pub email: String,
    #[validate(length(min = 7, message = "phone number is too short"))]
    pub phone: String,
    #[validate(range(min = 1, message = "at least one guest is required"))]
    pub guests: i64,
    pub payment_mode: PaymentMode,
}

// Booking view returned on the public API; internal row id is not exposed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking_id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub room_type: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guests: i64,
    pub amount: i64,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
}

impl From<&Booking> for BookingSummary {
    fn from(b: &Booking) -> Self {
        BookingSummary {
            booking_id: b.booking_id.clone(),
            customer_name: b.customer_name.clone(),
            email: b.email.clone(),
            phone: b.phone.clone(),
            room_type: b.room_type,
            check_in: b.check_in,
            check_out: b.check_out,
            nights: b.nights,
            guests: b.guests,
            amount: b.amount,
            payment_mode: b.payment_mode,
            payment_status: b.payment_status,
            booking_status: b.booking_status,
        }
    }
}

// Admin list/export filter. Also used to drive the CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BookingFilter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
