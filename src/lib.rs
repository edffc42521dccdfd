// Main library file for the hotel booking backend

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod providers;
pub mod session;
pub mod store;
pub mod templates;

// Re-export key types for convenience
pub use config::AppConfig;
pub use error::{Error, Result};
pub use lifecycle::{BookingService, ConfirmedEnquiry};
pub use models::{Booking, BookingStatus, PaymentMode, PaymentStatus, Room, RoomCategory};
pub use notify::{Dispatcher, NotificationKind, NotificationResult, Notifier};
pub use store::Store;

use session::SessionStore;

// Shared application state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub service: BookingService,
    pub sessions: SessionStore,
    pub dispatcher: Dispatcher,
}
