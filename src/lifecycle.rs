// Booking lifecycle: enquiry submission, admin transitions, availability.
// Status changes route through one transition table; admin overrides are
// possible but logged. Notification sends never decide an operation's fate.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;

use crate::error::{Error, Result};
use crate::models::{
    Booking, BookingStatus, CreateBookingRequest, PaymentMode, PaymentStatus,
};
use crate::notify::{Dispatcher, NotificationKind, NotificationResult, Notifier};
use crate::store::{NewBooking, Store};
use validator::Validate;

const BOOKING_ID_PREFIX: &str = "NJP";
const MAX_ID_ATTEMPTS: u32 = 16;

#[derive(Clone)]
pub struct BookingService {
    store: Store,
    notifier: Arc<Notifier>,
    dispatcher: Dispatcher,
}

/// Result of confirming an enquiry: the updated booking plus the awaited
/// email outcome, reported to the admin alongside the success response.
#[derive(Debug, Clone)]
pub struct ConfirmedEnquiry {
    pub booking: Booking,
    pub email: NotificationResult,
}

impl BookingService {
    pub fn new(store: Store, notifier: Arc<Notifier>, dispatcher: Dispatcher) -> Self {
        BookingService {
            store,
            notifier,
            dispatcher,
        }
    }

    /// Public enquiry submission. Creates the booking in
    /// (Enquiry, Pending Payment) and enqueues the acknowledgment without
    /// waiting on it.
    pub async fn submit_enquiry(&self, request: CreateBookingRequest) -> Result<Booking> {
        request.validate().map_err(validation_error)?;

        let today = Utc::now().date_naive();
        if request.check_in < today {
            return Err(Error::validation(
                "check_in",
                "Check-in date cannot be in the past",
            ));
        }
        if request.check_out <= request.check_in {
            return Err(Error::validation(
                "check_out",
                "Check-out date must be after check-in date",
            ));
        }

        let room = self
            .store
            .active_room(request.room_id)
            .await?
            .ok_or(Error::NotFound("Room"))?;
        if request.guests > room.max_guests {
            return Err(Error::validation(
                "guests",
                format!(
                    "Maximum {} guests allowed for this room type",
                    room.max_guests
                ),
            ));
        }

        let nights = (request.check_out - request.check_in).num_days();
        let amount = room.price * nights;
        let booking_id = allocate_booking_id(&self.store, generate_booking_id).await?;

        let booking = self
            .store
            .create_booking(NewBooking {
                booking_id,
                customer_name: request.customer_name.trim().to_string(),
                email: request.email.trim().to_lowercase(),
                phone: request.phone.trim().to_string(),
                room_id: room.id,
                room_type: room.category,
                check_in: request.check_in,
                check_out: request.check_out,
                nights,
                guests: request.guests,
                amount,
                payment_mode: request.payment_mode,
            })
            .await?;

        tracing::info!(
            booking_id = %booking.booking_id,
            room = %room.name,
            nights,
            amount,
            "enquiry submitted"
        );
        self.dispatcher
            .dispatch(NotificationKind::EnquiryAcknowledgment, booking.clone());
        Ok(booking)
    }

    /// Admin approval of an enquiry into a reservation. The confirmation
    /// email is awaited so its outcome can be echoed back; a failed send
    /// never turns the confirmation itself into a failure.
    pub async fn confirm_enquiry(&self, id: i64) -> Result<ConfirmedEnquiry> {
        let mut booking = self
            .store
            .booking(id)
            .await?
            .ok_or(Error::NotFound("Booking"))?;
        if booking.booking_status != BookingStatus::Enquiry {
            return Err(Error::InvalidState(
                "This is not an enquiry. Only enquiries can be confirmed.".to_string(),
            ));
        }

        let payment_status = if booking.payment_mode == PaymentMode::PayAtHotel {
            PaymentStatus::Confirmed
        } else {
            booking.payment_status
        };
        self.store
            .set_statuses(id, BookingStatus::Confirmed, payment_status)
            .await?;
        booking.booking_status = BookingStatus::Confirmed;
        booking.payment_status = payment_status;
        tracing::info!(booking_id = %booking.booking_id, "enquiry confirmed");

        let email = self
            .notifier
            .send_email(NotificationKind::BookingConfirmation, &booking)
            .await;
        self.dispatcher
            .dispatch_sms(NotificationKind::BookingConfirmation, booking.clone());

        Ok(ConfirmedEnquiry { booking, email })
    }

    /// Direct admin override: marks the booking paid and confirmed whatever
    /// its prior state. Calling it twice lands in the same place.
    pub async fn confirm_payment(&self, id: i64) -> Result<Booking> {
        let mut booking = self
            .store
            .booking(id)
            .await?
            .ok_or(Error::NotFound("Booking"))?;
        self.store
            .set_statuses(id, BookingStatus::Confirmed, PaymentStatus::Paid)
            .await?;
        booking.booking_status = BookingStatus::Confirmed;
        booking.payment_status = PaymentStatus::Paid;
        tracing::info!(booking_id = %booking.booking_id, "payment confirmed");

        self.dispatcher
            .dispatch(NotificationKind::BookingConfirmation, booking.clone());
        Ok(booking)
    }

    /// Generic admin status change, validated against the transition table.
    /// `force` applies an illegal transition anyway and logs the override.
    pub async fn update_status(
        &self,
        id: i64,
        status: BookingStatus,
        force: bool,
    ) -> Result<Booking> {
        let mut booking = self
            .store
            .booking(id)
            .await?
            .ok_or(Error::NotFound("Booking"))?;
        let from = booking.booking_status;

        if !transition_allowed(from, status) {
            if force {
                tracing::warn!(
                    booking_id = %booking.booking_id,
                    from = from.as_str(),
                    to = status.as_str(),
                    "forced booking status override"
                );
            } else {
                return Err(Error::InvalidState(format!(
                    "cannot move a booking from {} to {}",
                    from.as_str(),
                    status.as_str()
                )));
            }
        }

        if from != status {
            self.store.set_booking_status(id, status).await?;
            booking.booking_status = status;
            tracing::info!(
                booking_id = %booking.booking_id,
                from = from.as_str(),
                to = status.as_str(),
                "booking status updated"
            );
            if status == BookingStatus::Cancelled {
                self.dispatcher
                    .dispatch(NotificationKind::BookingCancelled, booking.clone());
            }
        }
        Ok(booking)
    }

    pub async fn cancel(&self, id: i64) -> Result<Booking> {
        self.update_status(id, BookingStatus::Cancelled, false).await
    }

    /// Availability check over the half-open stay interval. Read-only; a
    /// concurrent enquiry submission is allowed to race this (enquiries do
    /// not block a room until admin-confirmed).
    pub async fn is_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool> {
        if check_out <= check_in {
            return Err(Error::validation(
                "check_out",
                "Check-out date must be after check-in date",
            ));
        }
        let conflicts = self
            .store
            .conflicting_bookings(room_id, check_in, check_out)
            .await?;
        Ok(conflicts == 0)
    }
}

// Legal (from, to) pairs. Cancellation is reachable from every non-terminal
// state; everything else walks the Enquiry -> Confirmed -> Checked In ->
// Checked Out ladder. Same-state updates are a no-op, not an error.
pub fn transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    from == to
        || matches!(
            (from, to),
            (Enquiry, Confirmed) | (Confirmed, CheckedIn) | (CheckedIn, CheckedOut)
        )
        || (to == Cancelled && !from.is_terminal())
}

// `NJP` + last eight digits of unix millis + three random digits.
fn generate_booking_id() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let timestamp = &millis[millis.len().saturating_sub(8)..];
    let random: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{BOOKING_ID_PREFIX}{timestamp}{random:03}")
}

// Retries generation until the id is unused. The id space is large enough
// that MAX_ID_ATTEMPTS is only ever hit when something is badly wrong.
async fn allocate_booking_id<F>(store: &Store, mut generate: F) -> Result<String>
where
    F: FnMut() -> String,
{
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = generate();
        if !store.booking_id_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(Error::Storage(
        "could not allocate a unique booking id".to_string(),
    ))
}

fn validation_error(errors: validator::ValidationErrors) -> Error {
    let field_errors = errors.field_errors();
    match field_errors.iter().next() {
        Some((field, errs)) => {
            let message = errs
                .first()
                .and_then(|e| e.message.clone())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            Error::Validation {
                field: *field,
                message,
            }
        }
        None => Error::validation("request", "invalid request"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::test_config;
    use crate::providers::testing::RecordingProvider;
    use crate::store::testing::{memory_store, standard_room};
    use chrono::Days;

    struct Harness {
        service: BookingService,
        store: Store,
        provider: Arc<RecordingProvider>,
        dispatcher: Dispatcher,
    }

    async fn harness_with(provider: RecordingProvider) -> Harness {
        let config = test_config();
        let store = memory_store().await;
        let provider = Arc::new(provider);
        let notifier = Arc::new(Notifier::new(
            provider.clone(),
            provider.clone(),
            config.hotel,
            config.bank,
        ));
        let dispatcher = Dispatcher::spawn(notifier.clone());
        let service = BookingService::new(store.clone(), notifier, dispatcher.clone());
        Harness {
            service,
            store,
            provider,
            dispatcher,
        }
    }

    async fn harness() -> Harness {
        harness_with(RecordingProvider::default()).await
    }

    fn in_days(days: u64) -> NaiveDate {
        Utc::now().date_naive() + Days::new(days)
    }

    fn request(room_id: i64, check_in: NaiveDate, check_out: NaiveDate) -> CreateBookingRequest {
        CreateBookingRequest {
            room_id,
            check_in,
            check_out,
            customer_name: "Asha Verma".to_string(),
            email: "Asha@Example.com ".to_string(),
            phone: " 9828012345".to_string(),
            guests: 2,
            payment_mode: PaymentMode::PayAtHotel,
        }
    }

    #[tokio::test]
    async fn enquiry_derives_nights_amount_and_initial_states() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(30), in_days(33)))
            .await
            .unwrap();

        assert_eq!(booking.nights, 3);
        assert_eq!(booking.amount, 3000);
        assert_eq!(booking.booking_status, BookingStatus::Enquiry);
        assert_eq!(booking.payment_status, PaymentStatus::PendingPayment);
        assert_eq!(booking.room_type, room.category);
        // Contact details are normalized on the way in.
        assert_eq!(booking.email, "asha@example.com");
        assert_eq!(booking.phone, "9828012345");
        assert!(booking.booking_id.starts_with("NJP"));
        assert_eq!(booking.booking_id.len(), 14);
    }

    #[tokio::test]
    async fn past_check_in_is_rejected() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();

        let err = h
            .service
            .submit_enquiry(request(room.id, yesterday, in_days(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "check_in", .. }));
    }

    #[tokio::test]
    async fn check_out_must_follow_check_in() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let err = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "check_out", .. }));
    }

    #[tokio::test]
    async fn guest_count_is_capped_by_the_room() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let mut req = request(room.id, in_days(10), in_days(12));
        req.guests = 3;
        let err = h.service.submit_enquiry(req).await.unwrap_err();
        match err {
            Error::Validation { field, message } => {
                assert_eq!(field, "guests");
                assert!(message.contains("Maximum 2 guests"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inactive_or_missing_rooms_cannot_be_booked() {
        let h = harness().await;
        let inactive = h
            .store
            .create_room(crate::store::NewRoom {
                is_active: false,
                ..standard_room()
            })
            .await
            .unwrap();

        let err = h
            .service
            .submit_enquiry(request(inactive.id, in_days(10), in_days(12)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("Room")));

        let err = h
            .service
            .submit_enquiry(request(9999, in_days(10), in_days(12)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("Room")));
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_anything_else() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let mut req = request(room.id, in_days(10), in_days(12));
        req.email = "not-an-address".to_string();
        let err = h.service.submit_enquiry(req).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "email", .. }));
    }

    #[tokio::test]
    async fn id_allocation_retries_past_collisions_within_a_bound() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        h.store
            .create_booking(crate::store::testing::new_booking(
                &room,
                "NJPTAKEN",
                in_days(5),
                in_days(6),
            ))
            .await
            .unwrap();

        // Collides twice, then produces a fresh id.
        let mut calls = 0;
        let id = allocate_booking_id(&h.store, || {
            calls += 1;
            if calls <= 2 {
                "NJPTAKEN".to_string()
            } else {
                "NJPFRESH".to_string()
            }
        })
        .await
        .unwrap();
        assert_eq!(id, "NJPFRESH");
        assert_eq!(calls, 3);

        // A generator that never escapes the collision gives up cleanly.
        let err = allocate_booking_id(&h.store, || "NJPTAKEN".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn generated_ids_have_the_documented_shape() {
        let id = generate_booking_id();
        assert!(id.starts_with("NJP"));
        assert_eq!(id.len(), 14);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn availability_follows_confirmed_stays_only() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(15)))
            .await
            .unwrap();

        // An enquiry does not reserve the room.
        assert!(h
            .service
            .is_available(room.id, in_days(10), in_days(15))
            .await
            .unwrap());

        h.service.confirm_enquiry(booking.id).await.unwrap();
        assert!(!h
            .service
            .is_available(room.id, in_days(14), in_days(16))
            .await
            .unwrap());
        // Checkout day is free for the next guest.
        assert!(h
            .service
            .is_available(room.id, in_days(15), in_days(16))
            .await
            .unwrap());

        let err = h
            .service
            .is_available(room.id, in_days(5), in_days(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn confirm_enquiry_rejects_non_enquiries_without_mutating() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(12)))
            .await
            .unwrap();

        h.service.confirm_payment(booking.id).await.unwrap();
        let err = h.service.confirm_enquiry(booking.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        let stored = h.store.booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.booking_status, BookingStatus::Confirmed);
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn confirm_payment_is_an_idempotent_override() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(12)))
            .await
            .unwrap();

        for _ in 0..2 {
            let updated = h.service.confirm_payment(booking.id).await.unwrap();
            assert_eq!(updated.booking_status, BookingStatus::Confirmed);
            assert_eq!(updated.payment_status, PaymentStatus::Paid);
        }
        let stored = h.store.booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn email_outage_never_fails_a_confirmation() {
        let h = harness_with(RecordingProvider::failing_email()).await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(12)))
            .await
            .unwrap();

        let confirmed = h.service.confirm_enquiry(booking.id).await.unwrap();
        assert_eq!(confirmed.booking.booking_status, BookingStatus::Confirmed);
        assert!(!confirmed.email.success);
        assert!(confirmed
            .email
            .error
            .as_deref()
            .unwrap()
            .contains("simulated email outage"));
    }

    #[tokio::test]
    async fn update_status_enforces_the_transition_table() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(12)))
            .await
            .unwrap();

        // Skipping straight to Checked In is not a legal move.
        let err = h
            .service
            .update_status(booking.id, BookingStatus::CheckedIn, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        // The admin can force it, and the record follows.
        let forced = h
            .service
            .update_status(booking.id, BookingStatus::CheckedIn, true)
            .await
            .unwrap();
        assert_eq!(forced.booking_status, BookingStatus::CheckedIn);

        // Walking the ladder forward needs no force.
        let out = h
            .service
            .update_status(booking.id, BookingStatus::CheckedOut, false)
            .await
            .unwrap();
        assert_eq!(out.booking_status, BookingStatus::CheckedOut);

        // Checked Out is terminal; cancellation now requires force.
        let err = h.service.cancel(booking.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancellation_sends_the_cancellation_notice() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();
        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(10), in_days(12)))
            .await
            .unwrap();

        h.service.cancel(booking.id).await.unwrap();
        h.dispatcher.shutdown().await;

        let kinds: Vec<NotificationKind> =
            h.dispatcher.recent().iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&NotificationKind::EnquiryAcknowledgment));
        assert!(kinds.contains(&NotificationKind::BookingCancelled));
    }

    #[tokio::test]
    async fn end_to_end_enquiry_to_confirmed_pay_at_hotel() {
        let h = harness().await;
        let room = h.store.create_room(standard_room()).await.unwrap();

        let booking = h
            .service
            .submit_enquiry(request(room.id, in_days(20), in_days(23)))
            .await
            .unwrap();
        assert_eq!(booking.nights, 3);
        assert_eq!(booking.amount, 3000);
        assert_eq!(booking.booking_status, BookingStatus::Enquiry);
        assert_eq!(booking.payment_status, PaymentStatus::PendingPayment);

        let confirmed = h.service.confirm_enquiry(booking.id).await.unwrap();
        assert_eq!(confirmed.booking.booking_status, BookingStatus::Confirmed);
        assert_eq!(confirmed.booking.payment_status, PaymentStatus::Confirmed);
        assert!(confirmed.email.success);

        h.dispatcher.shutdown().await;
        let emails = h.provider.emails.lock();
        assert!(emails
            .iter()
            .any(|e| e.subject.starts_with("Enquiry Received")));
        assert!(emails
            .iter()
            .any(|e| e.subject.starts_with("Booking Confirmed")));
    }
}
