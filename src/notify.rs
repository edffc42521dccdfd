// Best-effort notification layer. The Notifier renders and sends through the
// configured providers; the Dispatcher wraps it in a queue drained by a
// background worker so lifecycle operations never wait on delivery. Nothing
// in this module returns an error to its caller: every attempt collapses
// into a NotificationResult.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{BankDetails, HotelInfo};
use crate::models::Booking;
use crate::providers::{NotificationProvider, ProviderError};
use crate::templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    EnquiryAcknowledgment,
    BookingConfirmation,
    BookingCancelled,
}

impl NotificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::EnquiryAcknowledgment => "enquiry acknowledgment",
            NotificationKind::BookingConfirmation => "booking confirmation",
            NotificationKind::BookingCancelled => "booking cancellation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    fn sent(message_id: Option<String>) -> Self {
        NotificationResult {
            success: true,
            message_id,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        NotificationResult {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    pub email: NotificationResult,
    pub sms: NotificationResult,
}

pub struct Notifier {
    email: Arc<dyn NotificationProvider>,
    sms: Arc<dyn NotificationProvider>,
    hotel: HotelInfo,
    bank: BankDetails,
}

impl Notifier {
    pub fn new(
        email: Arc<dyn NotificationProvider>,
        sms: Arc<dyn NotificationProvider>,
        hotel: HotelInfo,
        bank: BankDetails,
    ) -> Self {
        Notifier {
            email,
            sms,
            hotel,
            bank,
        }
    }

    pub async fn send(&self, kind: NotificationKind, booking: &Booking) -> NotificationOutcome {
        let (email, sms) =
            futures::join!(self.send_email(kind, booking), self.send_sms(kind, booking));
        NotificationOutcome { email, sms }
    }

    // Validates the recipient before touching the provider; an unusable
    // address fails fast without a network call.
    pub async fn send_email(&self, kind: NotificationKind, booking: &Booking) -> NotificationResult {
        if !validator::validate_email(booking.email.as_str()) {
            tracing::warn!(
                booking_id = %booking.booking_id,
                email = %booking.email,
                "skipping {} email, invalid address",
                kind.label()
            );
            return NotificationResult::failed(format!("invalid email address: {}", booking.email));
        }

        let message = templates::render_email(kind, booking, &self.hotel, &self.bank);
        match self.email.send_email(&message).await {
            Ok(receipt) => {
                tracing::info!(
                    booking_id = %booking.booking_id,
                    message_id = receipt.message_id.as_deref().unwrap_or("N/A"),
                    "{} email sent",
                    kind.label()
                );
                NotificationResult::sent(receipt.message_id)
            }
            Err(err @ ProviderError::NotConfigured(_)) => {
                tracing::debug!("skipping {} email: {err}", kind.label());
                NotificationResult::failed(err.to_string())
            }
            Err(err) => {
                tracing::error!(
                    booking_id = %booking.booking_id,
                    "{} email failed: {err}",
                    kind.label()
                );
                NotificationResult::failed(err.to_string())
            }
        }
    }

    pub async fn send_sms(&self, kind: NotificationKind, booking: &Booking) -> NotificationResult {
        let Some(to) = normalize_phone(&booking.phone) else {
            tracing::warn!(
                booking_id = %booking.booking_id,
                phone = %booking.phone,
                "skipping {} SMS, invalid phone number",
                kind.label()
            );
            return NotificationResult::failed(format!("invalid phone number: {}", booking.phone));
        };

        let mut message = templates::render_sms(kind, booking, &self.hotel);
        message.to = to;
        match self.sms.send_sms(&message).await {
            Ok(receipt) => {
                tracing::info!(
                    booking_id = %booking.booking_id,
                    message_id = receipt.message_id.as_deref().unwrap_or("N/A"),
                    "{} SMS sent",
                    kind.label()
                );
                NotificationResult::sent(receipt.message_id)
            }
            Err(err @ ProviderError::NotConfigured(_)) => {
                tracing::debug!("skipping {} SMS: {err}", kind.label());
                NotificationResult::failed(err.to_string())
            }
            Err(err) => {
                tracing::error!(
                    booking_id = %booking.booking_id,
                    "{} SMS failed: {err}",
                    kind.label()
                );
                NotificationResult::failed(err.to_string())
            }
        }
    }
}

// E.164 normalization; ten-digit local numbers get the default country code.
fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return None;
    }
    let digits = if !digits.starts_with("91") && digits.len() == 10 {
        format!("91{digits}")
    } else {
        digits
    };
    Some(format!("+{digits}"))
}

#[derive(Debug, Clone, Copy)]
enum JobChannels {
    Both,
    SmsOnly,
}

struct Job {
    kind: NotificationKind,
    booking: Booking,
    channels: JobChannels,
}

#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub kind: NotificationKind,
    pub booking_id: String,
    pub email: Option<NotificationResult>,
    pub sms: Option<NotificationResult>,
    pub at: DateTime<Utc>,
}

const RECENT_LIMIT: usize = 100;

/// Queued fire-and-forget dispatch. Jobs run on a single background worker;
/// completed outcomes are logged and kept in a bounded recent-history buffer.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    recent: RwLock<VecDeque<DispatchRecord>>,
}

impl Dispatcher {
    pub fn spawn(notifier: Arc<Notifier>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let inner = Arc::new(DispatcherInner {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(None),
            recent: RwLock::new(VecDeque::new()),
        });

        let worker_inner = Arc::clone(&inner);
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let (email, sms) = match job.channels {
                    JobChannels::Both => {
                        let outcome = notifier.send(job.kind, &job.booking).await;
                        (Some(outcome.email), Some(outcome.sms))
                    }
                    JobChannels::SmsOnly => {
                        (None, Some(notifier.send_sms(job.kind, &job.booking).await))
                    }
                };

                let record = DispatchRecord {
                    kind: job.kind,
                    booking_id: job.booking.booking_id.clone(),
                    email,
                    sms,
                    at: Utc::now(),
                };
                let mut recent = worker_inner.recent.write();
                if recent.len() == RECENT_LIMIT {
                    recent.pop_front();
                }
                recent.push_back(record);
            }
            tracing::debug!("notification worker stopped");
        });
        *inner.worker.lock() = Some(handle);

        Dispatcher { inner }
    }

    /// Enqueue both channels for the booking. Never blocks, never fails the
    /// caller; a closed queue only logs the dropped notification.
    pub fn dispatch(&self, kind: NotificationKind, booking: Booking) {
        self.enqueue(Job {
            kind,
            booking,
            channels: JobChannels::Both,
        });
    }

    pub fn dispatch_sms(&self, kind: NotificationKind, booking: Booking) {
        self.enqueue(Job {
            kind,
            booking,
            channels: JobChannels::SmsOnly,
        });
    }

    fn enqueue(&self, job: Job) {
        let kind = job.kind;
        let booking_id = job.booking.booking_id.clone();
        let tx = self.inner.tx.lock();
        match tx.as_ref().map(|tx| tx.send(job)) {
            Some(Ok(())) => {}
            _ => {
                tracing::warn!(
                    booking_id = %booking_id,
                    "dispatcher is shut down, dropping {} notification",
                    kind.label()
                );
            }
        }
    }

    pub fn recent(&self) -> Vec<DispatchRecord> {
        self.inner.recent.read().iter().cloned().collect()
    }

    /// Close the queue and wait for the worker to drain what was enqueued.
    pub async fn shutdown(&self) {
        let tx = self.inner.tx.lock().take();
        drop(tx);
        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!("notification worker panicked: {err}");
            }
        }
    }
}
