// Rendering of outbound email and SMS bodies from a booking snapshot plus
// the static hotel identity. Bank details are injected into confirmation
// emails for bank-transfer bookings.

use chrono::NaiveDate;

use crate::config::{BankDetails, HotelInfo};
use crate::models::{Booking, PaymentMode};
use crate::notify::NotificationKind;
use crate::providers::{EmailMessage, SmsMessage};

pub fn render_email(
    kind: NotificationKind,
    booking: &Booking,
    hotel: &HotelInfo,
    bank: &BankDetails,
) -> EmailMessage {
    match kind {
        NotificationKind::EnquiryAcknowledgment => acknowledgment_email(booking, hotel),
        NotificationKind::BookingConfirmation => confirmation_email(booking, hotel, bank),
        NotificationKind::BookingCancelled => cancelled_email(booking, hotel),
    }
}

pub fn render_sms(kind: NotificationKind, booking: &Booking, hotel: &HotelInfo) -> SmsMessage {
    let name = &booking.customer_name;
    let id = &booking.booking_id;
    let room = booking.room_type.as_str();
    let check_in = format_date_short(booking.check_in);
    let amount = format_inr(booking.amount);

    let body = match kind {
        NotificationKind::EnquiryAcknowledgment => format!(
            "Dear {name}, thank you for your enquiry {id} at {hotel}. Room: {room}, \
             Check-in: {check_in}, Amount: ₹{amount}. We have received your request and \
             will confirm shortly. For queries: {phone}",
            hotel = hotel.name,
            phone = hotel.phone,
        ),
        NotificationKind::BookingConfirmation => format!(
            "Dear {name}, your booking {id} is CONFIRMED at {hotel}. Room: {room}, \
             Check-in: {check_in}, Amount: ₹{amount}. We look forward to welcoming you! \
             For queries: {phone}",
            hotel = hotel.name,
            phone = hotel.phone,
        ),
        NotificationKind::BookingCancelled => format!(
            "Dear {name}, your booking {id} at {hotel} has been cancelled. \
             For queries: {phone}",
            hotel = hotel.name,
            phone = hotel.phone,
        ),
    };

    SmsMessage {
        to: booking.phone.clone(),
        body,
    }
}

fn acknowledgment_email(booking: &Booking, hotel: &HotelInfo) -> EmailMessage {
    let subject = format!(
        "Enquiry Received - {} - {}",
        booking.booking_id, hotel.name
    );

    let html_body = format!(
        "<html><body>\
         <h1>{hotel}</h1>\
         <p>Enquiry Received - We're Reviewing Your Request</p>\
         <p>Dear <strong>{name}</strong>,</p>\
         <p>Thank you for contacting {hotel}! We have received your room enquiry. \
         You will receive a confirmation email once we confirm your room booking.</p>\
         <h2>Your Enquiry Details</h2>\
         {details}\
         <p>Status: Pending Confirmation</p>\
         {times}\
         <p>Please keep this Enquiry ID (<strong>{id}</strong>) for your reference.</p>\
         {contact}\
         <p>This is an automated email. Please do not reply to this message.</p>\
         </body></html>",
        hotel = hotel.name,
        name = booking.customer_name,
        id = booking.booking_id,
        details = details_html(booking, "Enquiry ID"),
        times = times_html(hotel),
        contact = contact_html(hotel),
    );

    let text_body = format!(
        "Dear {name},\n\n\
         Thank you for your interest in {hotel}! We have received your room enquiry \
         and our team is currently reviewing your request.\n\n\
         ENQUIRY DETAILS:\n{details}- Status: Pending Confirmation\n\n\
         {times}\n\
         Please keep this Enquiry ID ({id}) for your reference.\n\n\
         {contact}\n\
         We look forward to welcoming you to {hotel}!\n",
        name = booking.customer_name,
        hotel = hotel.name,
        id = booking.booking_id,
        details = details_text(booking, "Enquiry ID"),
        times = times_text(hotel),
        contact = contact_text(hotel),
    );

    EmailMessage {
        to: booking.email.clone(),
        subject,
        html_body,
        text_body,
    }
}

fn confirmation_email(booking: &Booking, hotel: &HotelInfo, bank: &BankDetails) -> EmailMessage {
    let subject = format!(
        "Booking Confirmed - {} - {}",
        booking.booking_id, hotel.name
    );

    let bank_html = if booking.payment_mode == PaymentMode::BankTransfer {
        format!(
            "<h2>Bank Transfer Details</h2>\
             <p>Bank Name: {bank_name}<br>\
             Account Name: {account_name}<br>\
             Account Number: <strong>{account_number}</strong><br>\
             IFSC Code: <strong>{ifsc}</strong><br>\
             UPI ID: {upi}</p>\
             <p><strong>BOOKING AMOUNT IS NON-REFUNDABLE.</strong></p>",
            bank_name = bank.bank_name,
            account_name = bank.account_name,
            account_number = bank.account_number,
            ifsc = bank.ifsc_code,
            upi = bank.upi_id,
        )
    } else {
        String::new()
    };

    let bank_text = if booking.payment_mode == PaymentMode::BankTransfer {
        format!(
            "BANK TRANSFER DETAILS:\n\
             - Bank Name: {}\n- Account Name: {}\n- Account Number: {}\n\
             - IFSC Code: {}\n- UPI ID: {}\n\
             BOOKING AMOUNT IS NON-REFUNDABLE.\n\n",
            bank.bank_name, bank.account_name, bank.account_number, bank.ifsc_code, bank.upi_id,
        )
    } else {
        String::new()
    };

    let html_body = format!(
        "<html><body>\
         <h1>{hotel}</h1>\
         <p>Booking Confirmed</p>\
         <p>Dear <strong>{name}</strong>,</p>\
         <p>Your booking at {hotel} is confirmed. We look forward to welcoming you!</p>\
         <h2>Your Booking Details</h2>\
         {details}\
         {bank}\
         {times}\
         {contact}\
         <p>This is an automated email. Please do not reply to this message.</p>\
         </body></html>",
        hotel = hotel.name,
        name = booking.customer_name,
        details = details_html(booking, "Booking ID"),
        bank = bank_html,
        times = times_html(hotel),
        contact = contact_html(hotel),
    );

    let text_body = format!(
        "Dear {name},\n\n\
         Your booking at {hotel} is confirmed. We look forward to welcoming you!\n\n\
         BOOKING DETAILS:\n{details}\n{bank}{times}\n{contact}\n",
        name = booking.customer_name,
        hotel = hotel.name,
        details = details_text(booking, "Booking ID"),
        bank = bank_text,
        times = times_text(hotel),
        contact = contact_text(hotel),
    );

    EmailMessage {
        to: booking.email.clone(),
        subject,
        html_body,
        text_body,
    }
}

fn cancelled_email(booking: &Booking, hotel: &HotelInfo) -> EmailMessage {
    let subject = format!(
        "Booking Cancelled - {} - {}",
        booking.booking_id, hotel.name
    );

    let html_body = format!(
        "<html><body>\
         <h1>{hotel}</h1>\
         <p>Dear <strong>{name}</strong>,</p>\
         <p>Your booking (<strong>{id}</strong>) has been cancelled.</p>\
         <p>If you have questions contact {phone} or {email}.</p>\
         </body></html>",
        hotel = hotel.name,
        name = booking.customer_name,
        id = booking.booking_id,
        phone = hotel.phone,
        email = hotel.email,
    );

    let text_body = format!(
        "Dear {name},\n\nYour booking ({id}) has been cancelled.\n\
         If you have questions contact {phone} or {email}.\n\n{hotel}\n",
        name = booking.customer_name,
        id = booking.booking_id,
        phone = hotel.phone,
        email = hotel.email,
        hotel = hotel.name,
    );

    EmailMessage {
        to: booking.email.clone(),
        subject,
        html_body,
        text_body,
    }
}

fn details_html(booking: &Booking, id_label: &str) -> String {
    format!(
        "<p>{id_label}: <strong>{id}</strong><br>\
         Room Type: {room}<br>\
         Check-in Date: {check_in}<br>\
         Check-out Date: {check_out}<br>\
         Number of Nights: {nights}<br>\
         Number of Guests: {guests}<br>\
         Total Amount: <strong>₹{amount}</strong><br>\
         Payment Mode: {mode}<br>\
         Payment Status: {status}</p>",
        id = booking.booking_id,
        room = booking.room_type.as_str(),
        check_in = format_date_long(booking.check_in),
        check_out = format_date_long(booking.check_out),
        nights = booking.nights,
        guests = booking.guests,
        amount = format_inr(booking.amount),
        mode = booking.payment_mode.as_str(),
        status = display_payment_status(booking),
    )
}

fn details_text(booking: &Booking, id_label: &str) -> String {
    format!(
        "- {id_label}: {id}\n- Room Type: {room}\n- Check-in: {check_in}\n\
         - Check-out: {check_out}\n- Nights: {nights}\n- Guests: {guests}\n\
         - Total Amount: ₹{amount}\n- Payment Mode: {mode}\n- Payment Status: {status}\n",
        id = booking.booking_id,
        room = booking.room_type.as_str(),
        check_in = format_date_long(booking.check_in),
        check_out = format_date_long(booking.check_out),
        nights = booking.nights,
        guests = booking.guests,
        amount = format_inr(booking.amount),
        mode = booking.payment_mode.as_str(),
        status = display_payment_status(booking),
    )
}

fn times_html(hotel: &HotelInfo) -> String {
    format!(
        "<h2>Check-In / Check-Out Information</h2>\
         <p>Check-in Time: <strong>{check_in}</strong><br>\
         Check-out Time: <strong>{check_out}</strong></p>\
         <p>Note: Early check-in and late check-out are subject to availability \
         and may incur additional charges.</p>",
        check_in = hotel.check_in_time,
        check_out = hotel.check_out_time,
    )
}

fn times_text(hotel: &HotelInfo) -> String {
    format!(
        "CHECK-IN / CHECK-OUT INFORMATION:\n- Check-in Time: {}\n- Check-out Time: {}\n\
         Note: Early check-in and late check-out are subject to availability and may \
         incur additional charges.\n",
        hotel.check_in_time, hotel.check_out_time,
    )
}

fn contact_html(hotel: &HotelInfo) -> String {
    format!(
        "<h3>Need Help?</h3>\
         <p>Phone: {phone}<br>Email: {email}<br>Address: {address}</p>",
        phone = hotel.phone,
        email = hotel.email,
        address = hotel.address,
    )
}

fn contact_text(hotel: &HotelInfo) -> String {
    format!(
        "CONTACT INFORMATION:\nPhone: {}\nEmail: {}\nAddress: {}\n",
        hotel.phone, hotel.email, hotel.address,
    )
}

// A pay-at-hotel booking always displays "Pay at Hotel" for its payment
// status, whatever the stored status currently is.
fn display_payment_status(booking: &Booking) -> &str {
    if booking.payment_mode == PaymentMode::PayAtHotel {
        "Pay at Hotel"
    } else {
        booking.payment_status.as_str()
    }
}

fn format_date_long(date: NaiveDate) -> String {
    date.format("%A, %d %B %Y").to_string()
}

fn format_date_short(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

// Indian digit grouping: last three digits, then groups of two.
pub(crate) fn format_inr(amount: i64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::test_config;
    use crate::models::{BookingStatus, PaymentStatus, RoomCategory};
    use chrono::Utc;
    use test_case::test_case;

    fn booking(payment_mode: PaymentMode) -> Booking {
        Booking {
            id: 1,
            booking_id: "NJP82914407123".to_string(),
            customer_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+919828012345".to_string(),
            room_id: 1,
            room_type: RoomCategory::Standard,
            check_in: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            nights: 3,
            guests: 2,
            amount: 3000,
            payment_mode,
            payment_status: PaymentStatus::PendingPayment,
            booking_status: BookingStatus::Enquiry,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test_case(0, "0")]
    #[test_case(500, "500")]
    #[test_case(3000, "3,000")]
    #[test_case(100_000, "1,00,000")]
    #[test_case(12_345_678, "1,23,45,678")]
    fn inr_grouping(amount: i64, expected: &str) {
        assert_eq!(format_inr(amount), expected);
    }

    #[test]
    fn bank_details_appear_only_for_bank_transfer_confirmations() {
        let config = test_config();
        let with_bank = confirmation_email(
            &booking(PaymentMode::BankTransfer),
            &config.hotel,
            &config.bank,
        );
        assert!(with_bank.html_body.contains("Bank Transfer Details"));
        assert!(with_bank.text_body.contains("SBIN0001234"));
        assert!(with_bank.text_body.contains("NON-REFUNDABLE"));

        let without = confirmation_email(
            &booking(PaymentMode::PayAtHotel),
            &config.hotel,
            &config.bank,
        );
        assert!(!without.html_body.contains("Bank Transfer Details"));
        assert!(!without.text_body.contains("SBIN0001234"));
    }

    #[test]
    fn pay_at_hotel_masks_the_stored_payment_status() {
        let config = test_config();
        let email = acknowledgment_email(&booking(PaymentMode::PayAtHotel), &config.hotel);
        assert!(email.text_body.contains("Payment Status: Pay at Hotel"));

        let email = acknowledgment_email(&booking(PaymentMode::BankTransfer), &config.hotel);
        assert!(email.text_body.contains("Payment Status: Pending Payment"));
    }

    #[test]
    fn subjects_carry_the_booking_code() {
        let config = test_config();
        let b = booking(PaymentMode::PayAtHotel);
        let ack = render_email(
            NotificationKind::EnquiryAcknowledgment,
            &b,
            &config.hotel,
            &config.bank,
        );
        assert_eq!(
            ack.subject,
            "Enquiry Received - NJP82914407123 - Hotel Navjeevan Palace"
        );
        let cancelled = render_email(
            NotificationKind::BookingCancelled,
            &b,
            &config.hotel,
            &config.bank,
        );
        assert!(cancelled.subject.starts_with("Booking Cancelled"));
    }

    #[test]
    fn confirmation_sms_is_short_and_carries_the_code() {
        let config = test_config();
        let sms = render_sms(
            NotificationKind::BookingConfirmation,
            &booking(PaymentMode::PayAtHotel),
            &config.hotel,
        );
        assert!(sms.body.contains("NJP82914407123"));
        assert!(sms.body.contains("CONFIRMED"));
        assert!(sms.body.contains("3,000"));
        assert!(sms.body.len() < 320);
    }
}
