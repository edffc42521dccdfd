// Public JSON endpoints: room catalog, enquiry submission, booking lookup,
// availability, bank details, liveness.

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::{BookingSummary, CreateBookingRequest};
use crate::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/rooms", web::get().to(get_rooms))
            .route("/rooms/{id}", web::get().to(get_room))
            .route("/bookings", web::post().to(create_booking))
            .route("/bookings/{booking_id}", web::get().to(get_booking))
            .route("/availability", web::get().to(check_availability))
            .route("/bank-details", web::get().to(bank_details)),
    )
    .route("/health", web::get().to(health));
}

async fn get_rooms(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rooms = state.store.list_active_rooms().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "rooms": rooms })))
}

async fn get_room(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let room = state
        .store
        .active_room(path.into_inner())
        .await?
        .ok_or(Error::NotFound("Room"))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "room": room })))
}

async fn create_booking(
    state: web::Data<AppState>,
    body: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse> {
    let booking = state.service.submit_enquiry(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Enquiry submitted successfully. You will receive an acknowledgment \
                    email shortly. Confirmation will be sent after review.",
        "booking": BookingSummary::from(&booking),
    })))
}

async fn get_booking(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let booking = state
        .store
        .booking_by_code(&path.into_inner())
        .await?
        .ok_or(Error::NotFound("Booking"))?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "booking": BookingSummary::from(&booking),
    })))
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    room_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
}

async fn check_availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse> {
    let available = state
        .service
        .is_available(query.room_id, query.check_in, query.check_out)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "available": available,
        "message": if available {
            "Room is available"
        } else {
            "Room is not available for selected dates"
        },
    })))
}

async fn bank_details(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "bankDetails": state.config.bank,
    })))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
