// Admin JSON surface: login/logout, dashboard aggregates, booking list and
// detail, lifecycle actions, CSV export. Every route except login requires
// a live session cookie.

use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Days, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{BookingFilter, BookingStatus};
use crate::session::{AdminGuard, SESSION_COOKIE};
use crate::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/dashboard", web::get().to(dashboard))
            .route("/bookings", web::get().to(list_bookings))
            .route("/bookings/{id}", web::get().to(view_booking))
            .route("/bookings/{id}/status", web::put().to(update_status))
            .route("/bookings/{id}/confirm-payment", web::put().to(confirm_payment))
            .route("/bookings/{id}/confirm-enquiry", web::put().to(confirm_enquiry))
            .route("/bookings/{id}/cancel", web::put().to(cancel_booking))
            .route("/export", web::get().to(export_bookings)),
    );
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let admin = &state.config.admin;
    let email = body.email.trim().to_lowercase();
    if email != admin.email.to_lowercase() || body.password != admin.password {
        tracing::warn!(email = %email, "failed admin login attempt");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Invalid email or password"
        })));
    }

    let token = state.sessions.create(&email);
    tracing::info!(email = %email, "admin login successful");
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .finish();
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "success": true, "email": email })))
}

async fn logout(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "success": true })))
}

async fn dashboard(state: web::Data<AppState>, guard: AdminGuard) -> Result<HttpResponse> {
    let store = &state.store;
    let today = Utc::now().date_naive();
    let today_start = today.and_time(NaiveTime::MIN).and_utc();

    let stats = json!({
        "totalBookings": store.count_bookings().await?,
        "todayBookings": store.count_created_since(today_start).await?,
        "pendingEnquiries": store.count_by_status(BookingStatus::Enquiry).await?,
        "confirmedBookings": store.count_active_confirmed().await?,
        "totalRevenue": store.total_revenue().await?,
    });
    let recent = store.recent_bookings(10).await?;
    let upcoming = store
        .upcoming_check_ins(today, today + Days::new(7), 10)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "adminEmail": guard.admin_email,
        "stats": stats,
        "recentBookings": recent,
        "upcomingCheckIns": upcoming,
    })))
}

async fn list_bookings(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    query: web::Query<BookingFilter>,
) -> Result<HttpResponse> {
    let filter = query.into_inner();
    let (bookings, total) = state.store.list_bookings(&filter).await?;
    let limit = i64::from(filter.limit());
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "bookings": bookings,
        "pagination": {
            "page": filter.page(),
            "limit": filter.limit(),
            "total": total,
            "totalPages": (total + limit - 1) / limit,
        },
    })))
}

async fn view_booking(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let booking = state
        .store
        .booking(path.into_inner())
        .await?
        .ok_or(crate::error::Error::NotFound("Booking"))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "booking": booking })))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    booking_status: BookingStatus,
    #[serde(default)]
    force: bool,
}

async fn update_status(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
    let booking = state
        .service
        .update_status(path.into_inner(), body.booking_status, body.force)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Booking status updated",
        "booking": booking,
    })))
}

async fn confirm_payment(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let booking = state.service.confirm_payment(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Payment confirmed and confirmation email sent",
        "booking": booking,
    })))
}

// The one lifecycle operation that waits for its email so the panel can
// show whether the guest was actually notified.
async fn confirm_enquiry(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let confirmed = state.service.confirm_enquiry(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Enquiry confirmed! Confirmation email sent to customer.",
        "emailSent": confirmed.email.success,
        "emailError": confirmed.email.error,
        "booking": confirmed.booking,
    })))
}

async fn cancel_booking(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let booking = state.service.cancel(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Booking cancelled",
        "booking": booking,
    })))
}

async fn export_bookings(
    state: web::Data<AppState>,
    _guard: AdminGuard,
    query: web::Query<BookingFilter>,
) -> Result<HttpResponse> {
    let bookings = state.store.filtered_bookings(&query.into_inner()).await?;
    let csv = bookings_csv(&bookings);
    let filename = format!(
        "bookings-export-{}.csv",
        Utc::now().format("%Y%m%d%H%M%S")
    );
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(csv))
}

const CSV_HEADER: &str = "Booking ID,Customer Name,Email,Phone,Room Type,Check-in,Check-out,\
                          Nights,Guests,Amount,Payment Mode,Payment Status,Booking Status,Created At";

fn bookings_csv(bookings: &[crate::models::Booking]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for b in bookings {
        let row = [
            csv_field(&b.booking_id),
            csv_field(&b.customer_name),
            csv_field(&b.email),
            csv_field(&b.phone),
            csv_field(b.room_type.as_str()),
            b.check_in.format("%d/%m/%Y").to_string(),
            b.check_out.format("%d/%m/%Y").to_string(),
            b.nights.to_string(),
            b.guests.to_string(),
            b.amount.to_string(),
            csv_field(b.payment_mode.as_str()),
            csv_field(b.payment_status.as_str()),
            csv_field(b.booking_status.as_str()),
            b.created_at.format("%d/%m/%Y").to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::test_state;
    use crate::store::testing::{new_booking, standard_room};
    use actix_web::{test, App};
    use chrono::NaiveDate;

    fn in_days(days: u64) -> NaiveDate {
        Utc::now().date_naive() + Days::new(days)
    }

    // Logs in through its own service instance; the session store lives in
    // the shared state, so the cookie is valid for any app built on it.
    async fn login_cookie(state: &web::Data<AppState>) -> Cookie<'static> {
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/admin/login")
                .set_json(json!({ "email": "admin@example.com", "password": "secret" }))
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        resp.response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn admin_routes_require_a_session() {
        let state = test_state().await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/admin/dashboard").to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn bad_credentials_are_rejected_neutrally() {
        let state = test_state().await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/admin/login")
                .set_json(json!({ "email": "admin@example.com", "password": "wrong" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[actix_web::test]
    async fn dashboard_reports_counts_and_revenue() {
        let state = test_state().await;
        let room = state.store.create_room(standard_room()).await.unwrap();
        let paid = state
            .store
            .create_booking(new_booking(&room, "NJPD1", in_days(2), in_days(4)))
            .await
            .unwrap();
        state
            .store
            .set_statuses(
                paid.id,
                BookingStatus::Confirmed,
                crate::models::PaymentStatus::Paid,
            )
            .await
            .unwrap();
        state
            .store
            .create_booking(new_booking(&room, "NJPD2", in_days(20), in_days(22)))
            .await
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let cookie = login_cookie(&state).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/admin/dashboard")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["stats"]["totalBookings"], 2);
        assert_eq!(body["stats"]["pendingEnquiries"], 1);
        assert_eq!(body["stats"]["confirmedBookings"], 1);
        assert_eq!(body["stats"]["totalRevenue"], 2000);
        // Only the confirmed stay within the next week shows up.
        assert_eq!(body["upcomingCheckIns"].as_array().unwrap().len(), 1);
        assert_eq!(body["upcomingCheckIns"][0]["booking_id"], "NJPD1");
    }

    #[actix_web::test]
    async fn confirm_enquiry_round_trip_reports_the_email_outcome() {
        let state = test_state().await;
        let room = state.store.create_room(standard_room()).await.unwrap();
        let booking = state
            .store
            .create_booking(new_booking(&room, "NJPCE1", in_days(5), in_days(7)))
            .await
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let cookie = login_cookie(&state).await;
        let uri = format!("/admin/bookings/{}/confirm-enquiry", booking.id);
        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["emailSent"], true);
        assert_eq!(body["booking"]["booking_status"], "Confirmed");
        // Pay-at-hotel enquiries get their payment committed on confirmation.
        assert_eq!(body["booking"]["payment_status"], "Confirmed");

        // Confirming twice is a state conflict.
        let resp = test::call_service(
            &app,
            test::TestRequest::put().uri(&uri).cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 409);
    }

    #[actix_web::test]
    async fn status_updates_respect_the_table_unless_forced() {
        let state = test_state().await;
        let room = state.store.create_room(standard_room()).await.unwrap();
        let booking = state
            .store
            .create_booking(new_booking(&room, "NJPST1", in_days(5), in_days(7)))
            .await
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let cookie = login_cookie(&state).await;
        let uri = format!("/admin/bookings/{}/status", booking.id);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .cookie(cookie.clone())
                .set_json(json!({ "booking_status": "Checked Out" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 409);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .cookie(cookie)
                .set_json(json!({ "booking_status": "Checked Out", "force": true }))
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["booking"]["booking_status"], "Checked Out");
    }

    #[actix_web::test]
    async fn export_streams_filtered_bookings_as_csv() {
        let state = test_state().await;
        let room = state.store.create_room(standard_room()).await.unwrap();
        state
            .store
            .create_booking(new_booking(&room, "NJPEX1", in_days(5), in_days(7)))
            .await
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let cookie = login_cookie(&state).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/admin/export?status=Enquiry")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        assert!(resp
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("attachment"));
        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Booking ID,Customer Name"));
        assert!(lines.next().unwrap().contains("NJPEX1"));
    }

    #[actix_web::test]
    async fn logout_invalidates_the_session() {
        let state = test_state().await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let cookie = login_cookie(&state).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/admin/logout")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/admin/dashboard")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 401);
    }

    #[::core::prelude::v1::test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
