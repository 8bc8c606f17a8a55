use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, fleet, invoices, public};
use crate::middleware::auth::{auth_middleware, require_admin, require_fleet};
use crate::middleware::rate_limit::{create_fleet_governor, create_public_governor};
use crate::middleware::token_rate_limit::create_token_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Per-user governor for the fleet dashboard
    let fleet_governor = create_fleet_governor();
    // IP-based governor for unauthenticated routes
    let public_governor = create_public_governor();
    // Per-token governor for the tracking ping endpoint (one driver app per
    // session token, so the key is the token, not the IP)
    let token_governor = create_token_governor();

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public booking funnel: quote, book, pay
    let public_routes = Router::new()
        .route("/quotes", post(public::get_quote))
        .route("/bookings", post(public::create_booking))
        .route("/payments/create-session", post(public::create_payment_session))
        .route("/payments/webhook", post(public::payment_webhook))
        .route("/customer/tracking/{reference}", get(public::get_tracking))
        .route("/customer/rating/{reference}", post(public::submit_rating))
        .layer(public_governor);

    // Driver location pings are keyed by session token rather than IP
    let ping_routes = Router::new()
        .route("/tracking/ping/{token}", post(public::record_ping))
        .layer(token_governor);

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Booking management
        .route("/bookings", get(admin::list_bookings))
        .route("/bookings/{id}", get(admin::get_booking))
        .route("/bookings/{id}/status", put(admin::update_status))
        .route("/bookings/{id}/admin-notes", put(admin::update_admin_notes))
        .route("/bookings/{id}/assign", post(admin::assign_fleet))
        .route("/bookings/{id}/notes", post(admin::add_note))
        .route("/bookings/{id}/notes", get(admin::list_notes))
        .route("/bookings/{id}/history", get(admin::booking_history))
        // Tracking links
        .route("/bookings/{id}/tracking", post(admin::generate_tracking))
        .route(
            "/bookings/{id}/tracking/send-email",
            post(admin::send_tracking_email),
        )
        // Fleets & impersonation
        .route("/fleets", get(admin::list_fleets))
        .route(
            "/fleets/{id}/impersonate",
            post(admin::impersonate_fleet),
        )
        // Invoicing
        .route("/invoices", get(invoices::list_invoices))
        .route("/invoices", post(invoices::generate))
        .route("/invoices/uninvoiced", get(invoices::uninvoiced_bookings))
        .route(
            "/invoices/auto-generate-fleet",
            post(invoices::auto_generate_fleet),
        )
        .route("/invoices/{id}", get(invoices::get_invoice))
        .route("/invoices/{id}", put(invoices::update_draft))
        .route("/invoices/{id}/submit", post(invoices::submit_for_approval))
        .route("/invoices/{id}/approve", post(invoices::approve))
        .route("/invoices/{id}/issue", post(invoices::issue))
        .route("/invoices/{id}/mark-paid", post(invoices::mark_paid))
        .route("/invoices/{id}/cancel", post(invoices::cancel))
        .route(
            "/invoices/{id}/items/{booking_id}",
            delete(invoices::remove_item),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Fleet routes (requires auth + fleet role, or admin acting as a fleet)
    let fleet_routes = Router::new()
        .route("/jobs", get(fleet::my_jobs))
        .route("/jobs/{id}/accept", put(fleet::accept_job))
        .route("/jobs/{id}/assign-driver", put(fleet::assign_driver))
        .layer(fleet_governor)
        .layer(middleware::from_fn(require_fleet))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api", ping_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/fleet", fleet_routes)
        .with_state(state)
}
