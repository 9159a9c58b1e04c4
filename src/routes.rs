use axum::{
    routing::{get, post},
    Router,
};

use crate::{billing, membership};

pub fn api_routes() -> Router {
    Router::new()
        .route("/api/membership", get(membership::membership_summary))
        .route(
            "/api/assignments/:assignment_id/registrations",
            get(billing::billing_list_registrations),
        )
        .route(
            "/api/assignments/:assignment_id/registrations/:registration_id/periods",
            get(billing::billing_period_schedule),
        )
        .route(
            "/api/assignments/:assignment_id/registrations/:registration_id/enrollment",
            post(billing::billing_record_enrollment),
        )
        .route(
            "/api/assignments/:assignment_id/registrations/:registration_id/periods/:index",
            post(billing::billing_pay_period),
        )
}
