//! Coupon Desk web form
//!
//! Staff-facing HTTP front end over `coupon_core`: the form page plus a small
//! JSON API for issuing, listing, exporting and clearing coupons.

use axum::{
    routing::{get, post},
    Router,
};
use coupon_core::CouponService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod handlers;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CouponService>,
}

/// Envelope for every JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Form page
        .route("/", get(handlers::form_page))

        // Coupon API
        .route(
            "/api/coupons",
            post(handlers::issue_coupon).delete(handlers::clear_coupons),
        )
        .route("/api/coupons/recent", get(handlers::recent_coupons))
        .route("/api/coupons/export", get(handlers::export_coupons))
        .route("/api/coupons/image", post(handlers::coupon_image))
        .route("/api/coupons/email", post(handlers::email_coupon))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
