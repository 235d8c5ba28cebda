use crate::{ApiResponse, AppState};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use coupon_core::export::{EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME};
use coupon_core::store::DEFAULT_RECENT_LIMIT;
use coupon_core::{CouponError, CouponForm, CouponRecord, Discount, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Template)]
#[template(path = "form.html")]
struct FormPage<'a> {
    business_name: &'a str,
    currency: &'a str,
    discounts: Vec<u32>,
}

/// Everything the page needs to show a freshly issued coupon
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueResponse {
    pub record: CouponRecord,
    pub summary_html: String,
    pub chat_link: String,
    pub image_png_base64: String,
}

/// A coupon the page is still showing, plus the staff password
#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub record: CouponRecord,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct StaffAuth {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

/// Map a core error onto a status code. Validation and lookup problems are the caller's
/// to fix; everything else fails the request.
fn failure(err: CouponError) -> Response {
    let status = match &err {
        CouponError::Validation(ValidationError::IncorrectPassword) => StatusCode::FORBIDDEN,
        CouponError::Validation(_) => StatusCode::BAD_REQUEST,
        CouponError::UnknownCoupon(_) => StatusCode::NOT_FOUND,
        CouponError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CouponError::Delivery(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_client_error() {
        warn!("Rejected request: {}", err);
    } else {
        error!("Request failed: {}", err);
    }

    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

pub async fn form_page(State(state): State<AppState>) -> Response {
    let config = state.service.config();
    let page = FormPage {
        business_name: &config.business_name,
        currency: &config.currency,
        discounts: Discount::ALL.iter().map(|d| d.amount()).collect(),
    };

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => failure(CouponError::Template(e.to_string())),
    }
}

pub async fn issue_coupon(
    State(state): State<AppState>,
    Json(form): Json<CouponForm>,
) -> Response {
    let service = &state.service;

    let coupon = match service.issue(form).await {
        Ok(coupon) => coupon,
        Err(e) => return failure(e),
    };

    // The row is already stored; a render failure still fails the request
    let summary_html = match service.summary_html(&coupon) {
        Ok(html) => html,
        Err(e) => return failure(e),
    };
    let image = match service.render_png(&coupon) {
        Ok(png) => png,
        Err(e) => return failure(e),
    };

    let response = IssueResponse {
        chat_link: service.chat_link(&coupon),
        image_png_base64: STANDARD.encode(image),
        summary_html,
        record: coupon.record,
    };
    (StatusCode::CREATED, Json(ApiResponse::success(response))).into_response()
}

pub async fn recent_coupons(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    match state.service.recent(limit).await {
        Ok(records) => Json(ApiResponse::success(records)).into_response(),
        Err(e) => failure(e),
    }
}

pub async fn export_coupons(State(state): State<AppState>) -> Response {
    match state.service.export_csv().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => failure(e),
    }
}

pub async fn clear_coupons(
    State(state): State<AppState>,
    Json(auth): Json<StaffAuth>,
) -> Response {
    if let Err(e) = state.service.authorize(&auth.password) {
        return failure(e);
    }

    match state.service.clear().await {
        Ok(removed) => {
            info!("Database cleared ({} rows)", removed);
            Json(ApiResponse::success(removed)).into_response()
        }
        Err(e) => failure(e),
    }
}

pub async fn coupon_image(
    State(state): State<AppState>,
    Json(req): Json<CouponRequest>,
) -> Response {
    let coupon = match state.service.recall(req.record, &req.password).await {
        Ok(coupon) => coupon,
        Err(e) => return failure(e),
    };

    match state.service.render_png(&coupon) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => failure(e),
    }
}

pub async fn email_coupon(
    State(state): State<AppState>,
    Json(req): Json<CouponRequest>,
) -> Response {
    let coupon = match state.service.recall(req.record, &req.password).await {
        Ok(coupon) => coupon,
        Err(e) => return failure(e),
    };

    match state.service.send_email(&coupon).await {
        Ok(()) => Json(ApiResponse::success("Coupon sent via email!")).into_response(),
        Err(e) => failure(e),
    }
}
