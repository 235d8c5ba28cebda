//! Coupon issuing flow
//!
//! Ties validation, token generation, storage, rendering and delivery
//! together. A record is stored before any delivery is attempted, so a
//! failed email never removes it again.

use crate::config::AppConfig;
use crate::delivery::{self, Mailer};
use crate::export;
use crate::form::{self, CouponForm};
use crate::render::CouponRenderer;
use crate::store::CouponStore;
use crate::tokens;
use crate::{CouponError, CouponRecord, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// The coupon currently on screen: lives for one render/delivery cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCoupon {
    pub record: CouponRecord,
}

pub struct CouponService {
    store: CouponStore,
    renderer: CouponRenderer,
    mailer: Arc<dyn Mailer>,
    config: AppConfig,
}

impl CouponService {
    pub fn new(
        config: AppConfig,
        store: CouponStore,
        renderer: CouponRenderer,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            renderer,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CouponStore {
        &self.store
    }

    /// Validate the submission, draw tokens and store the new row
    pub async fn issue(&self, form: CouponForm) -> Result<IssuedCoupon> {
        let coupon = form.validate(&self.config.staff_password)?;
        let (ticket_number, unique_id) = tokens::generate();

        let record = CouponRecord {
            name: coupon.name,
            phone: coupon.phone,
            email: coupon.email,
            ticket_number,
            unique_id,
            discount: coupon.discount,
        };
        self.store.insert(&record).await?;

        info!("🎫 Issued coupon ticket {} ({} {})", record.ticket_number, record.discount, self.config.currency);
        Ok(IssuedCoupon { record })
    }

    /// Staff password check for actions outside the issue form
    pub fn authorize(&self, password: &str) -> Result<()> {
        form::check_staff_password(password, &self.config.staff_password)?;
        Ok(())
    }

    /// Bring back a coupon the client is still showing. Only staff may do
    /// this, and only for a record that matches a stored row exactly.
    pub async fn recall(&self, record: CouponRecord, password: &str) -> Result<IssuedCoupon> {
        self.authorize(password)?;

        let stored = self.store.find_by_unique_id(&record.unique_id).await?;
        if !stored.contains(&record) {
            return Err(CouponError::UnknownCoupon(format!(
                "ticket {}",
                record.ticket_number
            )));
        }

        Ok(IssuedCoupon { record })
    }

    pub fn summary_html(&self, coupon: &IssuedCoupon) -> Result<String> {
        self.renderer.summary_html(&coupon.record)
    }

    pub fn render_png(&self, coupon: &IssuedCoupon) -> Result<Vec<u8>> {
        self.renderer.render_png(&coupon.record)
    }

    pub fn chat_link(&self, coupon: &IssuedCoupon) -> String {
        let message = delivery::chat_message(
            &coupon.record,
            &self.config.business_name,
            &self.config.currency,
        );
        delivery::chat_link(&self.config.chat_base_url, &coupon.record.phone, &message)
    }

    /// Render the coupon and email it to the customer's address
    pub async fn send_email(&self, coupon: &IssuedCoupon) -> Result<()> {
        let image = self.render_png(coupon)?;
        let message = delivery::coupon_email(
            &coupon.record,
            &self.config.business_name,
            &self.config.currency,
            image,
        );
        self.mailer.send(message).await?;

        info!("📧 Coupon ticket {} emailed", coupon.record.ticket_number);
        Ok(())
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<CouponRecord>> {
        self.store.recent(limit).await
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let records = self.store.all().await?;
        export::to_csv(&records)
    }

    pub async fn clear(&self) -> Result<u64> {
        self.store.clear().await
    }
}
