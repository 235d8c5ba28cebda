use async_trait::async_trait;
use coupon_core::config::{AppConfig, AssetConfig};
use coupon_core::delivery::{EmailMessage, Mailer, ATTACHMENT_FILE_NAME};
use coupon_core::render::CouponRenderer;
use coupon_core::tokens::{TICKET_MAX, TICKET_MIN, UNIQUE_ID_LEN};
use coupon_core::{
    CouponError, CouponForm, CouponService, CouponStore, Discount, Result, ValidationError,
};
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const STAFF_PASSWORD: &str = "counter-secret";

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        if self.fail {
            return Err(CouponError::Delivery("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

async fn service(dir: &TempDir, mailer: Arc<RecordingMailer>) -> Result<CouponService> {
    let template_path = dir.path().join("ticket_template.png");
    RgbaImage::from_pixel(1200, 700, Rgba([255, 255, 255, 255])).save(&template_path)?;

    let config = AppConfig {
        business_name: "Corner Electronics".to_string(),
        staff_password: STAFF_PASSWORD.to_string(),
        assets: AssetConfig {
            template_path,
            font_path: None,
        },
        ..AppConfig::default()
    };

    let store = CouponStore::open_path(dir.path().join("coupons.db")).await?;
    let renderer = CouponRenderer::new(&config.assets, config.currency.clone());
    Ok(CouponService::new(config, store, renderer, mailer))
}

fn ali() -> CouponForm {
    CouponForm {
        name: "Ali".to_string(),
        phone: "+96890000000".to_string(),
        email: "ali@x.com".to_string(),
        discount: Discount::Ten,
        password: STAFF_PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn test_issue_stores_one_matching_row() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir, Arc::new(RecordingMailer::default())).await?;

    let coupon = service.issue(ali()).await?;
    let record = &coupon.record;

    assert_eq!(record.name, "Ali");
    assert_eq!(record.phone, "+96890000000");
    assert_eq!(record.email, "ali@x.com");
    assert_eq!(record.discount, Discount::Ten);
    assert!((TICKET_MIN..=TICKET_MAX).contains(&record.ticket_number));
    assert_eq!(record.unique_id.len(), UNIQUE_ID_LEN);

    assert_eq!(service.store().all().await?, vec![record.clone()]);

    let image = service.render_png(&coupon)?;
    assert!(!image.is_empty());

    let link = service.chat_link(&coupon);
    assert!(link.starts_with("https://wa.me/+96890000000?text=Your%20discount"));

    Ok(())
}

#[tokio::test]
async fn test_rejected_submissions_store_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir, Arc::new(RecordingMailer::default())).await?;

    let mut no_name = ali();
    no_name.name.clear();
    let mut no_password = ali();
    no_password.password.clear();
    let mut wrong_password = ali();
    wrong_password.password = "guess".to_string();

    assert!(matches!(
        service.issue(no_name).await,
        Err(CouponError::Validation(ValidationError::MissingField("name")))
    ));
    assert!(matches!(
        service.issue(no_password).await,
        Err(CouponError::Validation(ValidationError::MissingField("password")))
    ));
    assert!(matches!(
        service.issue(wrong_password).await,
        Err(CouponError::Validation(ValidationError::IncorrectPassword))
    ));

    assert_eq!(service.store().count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_email_carries_rendered_coupon() -> Result<()> {
    let dir = TempDir::new()?;
    let mailer = Arc::new(RecordingMailer::default());
    let service = service(&dir, mailer.clone()).await?;

    let coupon = service.issue(ali()).await?;
    service.send_email(&coupon).await?;

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ali@x.com");
    assert_eq!(sent[0].subject, "Your Discount Coupon From Corner Electronics");
    assert_eq!(sent[0].attachment.as_deref(), Some(service.render_png(&coupon)?.as_slice()));
    assert_eq!(ATTACHMENT_FILE_NAME, "coupon.png");

    Ok(())
}

#[tokio::test]
async fn test_failed_email_keeps_stored_row() -> Result<()> {
    let dir = TempDir::new()?;
    let mailer = Arc::new(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    });
    let service = service(&dir, mailer).await?;

    let coupon = service.issue(ali()).await?;
    assert!(matches!(
        service.send_email(&coupon).await,
        Err(CouponError::Delivery(_))
    ));

    assert_eq!(service.store().all().await?, vec![coupon.record]);
    Ok(())
}

#[tokio::test]
async fn test_export_and_clear_through_service() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir, Arc::new(RecordingMailer::default())).await?;

    let first = service.issue(ali()).await?;
    let second = service.issue(ali()).await?;

    let recent = service.recent(10).await?;
    assert_eq!(recent, vec![second.record.clone(), first.record.clone()]);

    let csv = service.export_csv().await?;
    let parsed = coupon_core::export::from_csv(&csv)?;
    assert_eq!(parsed, vec![first.record, second.record]);

    assert_eq!(service.clear().await?, 2);
    assert!(service.store().all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_recall_requires_password_and_stored_record() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir, Arc::new(RecordingMailer::default())).await?;

    let coupon = service.issue(ali()).await?;

    let recalled = service.recall(coupon.record.clone(), STAFF_PASSWORD).await?;
    assert_eq!(recalled, coupon);

    assert!(matches!(
        service.recall(coupon.record.clone(), "").await,
        Err(CouponError::Validation(ValidationError::MissingField("password")))
    ));
    assert!(matches!(
        service.recall(coupon.record.clone(), "guess").await,
        Err(CouponError::Validation(ValidationError::IncorrectPassword))
    ));

    // Same identifier, different recipient: not the stored row
    let mut redirected = coupon.record.clone();
    redirected.email = "someone-else@example.org".to_string();
    assert!(matches!(
        service.recall(redirected, STAFF_PASSWORD).await,
        Err(CouponError::UnknownCoupon(_))
    ));

    let mut never_issued = coupon.record;
    never_issued.unique_id = "AAAAAAAAAAAAAAAAAAAA".to_string();
    assert!(matches!(
        service.recall(never_issued, STAFF_PASSWORD).await,
        Err(CouponError::UnknownCoupon(_))
    ));

    Ok(())
}
