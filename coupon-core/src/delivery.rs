//! Coupon delivery: SMTP email and click-to-chat links
//!
//! Email goes out over an authenticated STARTTLS session. The chat link only
//! pre-fills a message; nothing confirms that it was ever sent.

use crate::config::SmtpConfig;
use crate::{CouponRecord, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Name the rendered coupon is attached under
pub const ATTACHMENT_FILE_NAME: &str = "coupon.png";

const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Vec<u8>>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// Email for a freshly issued coupon, with the rendered image attached
pub fn coupon_email(
    record: &CouponRecord,
    business_name: &str,
    currency: &str,
    image_png: Vec<u8>,
) -> EmailMessage {
    EmailMessage {
        to: record.email.clone(),
        subject: format!("Your Discount Coupon From {}", business_name),
        body: format!(
            "Dear {name},\n\n\
             Thank you for shopping at {business}. As a valued customer, please find your discount coupon attached below:\n\n\
             Ticket Number: {ticket}\n\
             Discount: {discount} {currency}\n\n\
             Thank you for choosing {business}",
            name = record.name,
            business = business_name,
            ticket = record.ticket_number,
            discount = record.discount,
            currency = currency,
        ),
        attachment: Some(image_png),
    }
}

/// Text pre-filled into the chat client
pub fn chat_message(record: &CouponRecord, business_name: &str, currency: &str) -> String {
    format!(
        "Your discount coupon For {}:\nTicket Number: {}\nDiscount: {} {}",
        business_name, record.ticket_number, record.discount, currency
    )
}

/// `<base>/<phone>?text=<message>`, phone used as typed
pub fn chat_link(base_url: &str, phone: &str, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        base_url.trim_end_matches('/'),
        phone,
        urlencoding::encode(message)
    )
}

/// Assemble a multipart message: plain-text body plus optional attachment
pub fn build_message(from: &str, message: &EmailMessage) -> Result<Message> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = message.to.parse()?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
    if let Some(bytes) = &message.attachment {
        let content_type = ContentType::parse(ATTACHMENT_CONTENT_TYPE)
            .map_err(|e| crate::CouponError::Delivery(e.to_string()))?;
        parts = parts.singlepart(
            Attachment::new(ATTACHMENT_FILE_NAME.to_string()).body(bytes.clone(), content_type),
        );
    }

    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject)
        .multipart(parts)?)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// STARTTLS relay authenticated with the configured credentials.
    /// The username doubles as the sender address.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from: config.username.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let email = build_message(&self.from, &message)?;
        self.transport.send(email).await?;

        info!("📧 Email sent: {}", message.subject);
        Ok(())
    }
}
