//! Coupon rendering
//!
//! Draws customer details, a QR code and the ticket number onto a fixed
//! template image. Every coordinate below belongs to that one template.

use crate::config::AssetConfig;
use crate::{CouponError, CouponRecord, Result};
use ab_glyph::{FontVec, PxScale};
use askama::Template;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use qrcode::QrCode;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FONT_SIZE: f32 = 35.0;

/// Left edge of the detail block on the right half of the template
const TEXT_X: i32 = 630;
const TEXT_Y: i32 = 130;
const LINE_HEIGHT: i32 = 50;

/// Pixels per QR module before the code is scaled into its box
const QR_MODULE_PX: u32 = 10;
/// White border around the code, in modules
pub const QR_BORDER_MODULES: u32 = 5;
const QR_SIZE: u32 = 300;
const QR_X: i64 = 90;
const QR_Y: i64 = 230;

/// Ticket line sits this far above the bottom edge, nudged left of centre
const TICKET_BOTTOM_MARGIN: i32 = 100;
const TICKET_X_NUDGE: i32 = 10;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Tried in order when the configured font cannot be loaded
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Template)]
#[template(path = "coupon_summary.html")]
struct CouponSummary<'a> {
    record: &'a CouponRecord,
    currency: &'a str,
}

/// On-screen markup for a coupon; customer input is HTML-escaped
pub fn summary_html(record: &CouponRecord, currency: &str) -> Result<String> {
    CouponSummary { record, currency }
        .render()
        .map_err(|e| CouponError::Template(e.to_string()))
}

/// Plain-text payload encoded into the QR code
pub fn qr_payload(record: &CouponRecord, currency: &str) -> String {
    format!(
        "Name: {}\nPhone: {}\nEmail: {}\nTicket Number: {}\nDiscount: {} {}",
        record.name, record.phone, record.email, record.ticket_number, record.discount, currency
    )
}

/// Black-on-white QR code, one module per `QR_MODULE_PX` pixels, framed by
/// a `QR_BORDER_MODULES` wide white border
pub fn qr_image(payload: &str) -> Result<GrayImage> {
    let code = QrCode::new(payload.as_bytes())?;
    let modules = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(QR_MODULE_PX, QR_MODULE_PX)
        .build();

    let border = QR_BORDER_MODULES * QR_MODULE_PX;
    let mut framed = GrayImage::from_pixel(
        modules.width() + 2 * border,
        modules.height() + 2 * border,
        Luma([255]),
    );
    imageops::replace(&mut framed, &modules, i64::from(border), i64::from(border));
    Ok(framed)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub struct CouponRenderer {
    template_path: PathBuf,
    font: Option<FontVec>,
    currency: String,
}

impl CouponRenderer {
    /// Build a renderer. A missing font degrades to the fallback list, then
    /// to no text at all; a missing template only fails at render time.
    pub fn new(assets: &AssetConfig, currency: impl Into<String>) -> Self {
        let font = assets
            .font_path
            .as_deref()
            .and_then(load_font)
            .or_else(|| {
                if let Some(path) = &assets.font_path {
                    warn!("Font {} unavailable, falling back to system fonts", path.display());
                }
                FALLBACK_FONTS.iter().map(Path::new).find_map(load_font)
            });

        if font.is_none() {
            warn!("No usable font found; coupon text will not be drawn");
        }

        Self {
            template_path: assets.template_path.clone(),
            font,
            currency: currency.into(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn summary_html(&self, record: &CouponRecord) -> Result<String> {
        summary_html(record, &self.currency)
    }

    /// Compose the coupon on a fresh copy of the template
    pub fn render(&self, record: &CouponRecord) -> Result<RgbaImage> {
        let mut canvas = image::open(&self.template_path)
            .map_err(|e| {
                CouponError::Template(format!("{}: {}", self.template_path.display(), e))
            })?
            .to_rgba8();
        let scale = PxScale::from(FONT_SIZE);

        if let Some(font) = &self.font {
            let lines = [
                format!("Name: {}", record.name),
                format!("Phone: {}", record.phone),
                format!("Email: {}", record.email),
                format!("Discount: {} {}", record.discount, self.currency),
            ];
            for (i, line) in lines.iter().enumerate() {
                let y = TEXT_Y + i as i32 * LINE_HEIGHT;
                draw_text_mut(&mut canvas, BLACK, TEXT_X, y, scale, font, line);
            }
        }

        let qr = qr_image(&qr_payload(record, &self.currency))?;
        let qr = imageops::resize(&qr, QR_SIZE, QR_SIZE, FilterType::Nearest);
        let qr = DynamicImage::ImageLuma8(qr).to_rgba8();
        imageops::replace(&mut canvas, &qr, QR_X, QR_Y);

        if let Some(font) = &self.font {
            let ticket_text = format!("Ticket No: {}", record.ticket_number);
            let (text_width, text_height) = text_size(scale, font, &ticket_text);
            let x = (canvas.width() as i32 - text_width as i32).div_euclid(2) - TICKET_X_NUDGE;
            let y = canvas.height() as i32 - text_height as i32 - TICKET_BOTTOM_MARGIN;
            draw_text_mut(&mut canvas, BLACK, x, y, scale, font, &ticket_text);
        }

        debug!("Rendered coupon for ticket {}", record.ticket_number);
        Ok(canvas)
    }

    pub fn render_png(&self, record: &CouponRecord) -> Result<Vec<u8>> {
        encode_png(&self.render(record)?)
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    FontVec::try_from_vec(bytes).ok()
}
