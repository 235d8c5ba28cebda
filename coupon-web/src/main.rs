//! Coupon Desk server
//!
//! Serves the staff coupon form and its JSON API.

use anyhow::Result;
use clap::Parser;
use coupon_core::delivery::SmtpMailer;
use coupon_core::render::CouponRenderer;
use coupon_core::{AppConfig, CouponService, CouponStore};
use coupon_web::{create_app, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Coupon Desk CLI
#[derive(Parser)]
#[command(name = "coupon-web")]
#[command(about = "Coupon Desk - staff form for issuing discount coupons", long_about = None)]
struct Cli {
    /// TOML configuration file; secrets may also come from COUPON_* variables
    #[arg(long, env = "COUPON_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;

    info!("🎫 Starting Coupon Desk for {}", config.business_name);

    let store = CouponStore::open(&config.database_url).await?;
    let renderer = CouponRenderer::new(&config.assets, config.currency.clone());
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

    let service = Arc::new(CouponService::new(config, store, renderer, mailer));
    let app = create_app(AppState { service });

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("🚀 Coupon Desk running on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
