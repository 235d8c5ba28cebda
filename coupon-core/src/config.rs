//! Application configuration
//!
//! Loaded from a TOML file; secrets can be supplied or overridden through
//! `COUPON_*` environment variables so they stay out of the file.

use crate::{CouponError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub business_name: String,
    pub currency: String,
    pub chat_base_url: String,
    pub staff_password: String,
    pub assets: AssetConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub template_path: PathBuf,
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:coupons.db".to_string(),
            business_name: "Our Store".to_string(),
            currency: "OMR".to_string(),
            chat_base_url: "https://wa.me".to_string(),
            staff_password: String::new(),
            assets: AssetConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("assets/ticket_template.png"),
            font_path: Some(PathBuf::from("assets/Arial.ttf")),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CouponError::Config(e.to_string()))
    }

    /// Read a TOML file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CouponError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Environment-only configuration, for deployments without a file
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay secrets from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COUPON_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(password) = lookup("COUPON_STAFF_PASSWORD") {
            self.staff_password = password;
        }
        if let Some(host) = lookup("COUPON_SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Some(port) = lookup("COUPON_SMTP_PORT") {
            self.smtp.port = port
                .parse()
                .map_err(|_| CouponError::Config(format!("invalid SMTP port: {}", port)))?;
        }
        if let Some(username) = lookup("COUPON_SMTP_USERNAME") {
            self.smtp.username = username;
        }
        if let Some(password) = lookup("COUPON_SMTP_PASSWORD") {
            self.smtp.password = password;
        }
        Ok(())
    }

    /// Startup checks. Email settings are only checked when a mailer is built.
    pub fn validate(&self) -> Result<()> {
        if self.staff_password.is_empty() {
            return Err(CouponError::Config("staff password is not set".to_string()));
        }
        if self.database_url.is_empty() {
            return Err(CouponError::Config("database url is empty".to_string()));
        }
        Ok(())
    }
}

impl SmtpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(CouponError::Config("SMTP host is not set".to_string()));
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(CouponError::Config("SMTP credentials are not set".to_string()));
        }
        Ok(())
    }
}
