//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// SMTP mail transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// SMTP server host.
    #[serde(default = "default_host")]
    pub smtp_host: String,
    /// SMTP server port (usually 587 for STARTTLS, 465 for TLS).
    #[serde(default = "default_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default)]
    pub password: String,
    /// Sender email address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_host(),
            smtp_port: default_port(),
            username: String::new(),
            password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "noreply@filedock.local".to_string()
}

fn default_from_name() -> String {
    "Filedock".to_string()
}
