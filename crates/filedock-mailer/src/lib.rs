//! Outbound mail delivery for Filedock.

pub mod smtp;

pub use smtp::SmtpMailer;
