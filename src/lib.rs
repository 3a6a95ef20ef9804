pub mod bridge;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod otp;
pub mod qr;
pub mod vault;
