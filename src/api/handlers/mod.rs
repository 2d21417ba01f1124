//! HTTP request handlers

pub mod checkout;
pub mod health;
pub mod videos;
