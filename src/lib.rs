//! Event registration service: a public sign-up form with PIX payment through
//! Mercado Pago, a payment status page, and a password-gated admin dashboard
//! for registrations and the media gallery.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod web;
