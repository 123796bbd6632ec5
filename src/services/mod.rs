pub mod dashboard_service;
pub mod gallery_service;
pub mod payment_gateway;
pub mod pricing;
pub mod registration_service;
pub mod webhook_service;
