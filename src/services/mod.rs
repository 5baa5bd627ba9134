pub mod cart_service;
pub mod checkout_service;
pub mod lookup_service;
pub mod notification_service;
pub mod order_code;
pub mod pricing;
pub mod webhook_service;
