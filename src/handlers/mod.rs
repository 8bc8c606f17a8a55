pub mod admin;
pub mod auth;
pub mod fleet;
pub mod invoices;
pub mod public;
