pub mod bookings;
pub mod dispatch;
pub mod invoicing;
pub mod notify;
pub mod tracking;
