pub mod booking;
pub mod booking_history;
pub mod booking_note;
pub mod driver;
pub mod fleet;
pub mod invoice;
pub mod invoice_item;
pub mod location_ping;
pub mod tracking_session;
pub mod user;
pub mod vehicle;
