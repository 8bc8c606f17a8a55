pub mod lifecycle;
pub mod money;
pub mod quote;
