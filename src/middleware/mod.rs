pub mod auth;
pub mod rate_limit;
pub mod token_rate_limit;
