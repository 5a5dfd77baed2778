pub mod auth;
pub mod portfolios;
