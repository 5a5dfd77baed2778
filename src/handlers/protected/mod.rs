pub mod auth;
pub mod experiences;
pub mod portfolio;
pub mod profile;
pub mod projects;
