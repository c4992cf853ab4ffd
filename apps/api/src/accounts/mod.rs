//! Accounts: registration, login, bearer sessions and password reset.

pub mod handlers;
pub mod password;
pub mod service;
pub mod session;
pub mod store;
pub mod tokens;
