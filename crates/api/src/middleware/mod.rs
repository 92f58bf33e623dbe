//! Request extractors for authentication and scope resolution.

pub mod auth;
pub mod scope;
