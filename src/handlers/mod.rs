//! HTTP handlers

pub mod health;
pub mod photo;
pub mod upload;
pub mod admin;

#[cfg(test)]
pub(crate) mod testing;
