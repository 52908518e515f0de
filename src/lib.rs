//! Jan-Sahayak: voice dialogue assistant for filling government scheme forms.

pub mod api;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod extract;
pub mod services;
pub mod session;
pub mod speech;

pub use error::{Error, Result};
