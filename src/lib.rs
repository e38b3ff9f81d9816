//! Declarative management of classes (batches) and enrollments on the
//! Adinusa learning platform.
//!
//! Callers log in once with [`Session::login`] and hand the session to the
//! lifecycle functions in [`class`] and [`enrollment`]. State lives with the
//! caller: each function takes the prior/desired records and returns the
//! observed one.

pub mod class;
pub mod client;
pub mod config;
pub mod diff;
pub mod enrollment;
pub mod error;
pub mod lookup;
pub mod models;

pub use client::Session;
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
