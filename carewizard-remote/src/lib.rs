pub mod client;
pub mod error;

pub use client::{entity_route, failure_message, submit_route, HttpClinicApi, Route};
pub use error::{RemoteError, Result};
