//! Client for the remote image filter service.
//!
//! The service exposes one `POST` endpoint per filter under a common base URL.
//! Each request carries the source image as a multipart part and, for filters
//! that take a parameter, the parameter as a plain string field. A `2xx` reply
//! carries the processed image as the raw body.

mod client;
mod filter;
mod request;

pub use client::{FilterClient, FilterService};
pub use filter::{FILTERS, FilterKind, FilterSelection, FilterSpec, ParameterSpec, Percentage};
pub use request::{FilterRequest, ServiceConfig};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request {url} failed. Error: {error}")]
    Request { url: String, error: reqwest::Error },

    #[error("Filter service {url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid content type `{0}`")]
    InvalidContentType(String),

    #[error("Unknown filter `{0}`")]
    UnknownFilter(String),
}
