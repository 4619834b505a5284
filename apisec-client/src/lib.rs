//! HTTP client for the API-protection management service.
//!
//! [`HttpManagementClient`] implements [`apisec_core::ManagementService`]
//! over blocking `ureq` calls. Specifications are uploaded as
//! `multipart/form-data` (see [`multipart`]).

mod http;
pub mod multipart;

pub use http::{parse_inventory, ClientConfig, HttpManagementClient};
