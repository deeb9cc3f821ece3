//! Runtime adapters: API surface and the tokio expiry driver.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod driver;

pub use api::{AdminOverview, Health, JoinResponse, ResourceRequest, StatusResponse};
#[cfg(feature = "tokio-runtime")]
pub use driver::{DriverHandle, ExpiryDriver};
