pub mod http;

pub use http::{HttpBackendError, HttpPanelBackend};
