// Library exports for cookpress
// The binary and integration tests both go through these modules

pub mod config;
pub mod error;
pub mod wordpress;

pub use error::{ContentError, ContentResult};
pub use wordpress::ContentClient;
