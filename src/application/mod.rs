pub mod config;
pub mod error;
pub mod notify;
pub mod reporting;
pub mod service;

pub use config::*;
pub use error::*;
pub use notify::*;
pub use reporting::*;
pub use service::*;
