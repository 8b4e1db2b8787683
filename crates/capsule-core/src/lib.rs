pub mod config;
pub mod error;
pub mod types;

pub use config::CapsuleConfig;
pub use error::{CapsuleError, CapsuleResult};
pub use types::CapsuleId;
