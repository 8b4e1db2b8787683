//! capsule-lock: Password protection for individual capsules
//!
//! A [`CapsuleLock`] owns one capsule's content for a session and mediates
//! every password check against it. Failed attempts go to an injected
//! [`AttemptStore`]; the [`LockoutPolicy`] turns that history into a
//! time-boxed lockout, read through an injected [`Clock`].

pub mod attempts;
pub mod clock;
pub mod error;
pub mod machine;
pub mod policy;

pub use attempts::{AttemptStore, JsonAttemptStore, MemoryAttemptStore, PasswordAttempt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LockError, LockResult};
pub use machine::{CapsuleLock, LockState};
pub use policy::LockoutPolicy;
