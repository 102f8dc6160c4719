//! Utility modules

pub mod secret_string;
pub mod time;

pub use secret_string::SecretString;
pub use time::unix_millis;
