pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Stored credential hash is malformed")]
    MalformedHash,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),
}
