//! Token and hashing primitives shared by the posting backend.

pub mod hash;
pub mod jwt;

pub use hash::{sha256, sha256_hex};
