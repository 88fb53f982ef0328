//! Vouch core library exports

pub mod authz;
pub mod codeowners;
pub mod comment;
pub mod config;
pub mod error;
pub mod github;
pub mod handle;
pub mod ops;
pub mod trustfile;
pub mod writer;

pub use error::VouchError;
pub use handle::Handle;
pub use trustfile::{Record, TrustFile, TrustStatus};
