//! Trust file - the persisted ordered record sequence
//!
//! A trust file is plain UTF-8 text, one record per line: blank lines,
//! `#` comments, and vouch/denounce entries. `codec` maps text to and from
//! records without losing anything; `store` layers the CRUD semantics and
//! sorting discipline on top.

pub mod codec;
pub mod store;

pub use codec::{Entry, EntryKind, Record};
pub use store::{TrustFile, TrustStatus};

/// Header written when a trust file is auto-initialized on a mutation path
pub const INIT_TEMPLATE: &str = "\
# This file lists identities that are vouched for (or denounced) on this
# project. One record per line: `[platform:]username [details]`, with a
# leading `-` marking a denouncement. Managed by vouch; edit with care.
";
