//! In-memory CRUD over the trust file record sequence
//!
//! Mutations keep one invariant: at most one entry per normalized
//! `(platform-or-default, username)` key, with non-entry records floated to
//! the top in their original relative order and entries sorted below them.
//! A pure parse/serialize cycle never triggers the re-sort; only mutations
//! do.

use crate::handle::Handle;
use crate::trustfile::codec::{self, Entry, EntryKind, Record};

/// Result of looking a user up in the trust file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStatus {
    Vouched,
    Denounced,
    Unknown,
}

impl std::fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrustStatus::Vouched => "vouched",
            TrustStatus::Denounced => "denounced",
            TrustStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// An ordered trust file held in memory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrustFile {
    records: Vec<Record>,
}

impl TrustFile {
    pub fn new(records: Vec<Record>) -> Self {
        TrustFile { records }
    }

    pub fn parse(text: &str) -> Self {
        TrustFile {
            records: codec::parse(text),
        }
    }

    pub fn serialize(&self) -> String {
        codec::serialize(&self.records)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// First entry matching the user, in record order
    pub fn find(&self, username: &str, default_platform: Option<&str>) -> Option<&Entry> {
        let target = Handle::parse(username);
        self.records.iter().find_map(|record| match record {
            Record::Entry(entry) if entry.handle.matches(&target, default_platform) => Some(entry),
            _ => None,
        })
    }

    /// Look up a user's status. First matching entry wins; pure read.
    pub fn check(&self, username: &str, default_platform: Option<&str>) -> TrustStatus {
        match self.find(username, default_platform) {
            Some(entry) => match entry.kind {
                EntryKind::Vouch => TrustStatus::Vouched,
                EntryKind::Denounce => TrustStatus::Denounced,
            },
            None => TrustStatus::Unknown,
        }
    }

    /// Vouch for a user, replacing any existing entry for the same identity
    pub fn add(&mut self, username: &str, default_platform: Option<&str>, details: Option<String>) {
        self.remove(username, default_platform);
        self.records.push(Record::Entry(Entry {
            kind: EntryKind::Vouch,
            handle: Handle::parse(username),
            details,
        }));
        self.sort();
    }

    /// Denounce a user; an empty reason is stored as no details at all
    pub fn denounce(&mut self, username: &str, reason: &str, default_platform: Option<&str>) {
        self.remove(username, default_platform);
        let details = if reason.is_empty() {
            None
        } else {
            Some(reason.to_string())
        };
        self.records.push(Record::Entry(Entry {
            kind: EntryKind::Denounce,
            handle: Handle::parse(username),
            details,
        }));
        self.sort();
    }

    /// Drop every entry matching the user; comments and blanks are untouched
    pub fn remove(&mut self, username: &str, default_platform: Option<&str>) {
        let target = Handle::parse(username);
        self.records.retain(|record| match record {
            Record::Entry(entry) => !entry.handle.matches(&target, default_platform),
            _ => true,
        });
    }

    /// Header records first (original relative order), then entries sorted
    /// case-insensitively by raw handle text.
    fn sort(&mut self) {
        let mut header = Vec::new();
        let mut entries = Vec::new();
        for record in self.records.drain(..) {
            match record {
                Record::Entry(entry) => entries.push(entry),
                other => header.push(other),
            }
        }
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        header.extend(entries.into_iter().map(Record::Entry));
        self.records = header;
    }
}
