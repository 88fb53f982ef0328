//! Line-level codec for the trust file format
//!
//! The format has no escaping: usernames containing `:`, leading `-`, or
//! embedded newlines are outside its domain. Parsing never drops
//! information, so `serialize(parse(s)) == s` holds for any well-formed
//! file (one record per line, blank lines empty, trailing newline). A
//! whitespace-only line still parses as a blank record but is written back
//! as an empty line; blank records carry no payload.

use crate::handle::Handle;

/// Whether an entry vouches for or denounces its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Vouch,
    Denounce,
}

/// A vouch or denounce record bound to a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub handle: Handle,
    /// Free text after the handle; a denouncement's reason lives here
    pub details: Option<String>,
}

impl Entry {
    /// Sort key: the raw handle text, case-folded, platform prefix included
    pub fn sort_key(&self) -> String {
        self.handle.raw().to_lowercase()
    }
}

/// One line of a trust file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Blank,
    /// A `#` comment line, kept verbatim
    Comment(String),
    Entry(Entry),
}

/// Parse trust file text into its ordered record sequence
pub fn parse(text: &str) -> Vec<Record> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Record {
    if line.trim().is_empty() {
        return Record::Blank;
    }
    if line.starts_with('#') {
        return Record::Comment(line.to_string());
    }

    let (kind, rest) = match line.strip_prefix('-') {
        Some(rest) => (EntryKind::Denounce, rest),
        None => (EntryKind::Vouch, line),
    };

    let (handle_text, details) = match rest.split_once(' ') {
        Some((handle, details)) => (handle, Some(details.to_string())),
        None => (rest, None),
    };

    Record::Entry(Entry {
        kind,
        handle: Handle::parse(handle_text),
        details,
    })
}

/// Serialize records back to text, one line per record, trailing newline
pub fn serialize(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        match record {
            Record::Blank => {}
            Record::Comment(text) => out.push_str(text),
            Record::Entry(entry) => {
                if entry.kind == EntryKind::Denounce {
                    out.push('-');
                }
                out.push_str(&entry.handle.raw());
                if let Some(details) = &entry.details {
                    out.push(' ');
                    out.push_str(details);
                }
            }
        }
        out.push('\n');
    }
    out
}
