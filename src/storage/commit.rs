//! Commit loading and authorship parsing
//!
//! The exporter only ever reads commits. For each one it needs:
//! - the parent ids, in recorded order
//! - the authorship instant, which may be absent when the author line is
//!   missing or malformed
//!
//! The authorship instant is read from the raw header bytes rather than
//! `Commit::author`, so a malformed author line surfaces as an absent
//! timestamp and a non UTF-8 author name does not hide a valid one.
//! Commits that libgit2 refuses to parse are read straight from the object
//! database instead of being reported missing.

use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{ObjectType, Oid, Repository};
use tracing::debug;

use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::types::CommitId;

/// information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: CommitId,
    pub parent_ids: Vec<CommitId>,
    /// absent when the author line cannot be parsed
    pub authored_at: Option<DateTime<FixedOffset>>,
}

impl CommitInfo {
    /// create a new CommitInfo
    pub fn new(
        id: CommitId,
        parent_ids: Vec<CommitId>,
        authored_at: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            id,
            parent_ids,
            authored_at,
        }
    }

    /// create CommitInfo from a git2::Commit
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        Self {
            id: CommitId::new(commit.id()),
            parent_ids: commit.parent_ids().map(CommitId::new).collect(),
            authored_at: parse_author_time(commit.raw_header_bytes()),
        }
    }

    /// Build a CommitInfo from the raw bytes of a commit object.
    ///
    /// Parent lines that do not hold a valid id are skipped.
    pub(crate) fn from_raw(id: CommitId, data: &[u8]) -> Self {
        let parent_ids = header_lines(data)
            .filter_map(|line| line.strip_prefix(b"parent "))
            .filter_map(|hex| std::str::from_utf8(hex).ok())
            .filter_map(|hex| Oid::from_str(hex.trim()).ok())
            .map(CommitId::new)
            .collect();

        Self::new(id, parent_ids, parse_author_time(data))
    }
}

/// get information about a commit
pub fn get_commit(repo: &Repository, id: CommitId) -> StorageResult<CommitInfo> {
    match repo.find_commit(id.raw()) {
        Ok(commit) => Ok(CommitInfo::from_git2(&commit)),
        Err(e) => match read_raw_commit(repo, id) {
            Some(info) => {
                debug!(commit = %id, error = e.message(), "read commit from its raw object");
                Ok(info)
            }
            None => Err(StorageError::CommitNotFound(format!("{} ({})", id, e.message()))),
        },
    }
}

/// Read a commit object without parsing its signatures. None when the
/// object is absent or is not a commit.
fn read_raw_commit(repo: &Repository, id: CommitId) -> Option<CommitInfo> {
    let odb = repo.odb().ok()?;
    let object = odb.read(id.raw()).ok()?;
    if object.kind() != ObjectType::Commit {
        return None;
    }
    Some(CommitInfo::from_raw(id, object.data()))
}

/// Header lines of a commit object, up to the blank line before the message.
fn header_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n').take_while(|line| !line.is_empty())
}

/// Extract the authorship instant from a raw commit header.
///
/// The author line has the shape `author Name <email> 1700000000 +0200`.
/// The name and email may be in any encoding; only the time and offset
/// fields after the email have to be ASCII. Returns None when there is no
/// author line or those fields do not parse.
pub fn parse_author_time(header: impl AsRef<[u8]>) -> Option<DateTime<FixedOffset>> {
    let line = header_lines(header.as_ref()).find_map(|l| l.strip_prefix(b"author "))?;

    // everything after the email is "<seconds> <offset>"
    let email_end = line.iter().rposition(|&b| b == b'>')?;
    let tail = std::str::from_utf8(&line[email_end + 1..]).ok()?;
    let mut fields = tail.split_whitespace();
    let seconds: i64 = fields.next()?.parse().ok()?;
    let offset = parse_offset(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }

    offset.timestamp_opt(seconds, 0).single()
}

/// parse a git timezone offset like `+0200` or `-0530`
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw.len() != 5 || !raw.is_char_boundary(1) {
        return None;
    }
    let (sign, digits) = raw.split_at(1);
    let sign = match sign {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
