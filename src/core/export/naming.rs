//! Directory and file naming for the export tree

use crate::config::NameCollisionPolicy;
use crate::core::export::summary::COUNTER_KEYS;
use crate::domain::{PodexError, Result};
use std::collections::HashSet;

/// Directory name for an account, e.g. `jane_at_example.com`
pub fn account_dir(username: &str) -> String {
    sanitize(&username.replace('@', "_at_"))
}

/// Make a display name safe to use as a single path component
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Names a child directory must not take inside its parent directory
///
/// Summary counter keys are always reserved: children and counters share one
/// JSON object in `summary.json`.
#[derive(Debug, Clone)]
pub struct ReservedNames {
    exact: HashSet<String>,
    page_kinds: Vec<&'static str>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            exact: COUNTER_KEYS.iter().map(|key| key.to_string()).collect(),
            page_kinds: Vec::new(),
        }
    }
}

impl ReservedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a file written next to the children
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.exact.insert(name.into());
        self
    }

    /// Reserve every page file of `kind` written next to the children
    pub fn with_pages(mut self, kind: &'static str) -> Self {
        self.page_kinds.push(kind);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exact.contains(name)
            || self.page_kinds.iter().any(|kind| is_page_file_name(kind, name))
    }
}

/// Whether `name` has the shape of [`page_file_name`] for `kind`
fn is_page_file_name(kind: &str, name: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    name.strip_prefix(kind)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".json"))
        .and_then(|range| range.split_once('-'))
        .is_some_and(|(start, end)| digits(start) && digits(end))
}

/// Assign unique directory names to siblings, in order
///
/// With [`NameCollisionPolicy::Suffix`] a repeated name gets ` (2)`, ` (3)`
/// and so on; with [`NameCollisionPolicy::Error`] the first repeat fails. A
/// name in `reserved` is not a sibling collision and is always suffixed.
pub fn assign_names<'a, I>(
    names: I,
    policy: NameCollisionPolicy,
    reserved: &ReservedNames,
) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    let mut assigned = Vec::new();
    let unavailable =
        |taken: &HashSet<String>, name: &str| taken.contains(name) || reserved.contains(name);

    for name in names {
        let base = sanitize(name);
        let unique = if !unavailable(&taken, &base) {
            base
        } else {
            if policy == NameCollisionPolicy::Error && taken.contains(&base) {
                return Err(PodexError::NameCollision(base));
            }
            let mut n = 2;
            loop {
                let candidate = format!("{base} ({n})");
                if !unavailable(&taken, &candidate) {
                    break candidate;
                }
                n += 1;
            }
        };
        taken.insert(unique.clone());
        assigned.push(unique);
    }

    Ok(assigned)
}

/// File name of a persisted page: `items_1-500.json`
pub fn page_file_name(kind: &str, offset: u64, count: u64) -> String {
    format!("{kind}_{}-{}.json", offset + 1, offset + count)
}

/// File extension for a MIME type
///
/// Common types come from a table; otherwise a short alphanumeric subtype is
/// used as is, and anything else becomes `bin`.
pub fn extension_for(mimetype: &str) -> String {
    let essence = mimetype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if let Some(known) = known_extension(&essence) {
        return known.to_string();
    }

    let subtype = essence
        .split_once('/')
        .map(|(_, sub)| sub.trim_start_matches("x-"))
        .unwrap_or_default();
    if (1..=5).contains(&subtype.len()) && subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        subtype.to_string()
    } else {
        "bin".to_string()
    }
}

fn known_extension(essence: &str) -> Option<&'static str> {
    let extension = match essence {
        "application/pdf" => "pdf",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "application/zip" => "zip",
        "application/gzip" => "gz",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "application/vnd.oasis.opendocument.text" => "odt",
        "application/vnd.oasis.opendocument.spreadsheet" => "ods",
        "application/rtf" => "rtf",
        "text/plain" => "txt",
        "text/csv" => "csv",
        "text/html" => "html",
        "text/calendar" => "ics",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "message/rfc822" => "eml",
        _ => return None,
    };
    Some(extension)
}
