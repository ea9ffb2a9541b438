//! Verse reference handling for the command line: splitting a request into
//! references, per-reference version suffixes, and file slugs.

/// One requested worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRequest {
    pub reference: String,
    /// Lower-case translation code.
    pub version: String,
}

impl VerseRequest {
    /// Cache / output file stem, e.g. `john_3_16_esv`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", normalize_slug(&self.reference), self.version)
    }
}

/// Split a comma-separated request such as `"John 3:16, Psalm 23:1 (KJV)"`.
/// Entries without their own `(VERSION)` suffix use `fallback_version`.
pub fn parse_requests(input: &str, fallback_version: &str) -> Vec<VerseRequest> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (version, reference) = extract_version(entry, fallback_version);
            VerseRequest { reference, version }
        })
        .collect()
}

/// Pull a trailing `(XYZ)` version code of 2–6 word characters off a
/// reference. Returns `(version, reference)`, both trimmed, version
/// lower-cased.
pub fn extract_version(text: &str, fallback_version: &str) -> (String, String) {
    let trimmed = text.trim();
    if let Some(body) = trimmed.strip_suffix(')') {
        if let Some(open) = body.rfind('(') {
            let code = &body[open + 1..];
            let len = code.chars().count();
            if (2..=6).contains(&len) && code.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return (code.to_lowercase(), body[..open].trim().to_string());
            }
        }
    }
    (fallback_version.trim().to_lowercase(), trimmed.to_string())
}

/// Filesystem-safe slug: lower-case, with `:`, dashes and spaces as `_`.
pub fn normalize_slug(reference: &str) -> String {
    reference
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ':' | '–' | '—' | ' ' => '_',
            c => c,
        })
        .collect()
}
