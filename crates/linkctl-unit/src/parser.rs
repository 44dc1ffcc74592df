//! Unit file syntax.

use std::path::Path;

use indexmap::IndexMap;
use linkctl_common::{LinkError, LinkResult};

use crate::unit::Section;

/// Parse unit file text into its sections.
///
/// Repeated section headers are merged into one section and repeated keys
/// keep every assignment in order.
pub(crate) fn parse(path: &Path, text: &str) -> LinkResult<IndexMap<String, Section>> {
    let mut sections: IndexMap<String, Section> = IndexMap::new();
    let mut current: Option<String> = None;

    for (number, line) in logical_lines(text) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let Some(name) = header.strip_suffix(']') else {
                return Err(LinkError::parse(
                    path,
                    format!("line {number}: unterminated section header"),
                ));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(LinkError::parse(
                    path,
                    format!("line {number}: empty section name"),
                ));
            }
            sections.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(LinkError::parse(
                path,
                format!("line {number}: expected Key=Value"),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(LinkError::parse(path, format!("line {number}: empty key")));
        }
        let Some(section) = current.as_ref().and_then(|name| sections.get_mut(name)) else {
            return Err(LinkError::parse(
                path,
                format!("line {number}: assignment outside of a section"),
            ));
        };
        section.push(key, value.trim());
    }

    Ok(sections)
}

/// Join backslash-continued lines, yielding each with its first line number.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let (start, mut buffer) = pending.take().unwrap_or((number, String::new()));

        if !buffer.is_empty() {
            let trimmed = raw.trim_start();
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                pending = Some((start, buffer));
                continue;
            }
        }

        match raw.trim_end().strip_suffix('\\') {
            Some(head) => {
                buffer.push_str(head);
                buffer.push(' ');
                pending = Some((start, buffer));
            }
            None => {
                buffer.push_str(raw);
                lines.push((start, buffer));
            }
        }
    }

    if let Some(rest) = pending {
        lines.push(rest);
    }
    lines
}
