//! Download filenames for generated sheets

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Longest component, in code points
pub const MAX_COMPONENT_CHARS: usize = 60;
/// Longest base name before the extension, in code points
pub const MAX_BASE_CHARS: usize = 120;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// RFC 5987 attr-char
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Make one filename component safe on common filesystems
pub fn sanitize_component(raw: &str, fallback: &str) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = truncate_clean(&replaced, MAX_COMPONENT_CHARS);
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned
}

/// `{property}_{location}.pdf`
pub fn build_output_filename(property_name: &str, location: &str) -> String {
    let property = sanitize_component(property_name, "property");
    let location = sanitize_component(location, "address");
    let base = truncate_clean(&format!("{}_{}", property, location), MAX_BASE_CHARS);
    format!("{}.pdf", base)
}

/// `Content-Disposition` value carrying a UTF-8 filename
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}

/// Cut to `max` code points; no trailing dots or spaces before or after the cut
fn truncate_clean(s: &str, max: usize) -> String {
    let cut: String = s.trim_end_matches(['.', ' ']).chars().take(max).collect();
    cut.trim_end_matches(['.', ' ']).to_string()
}
