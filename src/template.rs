//! # Template Binding
//!
//! Resolves `{{fieldName}}` tokens in element content against a
//! [`DataRecord`].
//!
//! ## Rules
//!
//! - A field missing from the record binds to the empty string. This is
//!   expected while previewing incomplete records and is not logged.
//! - Binding is a single pass. Substituted values are never rescanned, so a
//!   value that itself looks like `{{token}}` is emitted literally.
//! - Whitespace inside the braces is ignored: `{{ fullName }}` works.
//! - An unterminated `{{` or an empty `{{}}` is literal text.
//!
//! ```
//! use qrlayout::layout::DataRecord;
//! use qrlayout::template::bind;
//!
//! let mut record = DataRecord::new();
//! record.insert("fullName".into(), "Alex Johnson".into());
//! assert_eq!(bind("Name: {{fullName}}", &record), "Name: Alex Johnson");
//! assert_eq!(bind("{{department}}", &record), "");
//! ```

use crate::layout::DataRecord;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A piece of parsed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// Field name, already trimmed.
    Token(&'a str),
}

/// Format a field name as a token.
pub fn token(field: &str) -> String {
    format!("{}{}{}", OPEN, field, CLOSE)
}

/// Split content into literal text and tokens, in order.
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = content;
    let mut literal_start = 0usize;
    let mut cursor = 0usize;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };
        let name = after_open[..close].trim();
        let token_start = cursor + open;
        let token_end = token_start + OPEN.len() + close + CLOSE.len();

        if name.is_empty() || name.contains('{') || name.contains('}') {
            // Not a token; retry one byte further so "{{{x}}" still finds "{{x}}".
            cursor = token_start + 1;
            rest = &content[cursor..];
            continue;
        }

        if token_start > literal_start {
            out.push(Segment::Literal(&content[literal_start..token_start]));
        }
        out.push(Segment::Token(name));
        literal_start = token_end;
        cursor = token_end;
        rest = &content[cursor..];
    }

    if literal_start < content.len() {
        out.push(Segment::Literal(&content[literal_start..]));
    }
    out
}

/// Field names referenced by `content`, in order of appearance.
pub fn tokens(content: &str) -> Vec<&str> {
    segments(content)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Token(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Replace every token with its record value (missing → empty).
pub fn bind(content: &str, record: &DataRecord) -> String {
    let mut out = String::with_capacity(content.len());
    for segment in segments(content) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Token(name) => {
                if let Some(value) = record.get(name) {
                    out.push_str(value);
                }
            }
        }
    }
    out
}

/// Bind QR content, joining adjacent field values with `separator`.
///
/// Two tokens count as adjacent when nothing but whitespace sits between
/// them; that gap is replaced by the separator. Any other literal text is
/// kept. Without a separator this is plain [`bind`].
///
/// ```
/// use qrlayout::layout::DataRecord;
/// use qrlayout::template::bind_qr;
///
/// let record: DataRecord = [("id", "E1"), ("name", "Ann")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// assert_eq!(bind_qr("{{id}} {{name}}", &record, Some("|")), "E1|Ann");
/// assert_eq!(bind_qr("ID:{{id}}", &record, Some("|")), "ID:E1");
/// ```
pub fn bind_qr(content: &str, record: &DataRecord, separator: Option<&str>) -> String {
    let Some(separator) = separator else {
        return bind(content, record);
    };

    let parts = segments(content);
    let mut out = String::with_capacity(content.len());
    for (i, segment) in parts.iter().enumerate() {
        match *segment {
            Segment::Token(name) => {
                if i > 0 && matches!(parts[i - 1], Segment::Token(_)) {
                    out.push_str(separator);
                }
                if let Some(value) = record.get(name) {
                    out.push_str(value);
                }
            }
            Segment::Literal(text) => {
                let between_tokens = i > 0
                    && matches!(parts[i - 1], Segment::Token(_))
                    && matches!(parts.get(i + 1), Some(Segment::Token(_)));
                if between_tokens && text.trim().is_empty() {
                    out.push_str(separator);
                    continue;
                }
                out.push_str(text);
            }
        }
    }
    out
}
