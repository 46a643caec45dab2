//! Debian control paragraph reader
//!
//! Reads back a single deb822 paragraph, optionally wrapped in a PGP
//! clear-sign envelope.

use indexmap::IndexMap;
use thiserror::Error;

const SIGNED_HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {0}: expected 'Field: value'")]
    MissingColon(usize),

    #[error("line {0}: continuation line without a field")]
    OrphanContinuation(usize),

    #[error("signed message has no signature block")]
    UnterminatedSignature,
}

/// A parsed control paragraph
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    fields: IndexMap<String, String>,
    signed: bool,
}

impl Paragraph {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (body, signed, offset) = match strip_clearsign(text)? {
            Some((body, offset)) => (body, true, offset),
            None => (text.lines().map(str::to_string).collect(), false, 0),
        };

        let mut fields: IndexMap<String, String> = IndexMap::new();
        let mut current: Option<String> = None;

        for (idx, line) in body.iter().enumerate() {
            let line_no = idx + offset + 1;

            if line.trim().is_empty() {
                // A blank line ends the paragraph.
                if !fields.is_empty() {
                    break;
                }
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let key = current.as_ref().ok_or(ParseError::OrphanContinuation(line_no))?;
                if let Some(value) = fields.get_mut(key) {
                    value.push('\n');
                    // A lone "." stands for an empty line.
                    match line.trim() {
                        "." => {}
                        _ => value.push_str(line.trim_start()),
                    }
                }
                continue;
            }

            let (key, value) = line.split_once(':').ok_or(ParseError::MissingColon(line_no))?;
            let key = key.trim().to_string();
            fields.insert(key.clone(), value.trim().to_string());
            current = Some(key);
        }

        Ok(Self { fields, signed })
    }

    /// Case-insensitive field lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the paragraph came wrapped in a clear-sign envelope
    pub fn is_signed(&self) -> bool {
        self.signed
    }
}

/// Returns the signed payload lines and their line offset, or `None` when the
/// text is not a clear-signed message.
fn strip_clearsign(text: &str) -> Result<Option<(Vec<String>, usize)>, ParseError> {
    let mut lines = text.lines().enumerate().skip_while(|(_, l)| l.trim().is_empty());

    match lines.next() {
        Some((_, first)) if first.trim_end() == SIGNED_HEADER => {}
        _ => return Ok(None),
    }

    // Armor headers (Hash: ...) run until the first blank line.
    let mut offset = 0;
    for (idx, line) in lines.by_ref() {
        if line.trim().is_empty() {
            offset = idx + 1;
            break;
        }
    }

    let mut body = Vec::new();
    for (_, line) in lines {
        if line.trim_end() == SIGNATURE_HEADER {
            return Ok(Some((body, offset)));
        }
        let unescaped = line.strip_prefix("- ").unwrap_or(line);
        body.push(unescaped.to_string());
    }

    Err(ParseError::UnterminatedSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNED: &str = "-----BEGIN PGP SIGNED MESSAGE-----
Hash: SHA512

Format: 3.0
Source: pkg
Version: 1.0
Architecture: amd64
- -dashed: value
-----BEGIN PGP SIGNATURE-----

iQEzBAEBCgAdFiEE
-----END PGP SIGNATURE-----
";

    #[test]
    fn test_parse_plain() {
        let p = Paragraph::parse("Format: 3.0\nSource: foo\nVersion: 1.0-1\n").unwrap();
        assert_eq!(p.len(), 3);
        assert!(!p.is_signed());
        assert_eq!(p.get("source"), Some("foo"));
        assert_eq!(p.get("Version"), Some("1.0-1"));
        assert_eq!(p.get("Missing"), None);
    }

    #[test]
    fn test_parse_continuation() {
        let p = Paragraph::parse("Source: foo\nChecksums-Sha256:\n abc 1 a\n def 2 b\n").unwrap();
        assert_eq!(p.get("Checksums-Sha256"), Some("\nabc 1 a\ndef 2 b"));
    }

    #[test]
    fn test_dot_continuation_is_empty_line() {
        let p = Paragraph::parse("Description: a\n .\n b\nSection: utils\n").unwrap();
        assert_eq!(p.get("Description"), Some("a\n\nb"));
        assert_eq!(p.get("Section"), Some("utils"));
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let p = Paragraph::parse("Homepage: https://example.com:8080/x\n").unwrap();
        assert_eq!(p.get("Homepage"), Some("https://example.com:8080/x"));
    }

    #[test]
    fn test_parse_signed() {
        let p = Paragraph::parse(SIGNED).unwrap();
        assert!(p.is_signed());
        assert_eq!(p.get("Format"), Some("3.0"));
        assert_eq!(p.get("Architecture"), Some("amd64"));
        assert_eq!(p.get("-dashed"), Some("value"));
        assert_eq!(p.get("Hash"), None);
    }

    #[test]
    fn test_unterminated_signature() {
        let text = "-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA256\n\nSource: foo\n";
        assert_eq!(
            Paragraph::parse(text).unwrap_err(),
            ParseError::UnterminatedSignature
        );
    }

    #[test]
    fn test_errors_report_line() {
        assert_eq!(
            Paragraph::parse("Source: foo\nbroken\n").unwrap_err(),
            ParseError::MissingColon(2)
        );
        assert_eq!(
            Paragraph::parse(" leading\n").unwrap_err(),
            ParseError::OrphanContinuation(1)
        );
    }

    #[test]
    fn test_stops_at_blank_line() {
        let p = Paragraph::parse("Source: foo\n\nPackage: foo-bin\n").unwrap();
        assert_eq!(p.len(), 1);
    }
}
