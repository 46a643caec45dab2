//! Descriptor rendering
//!
//! The `.dsc` body is described as an ordered list of emission rules. Each rule
//! carries its own predicate so optional fields can be checked in isolation,
//! and a single formatting routine writes whatever is enabled.

use std::borrow::Cow;
use std::fmt::Write;

use crate::{error::RenderError, metadata::PackageMetadata};

/// Source format written on every descriptor
pub const SOURCE_FORMAT: &str = "3.0";

/// One candidate control field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule<'a> {
    pub emit: bool,
    pub name: Cow<'a, str>,
    pub value: Cow<'a, str>,
}

impl<'a> FieldRule<'a> {
    fn always(name: &'a str, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            emit: true,
            name: Cow::Borrowed(name),
            value: value.into(),
        }
    }

    fn if_present(name: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) -> Self {
        let value = value.into();
        Self {
            emit: !value.is_empty(),
            name: name.into(),
            value,
        }
    }
}

/// Fold a multi-line value into control file continuation lines.
///
/// Surrounding spaces and newlines are stripped, then every remaining newline
/// is followed by a single space. Blank inner lines become ` .` so they do not
/// end the paragraph.
pub fn reflow(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim_matches(|c| c == ' ' || c == '\n');
    if !trimmed.contains('\n') {
        return Cow::Borrowed(trimmed);
    }

    let lines: Vec<&str> = trimmed
        .split('\n')
        .map(|line| if line.trim().is_empty() { "." } else { line })
        .collect();
    Cow::Owned(lines.join("\n "))
}

/// Join list values the way relationship fields expect them
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the emission rules for `info`, in output order.
pub fn field_rules(info: &PackageMetadata) -> Vec<FieldRule<'_>> {
    let source = &info.deb.source;
    let has_homepage = !reflow(&info.homepage).is_empty();

    let mut rules = vec![
        FieldRule::always("Format", SOURCE_FORMAT),
        FieldRule::always("Source", info.name.as_str()),
        FieldRule::always("Version", info.composed_version()),
        FieldRule::if_present("Maintainer", reflow(&info.maintainer)),
        FieldRule::if_present("Homepage", reflow(&info.homepage)),
        // Only ever written next to Homepage, even when empty.
        FieldRule {
            emit: has_homepage,
            name: Cow::Borrowed("Standards-Version"),
            value: reflow(&source.standards_version),
        },
        FieldRule::always("Architecture", info.arch.as_str()),
    ];

    rules.extend(
        source
            .fields
            .iter()
            .map(|(key, value)| FieldRule::if_present(key.as_str(), reflow(value))),
    );

    rules
}

/// Write every enabled rule as a `Name: value` line.
pub fn write_fields<W: Write>(w: &mut W, rules: &[FieldRule<'_>]) -> std::fmt::Result {
    for rule in rules.iter().filter(|r| r.emit) {
        writeln!(w, "{}: {}", rule.name, rule.value)?;
    }
    Ok(())
}

/// Render the unsigned descriptor for `info`.
pub fn render(info: &PackageMetadata) -> Result<Vec<u8>, RenderError> {
    let mut out = String::new();
    write_fields(&mut out, &field_rules(info))?;
    Ok(out.into_bytes())
}
