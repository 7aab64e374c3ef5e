//! Version templates.
//!
//! A template is literal text with any number of `{version}` placeholders.
//! No other placeholder names are recognized, and braces cannot be escaped,
//! so once a template parses, rendering it is total.
//!
//! ```
//! use pawnup_toolchain::template::Template;
//!
//! let t = Template::parse("pawnc-{version}-linux.tar.gz")?;
//! assert_eq!(t.render("3.10.10"), "pawnc-3.10.10-linux.tar.gz");
//! # Ok::<(), pawnup_toolchain::error::TemplateError>(())
//! ```

use std::fmt;

use crate::error::TemplateError;

/// The only placeholder name the grammar knows.
pub const VERSION_PLACEHOLDER: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Version,
}

/// A parsed version template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `source` into literal and placeholder segments.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unbalanced`] for a `{` that is never closed or
    /// a `}` that was never opened, and [`TemplateError::UnknownPlaceholder`]
    /// for any `{name}` other than `{version}`.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source.char_indices();

        while let Some((offset, c)) = rest.next() {
            match c {
                '{' => {
                    let body = &source[offset + 1..];
                    let Some(close) = body.find(['{', '}']) else {
                        return Err(unbalanced(source, offset));
                    };
                    if body.as_bytes()[close] == b'{' {
                        return Err(unbalanced(source, offset));
                    }

                    let name = &body[..close];
                    if name != VERSION_PLACEHOLDER {
                        return Err(TemplateError::UnknownPlaceholder {
                            template: source.to_string(),
                            name: name.to_string(),
                        });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Version);

                    // Skip the name and the closing brace; both are ASCII-delimited.
                    for _ in 0..=name.chars().count() {
                        rest.next();
                    }
                }
                '}' => return Err(unbalanced(source, offset)),
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Substitutes `version` for every placeholder.
    #[must_use]
    pub fn render(&self, version: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + version.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Version => out.push_str(version),
            }
        }
        out
    }

}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses `template` and renders it with `version` in one step.
///
/// # Errors
///
/// Returns a [`TemplateError`] if `template` is malformed.
pub fn resolve(template: &str, version: &str) -> Result<String, TemplateError> {
    Template::parse(template).map(|t| t.render(version))
}

fn unbalanced(template: &str, offset: usize) -> TemplateError {
    TemplateError::Unbalanced {
        template: template.to_string(),
        offset,
    }
}
