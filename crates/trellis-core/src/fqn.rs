//! Fully-qualified names.
//!
//! Segments are joined by `.`. A segment that itself contains a `.` is wrapped
//! in double quotes, which is why names coming from the catalog must not carry
//! embedded double quotes (see [`identifier_safe`]).

use std::borrow::Cow;

use crate::errors::CoreError;

const SEPARATOR: char = '.';
const QUOTE: char = '"';

/// Replace embedded double quotes with single quotes.
///
/// `a"b` and `a'b` collapse to the same identifier after this step.
#[must_use]
pub fn identifier_safe(name: &str) -> Cow<'_, str> {
    if name.contains(QUOTE) {
        Cow::Owned(name.replace(QUOTE, "'"))
    } else {
        Cow::Borrowed(name)
    }
}

fn quote_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(SEPARATOR) {
        Cow::Owned(format!("{QUOTE}{segment}{QUOTE}"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Join segments into a fully-qualified name.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFqn`] if there are no segments or any segment is empty.
pub fn build<S: AsRef<str>>(segments: &[S]) -> Result<String, CoreError> {
    if segments.is_empty() {
        return Err(CoreError::InvalidFqn("no segments".into()));
    }
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            return Err(CoreError::InvalidFqn(format!(
                "empty segment in {:?}",
                segments.iter().map(AsRef::as_ref).collect::<Vec<_>>()
            )));
        }
        parts.push(quote_segment(&identifier_safe(segment)).into_owned());
    }
    Ok(parts.join(&SEPARATOR.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&["cas", "cas-shared-default", "Public", "CARS"], "cas.cas-shared-default.Public.CARS")]
    #[case(&["cas", "db", "Public", "CARS.2024"], "cas.db.Public.\"CARS.2024\"")]
    #[case(&["svc", "we\"ird"], "svc.we'ird")]
    fn builds_names(#[case] segments: &[&str], #[case] expected: &str) {
        assert_eq!(build(segments).unwrap(), expected);
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(build::<&str>(&[]).is_err());
        assert!(build(&["svc", ""]).is_err());
    }

    #[test]
    fn identifier_safe_borrows_clean_names() {
        assert!(matches!(identifier_safe("Make"), Cow::Borrowed("Make")));
        assert_eq!(identifier_safe("\"Make\""), "'Make'");
    }
}
