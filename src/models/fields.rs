//! Field cleaning shared by the submission forms and the edit sections.
//!
//! Each `clean_*` function records a message in `errors` and returns `None`
//! when the value is rejected, so a whole form can be checked before any of
//! it is saved.

use crate::error::FormErrors;

pub const REQUIRED: &str = "This field is required.";

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_SLUG_LENGTH: usize = 30;
pub const MAX_SUMMARY_LENGTH: usize = 250;
pub const MAX_URL_LENGTH: usize = 255;
/// Longest value a plain text column holds.
pub const MAX_VALUE_LENGTH: usize = 255;

/// Base name of a client-supplied filename, cut to fit its column. The end is
/// kept so the extension survives.
pub fn clamp_filename(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("upload.zip");
    let len = base.chars().count();
    base.chars().skip(len.saturating_sub(MAX_VALUE_LENGTH)).collect()
}

/// Append a message for `field`.
pub fn push_error(errors: &mut FormErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Trim `value`; reject it when required and empty or when longer than `max_len`.
/// Empty optional values clean to `Some(None)`.
pub fn clean_text(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
    max_len: Option<usize>,
) -> Option<Option<String>> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        if required {
            push_error(errors, field, REQUIRED);
            return None;
        }
        return Some(None);
    }
    if let Some(max) = max_len
        && trimmed.chars().count() > max
    {
        push_error(
            errors,
            field,
            format!("Ensure this value has at most {} characters.", max),
        );
        return None;
    }
    Some(Some(trimmed.to_string()))
}

/// Slugs are lowercase ASCII letters, digits, `-` and `_`, and never all digits
/// so they cannot be confused with numeric ids in URLs.
pub fn clean_slug(errors: &mut FormErrors, field: &str, value: Option<&str>) -> Option<String> {
    let slug = clean_text(errors, field, value, true, Some(MAX_SLUG_LENGTH))??;
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        push_error(
            errors,
            field,
            "Enter a valid slug consisting of lowercase letters, numbers, underscores or hyphens.",
        );
        return None;
    }
    if slug.chars().all(|c| c.is_ascii_digit()) {
        push_error(errors, field, "The slug cannot be a number.");
        return None;
    }
    Some(slug)
}

pub fn clean_email(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
) -> Option<Option<String>> {
    let email = clean_text(errors, field, value, required, Some(MAX_URL_LENGTH))?;
    if let Some(ref address) = email {
        let valid = match address.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !address.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            push_error(errors, field, "Enter a valid e-mail address.");
            return None;
        }
    }
    Some(email)
}

pub fn clean_url(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
) -> Option<Option<String>> {
    let url = clean_text(errors, field, value, required, Some(MAX_URL_LENGTH))?;
    if let Some(ref link) = url {
        let rest = link
            .strip_prefix("http://")
            .or_else(|| link.strip_prefix("https://"));
        let valid = matches!(rest, Some(host) if !host.is_empty() && !link.contains(char::is_whitespace));
        if !valid {
            push_error(errors, field, "Enter a valid URL.");
            return None;
        }
    }
    Some(url)
}

/// Finish a form check: `Ok` when nothing was recorded.
pub fn finish<T>(errors: FormErrors, cleaned: Option<T>) -> Result<T, FormErrors> {
    match cleaned {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(errors),
    }
}
