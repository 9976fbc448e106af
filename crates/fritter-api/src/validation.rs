use crate::error::ApiError;

pub const MAX_CONTENT_CHARS: usize = 140;

/// Post content must have a non-whitespace character and at most
/// [`MAX_CONTENT_CHARS`] characters. `kind` prefixes the error message.
pub fn content(kind: &str, content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{kind} content must be at least one character long."
        )));
    }

    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::PayloadTooLarge(format!(
            "{kind} content must be no more than {MAX_CONTENT_CHARS} characters."
        )));
    }

    Ok(())
}

pub fn username(username: Option<&str>) -> Result<&str, ApiError> {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Ok(name)
        }
        _ => Err(ApiError::BadRequest(
            "Username must be a nonempty alphanumeric string.".into(),
        )),
    }
}

pub fn password(password: Option<&str>) -> Result<&str, ApiError> {
    match password {
        Some(pw) if !pw.is_empty() && !pw.chars().any(char::is_whitespace) => Ok(pw),
        _ => Err(ApiError::BadRequest("Password must be a nonempty string.".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_bounds() {
        assert!(content("Freet", "x").is_ok());
        assert!(content("Freet", &"a".repeat(140)).is_ok());
        // Counted in characters, not bytes.
        assert!(content("Freet", &"é".repeat(140)).is_ok());

        assert!(matches!(content("Freet", "   \n"), Err(ApiError::BadRequest(_))));
        assert!(matches!(content("Freet", ""), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            content("Freet", &"a".repeat(141)),
            Err(ApiError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn credentials_format() {
        assert_eq!(username(Some(" alice_1 ")).unwrap(), "alice_1");
        assert!(username(Some("al ice")).is_err());
        assert!(username(Some("")).is_err());
        assert!(username(None).is_err());

        assert_eq!(password(Some("p@ss")).unwrap(), "p@ss");
        assert!(password(Some("two words")).is_err());
        assert!(password(None).is_err());
    }
}
