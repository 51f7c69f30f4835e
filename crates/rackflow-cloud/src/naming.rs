//! Stack naming convention
//!
//! A rack owns the stack named after it; each app in the rack owns the stack
//! `{rack}-{app}`. The separator is reserved so the two never collide.

use crate::error::{ProviderError, Result};

/// Separator between rack and app in composite stack names
pub const SEPARATOR: char = '-';

/// Check a rack or app name: non-empty and free of the separator
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ProviderError::InvalidInput(format!("{kind} name must not be blank")));
    }
    if name.contains(SEPARATOR) {
        return Err(ProviderError::InvalidInput(format!(
            "{kind} name {name:?} must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Stack name for `app` within `rack`
pub fn app_stack_name(rack: &str, app: &str) -> Result<String> {
    validate_name("rack", rack)?;
    validate_name("app", app)?;
    Ok(format!("{rack}{SEPARATOR}{app}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_stack_name() {
        assert_eq!(app_stack_name("prod", "web").unwrap(), "prod-web");
    }

    #[test]
    fn test_separator_is_reserved() {
        assert!(matches!(
            app_stack_name("prod", "web-api"),
            Err(ProviderError::InvalidInput(_))
        ));
        assert!(matches!(
            app_stack_name("my-rack", "web"),
            Err(ProviderError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_blank_names() {
        assert!(validate_name("app", "").is_err());
        assert!(app_stack_name("", "web").is_err());
    }
}
