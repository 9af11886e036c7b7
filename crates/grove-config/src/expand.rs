//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use std::convert::Infallible;

use crate::ConfigError;

/// Expand `${VAR}` references in a configuration value.
///
/// Values without `${` are returned unchanged. A bare `$VAR` whose variable
/// is unset is kept literally.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let expanded = shellexpand::env_with_context(value, |var| -> Result<Option<String>, Infallible> {
        Ok(std::env::var(var).ok())
    })
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: e.to_string(),
    })?
    .into_owned();

    // Unset variables without a default are left in place by shellexpand.
    if let Some(name) = unresolved_reference(&expanded) {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }

    Ok(expanded)
}

/// Find the first `${NAME}` left in an expanded string.
fn unresolved_reference(expanded: &str) -> Option<&str> {
    let start = expanded.find("${")? + 2;
    let rest = &expanded[start..];
    let end = rest.find('}')?;
    let name = &rest[..end];
    let is_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_name.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GROVE_TEST_SIMPLE", "hello");
        }
        let result = expand_env("${GROVE_TEST_SIMPLE}", "test.field").unwrap();
        assert_eq!(result, "hello");
        unsafe {
            std::env::remove_var("GROVE_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("GROVE_TEST_UNSET");
        }
        let result = expand_env("${GROVE_TEST_UNSET:-fallback}", "test.field").unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("GROVE_TEST_MISSING");
        }
        let err = expand_env("${GROVE_TEST_MISSING}", "server.host").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("GROVE_TEST_MISSING"));
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GROVE_TEST_IFACE", "10.0.0.1");
        }
        let result = expand_env("${GROVE_TEST_IFACE}:inner", "test.field").unwrap();
        assert_eq!(result, "10.0.0.1:inner");
        unsafe {
            std::env::remove_var("GROVE_TEST_IFACE");
        }
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_env("0.0.0.0", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
    }
}
