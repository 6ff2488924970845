//! Sensitive data marker for automatic redaction
//!
//! The CircleCI API token travels through settings, the store client and
//! request URLs. Wrapping it in `Sensitive<T>` keeps it out of `Debug`
//! output, error messages and log fields.

use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use tfmigrate_core_types::Sensitive;
///
/// let token = Sensitive::new("circle-token");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(format!("{}", token), "***REDACTED***");
///
/// assert_eq!(token.expose(), &"circle-token");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only call this at the point the secret leaves the process
    /// (e.g. building an authenticated request).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("circle-abc123");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("circle-abc123"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("circle-abc123");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_sensitive_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("token"));
        assert_eq!(secret.expose(), "token");
        assert_eq!(secret.into_inner(), "token");
    }

    #[test]
    fn test_sensitive_inside_settings_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Settings {
            project: String,
            token: Sensitive<String>,
        }

        let settings = Settings {
            project: "github/acme/infra".to_string(),
            token: Sensitive::new("secret123".to_string()),
        };

        let debug_str = format!("{:?}", settings);
        assert!(debug_str.contains("github/acme/infra"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("secret123"));
    }
}
