//! Macro for implementing Display and FromStr for string-keyed domain enums
//!
//! Platform identifiers and connection states are stored and logged by their
//! lowercase names. This macro keeps both directions of that mapping in one
//! place.
//!
//! # Example
//!
//! ```rust
//! use streamgate_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Grant {
//!     AuthorizationCode,
//!     RefreshToken,
//! }
//!
//! impl_domain_enum_conversions!(Grant {
//!     AuthorizationCode => "authorization_code",
//!     RefreshToken => "refresh_token",
//! });
//!
//! assert_eq!(Grant::RefreshToken.to_string(), "refresh_token");
//! ```

/// Implements Display and FromStr traits for string-keyed enums
///
/// - Display writes the mapped string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestGrant {
        AuthorizationCode,
        RefreshToken,
    }

    impl_domain_enum_conversions!(TestGrant {
        AuthorizationCode => "authorization_code",
        RefreshToken => "refresh_token",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestGrant::AuthorizationCode.to_string(), "authorization_code");
        assert_eq!(TestGrant::RefreshToken.as_str(), "refresh_token");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(TestGrant::from_str("Refresh_Token").unwrap(), TestGrant::RefreshToken);
        assert_eq!(
            TestGrant::from_str("AUTHORIZATION_CODE").unwrap(),
            TestGrant::AuthorizationCode
        );
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestGrant::from_str("implicit");
        assert!(result.unwrap_err().contains("Invalid TestGrant: implicit"));
        assert!(TestGrant::from_str("").is_err());
    }
}
