//! Identifier mapping between remote numeric ids and normalized ids.
//!
//! The remote network identifies every entity with a signed 64-bit integer.
//! The normalized layer uses opaque strings. All mappings here are total,
//! deterministic, and reversible for integer-valued ids; there is no state
//! and no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized id of a remote user (ghost identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

/// Normalized id of one logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginId(String);

/// Normalized id of one conversation (portal).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalId(String);

macro_rules! id_impls {
    ($name:ident) => {
        impl $name {
            /// Borrow the normalized string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_impls!(UserId);
id_impls!(LoginId);
id_impls!(PortalId);

/// Failure to parse a normalized identifier back into a remote id.
#[derive(Debug, Error)]
#[error("not a numeric identifier: {input:?}")]
pub struct IdParseError {
    /// The rejected input.
    pub input: String,
    #[source]
    source: std::num::ParseIntError,
}

/// Map a remote contact id to its normalized user id.
pub fn make_user_id(remote_id: i64) -> UserId {
    UserId(remote_id.to_string())
}

/// Map a remote contact id to the login id its account would use.
pub fn make_user_login_id(remote_id: i64) -> LoginId {
    LoginId(remote_id.to_string())
}

/// Map a remote thread key to its normalized portal id.
pub fn make_portal_id(thread_key: i64) -> PortalId {
    PortalId(thread_key.to_string())
}

/// Parse a normalized identifier string back into a remote id.
///
/// # Errors
///
/// Returns [`IdParseError`] when the input is not a representable signed
/// 64-bit integer.
pub fn parse_id(input: &str) -> Result<i64, IdParseError> {
    input
        .parse::<i64>()
        .map_err(|source| IdParseError { input: input.to_string(), source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_numeric_identifier() {
        assert_eq!(parse_id("123").unwrap(), 123);
    }

    #[test]
    fn parse_rejects_non_numeric_identifier() {
        let err = parse_id("abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(parse_id("99999999999999999999999").is_err());
    }

    #[test]
    fn mappings_are_deterministic() {
        assert_eq!(make_user_id(42), make_user_id(42));
        assert_eq!(make_portal_id(1234).as_str(), "1234");
        assert_eq!(make_user_login_id(-7).as_str(), "-7");
    }

    proptest! {
        #[test]
        fn user_id_roundtrips(remote_id in any::<i64>()) {
            let mapped = make_user_id(remote_id);
            prop_assert_eq!(parse_id(mapped.as_str()).unwrap(), remote_id);
        }

        #[test]
        fn portal_id_roundtrips(thread_key in any::<i64>()) {
            let mapped = make_portal_id(thread_key);
            prop_assert_eq!(parse_id(mapped.as_str()).unwrap(), thread_key);
        }
    }
}
