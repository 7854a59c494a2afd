//! Station code types.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

/// Error returned when parsing an invalid CRS code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CRS code: {reason}")]
pub struct InvalidCrs {
    reason: &'static str,
}

/// A valid 3-letter CRS (Computer Reservation System) station code.
///
/// CRS codes are stored as 3 uppercase ASCII letters. Input is normalized:
/// lowercase letters are accepted and upper-cased, because configuration
/// sources and the public fallback API are inconsistent about case. This
/// type guarantees that any `Crs` value is valid by construction.
///
/// # Examples
///
/// ```
/// use train_monitor::domain::Crs;
///
/// let ely = Crs::parse("ELY").unwrap();
/// assert_eq!(ely.as_str(), "ELY");
///
/// // Lowercase is normalized
/// assert_eq!(Crs::parse("cbg").unwrap().as_str(), "CBG");
///
/// // Wrong length is rejected
/// assert!(Crs::parse("EL").is_err());
/// assert!(Crs::parse("ELYY").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs([u8; 3]);

impl Crs {
    /// Parse a CRS code from a string.
    ///
    /// The input must be exactly 3 ASCII letters; case is normalized to
    /// uppercase. Surrounding whitespace is not accepted.
    pub fn parse(s: &str) -> Result<Self, InvalidCrs> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidCrs {
                reason: "must be exactly 3 characters",
            });
        }

        let mut code = [0u8; 3];
        for (i, &b) in bytes.iter().enumerate() {
            if !b.is_ascii_alphabetic() {
                return Err(InvalidCrs {
                    reason: "must be ASCII letters A-Z",
                });
            }
            code[i] = b.to_ascii_uppercase();
        }

        Ok(Crs(code))
    }

    /// Returns the CRS code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII uppercase letters
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crs({})", self.as_str())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Crs {
    type Err = InvalidCrs;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crs::parse(s)
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Crs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CrsVisitor;

        impl Visitor<'_> for CrsVisitor {
            type Value = Crs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a 3-letter CRS code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Crs, E> {
                Crs::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(CrsVisitor)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating CRS codes in mixed case
    fn any_case_crs() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[A-Za-z]{3}").unwrap()
    }

    proptest! {
        /// Any 3-letter input parses and normalizes to uppercase
        #[test]
        fn letters_always_parse(s in any_case_crs()) {
            let crs = Crs::parse(&s).unwrap();
            prop_assert_eq!(crs.as_str(), s.to_ascii_uppercase().as_str());
        }

        /// Parsing is case-insensitive with respect to equality
        #[test]
        fn case_insensitive_eq(s in any_case_crs()) {
            let lower = Crs::parse(&s.to_ascii_lowercase()).unwrap();
            let upper = Crs::parse(&s.to_ascii_uppercase()).unwrap();
            prop_assert_eq!(lower, upper);
        }

        /// Wrong-length strings are always rejected
        #[test]
        fn wrong_length_rejected(s in "[A-Z]{0,2}|[A-Z]{4,10}") {
            prop_assert!(Crs::parse(&s).is_err());
        }

        /// Strings with digits are rejected
        #[test]
        fn digits_rejected(s in "[A-Z0-9]{3}".prop_filter("has digit", |s| s.chars().any(|c| c.is_ascii_digit()))) {
            prop_assert!(Crs::parse(&s).is_err());
        }

        /// Serde roundtrips through JSON
        #[test]
        fn serde_roundtrip(s in "[A-Z]{3}") {
            let crs = Crs::parse(&s).unwrap();
            let json = serde_json::to_string(&crs).unwrap();
            let back: Crs = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, crs);
        }
    }
}
