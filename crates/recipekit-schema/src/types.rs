//! Newtype wrappers for derived recipe identifiers.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Short build token such as `np19py27_3`: pinned runtime tags plus build number.
    BuildId
);

string_newtype!(
    /// `name-version-build` identifier of one build output.
    DistName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_id_display_and_as_ref() {
        let id = BuildId::new("py27_0");
        assert_eq!(id.to_string(), "py27_0");
        assert_eq!(id.as_str(), "py27_0");
        assert_eq!(AsRef::<str>::as_ref(&id), "py27_0");
    }

    #[test]
    fn dist_name_serializes_as_plain_string() {
        let dist = DistName::new("pycosat-0.6.1-py27_0");
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!(json, "\"pycosat-0.6.1-py27_0\"");
        let back: DistName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dist);
    }

    #[test]
    fn dist_name_splits_like_a_str() {
        let dist = DistName::from("foo-1.0-np19py27_0");
        assert_eq!(dist.rsplit('-').next(), Some("np19py27_0"));
        assert!(dist.starts_with("foo-"));
    }

    #[test]
    fn build_id_into_inner() {
        let id = BuildId::new("3".to_owned());
        assert_eq!(id.into_inner(), "3");
    }

    #[test]
    fn compares_with_strings() {
        let id = BuildId::from(String::from("np19py27_3"));
        assert_eq!(id, String::from("np19py27_3"));
        assert_eq!(String::from("np19py27_3"), id);
    }
}
