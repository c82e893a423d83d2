//! Typed identifier newtypes.
//!
//! Remote identifiers are opaque strings assigned by the platform, so the
//! newtypes wrap a `String` and serialize transparently.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
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

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a remote [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Identifier of a [`Room`](crate::device::Room).
    RoomId
);

define_id!(
    /// Identifier of a [`Household`](crate::device::Household).
    HouseholdId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_raw_value() {
        let id = DeviceId::new("4a5c0b7e-lamp");
        assert_eq!(id.to_string(), "4a5c0b7e-lamp");
        assert_eq!(id.as_str(), "4a5c0b7e-lamp");
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let id = RoomId::from("kitchen");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"kitchen\"");
        let parsed: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_order_lexicographically() {
        let a = HouseholdId::from("a");
        let b = HouseholdId::from(String::from("b"));
        assert!(a < b);
    }
}
