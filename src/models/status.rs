//! Lifecycle status enums
//!
//! Every entity carries a status stored as a lowercase string. `status_enum!`
//! generates the enum together with its string conversions so each entity
//! module only lists its variants.

/// Declare a lowercase string-backed status enum.
///
/// The first variant is the default.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const NAMES: &'static [&'static str] = &[$($text),+];

            /// Database string representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parse a database or query-string value (case-insensitive)
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::models::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| {
                    $crate::models::ValidationError::new(format!(
                        "Invalid {} '{}', expected one of: {}",
                        stringify!($name),
                        s,
                        Self::NAMES.join(", ")
                    ))
                })
            }
        }
    };
}
