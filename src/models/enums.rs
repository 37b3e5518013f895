use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Leading attributes are forwarded to the enum (used for serde renames).
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $(#[$meta])*
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Status of one adherence event for a medicine on a date.
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    LogStatus {
        Taken => "TAKEN",
        Missed => "MISSED",
        Pending => "PENDING",
        Edited => "EDITED",
    }
);

str_enum!(
    /// Where a medicine's active window sits relative to today.
    #[serde(rename_all = "lowercase")]
    MedicineStatus {
        Active => "active",
        Upcoming => "upcoming",
        Completed => "completed",
    }
);
