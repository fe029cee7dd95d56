//! Member binding flags
//!
//! Flags select which members a query returns. A query needs at least one
//! visibility flag (`PUBLIC`, `NON_PUBLIC`) and at least one storage flag
//! (`INSTANCE`, `STATIC`); otherwise nothing matches.
//!
//! Flags can be written in configuration as a pipe-separated string:
//!
//! ```toml
//! default_binding = "PUBLIC|INSTANCE|STATIC"
//! ```

use std::fmt;

use crate::descriptor::Visibility;

/// Member selection flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingFlags(u8);

impl BindingFlags {
    /// Nothing selected
    pub const NONE: Self = Self(0x00);
    /// Instance members
    pub const INSTANCE: Self = Self(0x01);
    /// Static members
    pub const STATIC: Self = Self(0x02);
    /// Public members
    pub const PUBLIC: Self = Self(0x04);
    /// Protected, internal and private members
    pub const NON_PUBLIC: Self = Self(0x08);
    /// Members declared on the queried type only
    pub const DECLARED_ONLY: Self = Self(0x10);
    /// Include public and protected static members of base types
    pub const FLATTEN_HIERARCHY: Self = Self(0x20);

    /// PUBLIC | INSTANCE | STATIC, used when no flags are given
    pub const DEFAULT_LOOKUP: Self = Self(0x07);
    /// PUBLIC | NON_PUBLIC | INSTANCE
    pub const ALL_INSTANCE: Self = Self(0x0D);
    /// PUBLIC | NON_PUBLIC | STATIC
    pub const ALL_STATIC: Self = Self(0x0E);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if all flags of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether a member with this visibility and storage is selected
    pub fn admits(&self, visibility: Visibility, is_static: bool) -> bool {
        let visible = if visibility.is_public() {
            self.contains(Self::PUBLIC)
        } else {
            self.contains(Self::NON_PUBLIC)
        };
        let storage = if is_static {
            self.contains(Self::STATIC)
        } else {
            self.contains(Self::INSTANCE)
        };
        visible && storage
    }

    /// Parse a single flag name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "INSTANCE" => Some(Self::INSTANCE),
            "STATIC" => Some(Self::STATIC),
            "PUBLIC" => Some(Self::PUBLIC),
            "NON_PUBLIC" | "NONPUBLIC" => Some(Self::NON_PUBLIC),
            "DECLARED_ONLY" => Some(Self::DECLARED_ONLY),
            "FLATTEN_HIERARCHY" => Some(Self::FLATTEN_HIERARCHY),
            "DEFAULT_LOOKUP" => Some(Self::DEFAULT_LOOKUP),
            "ALL_INSTANCE" => Some(Self::ALL_INSTANCE),
            "ALL_STATIC" => Some(Self::ALL_STATIC),
            _ => {
                if let Some(hex) = s.strip_prefix("0x") {
                    u8::from_str_radix(hex, 16).ok().map(Self::from_bits)
                } else {
                    s.parse::<u8>().ok().map(Self::from_bits)
                }
            }
        }
    }

    /// Parse combined flags from a pipe-separated string (e.g. "PUBLIC|STATIC")
    pub fn from_combined_str(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            result = result.union(Self::from_name(part.trim())?);
        }
        Some(result)
    }
}

impl Default for BindingFlags {
    fn default() -> Self {
        Self::DEFAULT_LOOKUP
    }
}

impl std::ops::BitOr for BindingFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for BindingFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(BindingFlags, &str); 6] = [
            (BindingFlags::PUBLIC, "PUBLIC"),
            (BindingFlags::NON_PUBLIC, "NON_PUBLIC"),
            (BindingFlags::INSTANCE, "INSTANCE"),
            (BindingFlags::STATIC, "STATIC"),
            (BindingFlags::DECLARED_ONLY, "DECLARED_ONLY"),
            (BindingFlags::FLATTEN_HIERARCHY, "FLATTEN_HIERARCHY"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
