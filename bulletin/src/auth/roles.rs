//! Badge-derived role tags.
//!
//! A user's role is decided by the first character of their badge when they register and is
//! stored alongside the account. It is never recomputed on login.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Permission tier assigned at registration.
///
/// `Executive` holds every permission `Director` has, and `Director` every permission of a plain
/// authenticated user. The remaining tags are non-administrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "camelCase")]
#[sqlx(type_name = "role_tag", rename_all = "camelCase")]
pub enum RoleTag {
    Executive,
    Vip,
    Director,
    Manager,
    NewHire,
    Campaign,
    Regular,
    Unknown,
}

impl RoleTag {
    pub const ALL: [RoleTag; 8] = [
        RoleTag::Executive,
        RoleTag::Vip,
        RoleTag::Director,
        RoleTag::Manager,
        RoleTag::NewHire,
        RoleTag::Campaign,
        RoleTag::Regular,
        RoleTag::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Executive => "executive",
            RoleTag::Vip => "vip",
            RoleTag::Director => "director",
            RoleTag::Manager => "manager",
            RoleTag::NewHire => "newHire",
            RoleTag::Campaign => "campaign",
            RoleTag::Regular => "regular",
            RoleTag::Unknown => "unknown",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a role from a badge identifier.
///
/// Only the first character is inspected; an absent or empty badge is `Unknown`.
pub fn classify(badge: Option<&str>) -> RoleTag {
    match badge.and_then(|b| b.chars().next()) {
        Some('1') => RoleTag::Executive,
        Some('2') => RoleTag::Vip,
        Some('3') => RoleTag::Director,
        Some('4') => RoleTag::Manager,
        Some('5') => RoleTag::NewHire,
        Some('6') => RoleTag::Campaign,
        Some('7') => RoleTag::Regular,
        _ => RoleTag::Unknown,
    }
}

/// A set of role tags, used as the requirement of a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Every role, i.e. "any authenticated user".
    pub const ANY: RoleSet = RoleSet::of(&RoleTag::ALL);
    /// Roles allowed to create and edit posts.
    pub const EDITORS: RoleSet = RoleSet::of(&[RoleTag::Executive, RoleTag::Director]);
    /// Roles allowed to delete posts and administer users.
    pub const EXECUTIVES: RoleSet = RoleSet::of(&[RoleTag::Executive]);

    pub const fn of(roles: &[RoleTag]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(&self, role: RoleTag) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleTag> + '_ {
        RoleTag::ALL.into_iter().filter(|role| self.contains(*role))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|role| role.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_prefixes() {
        assert_eq!(classify(Some("1")), RoleTag::Executive);
        assert_eq!(classify(Some("2000")), RoleTag::Vip);
        assert_eq!(classify(Some("3999")), RoleTag::Director);
        assert_eq!(classify(Some("4abc")), RoleTag::Manager);
        assert_eq!(classify(Some("5")), RoleTag::NewHire);
        assert_eq!(classify(Some("6-campaign")), RoleTag::Campaign);
        assert_eq!(classify(Some("7777")), RoleTag::Regular);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(None), RoleTag::Unknown);
        assert_eq!(classify(Some("")), RoleTag::Unknown);
        assert_eq!(classify(Some("9xx")), RoleTag::Unknown);
        assert_eq!(classify(Some("0123")), RoleTag::Unknown);
        assert_eq!(classify(Some("8")), RoleTag::Unknown);
        assert_eq!(classify(Some("A100")), RoleTag::Unknown);
        assert_eq!(classify(Some(" 1")), RoleTag::Unknown);
    }

    #[test]
    fn test_classify_ignores_everything_after_first_char() {
        let suffixes = ["", "0", "999", "abc", "-x-", "\u{00e9}\u{00e9}", "1234567890"];
        for first in ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'x', '#'] {
            let expected = classify(Some(&first.to_string()));
            for suffix in suffixes {
                let badge = format!("{first}{suffix}");
                assert_eq!(classify(Some(&badge)), expected, "badge {badge:?}");
            }
        }
    }

    #[test]
    fn test_role_tag_wire_names() {
        assert_eq!(serde_json::to_string(&RoleTag::NewHire).unwrap(), "\"newHire\"");
        assert_eq!(serde_json::to_string(&RoleTag::Director).unwrap(), "\"director\"");
        for role in RoleTag::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_role_sets() {
        assert!(RoleSet::EDITORS.contains(RoleTag::Executive));
        assert!(RoleSet::EDITORS.contains(RoleTag::Director));
        assert!(!RoleSet::EDITORS.contains(RoleTag::Regular));
        assert!(!RoleSet::EXECUTIVES.contains(RoleTag::Director));
        for role in RoleTag::ALL {
            assert!(RoleSet::ANY.contains(role));
        }
        assert_eq!(RoleSet::EDITORS.to_string(), "{executive, director}");
        assert_eq!(RoleSet::default().iter().count(), 0);
    }
}
