//! Saved broadcast records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dialogue::DialogueLine;

/// Who may see a saved broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown visibility '{other}'")),
        }
    }
}

/// A persisted broadcast in the `news_broadcast` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: String,
    pub topic: String,
    pub dialogue: Vec<DialogueLine>,
    pub visibility: Visibility,
    pub timestamp: DateTime<Utc>,
    pub owner: String,
}

impl Broadcast {
    /// Whether `requester` may see this record.
    pub fn is_visible_to(&self, requester: Option<&str>) -> bool {
        self.visibility == Visibility::Public || self.is_owned_by(requester)
    }

    pub fn is_owned_by(&self, requester: Option<&str>) -> bool {
        requester.is_some_and(|user| user == self.owner)
    }
}

/// Fields supplied when creating a broadcast; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBroadcast {
    pub topic: String,
    pub dialogue: Vec<DialogueLine>,
    pub visibility: Visibility,
    pub timestamp: DateTime<Utc>,
    pub owner: String,
}

impl NewBroadcast {
    pub fn into_broadcast(self, id: impl Into<String>) -> Broadcast {
        Broadcast {
            id: id.into(),
            topic: self.topic,
            dialogue: self.dialogue,
            visibility: self.visibility,
            timestamp: self.timestamp,
            owner: self.owner,
        }
    }
}

/// Which slices of the feed a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedFilter {
    /// The requester's own private broadcasts.
    pub include_private: bool,
    /// Public broadcasts from anyone.
    pub include_public: bool,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            include_private: true,
            include_public: true,
        }
    }
}

impl FeedFilter {
    pub fn matches(&self, broadcast: &Broadcast, requester: Option<&str>) -> bool {
        let mine = broadcast.is_owned_by(requester);
        match broadcast.visibility {
            Visibility::Public => self.include_public || (self.include_private && mine),
            Visibility::Private => self.include_private && mine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, visibility: Visibility) -> Broadcast {
        Broadcast {
            id: "b1".into(),
            topic: "t".into(),
            dialogue: Vec::new(),
            visibility,
            timestamp: Utc::now(),
            owner: owner.into(),
        }
    }

    #[test]
    fn test_visibility_rules() {
        let private = record("x", Visibility::Private);
        assert!(private.is_visible_to(Some("x")));
        assert!(!private.is_visible_to(Some("y")));
        assert!(!private.is_visible_to(None));

        let public = record("x", Visibility::Public);
        assert!(public.is_visible_to(None));
    }

    #[test]
    fn test_feed_filter() {
        let public_other = record("y", Visibility::Public);
        let private_mine = record("x", Visibility::Private);
        let only_private = FeedFilter {
            include_private: true,
            include_public: false,
        };
        assert!(!only_private.matches(&public_other, Some("x")));
        assert!(only_private.matches(&private_mine, Some("x")));
        assert!(FeedFilter::default().matches(&public_other, Some("x")));
    }

    #[test]
    fn test_visibility_default_and_parse() {
        assert_eq!(Visibility::default(), Visibility::Private);
        assert_eq!("PUBLIC".parse::<Visibility>().unwrap(), Visibility::Public);
    }
}
