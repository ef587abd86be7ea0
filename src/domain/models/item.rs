//! Shared item domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tools,
    Garden,
    Kitchen,
    Outdoor,
    Electronics,
    Games,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Tools,
        Self::Garden,
        Self::Kitchen,
        Self::Outdoor,
        Self::Electronics,
        Self::Games,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::Garden => "garden",
            Self::Kitchen => "kitchen",
            Self::Outdoor => "outdoor",
            Self::Electronics => "electronics",
            Self::Games => "games",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A physical item offered for lending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    /// Display name of the lender
    pub owner: String,
    /// Whether the item can be reserved right now
    pub available: bool,
    pub listed_at: DateTime<Utc>,
}

impl Item {
    pub fn new(name: impl Into<String>, category: Category, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            owner: owner.into(),
            available: true,
            listed_at: Utc::now(),
        }
    }

    /// Case-insensitive match on name or owner
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.owner.to_lowercase().contains(&needle)
    }
}

// ── Tests ──────────────────────────────────────────────────────
