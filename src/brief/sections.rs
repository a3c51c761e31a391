//! Brief section types and the heading table.

use serde::{Deserialize, Serialize};

/// A recognized heading and its presentation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionConfig {
    /// Canonical heading, upper case.
    pub title: &'static str,
    pub id: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Headings in canonical order. Titles must not be substrings of each other
/// or the first match in this order silently wins.
pub const DEFAULT_SECTIONS: &[SectionConfig] = &[
    SectionConfig {
        title: "DECISION BEING MADE",
        id: "decision",
        icon: "🎯",
        color: "blue",
    },
    SectionConfig {
        title: "OPTIONS CONSIDERED",
        id: "options",
        icon: "🔀",
        color: "purple",
    },
    SectionConfig {
        title: "TRADEOFFS",
        id: "tradeoffs",
        icon: "⚖️",
        color: "indigo",
    },
    SectionConfig {
        title: "RECOMMENDED DECISION",
        id: "recommendation",
        icon: "✅",
        color: "green",
    },
    SectionConfig {
        title: "DECISION OWNER",
        id: "owner",
        icon: "👤",
        color: "orange",
    },
    SectionConfig {
        title: "RISKS & WATCHOUTS",
        id: "risks",
        icon: "⚠️",
        color: "red",
    },
    SectionConfig {
        title: "NEXT 3 ACTIONS",
        id: "actions",
        icon: "📋",
        color: "teal",
    },
];

/// Headings a complete brief must contain.
pub fn required_headings() -> impl Iterator<Item = &'static str> {
    DEFAULT_SECTIONS.iter().map(|s| s.title)
}

/// One parsed region of a brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub icon: String,
    pub color: String,
}

impl BriefSection {
    /// Open an empty section for a heading.
    pub fn open(config: &SectionConfig) -> Self {
        Self {
            id: config.id.to_string(),
            title: config.title.to_string(),
            content: String::new(),
            icon: config.icon.to_string(),
            color: config.color.to_string(),
        }
    }
}
