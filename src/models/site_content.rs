// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-managed site content (footer, about page, homepage, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteContentType {
    Footer,
    About,
    Terms,
    Privacy,
    Homepage,
    Faq,
    Contact,
    Roadmap,
    Pricing,
}

impl SiteContentType {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(raw.to_lowercase())).ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SiteContentType::Footer => "footer",
            SiteContentType::About => "about",
            SiteContentType::Terms => "terms",
            SiteContentType::Privacy => "privacy",
            SiteContentType::Homepage => "homepage",
            SiteContentType::Faq => "faq",
            SiteContentType::Contact => "contact",
            SiteContentType::Roadmap => "roadmap",
            SiteContentType::Pricing => "pricing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    #[default]
    Published,
    PendingReview,
}

/// Homepage section keys, in display order.
pub const HOMEPAGE_SECTIONS: [&str; 8] = [
    "hero",
    "features",
    "testimonials",
    "pricing",
    "cta",
    "stats",
    "footer",
    "header",
];

/// One content document, keyed by its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContent {
    #[serde(rename = "type")]
    pub content_type: SiteContentType,
    pub content: serde_json::Value,
    /// Homepage sections present in `content`
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Homepage sections present in a content object.
///
/// Keys may sit at the top level or under a language key (`vi`, `en`).
pub fn homepage_sections(content: &serde_json::Value) -> Vec<String> {
    let has_section = |key: &str| {
        content.get(key).is_some()
            || ["vi", "en"]
                .iter()
                .any(|lang| content.get(lang).and_then(|c| c.get(key)).is_some())
    };

    HOMEPAGE_SECTIONS
        .iter()
        .filter(|key| has_section(key))
        .map(|key| key.to_string())
        .collect()
}
