// src/domain/category.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The four marketing buckets a listing is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Launch,
    MostWanted,
    Waterfront,
    MoveInReady,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Launch,
        Category::MostWanted,
        Category::Waterfront,
        Category::MoveInReady,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Category::Launch => "launch",
            Category::MostWanted => "most-wanted",
            Category::Waterfront => "waterfront",
            Category::MoveInReady => "move-in-ready",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Launch => "New Launches",
            Category::MostWanted => "Most Wanted",
            Category::Waterfront => "Waterfront",
            Category::MoveInReady => "Move-in Ready",
        }
    }

    /// Storage key of the derived per-category cache, e.g. `launchProperties`.
    pub fn cache_key(self) -> String {
        format!("{}Properties", self.slug())
    }

    /// Strict parse of a canonical slug. Use [`CategoryTable::resolve`] for loose input.
    pub fn from_slug(s: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.slug() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Every known spelling of a category or property type, and the bucket it lands in.
/// Keys are lowercase.
const CATEGORY_HINTS: &[(&str, Category)] = &[
    // canonical slugs
    ("launch", Category::Launch),
    ("most-wanted", Category::MostWanted),
    ("waterfront", Category::Waterfront),
    ("move-in-ready", Category::MoveInReady),
    // legacy page slugs
    ("lancamentos", Category::Launch),
    ("lançamentos", Category::Launch),
    ("mais-procurados", Category::MostWanted),
    ("beira-mar", Category::Waterfront),
    ("pronto-morar", Category::MoveInReady),
    // property types written by the dashboard form
    ("apartamento", Category::Launch),
    ("cobertura", Category::Launch),
    ("casa", Category::MostWanted),
    ("sobrado", Category::MostWanted),
    ("terreno", Category::Waterfront),
    ("sitio", Category::Waterfront),
    ("sítio", Category::Waterfront),
    ("chacara", Category::Waterfront),
    ("chácara", Category::Waterfront),
    ("comercial", Category::MoveInReady),
    // english type words
    ("apartment", Category::Launch),
    ("penthouse", Category::Launch),
    ("house", Category::MostWanted),
    ("townhouse", Category::MostWanted),
    ("land", Category::Waterfront),
    ("lot", Category::Waterfront),
    ("farm", Category::Waterfront),
    ("commercial", Category::MoveInReady),
];

/// Single lookup table from free-text type hints to categories.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    hints: HashMap<&'static str, Category>,
    default: Category,
}

impl CategoryTable {
    pub fn new(default: Category) -> Self {
        Self {
            hints: CATEGORY_HINTS.iter().copied().collect(),
            default,
        }
    }

    /// Case-insensitive lookup without falling back to the default.
    pub fn lookup(&self, hint: &str) -> Option<Category> {
        let key = hint.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.hints.get(key.as_str()).copied()
    }

    /// Resolves a loose type hint; unknown or missing hints land in the default bucket.
    pub fn resolve(&self, hint: Option<&str>) -> Category {
        hint.and_then(|h| self.lookup(h)).unwrap_or(self.default)
    }
}
