//! Named groups of file extensions.
//!
//! The catalog is a fixed table: each category maps a human-readable name to the
//! extensions (lower-case, with the leading dot) that belong to it. Callers use
//! it to turn a choice like "spreadsheets" into an extension allow-set.
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// A named group of extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

/// All known categories, in display order
pub const CATEGORIES: &[Category] = &[
    Category {
        name: "documents",
        extensions: &[".txt", ".doc", ".docx", ".pdf", ".rtf"],
    },
    Category {
        name: "spreadsheets",
        extensions: &[".xls", ".xlsx", ".csv"],
    },
    Category {
        name: "databases",
        extensions: &[".db", ".sql", ".sqlite"],
    },
    Category {
        name: "web",
        extensions: &[".html", ".xml", ".json"],
    },
    Category {
        name: "source code",
        extensions: &[".py", ".js", ".cpp", ".java", ".php"],
    },
];

static ALL_EXTENSIONS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    CATEGORIES
        .iter()
        .flat_map(|category| category.extensions.iter().copied())
        .collect()
});

/// Looks up a category by name, ignoring case and surrounding whitespace
pub fn by_name(name: &str) -> Option<&'static Category> {
    let name = name.trim();
    CATEGORIES
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(name))
}

/// Looks up a category by its 1-based position in [`CATEGORIES`]
pub fn by_index(index: usize) -> Option<&'static Category> {
    index.checked_sub(1).and_then(|i| CATEGORIES.get(i))
}

/// Resolves a selector that is either a category name or a 1-based index
pub fn resolve(selector: &str) -> Option<&'static Category> {
    match selector.trim().parse::<usize>() {
        Ok(index) => by_index(index),
        Err(_) => by_name(selector),
    }
}

/// Every extension mentioned by any category
pub fn all_extensions() -> &'static BTreeSet<&'static str> {
    &ALL_EXTENSIONS
}
