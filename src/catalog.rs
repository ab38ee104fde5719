//! Category and saved-set filtering over the article catalog.
//!
//! Filtering is a pure function: same inputs, same ordered output, no side
//! effects. Category matching is a case-insensitive substring test of each
//! tag against the category's target list.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::articles::Article;

const TECHNOLOGY_TARGETS: &[&str] = &["teknoloji", "yapayzeka", "ai", "blokzincir", "vr"];
const ANALYSIS_TARGETS: &[&str] = &["analiz", "verianalizi", "mekansalanaliz", "gis"];
const EDUCATION_TARGETS: &[&str] = &["eğitim", "oyunlaştırma", "simülasyon", "sanalmüze"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Technology,
    Analysis,
    Education,
    /// Free-text category, stored lower-cased; matches tags containing it.
    Other(String),
}

impl Category {
    /// Categories offered in the home-page menu, in display order.
    #[must_use]
    pub fn menu() -> [Self; 4] {
        [Self::All, Self::Technology, Self::Analysis, Self::Education]
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "Tümü",
            Self::Technology => "Teknoloji",
            Self::Analysis => "Analiz",
            Self::Education => "Eğitim",
            Self::Other(text) => text,
        }
    }

    /// Lower-case tag substrings this category matches; `None` matches everything.
    #[must_use]
    pub fn targets(&self) -> Option<Vec<&str>> {
        match self {
            Self::All => None,
            Self::Technology => Some(TECHNOLOGY_TARGETS.to_vec()),
            Self::Analysis => Some(ANALYSIS_TARGETS.to_vec()),
            Self::Education => Some(EDUCATION_TARGETS.to_vec()),
            Self::Other(text) => Some(vec![text.as_str()]),
        }
    }

    #[must_use]
    pub fn matches(&self, article: &Article) -> bool {
        let Some(targets) = self.targets() else {
            return true;
        };
        article.tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            targets.iter().any(|target| tag.contains(target))
        })
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().trim_start_matches('#').to_lowercase();
        Ok(match lowered.as_str() {
            "" | "tümü" | "all" => Self::All,
            "teknoloji" => Self::Technology,
            "analiz" => Self::Analysis,
            "eğitim" => Self::Education,
            _ => Self::Other(lowered),
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which listing the caller is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Browse,
    Saved,
}

/// Articles visible for the given category, mode, and saved ids, in catalog order.
///
/// In [`ViewMode::Saved`] the category is ignored and only saved articles are
/// returned.
#[must_use]
pub fn filter<'a>(
    articles: &'a [Article],
    category: &Category,
    mode: ViewMode,
    saved: &HashSet<String>,
) -> Vec<&'a Article> {
    match mode {
        ViewMode::Saved => articles.iter().filter(|a| saved.contains(a.id)).collect(),
        ViewMode::Browse => articles.iter().filter(|a| category.matches(a)).collect(),
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
