use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::pr::{PRInfo, ReleaseMetadata};
use super::repo::RepositoryRef;

/// Fixed category set. Variant order is display order; classification
/// priority lives in the categorizer's rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Features,
    BugFixes,
    Documentation,
    Refactoring,
    Tests,
    Dependencies,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Features,
        Category::BugFixes,
        Category::Documentation,
        Category::Refactoring,
        Category::Tests,
        Category::Dependencies,
        Category::Other,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Features => "Features",
            Category::BugFixes => "Bug Fixes",
            Category::Documentation => "Documentation",
            Category::Refactoring => "Refactoring",
            Category::Tests => "Tests",
            Category::Dependencies => "Dependencies",
            Category::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

pub type CategoryMap = BTreeMap<Category, Vec<PRInfo>>;

/// The immutable result of analyzing one release: metadata, the deduped
/// PR list in ascending number order, and the category partition.
#[derive(Debug, Clone)]
pub struct ReleaseAnalysis {
    pub repo: RepositoryRef,
    pub metadata: ReleaseMetadata,
    pub prs: Vec<PRInfo>,
    pub categories: CategoryMap,
}

impl ReleaseAnalysis {
    pub fn total_prs(&self) -> usize {
        self.prs.len()
    }

    /// Consumes the fetched analysis and attaches the category partition.
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    pub fn stats(&self) -> ReleaseStats {
        let contributors: BTreeSet<&str> =
            self.prs.iter().map(|pr| pr.author.as_str()).collect();

        let category_counts: BTreeMap<Category, usize> = self
            .categories
            .iter()
            .map(|(cat, prs)| (*cat, prs.len()))
            .collect();

        let top_category = category_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .max_by_key(|(_, count)| **count)
            .map(|(cat, _)| *cat);

        ReleaseStats {
            total_prs: self.prs.len(),
            additions: self.prs.iter().map(|pr| pr.additions as u64).sum(),
            deletions: self.prs.iter().map(|pr| pr.deletions as u64).sum(),
            changed_files: self.prs.iter().map(|pr| pr.changed_files as u64).sum(),
            contributors: contributors.len(),
            category_counts,
            top_category,
        }
    }
}

/// Aggregate numbers over the full PR set.
#[derive(Debug, Clone)]
pub struct ReleaseStats {
    pub total_prs: usize,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub contributors: usize,
    pub category_counts: BTreeMap<Category, usize>,
    pub top_category: Option<Category>,
}

/// Audience a summary is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryLevel {
    Executive,
    Product,
    Developer,
}

impl SummaryLevel {
    pub const ALL: [SummaryLevel; 3] = [
        SummaryLevel::Executive,
        SummaryLevel::Product,
        SummaryLevel::Developer,
    ];
}

impl fmt::Display for SummaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SummaryLevel::Executive => "executive",
            SummaryLevel::Product => "product",
            SummaryLevel::Developer => "developer",
        };
        write!(f, "{}", name)
    }
}

/// Generated summaries, one slot per requested level. A failed level stays
/// absent and its reason is recorded so the caller can report it.
#[derive(Debug, Clone, Default)]
pub struct SummaryBundle {
    pub executive: Option<String>,
    pub product: Option<String>,
    pub developer: Option<String>,
    pub failures: Vec<(SummaryLevel, String)>,
}

impl SummaryBundle {
    pub fn get(&self, level: SummaryLevel) -> Option<&str> {
        match level {
            SummaryLevel::Executive => self.executive.as_deref(),
            SummaryLevel::Product => self.product.as_deref(),
            SummaryLevel::Developer => self.developer.as_deref(),
        }
    }

    pub fn set(&mut self, level: SummaryLevel, text: String) {
        match level {
            SummaryLevel::Executive => self.executive = Some(text),
            SummaryLevel::Product => self.product = Some(text),
            SummaryLevel::Developer => self.developer = Some(text),
        }
    }
}

/// Per-category PR-count deltas between two releases of the same repo.
#[derive(Debug, Clone)]
pub struct ReleaseDelta {
    pub total_prs: i64,
    pub by_category: BTreeMap<Category, i64>,
}

impl ReleaseDelta {
    /// Deltas cover every category present in either release.
    pub fn between(a: &ReleaseAnalysis, b: &ReleaseAnalysis) -> Self {
        let mut by_category = BTreeMap::new();
        for cat in Category::ALL {
            let count_a = a.categories.get(&cat).map_or(0, |prs| prs.len()) as i64;
            let count_b = b.categories.get(&cat).map_or(0, |prs| prs.len()) as i64;
            if count_a > 0 || count_b > 0 {
                by_category.insert(cat, count_b - count_a);
            }
        }
        Self {
            total_prs: b.total_prs() as i64 - a.total_prs() as i64,
            by_category,
        }
    }
}
