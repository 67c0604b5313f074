//! Assigns every PR to exactly one category.
//!
//! Classification is an ordered rule table: labels are checked against each
//! vocabulary in priority order, then the title is scanned against the same
//! vocabularies when no label matched. First match wins; a new category is
//! a new row, not a new type.

use crate::models::{Category, CategoryMap, PRInfo};

/// Priority order for classification. Bug-fix labels outrank feature
/// labels so a PR tagged both lands in Bug Fixes.
const RULES: [(Category, &[&str]); 6] = [
    (Category::BugFixes, &["bug", "fix", "hotfix"]),
    (Category::Features, &["feature", "enhancement"]),
    (Category::Documentation, &["docs", "documentation"]),
    (Category::Refactoring, &["refactor", "cleanup", "style"]),
    (Category::Tests, &["test", "tests"]),
    (Category::Dependencies, &["dependencies", "deps", "bump"]),
];

/// Partitions `prs` over the fixed category set. Every category key is
/// present in the result, empty ones included, so downstream formatting
/// sees a stable set.
pub fn categorize(prs: &[PRInfo]) -> CategoryMap {
    let mut map = CategoryMap::new();
    for category in Category::ALL {
        map.insert(category, Vec::new());
    }

    for pr in prs {
        let category = classify(pr);
        map.get_mut(&category)
            .expect("all categories pre-inserted")
            .push(pr.clone());
    }

    map
}

fn classify(pr: &PRInfo) -> Category {
    let labels: Vec<String> = pr.labels.iter().map(|l| l.to_lowercase()).collect();
    for (category, vocabulary) in RULES {
        if labels
            .iter()
            .any(|label| vocabulary.iter().any(|word| label.contains(word)))
        {
            return category;
        }
    }

    let title = pr.title.to_lowercase();
    for (category, vocabulary) in RULES {
        if vocabulary.iter().any(|word| title.contains(word)) {
            return category;
        }
    }

    Category::Other
}
