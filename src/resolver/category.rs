//! Work item categories
//!
//! A category abstracts over a work item's purpose independently of the
//! concrete type name a project's process template uses for it. The set is
//! closed, so an unknown category is impossible past the parsing boundary;
//! the concrete type names themselves stay open strings because they are
//! project-defined.

use std::fmt;
use std::str::FromStr;

use crate::error::DevOpsError;

// == Category ==
/// Abstract work item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Requirement-level backlog entry (PBI, User Story, Issue, ...)
    BacklogItem,
    /// Defect
    Bug,
    /// Unit of work
    Task,
    /// Feature
    Feature,
    /// Epic
    Epic,
    /// Test case
    TestCase,
}

impl Category {
    /// Every category, for iteration.
    pub const ALL: [Category; 6] = [
        Category::BacklogItem,
        Category::Bug,
        Category::Task,
        Category::Feature,
        Category::Epic,
        Category::TestCase,
    ];

    /// The string form used in CLI arguments and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BacklogItem => "backlog_item",
            Category::Bug => "bug",
            Category::Task => "task",
            Category::Feature => "feature",
            Category::Epic => "epic",
            Category::TestCase => "test_case",
        }
    }

    // == Candidate Table ==
    /// Concrete type name candidates for this category, ordered by
    /// preference. Earlier entries are the more specific template
    /// conventions (Scrum before Agile before Basic before CMMI).
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Category::BacklogItem => &[
                "Product Backlog Item", // Scrum
                "User Story",           // Agile
                "Issue",                // Basic
                "Requirement",          // CMMI
            ],
            Category::Bug => &["Bug", "Defect"],
            Category::Task => &["Task"],
            Category::Feature => &["Feature"],
            Category::Epic => &["Epic"],
            Category::TestCase => &["Test Case"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = DevOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "backlog_item" => Ok(Category::BacklogItem),
            "bug" => Ok(Category::Bug),
            "task" => Ok(Category::Task),
            "feature" => Ok(Category::Feature),
            "epic" => Ok(Category::Epic),
            "test_case" => Ok(Category::TestCase),
            other => Err(DevOpsError::InvalidArgument(format!(
                "unknown category '{}'. Known categories: {}",
                other,
                Category::ALL
                    .iter()
                    .map(Category::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_item_preference_order() {
        let candidates = Category::BacklogItem.candidates();
        assert_eq!(
            candidates,
            &["Product Backlog Item", "User Story", "Issue", "Requirement"]
        );
    }

    #[test]
    fn test_every_category_has_candidates() {
        for category in Category::ALL {
            assert!(
                !category.candidates().is_empty(),
                "category {} has no candidates",
                category
            );
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_from_str_accepts_dashes_and_case() {
        let parsed: Category = "Backlog-Item".parse().unwrap();
        assert_eq!(parsed, Category::BacklogItem);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "story".parse::<Category>().unwrap_err();
        assert!(matches!(err, DevOpsError::InvalidArgument(_)));
        assert!(err.to_string().contains("backlog_item"));
    }
}
