//! PR title classification.
//!
//! Titles are expected to start with an emoji (or its GitHub shortcode)
//! naming the kind of change. [`classify`] finds that prefix and strips it;
//! [`verify_pr_title`] is the verification plugin built on top of it.

use crate::event::PullRequest;
use crate::verify::{HelpfulError, VerifyError};

/// Where the title conventions are documented.
pub const VERSIONING_DOC_URL: &str = "https://sigs.k8s.io/kubebuilder-release-tools/VERSIONING.md";

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Kind of change a pull request declares in its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrType {
    Uncategorized,
    Breaking,
    Feature,
    Bugfix,
    Docs,
    Infra,
}

impl PrType {
    /// Every recognised category, in the order they are documented.
    pub const CATEGORIES: [PrType; 5] = [
        PrType::Breaking,
        PrType::Feature,
        PrType::Bugfix,
        PrType::Docs,
        PrType::Infra,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            PrType::Uncategorized => "",
            PrType::Breaking => "⚠",
            PrType::Feature => "✨",
            PrType::Bugfix => "🐛",
            PrType::Docs => "📖",
            PrType::Infra => "🌱",
        }
    }

    pub fn shortcode(&self) -> &'static str {
        match self {
            PrType::Uncategorized => "",
            PrType::Breaking => ":warning:",
            PrType::Feature => ":sparkles:",
            PrType::Bugfix => ":bug:",
            PrType::Docs => ":book:",
            PrType::Infra => ":seedling:",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrType::Uncategorized => "uncategorized",
            PrType::Breaking => "breaking",
            PrType::Feature => "feature",
            PrType::Bugfix => "bugfix",
            PrType::Docs => "docs",
            PrType::Infra => "infra",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            PrType::Uncategorized => "Uncategorized",
            PrType::Breaking => "Breaking change",
            PrType::Feature => "Non-breaking feature",
            PrType::Bugfix => "Patch fix",
            PrType::Docs => "Docs",
            PrType::Infra => "Infra/Tests/Other",
        }
    }

    /// Prefixes that mark a title as this type. Legacy spellings included.
    fn prefixes(&self) -> &'static [&'static str] {
        match self {
            PrType::Uncategorized => &[],
            PrType::Breaking => &["⚠", ":warning:"],
            PrType::Feature => &["✨", ":sparkles:"],
            PrType::Bugfix => &["🐛", ":bug:"],
            PrType::Docs => &["📖", ":book:"],
            PrType::Infra => &["🌱", ":seedling:", "🏃", ":running:"],
        }
    }
}

impl std::fmt::Display for PrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `title`, returning its type and the title without the prefix.
///
/// Titles without a recognised prefix come back as
/// [`PrType::Uncategorized`] with the trimmed title unchanged.
pub fn classify(title: &str) -> (PrType, String) {
    let title = title.trim();

    for pr_type in PrType::CATEGORIES {
        for prefix in pr_type.prefixes() {
            if let Some(rest) = title.strip_prefix(prefix) {
                let rest = rest.trim_start_matches(VARIATION_SELECTOR);
                return (pr_type, rest.trim().to_string());
            }
        }
    }

    (PrType::Uncategorized, title.to_string())
}

/// Title lacks a recognised type prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleTypeError {
    pub title: String,
}

impl std::fmt::Display for TitleTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no matching PR type indicator found in title")
    }
}

impl std::error::Error for TitleTypeError {}

impl HelpfulError for TitleTypeError {
    fn help(&self) -> String {
        let prefixes: Vec<String> = PrType::CATEGORIES
            .iter()
            .map(|t| format!("- {}: {} (`{}`)", t.description(), t.emoji(), t.shortcode()))
            .collect();

        format!(
            "I saw a title of `{}`, which doesn't seem to have any of the acceptable prefixes.\n\
             \n\
             You need to have one of these as the prefix of your PR title:\n\
             \n\
             {}\n\
             \n\
             More details can be found at [sigs.k8s.io/kubebuilder-release-tools/VERSIONING.md]({}).",
            self.title,
            prefixes.join("\n"),
            VERSIONING_DOC_URL
        )
    }
}

/// Verification plugin: the title must declare its change type.
pub fn verify_pr_title(pr: &PullRequest) -> Result<String, VerifyError> {
    let (pr_type, final_title) = classify(&pr.title);
    if pr_type == PrType::Uncategorized {
        return Err(TitleTypeError {
            title: pr.title.clone(),
        }
        .into());
    }

    Ok(format!(
        "Found {} PR ({}) with final title:\n\n\t{}\n",
        pr_type.emoji(),
        pr_type,
        final_title
    ))
}
