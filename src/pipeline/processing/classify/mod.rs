//! Tag-based point-of-interest categorization
//!
//! A node's tags are matched against an ordered table of category rules. The
//! first rule with a matching tag decides the category; when none match, a
//! short fallback chain keyed on the presence of broad tag keys applies, and
//! anything left over is `Other`.

pub mod rules;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoverageError;
use crate::types::Tags;

/// Closed set of categories a node can be assigned to.
///
/// Declaration order is the rule-table priority order followed by the
/// fallback categories, so sorting by `Category` keeps reports stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Drink")]
    FoodAndDrink,
    #[serde(rename = "Retail")]
    Retail,
    #[serde(rename = "Services")]
    Services,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Accommodation")]
    Accommodation,
    #[serde(rename = "Leisure & Recreation")]
    LeisureAndRecreation,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Financial")]
    Financial,
    #[serde(rename = "Natural & Parks")]
    NaturalAndParks,
    #[serde(rename = "Infrastructure")]
    Infrastructure,
    #[serde(rename = "Religious & Cultural")]
    ReligiousAndCultural,
    #[serde(rename = "Tourism & Recreation")]
    TourismAndRecreation,
    #[serde(rename = "Business Services")]
    BusinessServices,
    #[serde(rename = "Crafts & Trades")]
    CraftsAndTrades,
    #[serde(rename = "Industrial")]
    Industrial,
    #[serde(rename = "Buildings")]
    Buildings,
    #[serde(rename = "Historic")]
    Historic,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 19] = [
        Category::FoodAndDrink,
        Category::Retail,
        Category::Services,
        Category::Healthcare,
        Category::Transportation,
        Category::Accommodation,
        Category::LeisureAndRecreation,
        Category::Education,
        Category::Financial,
        Category::NaturalAndParks,
        Category::Infrastructure,
        Category::ReligiousAndCultural,
        Category::TourismAndRecreation,
        Category::BusinessServices,
        Category::CraftsAndTrades,
        Category::Industrial,
        Category::Buildings,
        Category::Historic,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodAndDrink => "Food & Drink",
            Category::Retail => "Retail",
            Category::Services => "Services",
            Category::Healthcare => "Healthcare",
            Category::Transportation => "Transportation",
            Category::Accommodation => "Accommodation",
            Category::LeisureAndRecreation => "Leisure & Recreation",
            Category::Education => "Education",
            Category::Financial => "Financial",
            Category::NaturalAndParks => "Natural & Parks",
            Category::Infrastructure => "Infrastructure",
            Category::ReligiousAndCultural => "Religious & Cultural",
            Category::TourismAndRecreation => "Tourism & Recreation",
            Category::BusinessServices => "Business Services",
            Category::CraftsAndTrades => "Crafts & Trades",
            Category::Industrial => "Industrial",
            Category::Buildings => "Buildings",
            Category::Historic => "Historic",
            Category::Other => "Other",
        }
    }

    /// Marker color used when plotting nodes of this category
    pub fn marker_color(&self) -> &'static str {
        match self {
            Category::FoodAndDrink => "green",
            Category::Retail => "blue",
            Category::Services => "purple",
            Category::Healthcare => "red",
            Category::Transportation => "orange",
            Category::Accommodation => "pink",
            Category::LeisureAndRecreation => "lightblue",
            Category::Education => "darkblue",
            Category::Financial => "cadetblue",
            Category::NaturalAndParks => "darkgreen",
            Category::Infrastructure => "gray",
            Category::ReligiousAndCultural => "darkpurple",
            Category::Other => "black",
            _ => "gray",
        }
    }

    /// Glyphicon name used when plotting nodes of this category
    pub fn marker_icon(&self) -> &'static str {
        match self {
            Category::FoodAndDrink => "cutlery",
            Category::Retail => "shopping-cart",
            Category::Services => "wrench",
            Category::Healthcare => "plus-sign",
            Category::Transportation => "road",
            Category::Accommodation => "home",
            Category::LeisureAndRecreation => "glass",
            Category::Education => "book",
            Category::Financial => "usd",
            Category::NaturalAndParks => "tree-conifer",
            Category::Infrastructure => "cog",
            Category::ReligiousAndCultural => "star",
            _ => "info-sign",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoverageError::InvalidInput(format!("unknown category '{}'", s)))
    }
}

/// Which values of a tag key a rule accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// Any value, as long as the key is present
    Any,
    OneOf(BTreeSet<String>),
}

impl TagMatch {
    pub fn one_of(values: &[&str]) -> Self {
        TagMatch::OneOf(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            TagMatch::Any => true,
            TagMatch::OneOf(values) => values.contains(value),
        }
    }
}

/// One category and the tag conditions that select it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub matchers: Vec<(String, TagMatch)>,
}

impl CategoryRule {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            matchers: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, matcher: TagMatch) -> Self {
        self.matchers.push((key.to_string(), matcher));
        self
    }

    pub fn matches(&self, tags: &Tags) -> bool {
        self.matchers
            .iter()
            .any(|(key, matcher)| tags.get(key).is_some_and(|value| matcher.accepts(value)))
    }
}

/// Ordered rule table plus fallback chain
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
    fallbacks: Vec<(String, Category)>,
}

static STANDARD: Lazy<Classifier> = Lazy::new(Classifier::new);

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Classifier with the built-in rule table
    pub fn new() -> Self {
        Self {
            rules: rules::standard_rules(),
            fallbacks: rules::standard_fallbacks(),
        }
    }

    pub fn with_rules(rules: Vec<CategoryRule>, fallbacks: Vec<(String, Category)>) -> Self {
        Self { rules, fallbacks }
    }

    /// Process-wide instance of the built-in classifier
    pub fn standard() -> &'static Classifier {
        &STANDARD
    }

    pub fn classify(&self, tags: &Tags) -> Category {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(tags)) {
            return rule.category;
        }

        self.fallbacks
            .iter()
            .find(|(key, _)| tags.contains_key(key))
            .map(|(_, category)| *category)
            .unwrap_or(Category::Other)
    }
}

/// Classify tags with the built-in rule table
pub fn classify(tags: &Tags) -> Category {
    Classifier::standard().classify(tags)
}
