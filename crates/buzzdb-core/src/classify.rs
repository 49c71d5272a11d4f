//! Classification taxonomy and priority derivation.

use serde::{Deserialize, Serialize};

/// Business category assigned by the classifier.
///
/// Spam is deliberately not a category: it is an orthogonal flag on the
/// judgment, and spam posts carry no category at all. Aggregation code must
/// never invent a fifth "Spam" bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Praise,
    Complaint,
    #[serde(rename = "Experience Breakage")]
    ExperienceBreakage,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Praise,
        Category::Complaint,
        Category::ExperienceBreakage,
        Category::FeatureRequest,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Praise => "Praise",
            Category::Complaint => "Complaint",
            Category::ExperienceBreakage => "Experience Breakage",
            Category::FeatureRequest => "Feature Request",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Praise" => Ok(Category::Praise),
            "Complaint" => Ok(Category::Complaint),
            "Experience Breakage" => Ok(Category::ExperienceBreakage),
            "Feature Request" => Ok(Category::FeatureRequest),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Derived triage priority, a pure function of the urgency and impact scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Derive a [`Priority`] from 1–10 urgency and impact scores.
///
/// The combined score is the mean of the two. A missing score on either
/// side yields `Medium` — an unscored post should neither sink to the
/// bottom of the queue nor jump it.
#[must_use]
pub fn priority_for(urgency: Option<i16>, impact: Option<i16>) -> Priority {
    let (Some(urgency), Some(impact)) = (urgency, impact) else {
        return Priority::Medium;
    };

    let combined = f64::from(urgency + impact) / 2.0;
    if combined >= 8.0 {
        Priority::Critical
    } else if combined >= 6.0 {
        Priority::High
    } else if combined >= 4.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}
