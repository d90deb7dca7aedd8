//! The fixed five-category scoring rubric.

use crate::error::{PrepcallError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RubricCategory {
    #[serde(rename = "Communication Skills")]
    CommunicationSkills,
    #[serde(rename = "Technical Knowledge")]
    TechnicalKnowledge,
    #[serde(rename = "Problem-Solving")]
    ProblemSolving,
    #[serde(rename = "Cultural & Role Fit")]
    CulturalAndRoleFit,
    #[serde(rename = "Confidence & Clarity")]
    ConfidenceAndClarity,
}

impl RubricCategory {
    pub const ALL: [RubricCategory; 5] = [
        RubricCategory::CommunicationSkills,
        RubricCategory::TechnicalKnowledge,
        RubricCategory::ProblemSolving,
        RubricCategory::CulturalAndRoleFit,
        RubricCategory::ConfidenceAndClarity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RubricCategory::CommunicationSkills => "Communication Skills",
            RubricCategory::TechnicalKnowledge => "Technical Knowledge",
            RubricCategory::ProblemSolving => "Problem-Solving",
            RubricCategory::CulturalAndRoleFit => "Cultural & Role Fit",
            RubricCategory::ConfidenceAndClarity => "Confidence & Clarity",
        }
    }

    /// What the model is asked to look for.
    pub fn description(self) -> &'static str {
        match self {
            RubricCategory::CommunicationSkills => "Clarity, articulation, structured responses.",
            RubricCategory::TechnicalKnowledge => "Understanding of key concepts for the role.",
            RubricCategory::ProblemSolving => {
                "Ability to analyze problems and propose solutions."
            }
            RubricCategory::CulturalAndRoleFit => "Alignment with company values and job role.",
            RubricCategory::ConfidenceAndClarity => {
                "Confidence in responses, engagement, and clarity."
            }
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for RubricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Check that a score is a finite number in `[0, 100]`.
pub fn check_score(what: &str, score: f64) -> Result<()> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(PrepcallError::FeedbackSchema {
            message: format!("{} score {} is outside 0-100", what, score),
        })
    }
}

/// One score per rubric category, no more and no fewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawCategoryScores",
    into = "BTreeMap<RubricCategory, f64>"
)]
pub struct CategoryScores(BTreeMap<RubricCategory, f64>);

impl CategoryScores {
    pub fn new(scores: BTreeMap<RubricCategory, f64>) -> Result<Self> {
        let scores = Self(scores);
        scores.check()?;
        Ok(scores)
    }

    pub fn check(&self) -> Result<()> {
        if let Some(missing) = RubricCategory::ALL
            .iter()
            .find(|c| !self.0.contains_key(c))
        {
            return Err(PrepcallError::FeedbackSchema {
                message: format!("missing category '{}'", missing),
            });
        }
        for (category, score) in &self.0 {
            check_score(category.label(), *score)?;
        }
        Ok(())
    }

    pub fn get(&self, category: RubricCategory) -> f64 {
        self.0.get(&category).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RubricCategory, f64)> + '_ {
        self.0.iter().map(|(c, s)| (*c, *s))
    }

    pub fn mean(&self) -> f64 {
        self.0.values().sum::<f64>() / self.0.len().max(1) as f64
    }
}

impl From<CategoryScores> for BTreeMap<RubricCategory, f64> {
    fn from(scores: CategoryScores) -> Self {
        scores.0
    }
}

/// Wire forms accepted for category scores: a label-to-score map, or the
/// list of `{name, score, comment}` objects some models return.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCategoryScores {
    Map(BTreeMap<String, f64>),
    List(Vec<RawCategory>),
}

#[derive(Deserialize)]
struct RawCategory {
    name: String,
    score: f64,
}

impl TryFrom<RawCategoryScores> for CategoryScores {
    type Error = PrepcallError;

    fn try_from(raw: RawCategoryScores) -> Result<Self> {
        let pairs: Vec<(String, f64)> = match raw {
            RawCategoryScores::Map(map) => map.into_iter().collect(),
            RawCategoryScores::List(list) => list.into_iter().map(|c| (c.name, c.score)).collect(),
        };

        let mut scores = BTreeMap::new();
        for (name, score) in pairs {
            let category =
                RubricCategory::from_label(&name).ok_or_else(|| PrepcallError::FeedbackSchema {
                    message: format!("unknown category '{}'", name),
                })?;
            if scores.insert(category, score).is_some() {
                return Err(PrepcallError::FeedbackSchema {
                    message: format!("category '{}' scored twice", category),
                });
            }
        }
        CategoryScores::new(scores)
    }
}
