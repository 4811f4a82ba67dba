//! Lead Scoring
//!
//! Additive heuristic over a small set of positive signals per visitor
//! category. Weights, keyword lists, and temperature thresholds come from
//! [`ScoringConfig`]; the defaults are:
//!
//! | category    | signal                                   | points |
//! |-------------|------------------------------------------|--------|
//! | parent      | grade in core band (3-8)                 | 20     |
//! | parent      | interest mentions coding/robotics/stem   | 15     |
//! | parent      | phone supplied                           | 20     |
//! | institution | decision-maker role                      | 30     |
//! | institution | more than 1000 students                  | 25     |
//! | institution | integrated program format                | 20     |
//!
//! The same per-field evaluation drives the running score during the
//! conversation and the final score at completion, so the two always agree.

use serde::{Deserialize, Serialize};

use enrollment_agent_config::ScoringConfig;
use enrollment_agent_core::{FieldKey, Fields, Temperature, VisitorCategory};

use crate::validation::{first_integer, leading_integer, normalize};

/// Outcome of one scored field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalScore {
    pub field: FieldKey,
    /// Points earned (0 or the full weight)
    pub points: u32,
    /// Points available for this field
    pub weight: u32,
}

/// Final score for a completed or partial set of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    pub total: u32,
    /// Sum of the weights of the scored fields present
    pub max: u32,
    pub temperature: Temperature,
    pub breakdown: Vec<SignalScore>,
}

/// Scores collected fields for a visitor category
#[derive(Debug, Clone, Default)]
pub struct LeadScorer {
    config: ScoringConfig,
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Fields that carry a signal for the category, in path order
    pub fn scored_fields(category: VisitorCategory) -> &'static [FieldKey] {
        match category {
            VisitorCategory::Parent => &[FieldKey::Grade, FieldKey::Interest, FieldKey::Phone],
            VisitorCategory::Institution => {
                &[FieldKey::Role, FieldKey::Strength, FieldKey::ProgramFormat]
            }
            VisitorCategory::Unknown => &[],
        }
    }

    /// Evaluate a single field; None when the field carries no signal for the category
    pub fn signal(
        &self,
        category: VisitorCategory,
        field: FieldKey,
        value: &str,
    ) -> Option<SignalScore> {
        let (hit, weight) = match (category, field) {
            (VisitorCategory::Parent, FieldKey::Grade) => {
                let parent = &self.config.parent;
                let hit = first_integer(&normalize(value))
                    .is_some_and(|grade| parent.grade_band.contains(grade));
                (hit, parent.grade_weight)
            }
            (VisitorCategory::Parent, FieldKey::Interest) => {
                let parent = &self.config.parent;
                (
                    contains_any(value, &parent.interest_keywords),
                    parent.interest_weight,
                )
            }
            (VisitorCategory::Parent, FieldKey::Phone) => {
                (!value.trim().is_empty(), self.config.parent.phone_weight)
            }
            (VisitorCategory::Institution, FieldKey::Role) => {
                let institution = &self.config.institution;
                (
                    contains_any(value, &institution.role_keywords),
                    institution.role_weight,
                )
            }
            (VisitorCategory::Institution, FieldKey::Strength) => {
                let institution = &self.config.institution;
                let hit = leading_integer(value)
                    .is_some_and(|count| count > u64::from(institution.strength_threshold));
                (hit, institution.strength_weight)
            }
            (VisitorCategory::Institution, FieldKey::ProgramFormat) => {
                let institution = &self.config.institution;
                (
                    contains_any(value, &institution.program_format_keywords),
                    institution.program_format_weight,
                )
            }
            _ => return None,
        };

        Some(SignalScore {
            field,
            points: if hit { weight } else { 0 },
            weight,
        })
    }

    /// Score every scored field present in `fields`
    pub fn score(&self, category: VisitorCategory, fields: &Fields) -> LeadScore {
        let breakdown: Vec<SignalScore> = Self::scored_fields(category)
            .iter()
            .filter_map(|field| {
                let value = fields.get(field)?;
                self.signal(category, *field, value)
            })
            .collect();

        let total = breakdown.iter().map(|s| s.points).sum();
        let max = breakdown.iter().map(|s| s.weight).sum();

        LeadScore {
            total,
            max,
            temperature: self.classify(total),
            breakdown,
        }
    }

    /// Temperature for a score; HOT is inclusive of the hot threshold
    pub fn classify(&self, score: u32) -> Temperature {
        let thresholds = &self.config.thresholds;
        if score >= thresholds.hot {
            Temperature::Hot
        } else if score >= thresholds.warm {
            Temperature::Warm
        } else {
            Temperature::Cold
        }
    }
}

fn contains_any(value: &str, keywords: &[String]) -> bool {
    let lower = value.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: &[(FieldKey, &str)]) -> Fields {
        entries
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect()
    }

    #[test]
    fn test_classify_thresholds() {
        let scorer = LeadScorer::default();
        assert_eq!(scorer.classify(0), Temperature::Cold);
        assert_eq!(scorer.classify(29), Temperature::Cold);
        assert_eq!(scorer.classify(30), Temperature::Warm);
        assert_eq!(scorer.classify(59), Temperature::Warm);
        assert_eq!(scorer.classify(60), Temperature::Hot);
        assert_eq!(scorer.classify(75), Temperature::Hot);
    }

    #[test]
    fn test_parent_full_score() {
        let scorer = LeadScorer::default();
        let score = scorer.score(
            VisitorCategory::Parent,
            &fields(&[
                (FieldKey::Name, "Asha"),
                (FieldKey::Grade, "5"),
                (FieldKey::Interest, "Coding"),
                (FieldKey::City, "Pune"),
                (FieldKey::Email, "a@b.com"),
                (FieldKey::Phone, "9876543210"),
            ]),
        );
        assert_eq!(score.total, 55);
        assert_eq!(score.max, 55);
        assert_eq!(score.temperature, Temperature::Warm);
        assert_eq!(score.breakdown.len(), 3);
    }

    #[test]
    fn test_parent_grade_band() {
        let scorer = LeadScorer::default();
        let grade = |value: &str| {
            scorer
                .signal(VisitorCategory::Parent, FieldKey::Grade, value)
                .map(|s| s.points)
        };
        assert_eq!(grade("Grades 3\u{2013}5"), Some(20));
        assert_eq!(grade("Grade 8"), Some(20));
        assert_eq!(grade("Grades 1\u{2013}2"), Some(0));
        assert_eq!(grade("Grades 9\u{2013}10"), Some(0));
    }

    #[test]
    fn test_institution_signals() {
        let scorer = LeadScorer::default();
        let score = scorer.score(
            VisitorCategory::Institution,
            &fields(&[
                (FieldKey::Role, "Principal"),
                (FieldKey::Strength, "1,200"),
                (FieldKey::Curriculum, "CBSE"),
                (FieldKey::ProgramFormat, "Integrated curriculum"),
            ]),
        );
        assert_eq!(score.total, 75);
        assert_eq!(score.temperature, Temperature::Hot);
    }

    #[test]
    fn test_strength_threshold_is_exclusive() {
        let scorer = LeadScorer::default();
        let at = scorer
            .signal(VisitorCategory::Institution, FieldKey::Strength, "1000")
            .unwrap();
        let above = scorer
            .signal(VisitorCategory::Institution, FieldKey::Strength, "1001")
            .unwrap();
        assert_eq!(at.points, 0);
        assert_eq!(above.points, 25);
    }

    #[test]
    fn test_unscored_fields_have_no_signal() {
        let scorer = LeadScorer::default();
        assert!(scorer
            .signal(VisitorCategory::Parent, FieldKey::City, "Pune")
            .is_none());
        assert!(scorer
            .signal(VisitorCategory::Institution, FieldKey::Phone, "9876543210")
            .is_none());
        assert!(scorer
            .signal(VisitorCategory::Unknown, FieldKey::Grade, "5")
            .is_none());
    }

    #[test]
    fn test_partial_fields_bound_max() {
        let scorer = LeadScorer::default();
        let score = scorer.score(
            VisitorCategory::Parent,
            &fields(&[(FieldKey::Grade, "5")]),
        );
        assert_eq!(score.total, 20);
        assert_eq!(score.max, 20);
    }

    #[test]
    fn test_score_is_idempotent() {
        let scorer = LeadScorer::default();
        let input = fields(&[(FieldKey::Role, "Teacher"), (FieldKey::Strength, "50")]);
        assert_eq!(
            scorer.score(VisitorCategory::Institution, &input),
            scorer.score(VisitorCategory::Institution, &input)
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let mut config = ScoringConfig::default();
        config.thresholds.hot = 50;
        let scorer = LeadScorer::new(config);
        assert_eq!(scorer.classify(55), Temperature::Hot);
    }
}
