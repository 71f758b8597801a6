//! Ad-hoc query parsing and concept scoring

use serde::{Deserialize, Serialize};

use super::knowledge_base::KnowledgeBase;

const NAME_WEIGHT: u32 = 3;
const DEFINITION_WEIGHT: u32 = 2;
const DOMAIN_WEIGHT: u32 = 1;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "what", "which", "how", "should", "does", "can", "with",
    "about", "into", "from", "that", "this", "have", "need", "before", "after", "next",
    "study", "learn", "topic", "topics", "is", "to", "of", "a", "an", "do", "i", "my", "me",
];

/// Broad intent of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Prerequisite,
    Difficulty,
    Relationship,
    Recommendation,
    General,
}

impl QuestionType {
    /// Rule whose inferences best answer this kind of question
    pub fn preferred_rule(self) -> Option<&'static str> {
        match self {
            QuestionType::Prerequisite => Some("prerequisite_inference"),
            QuestionType::Difficulty => Some("difficulty_progression"),
            QuestionType::Relationship => Some("concept_relationships"),
            QuestionType::Recommendation => Some("path_optimization"),
            QuestionType::General => None,
        }
    }
}

/// A tokenized, classified query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub raw: String,
    pub keywords: Vec<String>,
    pub question_type: QuestionType,
}

impl ParsedQuery {
    pub fn parse(query: &str) -> Self {
        let lower = query.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .collect();

        let keywords = words.iter()
            .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
            .map(|w| w.to_string())
            .collect();

        Self {
            raw: query.to_string(),
            keywords,
            question_type: classify(&lower),
        }
    }
}

/// First matching intent wins; order reflects specificity
pub fn classify(lower: &str) -> QuestionType {
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["prerequisite", "before", "require", "depend", "need to know"]) {
        QuestionType::Prerequisite
    } else if has(&["difficult", "hard", "easy", "ready", "level"]) {
        QuestionType::Difficulty
    } else if has(&["related", "relationship", "connect", "similar", "link"]) {
        QuestionType::Relationship
    } else if has(&["next", "recommend", "should i", "order", "path", "plan"]) {
        QuestionType::Recommendation
    } else {
        QuestionType::General
    }
}

/// Score every concept by keyword overlap (name 3, definition 2, domain 1).
/// Concepts scoring zero are omitted; ties keep base order.
pub fn score_concepts(query: &ParsedQuery, kb: &KnowledgeBase) -> Vec<(String, u32)> {
    let mut scored: Vec<(String, u32)> = kb.concepts().iter()
        .map(|concept| {
            let name = concept.name.to_lowercase();
            let id = concept.id.to_lowercase();
            let definition = concept.definition.to_lowercase();
            let domain = concept.domain.to_lowercase();

            let score = query.keywords.iter()
                .map(|k| {
                    let mut s = 0;
                    if name.contains(k.as_str()) || id.contains(k.as_str()) {
                        s += NAME_WEIGHT;
                    }
                    if definition.contains(k.as_str()) {
                        s += DEFINITION_WEIGHT;
                    }
                    if domain.contains(k.as_str()) {
                        s += DOMAIN_WEIGHT;
                    }
                    s
                })
                .sum();

            (concept.id.clone(), score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("what do i need before genetics?"), QuestionType::Prerequisite);
        assert_eq!(classify("is evolution too hard for me"), QuestionType::Difficulty);
        assert_eq!(classify("how is ecology related to evolution"), QuestionType::Relationship);
        assert_eq!(classify("what should i study next"), QuestionType::Recommendation);
        assert_eq!(classify("tell me about cells"), QuestionType::General);
    }

    #[test]
    fn test_parse_drops_stopwords() {
        let parsed = ParsedQuery::parse("What are the prerequisites for Genetics?");
        assert_eq!(parsed.keywords, vec!["prerequisites", "genetics"]);
        assert_eq!(parsed.question_type, QuestionType::Prerequisite);
    }
}
