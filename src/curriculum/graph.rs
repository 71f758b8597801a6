//! Curriculum graph and prerequisite resolution
//!
//! Topics are stored in load order and indexed by id. Prerequisite edges
//! point from a topic to the topics it requires. The source curriculum is
//! expected to be acyclic, but every traversal here carries its own visited
//! set so a malformed cyclic graph still terminates in O(topics).

use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::catalog::SkillCatalog;
use super::Topic;

/// Structural problem found while validating a curriculum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    /// A topic names a prerequisite that is not in the curriculum
    DanglingPrerequisite { topic: String, missing: String },
    /// A prerequisite cycle, listed in traversal order
    Cycle { path: Vec<String> },
}

impl std::fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphIssue::DanglingPrerequisite { topic, missing } => {
                write!(f, "topic '{}' requires unknown topic '{}'", topic, missing)
            }
            GraphIssue::Cycle { path } => write!(f, "prerequisite cycle: {}", path.join(" -> ")),
        }
    }
}

/// Read-only curriculum shared across all learners
#[derive(Debug, Clone, Default)]
pub struct CurriculumGraph {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
    catalog: SkillCatalog,
}

impl CurriculumGraph {
    /// Build a graph from topics. Later duplicates of an id are ignored.
    pub fn new(topics: Vec<Topic>) -> Self {
        let mut graph = Self::default();
        for topic in topics {
            if graph.index.contains_key(&topic.id) {
                warn!("Duplicate topic id '{}' ignored", topic.id);
                continue;
            }
            for skill in &topic.required_skills {
                graph.catalog.register(skill.clone());
            }
            graph.index.insert(topic.id.clone(), graph.topics.len());
            graph.topics.push(topic);
        }

        for issue in graph.validate() {
            warn!("Curriculum issue: {}", issue);
        }

        graph
    }

    pub fn get(&self, topic_id: &str) -> Option<&Topic> {
        self.index.get(topic_id).map(|&i| &self.topics[i])
    }

    /// Topics in load order
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Full transitive prerequisite closure of a topic.
    ///
    /// Depth-first, preorder, deduplicated. The starting topic is never part
    /// of its own closure, even when a cycle leads back to it. Prerequisite
    /// ids with no matching topic are reported but not expanded.
    pub fn get_all_prerequisites(&self, topic_id: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut closure = Vec::new();
        visited.insert(topic_id);

        let mut stack: Vec<&str> = match self.get(topic_id) {
            Some(topic) => topic.prerequisites.iter().rev().map(String::as_str).collect(),
            None => return closure,
        };

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            closure.push(current.to_string());

            if let Some(topic) = self.get(current) {
                stack.extend(
                    topic.prerequisites.iter()
                        .rev()
                        .map(String::as_str)
                        .filter(|id| !visited.contains(id)),
                );
            }
        }

        closure
    }

    /// Prerequisite closure plus the topic itself, ordered so every topic
    /// comes after the topics it requires (postorder). Only known topics
    /// are returned. Back edges of a cycle are ignored.
    pub fn learning_order(&self, topic_id: &str) -> Vec<String> {
        let mut order = Vec::new();
        if self.get(topic_id).is_none() {
            return order;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        // (topic, expanded)
        let mut stack: Vec<(&str, bool)> = vec![(topic_id, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current.to_string());
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            let Some(topic) = self.get(current) else {
                continue;
            };
            stack.push((current, true));
            stack.extend(
                topic.prerequisites.iter()
                    .rev()
                    .map(String::as_str)
                    .filter(|id| !visited.contains(id))
                    .map(|id| (id, false)),
            );
        }

        order
    }

    /// Number of topics that list `topic_id` as a direct prerequisite
    pub fn dependent_count(&self, topic_id: &str) -> usize {
        self.topics.iter()
            .filter(|t| t.prerequisites.iter().any(|p| p == topic_id))
            .count()
    }

    /// Topics with no prerequisites
    pub fn foundational(&self) -> Vec<&Topic> {
        self.topics.iter().filter(|t| t.prerequisites.is_empty()).collect()
    }

    /// Report dangling prerequisites and cycles without failing
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();

        for topic in &self.topics {
            for prereq in &topic.prerequisites {
                if !self.index.contains_key(prereq) {
                    issues.push(GraphIssue::DanglingPrerequisite {
                        topic: topic.id.clone(),
                        missing: prereq.clone(),
                    });
                }
            }
        }

        issues.extend(self.find_cycles());
        issues
    }

    /// Iterative three-colour DFS; each back edge yields one cycle
    fn find_cycles(&self) -> Vec<GraphIssue> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.topics.len()];
        let mut cycles = Vec::new();

        for root in 0..self.topics.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }

            // (topic index, next prerequisite position)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::InProgress;

            while let Some(top) = stack.last_mut() {
                let (node, position) = *top;
                let prereqs = &self.topics[node].prerequisites;
                if position >= prereqs.len() {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                }

                top.1 += 1;
                let prereq = &prereqs[position];

                let Some(&child) = self.index.get(prereq) else {
                    continue;
                };

                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        let start = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut path: Vec<String> = stack[start..].iter()
                            .map(|&(n, _)| self.topics[n].id.clone())
                            .collect();
                        path.push(self.topics[child].id.clone());
                        cycles.push(GraphIssue::Cycle { path });
                    }
                    Mark::Done => {}
                }
            }
        }

        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn topic(id: &str, prereqs: &[&str]) -> Topic {
        Topic::new(id, id, Difficulty::default(), 30)
            .with_prerequisites(prereqs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_closure_is_preorder_and_deduplicated() {
        let graph = CurriculumGraph::new(vec![
            topic("a", &[]),
            topic("b", &["a"]),
            topic("c", &["a"]),
            topic("d", &["b", "c"]),
        ]);

        assert_eq!(graph.get_all_prerequisites("d"), vec!["b", "a", "c"]);
        assert!(graph.get_all_prerequisites("a").is_empty());
        assert!(graph.get_all_prerequisites("missing").is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = CurriculumGraph::new(vec![topic("a", &["b"]), topic("b", &["a"])]);

        assert_eq!(graph.get_all_prerequisites("a"), vec!["b"]);
        assert_eq!(graph.get_all_prerequisites("b"), vec!["a"]);

        let issues = graph.validate();
        assert!(issues.iter().any(|i| matches!(i, GraphIssue::Cycle { .. })));
    }

    #[test]
    fn test_dangling_prerequisite_is_reported_not_expanded() {
        let graph = CurriculumGraph::new(vec![topic("a", &["ghost"])]);
        assert_eq!(graph.get_all_prerequisites("a"), vec!["ghost"]);
        assert_eq!(
            graph.validate(),
            vec![GraphIssue::DanglingPrerequisite { topic: "a".into(), missing: "ghost".into() }]
        );
    }

    #[test]
    fn test_learning_order_puts_prerequisites_first() {
        let graph = CurriculumGraph::new(vec![
            topic("a", &[]),
            topic("b", &["a"]),
            topic("c", &["a"]),
            topic("d", &["b", "c"]),
        ]);
        assert_eq!(graph.learning_order("d"), vec!["a", "b", "c", "d"]);
        assert_eq!(graph.learning_order("a"), vec!["a"]);
        assert!(graph.learning_order("missing").is_empty());

        let cyclic = CurriculumGraph::new(vec![topic("x", &["y"]), topic("y", &["x"])]);
        assert_eq!(cyclic.learning_order("x"), vec!["y", "x"]);
    }

    #[test]
    fn test_dependent_count() {
        let graph = CurriculumGraph::new(vec![
            topic("a", &[]),
            topic("b", &["a"]),
            topic("c", &["a"]),
        ]);
        assert_eq!(graph.dependent_count("a"), 2);
        assert_eq!(graph.dependent_count("b"), 0);
        assert_eq!(graph.foundational().len(), 1);
    }
}
