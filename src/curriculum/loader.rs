//! Curriculum loading
//!
//! Curricula are plain TOML or JSON documents with a `topics` array.
//! When no file is configured the built-in sample curriculum is used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::catalog::SkillId;
use super::graph::CurriculumGraph;
use super::Topic;
use crate::config::CurriculumConfig;
use crate::error::TutorError;
use crate::types::Difficulty;

/// On-disk curriculum document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// Load a curriculum file, choosing the format by extension
pub fn load_from_path(path: &Path) -> Result<CurriculumGraph> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curriculum file {}", path.display()))?;

    let file: CurriculumFile = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| TutorError::Curriculum(e.to_string()))?,
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| TutorError::Curriculum(e.to_string()))?,
        other => {
            return Err(TutorError::Curriculum(format!(
                "unsupported curriculum format {:?} (expected .toml or .json)",
                other
            ))
            .into())
        }
    };

    info!(
        "Loaded curriculum '{}' with {} topics from {}",
        file.name.as_deref().unwrap_or("unnamed"),
        file.topics.len(),
        path.display()
    );

    Ok(CurriculumGraph::new(file.topics))
}

/// Load the configured curriculum, falling back to the built-in sample
pub fn load_curriculum(config: &CurriculumConfig) -> Result<CurriculumGraph> {
    match &config.path {
        Some(path) => load_from_path(path),
        None => Ok(sample_curriculum()),
    }
}

fn skills(ids: &[&str]) -> Vec<SkillId> {
    ids.iter().filter_map(|id| SkillId::parse(id).ok()).collect()
}

fn objectives(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn level(n: u8) -> Difficulty {
    Difficulty::saturating(n as i64)
}

/// Small biology/mathematics curriculum used when nothing is configured
pub fn sample_curriculum() -> CurriculumGraph {
    let topics = vec![
        Topic::new("cell_biology", "Cell Biology", level(2), 45)
            .with_skills(skills(&["biology.cell_structure", "biology.organelles", "biology.cell_function"]))
            .with_domain("biology")
            .with_description("structure and function of cells and their organelles")
            .with_objectives(objectives(&[
                "Identify the main organelles",
                "Explain how cells produce energy",
            ])),
        Topic::new("basic_probability", "Basic Probability", level(2), 40)
            .with_skills(skills(&["logic.probability", "math.fractions"]))
            .with_domain("mathematics")
            .with_description("likelihood of events, sample spaces and simple outcomes")
            .with_objectives(objectives(&["Compute simple event probabilities"])),
        Topic::new("genetics", "Genetics", level(4), 60)
            .with_prerequisites(vec!["cell_biology".to_string()])
            .with_skills(skills(&["biology.genetics", "biology.inheritance", "logic.probability"]))
            .with_domain("biology")
            .with_description("inheritance of traits through genes and probability of offspring outcomes")
            .with_objectives(objectives(&[
                "Explain dominant and recessive alleles",
                "Solve Punnett square problems",
            ])),
        Topic::new("evolution", "Evolution", level(4), 55)
            .with_prerequisites(vec!["genetics".to_string()])
            .with_skills(skills(&["biology.evolution", "biology.inheritance"]))
            .with_domain("biology")
            .with_description("natural selection and change in populations over generations")
            .with_objectives(objectives(&["Describe natural selection"])),
        Topic::new("ecology", "Ecology", level(3), 50)
            .with_prerequisites(vec!["cell_biology".to_string()])
            .with_skills(skills(&["biology.ecosystems", "biology.populations"]))
            .with_domain("biology")
            .with_description("interactions between organisms and their environment")
            .with_objectives(objectives(&["Model a food web"])),
        Topic::new("statistics", "Introductory Statistics", level(3), 50)
            .with_prerequisites(vec!["basic_probability".to_string()])
            .with_skills(skills(&["math.statistics", "logic.probability"]))
            .with_domain("mathematics")
            .with_description("summarizing data with distributions, mean and variance")
            .with_objectives(objectives(&["Compute mean and variance", "Read a histogram"])),
        Topic::new("population_genetics", "Population Genetics", level(5), 75)
            .with_prerequisites(vec!["evolution".to_string(), "statistics".to_string()])
            .with_skills(skills(&["biology.populations", "biology.genetics", "math.statistics"]))
            .with_domain("biology")
            .with_description("allele frequencies in populations and Hardy-Weinberg equilibrium")
            .with_objectives(objectives(&["Apply the Hardy-Weinberg principle"])),
    ];

    CurriculumGraph::new(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sample_curriculum_is_valid() {
        let graph = sample_curriculum();
        assert_eq!(graph.len(), 7);
        assert!(graph.validate().is_empty());
        assert!(graph.catalog().contains("biology.genetics"));
        assert_eq!(
            graph.get_all_prerequisites("population_genetics"),
            vec!["evolution", "genetics", "cell_biology", "statistics", "basic_probability"]
        );
    }

    #[test]
    fn test_load_toml_curriculum() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
name = "tiny"

[[topics]]
id = "intro"
name = "Intro"
difficulty = 1
estimated_minutes = 20
required_skills = ["general.basics"]

[[topics]]
id = "next"
name = "Next"
difficulty = 2
estimated_minutes = 30
prerequisites = ["intro"]
"#
        )
        .unwrap();

        let graph = load_from_path(file.path()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get_all_prerequisites("next"), vec!["intro"]);
        assert_eq!(graph.get("intro").unwrap().domain(), "general");
    }

    #[test]
    fn test_load_rejects_bad_difficulty() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"topics": [{{"id": "x", "name": "X", "difficulty": 9, "estimated_minutes": 10}}]}}"#
        )
        .unwrap();

        assert!(load_from_path(file.path()).is_err());
    }
}
