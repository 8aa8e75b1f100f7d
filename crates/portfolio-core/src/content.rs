//! Static portfolio content.
//!
//! The record is read-only once loaded. Every section of the UI renders from it,
//! and the chat controller serializes it into the system preamble.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_CONTENT: &str = include_str!("../data/portfolio.json");

static BUILTIN: OnceLock<ContentRecord> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub personal: PersonalInfo,
    pub about: About,
    pub skills: Vec<Skill>,
    pub projects: Vec<ProjectCategory>,
    pub experience: Vec<Experience>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub role: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub social: SocialLinks,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub facebook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct About {
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCategory {
    pub category: String,
    pub items: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub tools: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub description: String,
}

impl ContentRecord {
    /// The content compiled into the binary, parsed on first access.
    pub fn builtin() -> &'static ContentRecord {
        BUILTIN.get_or_init(|| {
            serde_json::from_str(BUILTIN_CONTENT).expect("embedded portfolio.json must parse")
        })
    }

    pub fn load_from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading content file {}", path.display()))?;
        let record: ContentRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing content file {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            skills = record.skills.len(),
            projects = record.project_count(),
            "loaded portfolio content"
        );

        Ok(record)
    }

    /// Pretty JSON used as the `portfolioContext` prompt variable.
    pub fn context_json(&self) -> String {
        // Plain structs of strings cannot fail to serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn project_count(&self) -> usize {
        self.projects.iter().map(|c| c.items.len()).sum()
    }
}
