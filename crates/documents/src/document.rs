//! Document and version records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use folio_core::{DocumentId, ProjectId, UserId, VersionId};

/// Fixed pipeline position of a document. One document per stage per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ProblemContext,
    Discovery,
    SwotCsd,
    Personas,
    UserResearch,
    HypothesisValidation,
    FeaturePrioritization,
    UserStoriesFlows,
    CriteriaMetrics,
    RoadmapBacklog,
    Prototype,
    FinalPrd,
    Launch,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Stage::ProblemContext,
        Stage::Discovery,
        Stage::SwotCsd,
        Stage::Personas,
        Stage::UserResearch,
        Stage::HypothesisValidation,
        Stage::FeaturePrioritization,
        Stage::UserStoriesFlows,
        Stage::CriteriaMetrics,
        Stage::RoadmapBacklog,
        Stage::Prototype,
        Stage::FinalPrd,
        Stage::Launch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProblemContext => "problem-context",
            Self::Discovery => "discovery",
            Self::SwotCsd => "swot-csd",
            Self::Personas => "personas",
            Self::UserResearch => "user-research",
            Self::HypothesisValidation => "hypothesis-validation",
            Self::FeaturePrioritization => "feature-prioritization",
            Self::UserStoriesFlows => "user-stories-flows",
            Self::CriteriaMetrics => "criteria-metrics",
            Self::RoadmapBacklog => "roadmap-backlog",
            Self::Prototype => "prototype",
            Self::FinalPrd => "final-prd",
            Self::Launch => "launch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every status stays editable. `Approved` is only reachable through approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    InReview,
    Approved,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_review" => Some(Self::InReview),
            "approved" => Some(Self::Approved),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl core::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Pdf,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "markdown" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Current state of a stage document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub project_id: ProjectId,
    pub stage: Stage,
    pub title: String,
    pub content: String,
    pub structured_content: Value,
    pub format: DocumentFormat,
    pub tags: Vec<String>,
    pub status: DocumentStatus,
    /// Number of the snapshot the current content corresponds to (>= 1).
    pub version: u32,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Snapshot of the current content under the current version number.
    pub fn snapshot(&self, author_id: UserId) -> DocumentVersion {
        DocumentVersion {
            id: VersionId::new(),
            document_id: self.id,
            version: self.version,
            content: self.content.clone(),
            structured_content: self.structured_content.clone(),
            author_id,
            created_at: Utc::now(),
        }
    }
}

/// Immutable content snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version: u32,
    pub content: String,
    pub structured_content: Value,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub project_id: ProjectId,
    pub stage: Stage,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "empty_object")]
    pub structured_content: Value,
    #[serde(default)]
    pub format: DocumentFormat,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub structured_content: Option<Value>,
    pub format: Option<DocumentFormat>,
    pub tags: Option<Vec<String>>,
    pub status: Option<DocumentStatus>,
}

/// Read-path filter. `projects` scopes the result to what the caller may see.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub projects: Vec<ProjectId>,
    pub stage: Option<Stage>,
    pub status: Option<DocumentStatus>,
    /// Case-insensitive match on title or content.
    pub search: Option<String>,
}

impl DocumentQuery {
    pub fn matches(&self, doc: &Document) -> bool {
        if !self.projects.contains(&doc.project_id) {
            return false;
        }
        if self.stage.is_some_and(|s| s != doc.stage) {
            return false;
        }
        if self.status.is_some_and(|s| s != doc.status) {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(needle) => doc.title.to_lowercase().contains(&needle) || doc.content.to_lowercase().contains(&needle),
            None => true,
        }
    }
}

pub(crate) fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_keys_are_kebab_case() {
        assert_eq!(serde_json::to_value(Stage::SwotCsd).unwrap(), "swot-csd");
        assert_eq!(serde_json::to_value(Stage::FinalPrd).unwrap(), "final-prd");
        for stage in Stage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, stage.as_str());
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::parse("unknown"), None);
    }

    #[test]
    fn status_uses_snake_case() {
        assert_eq!(serde_json::to_value(DocumentStatus::InReview).unwrap(), "in_review");
        assert_eq!(DocumentStatus::parse("in_review"), Some(DocumentStatus::InReview));
    }

    #[test]
    fn new_document_defaults() {
        let doc: NewDocument = serde_json::from_value(serde_json::json!({
            "project_id": ProjectId::new(),
            "stage": "discovery",
            "title": "Discovery notes",
        }))
        .unwrap();
        assert_eq!(doc.format, DocumentFormat::Markdown);
        assert_eq!(doc.structured_content, serde_json::json!({}));
        assert!(doc.content.is_empty());
    }
}
