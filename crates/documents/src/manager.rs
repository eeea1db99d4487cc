//! Document mutation and version history.
//!
//! Callers authorize before calling in: reads need `read`, creation `create`,
//! edits/approval/restore `edit`, deletion `delete`.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use folio_core::{DocumentId, UserId};

use crate::document::{Document, DocumentChanges, DocumentQuery, DocumentStatus, DocumentVersion, NewDocument};
use crate::error::VersioningError;
use crate::repository::DocumentRepository;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 200;
pub const CONTENT_MAX: usize = 50_000;
pub const TAG_MAX: usize = 50;

#[derive(Clone)]
pub struct DocumentVersionManager {
    repo: Arc<dyn DocumentRepository>,
}

impl DocumentVersionManager {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self { repo }
    }

    /// Create the document for a stage at version 1, with its first snapshot.
    pub async fn create(&self, author: UserId, input: NewDocument) -> Result<Document, VersioningError> {
        let title = validate_title(&input.title)?;
        validate_content(&input.content)?;
        let tags = normalize_tags(input.tags)?;

        let now = Utc::now();
        let document = Document {
            id: DocumentId::new(),
            project_id: input.project_id,
            stage: input.stage,
            title,
            content: input.content,
            structured_content: input.structured_content,
            format: input.format,
            tags,
            status: DocumentStatus::Draft,
            version: 1,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        let initial = document.snapshot(author);

        self.repo.insert(document.clone(), initial).await?;
        info!(document_id = %document.id, project_id = %document.project_id, stage = %document.stage, "document created");
        Ok(document)
    }

    /// Apply a partial update.
    ///
    /// A content or structured-content change appends exactly one snapshot and
    /// bumps `version` by one; metadata-only changes never do.
    pub async fn update(&self, id: DocumentId, author: UserId, changes: DocumentChanges) -> Result<Document, VersioningError> {
        let title = changes.title.as_deref().map(validate_title).transpose()?;
        if let Some(content) = &changes.content {
            validate_content(content)?;
        }
        let tags = changes.tags.clone().map(normalize_tags).transpose()?;
        if changes.status == Some(DocumentStatus::Approved) {
            return Err(VersioningError::validation("documents are approved through the approve action"));
        }

        let edit = move |doc: &mut Document| -> Result<Option<DocumentVersion>, VersioningError> {
            if let Some(title) = &title {
                doc.title = title.clone();
            }
            if let Some(tags) = &tags {
                doc.tags = tags.clone();
            }
            if let Some(format) = changes.format {
                doc.format = format;
            }
            if let Some(status) = changes.status {
                doc.status = status;
            }

            let content_changed = changes.content.as_ref().is_some_and(|c| *c != doc.content);
            let structured_changed = changes
                .structured_content
                .as_ref()
                .is_some_and(|s| *s != doc.structured_content);

            doc.updated_at = Utc::now();
            if !content_changed && !structured_changed {
                return Ok(None);
            }

            if let Some(content) = &changes.content {
                doc.content = content.clone();
            }
            if let Some(structured) = &changes.structured_content {
                doc.structured_content = structured.clone();
            }
            doc.version += 1;
            Ok(Some(doc.snapshot(author)))
        };

        let document = self.repo.commit_edit(id, &edit).await?;
        info!(document_id = %id, version = document.version, "document updated");
        Ok(document)
    }

    pub async fn approve(&self, id: DocumentId, approver: UserId) -> Result<Document, VersioningError> {
        let edit = move |doc: &mut Document| -> Result<Option<DocumentVersion>, VersioningError> {
            let now = Utc::now();
            doc.status = DocumentStatus::Approved;
            doc.approved_by = Some(approver);
            doc.approved_at = Some(now);
            doc.updated_at = now;
            Ok(None)
        };

        let document = self.repo.commit_edit(id, &edit).await?;
        info!(document_id = %id, approver_id = %approver, "document approved");
        Ok(document)
    }

    /// Point the document back at an earlier snapshot.
    ///
    /// The current content is overwritten and `version` set to the target. No
    /// snapshot is written and history is left as is, so a later edit numbers
    /// from the restored version.
    pub async fn restore(&self, id: DocumentId, target_version: u32) -> Result<Document, VersioningError> {
        let snapshot = self
            .repo
            .find_version(id, target_version)
            .await?
            .ok_or(VersioningError::NotFound)?;

        let edit = move |doc: &mut Document| -> Result<Option<DocumentVersion>, VersioningError> {
            doc.content = snapshot.content.clone();
            doc.structured_content = snapshot.structured_content.clone();
            doc.version = snapshot.version;
            doc.updated_at = Utc::now();
            Ok(None)
        };

        let document = self.repo.commit_edit(id, &edit).await?;
        info!(document_id = %id, version = target_version, "document restored");
        Ok(document)
    }

    pub async fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, VersioningError> {
        if self.repo.get(id).await?.is_none() {
            return Err(VersioningError::NotFound);
        }
        Ok(self.repo.versions(id).await?)
    }

    pub async fn get(&self, id: DocumentId) -> Result<Document, VersioningError> {
        self.repo.get(id).await?.ok_or(VersioningError::NotFound)
    }

    pub async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, VersioningError> {
        if query.projects.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.list(query).await?)
    }

    pub async fn delete(&self, id: DocumentId) -> Result<(), VersioningError> {
        if !self.repo.delete(id).await? {
            return Err(VersioningError::NotFound);
        }
        info!(document_id = %id, "document deleted");
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<String, VersioningError> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(VersioningError::validation(format!(
            "title must be between {TITLE_MIN} and {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<(), VersioningError> {
    if content.chars().count() > CONTENT_MAX {
        return Err(VersioningError::validation(format!(
            "content must be at most {CONTENT_MAX} characters"
        )));
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, VersioningError> {
    tags.into_iter()
        .map(|tag| {
            let tag = tag.trim().to_string();
            if tag.is_empty() || tag.chars().count() > TAG_MAX {
                Err(VersioningError::validation(format!("each tag must be 1-{TAG_MAX} characters")))
            } else {
                Ok(tag)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, Stage};
    use crate::testing::MemoryRepository;
    use folio_core::ProjectId;
    use serde_json::json;

    fn manager() -> DocumentVersionManager {
        DocumentVersionManager::new(Arc::new(MemoryRepository::default()))
    }

    fn discovery(project_id: ProjectId, content: &str) -> NewDocument {
        NewDocument {
            project_id,
            stage: Stage::Discovery,
            title: "Discovery".into(),
            content: content.into(),
            structured_content: json!({}),
            format: DocumentFormat::Markdown,
            tags: vec![],
        }
    }

    fn edit(content: &str) -> DocumentChanges {
        DocumentChanges {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_writes_version_one_snapshot() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(doc.status, DocumentStatus::Draft);
        let versions = m.versions(doc.id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].content, "v1");
        assert_eq!(versions[0].author_id, author);
    }

    #[tokio::test]
    async fn duplicate_stage_is_rejected() {
        let m = manager();
        let project = ProjectId::new();
        m.create(UserId::new(), discovery(project, "a")).await.unwrap();

        let err = m.create(UserId::new(), discovery(project, "b")).await.unwrap_err();
        assert_eq!(err, VersioningError::DuplicateStage(Stage::Discovery));
        assert_eq!(err.status_code(), 409);

        assert!(m.create(UserId::new(), discovery(ProjectId::new(), "c")).await.is_ok());
    }

    #[tokio::test]
    async fn each_content_change_adds_exactly_one_version() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();

        for (i, content) in ["v2", "v3", "v4"].into_iter().enumerate() {
            let updated = m.update(doc.id, author, edit(content)).await.unwrap();
            assert_eq!(updated.version, i as u32 + 2);
        }

        let versions = m.versions(doc.id).await.unwrap();
        assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn unchanged_or_metadata_edits_do_not_version() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();

        let same = m.update(doc.id, author, edit("v1")).await.unwrap();
        assert_eq!(same.version, 1);

        let meta = m
            .update(
                doc.id,
                author,
                DocumentChanges {
                    title: Some("Renamed discovery".into()),
                    tags: Some(vec![" research ".into()]),
                    status: Some(DocumentStatus::InReview),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.title, "Renamed discovery");
        assert_eq!(meta.tags, vec!["research".to_string()]);
        assert_eq!(meta.status, DocumentStatus::InReview);
        assert_eq!(m.versions(doc.id).await.unwrap().len(), 1);

        let structured = m
            .update(
                doc.id,
                author,
                DocumentChanges {
                    structured_content: Some(json!({"insights": 3})),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(structured.version, 2);
    }

    #[tokio::test]
    async fn restore_brings_back_snapshot_content() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();
        m.update(doc.id, author, edit("v2")).await.unwrap();

        let restored = m.restore(doc.id, 1).await.unwrap();
        assert_eq!(restored.content, "v1");
        assert_eq!(restored.version, 1);
        assert_eq!(m.versions(doc.id).await.unwrap().len(), 2);

        assert_eq!(m.restore(doc.id, 9).await.unwrap_err(), VersioningError::NotFound);
    }

    #[tokio::test]
    async fn edits_after_restore_number_from_the_restored_version() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();
        m.update(doc.id, author, edit("v2")).await.unwrap();
        m.update(doc.id, author, edit("v3")).await.unwrap();
        m.restore(doc.id, 1).await.unwrap();

        let after = m.update(doc.id, author, edit("v2-bis")).await.unwrap();
        assert_eq!(after.version, 2);

        // Latest snapshot wins when two carry the same number.
        let again = m.restore(doc.id, 2).await.unwrap();
        assert_eq!(again.content, "v2-bis");
    }

    #[tokio::test]
    async fn approval_is_explicit_and_sticks_through_edits() {
        let m = manager();
        let author = UserId::new();
        let doc = m.create(author, discovery(ProjectId::new(), "v1")).await.unwrap();

        let err = m
            .update(
                doc.id,
                author,
                DocumentChanges {
                    status: Some(DocumentStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VersioningError::Validation(_)));

        let approver = UserId::new();
        let approved = m.approve(doc.id, approver).await.unwrap();
        assert_eq!(approved.status, DocumentStatus::Approved);
        assert_eq!(approved.approved_by, Some(approver));
        assert!(approved.approved_at.is_some());

        let edited = m.update(doc.id, author, edit("v2")).await.unwrap();
        assert_eq!(edited.status, DocumentStatus::Approved);
        assert_eq!(edited.version, 2);
    }

    #[tokio::test]
    async fn validation_rejects_bad_titles_and_oversized_content() {
        let m = manager();
        let mut short = discovery(ProjectId::new(), "");
        short.title = "ab".into();
        assert!(matches!(m.create(UserId::new(), short).await, Err(VersioningError::Validation(_))));

        let huge = "x".repeat(CONTENT_MAX + 1);
        assert!(matches!(
            m.create(UserId::new(), discovery(ProjectId::new(), &huge)).await,
            Err(VersioningError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_document_and_history() {
        let m = manager();
        let doc = m.create(UserId::new(), discovery(ProjectId::new(), "v1")).await.unwrap();
        m.delete(doc.id).await.unwrap();

        assert_eq!(m.get(doc.id).await.unwrap_err(), VersioningError::NotFound);
        assert_eq!(m.versions(doc.id).await.unwrap_err(), VersioningError::NotFound);
        assert_eq!(m.delete(doc.id).await.unwrap_err(), VersioningError::NotFound);
    }

    #[tokio::test]
    async fn list_is_scoped_to_visible_projects() {
        let m = manager();
        let mine = ProjectId::new();
        m.create(UserId::new(), discovery(mine, "alpha")).await.unwrap();
        m.create(UserId::new(), discovery(ProjectId::new(), "beta")).await.unwrap();

        let query = DocumentQuery {
            projects: vec![mine],
            ..Default::default()
        };
        assert_eq!(m.list(&query).await.unwrap().len(), 1);
        assert!(m.list(&DocumentQuery::default()).await.unwrap().is_empty());

        let search = DocumentQuery {
            projects: vec![mine],
            search: Some("ALPHA".into()),
            ..Default::default()
        };
        assert_eq!(m.list(&search).await.unwrap().len(), 1);
    }
}
