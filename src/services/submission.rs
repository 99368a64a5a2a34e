//! Submission lifecycle: creation with up-front validation, staff
//! verification, status transitions, and assembly of render input for the
//! public letter view and the staff print endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::resolve_for_personnel;
use crate::config::config;
use crate::database::models::{
    CarbonCopy, DocumentSubmission, LetterAttachment, LetterAttributeSubmission, LetterSignature,
    Submission, SubmissionKind, SubmissionStatus,
};
use crate::database::store::{NewSubmission, Page, Store, SubmissionFilter};
use crate::render::{LetterRenderData, RenderedLetter};
use crate::services::files::{discard_files, delete_stored_file, UploadedFile};
use crate::services::{generate_code, generate_token, ServiceError, ServiceResult};
use crate::types::Identity;

/// One answer for a letter attribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeAnswer {
    pub letter_attribute_id: Uuid,
    pub content: String,
}

/// One uploaded file bound to a document slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub letter_document_id: Uuid,
    #[serde(flatten)]
    pub file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmission {
    pub letter_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeAnswer>,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
    pub carbon_copy: Option<CarbonCopy>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySubmission {
    pub letter_number: String,
    pub letter_date: NaiveDate,
    #[serde(default)]
    pub attributes: Vec<AttributeAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmission {
    #[serde(default)]
    pub attributes: Vec<AttributeAnswer>,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

/// Listing query as received from the client; composed with the caller's
/// access scope before it reaches the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissions {
    pub kind: Option<SubmissionKind>,
    pub status: Option<SubmissionStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Supplementary page added to a submission by staff.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttachment {
    pub content: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Submission with all its owned rows, for detail responses. Signature
/// secrets are skipped by the row type's serializer.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub attributes: Vec<LetterAttributeSubmission>,
    pub documents: Vec<DocumentSubmission>,
    pub signatures: Vec<LetterSignature>,
    pub attachments: Vec<LetterAttachment>,
}

pub struct SubmissionService {
    store: Arc<dyn Store>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and persist a new submission with all its owned rows. Any
    /// validation failure removes the request's uploaded files from disk
    /// before returning.
    pub async fn create(
        &self,
        identity: &Identity,
        kind: SubmissionKind,
        request: CreateSubmission,
    ) -> ServiceResult<Submission> {
        match self.validate_and_build(identity, kind, &request).await {
            Ok(new) => Ok(self.store.create_submission(new).await?),
            Err(err) => {
                let files: Vec<UploadedFile> =
                    request.documents.iter().map(|d| d.file.clone()).collect();
                discard_files(&files);
                Err(err)
            }
        }
    }

    async fn validate_and_build(
        &self,
        identity: &Identity,
        kind: SubmissionKind,
        request: &CreateSubmission,
    ) -> ServiceResult<NewSubmission> {
        let letter = self
            .store
            .letter(request.letter_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter not found".to_string()))?;

        let answers: HashMap<Uuid, &str> = request
            .attributes
            .iter()
            .map(|a| (a.letter_attribute_id, a.content.as_str()))
            .collect();
        for attribute in self.store.letter_attributes(letter.id).await? {
            if !attribute.is_required {
                continue;
            }
            let blank = answers
                .get(&attribute.id)
                .map(|c| c.trim().is_empty())
                .unwrap_or(true);
            if blank {
                return Err(ServiceError::validation(
                    attribute.attribute_name.clone(),
                    format!("{} is required", attribute.attribute_name),
                ));
            }
        }

        let slots = self.store.letter_documents(letter.id).await?;
        let required = slots.iter().filter(|s| s.is_required).count();
        if request.documents.len() != required {
            return Err(ServiceError::validation(
                "documents",
                format!("expected {} documents, got {}", required, request.documents.len()),
            ));
        }
        for upload in &request.documents {
            let slot = slots
                .iter()
                .find(|s| s.id == upload.letter_document_id)
                .ok_or_else(|| {
                    ServiceError::validation("documents", "unknown document slot")
                })?;
            if !slot.accepts_mime(&upload.file.mime_type) {
                return Err(ServiceError::validation(
                    slot.document_name.clone(),
                    format!("{} does not accept {}", slot.document_name, upload.file.mime_type),
                ));
            }
        }

        let (institution_id, student_id) = match kind {
            SubmissionKind::Student => {
                let student_id = identity.student_id.ok_or_else(|| {
                    ServiceError::validation("student", "caller is not a student")
                })?;
                let student = self
                    .store
                    .student(student_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))?;
                (student.institution_id, Some(student.id))
            }
            SubmissionKind::General => {
                let personnel = identity.personnel.as_ref().ok_or_else(|| {
                    ServiceError::validation("institution", "caller has no institution")
                })?;
                (personnel.institution_id, None)
            }
        };

        let submission_id = Uuid::new_v4();
        let now = Utc::now();

        let mut signatures = Vec::new();
        for template in self.store.signature_templates(letter.id).await? {
            let official = self
                .store
                .official(template.official_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Official not found".to_string()))?;
            signatures.push(LetterSignature {
                id: Uuid::new_v4(),
                submission_id,
                official_id: official.id,
                official_name: official.name,
                occupation: official.occupation,
                unique_code: official.unique_code,
                position: template.position,
                is_acknowledged: template.is_acknowledged,
                token: generate_token(),
                code: generate_code(),
                signature: None,
                verified_at: None,
                created_at: now,
            });
        }

        let attributes = request
            .attributes
            .iter()
            .map(|a| LetterAttributeSubmission {
                id: Uuid::new_v4(),
                submission_id,
                letter_attribute_id: a.letter_attribute_id,
                content: a.content.clone(),
            })
            .collect();

        let documents = request
            .documents
            .iter()
            .map(|d| DocumentSubmission {
                id: Uuid::new_v4(),
                submission_id,
                letter_document_id: d.letter_document_id,
                file_path: d.file.file_path.clone(),
            })
            .collect();

        Ok(NewSubmission {
            submission: Submission {
                id: submission_id,
                kind,
                token: generate_token(),
                name: request.name.clone(),
                letter_id: letter.id,
                institution_id,
                student_id,
                user_id: Some(identity.user_id),
                letter_number: None,
                letter_date: None,
                status: SubmissionStatus::Pending,
                carbon_copy: request.carbon_copy.clone(),
                created_at: now,
            },
            attributes,
            documents,
            signatures,
        })
    }

    /// Staff review: amend answers, assign the letter number and date, and
    /// hand the submission to signature collection. A letter with no
    /// signature slots is approved outright.
    pub async fn verify(
        &self,
        identity: &Identity,
        id: Uuid,
        request: VerifySubmission,
    ) -> ServiceResult<Submission> {
        self.require_staff(identity)?;
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        if submission.status.is_terminal() {
            return Err(ServiceError::Conflict("Submission is already finalized".to_string()));
        }

        for answer in &request.attributes {
            self.store
                .amend_attribute(id, answer.letter_attribute_id, &answer.content)
                .await?;
        }

        let slots = self.store.submission_signatures(id).await?;
        let next = if slots.is_empty() {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::WaitingSignature
        };
        Ok(self
            .store
            .set_verified(id, &request.letter_number, request.letter_date, next)
            .await?)
    }

    pub async fn change_status(
        &self,
        identity: &Identity,
        id: Uuid,
        status: SubmissionStatus,
    ) -> ServiceResult<Submission> {
        self.require_staff(identity)?;
        if !status.is_terminal() {
            return Err(ServiceError::validation(
                "status",
                "status must be approved or rejected",
            ));
        }
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        if submission.status.is_terminal() {
            return Err(ServiceError::Conflict("Submission is already finalized".to_string()));
        }
        Ok(self.store.set_status(id, status).await?)
    }

    /// Amend answers and replace document files before verification. Replaced
    /// files are removed from disk after the row update succeeds.
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        request: UpdateSubmission,
    ) -> ServiceResult<Submission> {
        let submission = self.load(id).await?;
        if let Err(err) = self.check_read_access(identity, &submission).await {
            let files: Vec<UploadedFile> =
                request.documents.iter().map(|d| d.file.clone()).collect();
            discard_files(&files);
            return Err(err);
        }
        if submission.status.is_terminal() {
            let files: Vec<UploadedFile> =
                request.documents.iter().map(|d| d.file.clone()).collect();
            discard_files(&files);
            return Err(ServiceError::Conflict("Submission is already finalized".to_string()));
        }

        let slots = self.store.letter_documents(submission.letter_id).await?;
        for upload in &request.documents {
            let accepted = slots
                .iter()
                .find(|s| s.id == upload.letter_document_id)
                .map(|s| s.accepts_mime(&upload.file.mime_type))
                .unwrap_or(false);
            if !accepted {
                let files: Vec<UploadedFile> =
                    request.documents.iter().map(|d| d.file.clone()).collect();
                discard_files(&files);
                return Err(ServiceError::validation("documents", "file type not accepted"));
            }
        }

        for answer in &request.attributes {
            self.store
                .amend_attribute(id, answer.letter_attribute_id, &answer.content)
                .await?;
        }
        for upload in &request.documents {
            let old = self
                .store
                .replace_document(id, upload.letter_document_id, &upload.file.file_path)
                .await?;
            if let Some(old_path) = old {
                delete_stored_file(&old_path);
            }
        }

        self.load(id).await
    }

    pub async fn update_carbon_copy(
        &self,
        identity: &Identity,
        id: Uuid,
        carbon_copy: Option<CarbonCopy>,
    ) -> ServiceResult<Submission> {
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        if submission.status.is_terminal() {
            return Err(ServiceError::Conflict("Submission is already finalized".to_string()));
        }
        Ok(self.store.set_carbon_copy(id, carbon_copy).await?)
    }

    pub async fn find_all(
        &self,
        identity: &Identity,
        query: ListSubmissions,
    ) -> ServiceResult<Page<Submission>> {
        let api = &config().api;
        let mut filter = SubmissionFilter {
            kind: query.kind,
            status: query.status,
            search: query.search.filter(|s| !s.trim().is_empty()),
            page: query.page.unwrap_or(1).max(1),
            limit: query
                .limit
                .unwrap_or(api.default_page_size)
                .clamp(1, api.max_page_size),
            ..SubmissionFilter::default()
        };

        match identity.role {
            crate::types::Role::Admin => {}
            crate::types::Role::Personnel => {
                let personnel = identity.personnel.as_ref().ok_or_else(|| {
                    ServiceError::Forbidden("Caller has no institution".to_string())
                })?;
                let access = resolve_for_personnel(self.store.as_ref(), personnel).await?;
                filter.scope = access.scope;
            }
            crate::types::Role::Student => {
                let student_id = identity.student_id.ok_or_else(|| {
                    ServiceError::Forbidden("Caller is not a student".to_string())
                })?;
                filter.student_id = Some(student_id);
            }
        }

        Ok(self.store.list_submissions(&filter).await?)
    }

    pub async fn find_one(&self, identity: &Identity, id: Uuid) -> ServiceResult<SubmissionDetail> {
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        Ok(SubmissionDetail {
            attributes: self.store.attribute_submissions(id).await?,
            documents: self.store.document_submissions(id).await?,
            signatures: self.store.submission_signatures(id).await?,
            attachments: self.store.attachments(id).await?,
            submission,
        })
    }

    /// Staff append a supplementary page. Hidden attachments are kept on the
    /// record but never rendered.
    pub async fn add_attachment(
        &self,
        identity: &Identity,
        id: Uuid,
        request: AddAttachment,
    ) -> ServiceResult<LetterAttachment> {
        self.require_staff(identity)?;
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        if submission.status.is_terminal() {
            return Err(ServiceError::Conflict("Submission is already finalized".to_string()));
        }
        if request.content.trim().is_empty() {
            return Err(ServiceError::validation("content", "attachment content is required"));
        }
        let attachment = LetterAttachment {
            id: Uuid::new_v4(),
            submission_id: id,
            content: request.content,
            is_visible: request.is_visible,
        };
        self.store.insert_attachment(attachment.clone()).await?;
        Ok(attachment)
    }

    /// Delete a submission and all owned rows, then remove its stored files.
    pub async fn remove(&self, identity: &Identity, id: Uuid) -> ServiceResult<()> {
        self.require_staff(identity)?;
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;

        let documents = self.store.document_submissions(id).await?;
        self.store.delete_submission(id).await?;
        for document in documents {
            delete_stored_file(&document.file_path);
        }
        Ok(())
    }

    /// Public letter view: structured, placeholder-substituted data looked up
    /// by the submission's opaque token.
    pub async fn letter_view(&self, token: &str) -> ServiceResult<RenderedLetter> {
        let submission = self
            .store
            .submission_by_token(token)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter not found".to_string()))?;
        let data = self.assemble(submission).await?;
        Ok(crate::render::rendered_view(&data))
    }

    /// Final print HTML for staff.
    pub async fn print_html(&self, identity: &Identity, id: Uuid) -> ServiceResult<String> {
        let submission = self.load(id).await?;
        self.check_read_access(identity, &submission).await?;
        let data = self.assemble(submission).await?;
        Ok(crate::render::render_html(&data))
    }

    async fn assemble(&self, submission: Submission) -> ServiceResult<LetterRenderData> {
        let letter = self
            .store
            .letter(submission.letter_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter not found".to_string()))?;
        let template = self
            .store
            .letter_template(letter.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter has no template".to_string()))?;

        let student = match submission.student_id {
            Some(student_id) => self.store.student(student_id).await?,
            None => None,
        };
        let institution = self.store.institution(submission.institution_id).await?;

        let names: HashMap<Uuid, String> = self
            .store
            .letter_attributes(letter.id)
            .await?
            .into_iter()
            .map(|a| (a.id, a.attribute_name))
            .collect();
        let attributes = self
            .store
            .attribute_submissions(submission.id)
            .await?
            .into_iter()
            .filter_map(|row| {
                names.get(&row.letter_attribute_id).map(|name| (name.clone(), row.content))
            })
            .collect();

        let letterhead = match letter.letterhead_id {
            Some(letterhead_id) => self.store.letterhead(letterhead_id).await?,
            None => None,
        };

        Ok(LetterRenderData {
            template_content: template.content,
            signatures: self.store.submission_signatures(submission.id).await?,
            attachments: self.store.attachments(submission.id).await?,
            institution_name: institution.map(|i| i.name),
            letter,
            student,
            attributes,
            letterhead,
            submission,
        })
    }

    fn require_staff(&self, identity: &Identity) -> ServiceResult<()> {
        if identity.is_staff() || identity.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Staff role required".to_string()))
        }
    }

    async fn check_read_access(
        &self,
        identity: &Identity,
        submission: &Submission,
    ) -> ServiceResult<()> {
        match identity.role {
            crate::types::Role::Admin => Ok(()),
            crate::types::Role::Student => {
                if identity.student_id.is_some() && identity.student_id == submission.student_id {
                    Ok(())
                } else {
                    Err(ServiceError::Forbidden("Not your submission".to_string()))
                }
            }
            crate::types::Role::Personnel => {
                let personnel = identity.personnel.as_ref().ok_or_else(|| {
                    ServiceError::Forbidden("Caller has no institution".to_string())
                })?;
                let access = resolve_for_personnel(self.store.as_ref(), personnel).await?;
                if access.scope.allows(submission.institution_id) {
                    Ok(())
                } else {
                    Err(ServiceError::Forbidden(
                        "Submission is outside your institution scope".to_string(),
                    ))
                }
            }
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Submission> {
        self.store
            .submission(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Submission not found".to_string()))
    }
}
