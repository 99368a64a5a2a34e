use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::access::AccessScope;
use crate::database::models::{
    CarbonCopy, DocumentSubmission, Institution, Letter, LetterAttachment, LetterAttribute,
    LetterAttributeSubmission, LetterDocument, LetterSignature, LetterSignatureTemplate,
    LetterTemplate, Letterhead, Official, Personnel, Student, Submission, SubmissionKind,
    SubmissionStatus,
};

/// Errors from a Store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed filter for submission listings. Composed by the services from the
/// caller's role and the access resolver's scope; list implementations apply
/// every present field conjunctively.
#[derive(Debug, Clone)]
pub struct SubmissionFilter {
    pub kind: Option<SubmissionKind>,
    pub status: Option<SubmissionStatus>,
    pub scope: AccessScope,
    pub student_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Case-insensitive match against submission name and letter number.
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl Default for SubmissionFilter {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            scope: AccessScope::All,
            student_id: None,
            user_id: None,
            search: None,
            page: 1,
            limit: 10,
        }
    }
}

impl SubmissionFilter {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

/// Listing result with the total row count before pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
}

/// A submission together with all its owned child rows, persisted as one
/// unit: signature slots never exist without their parent and a submission is
/// never created without all its slots.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub submission: Submission,
    pub attributes: Vec<LetterAttributeSubmission>,
    pub documents: Vec<DocumentSubmission>,
    pub signatures: Vec<LetterSignature>,
}

/// Storage seam for the letter core. One implementation speaks Postgres, one
/// keeps everything in memory for tests and demos; the services only see this
/// trait.
#[async_trait]
pub trait Store: Send + Sync {
    // institutions
    async fn insert_institution(&self, institution: Institution) -> StoreResult<()>;
    async fn institution(&self, id: Uuid) -> StoreResult<Option<Institution>>;
    async fn institutions_in(&self, scope: &AccessScope) -> StoreResult<Vec<Institution>>;
    async fn child_institution_ids(&self, parent_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // people
    async fn insert_personnel(&self, personnel: Personnel) -> StoreResult<()>;
    async fn personnel(&self, id: Uuid) -> StoreResult<Option<Personnel>>;
    async fn insert_student(&self, student: Student) -> StoreResult<()>;
    async fn student(&self, id: Uuid) -> StoreResult<Option<Student>>;
    async fn insert_official(&self, official: Official) -> StoreResult<()>;
    async fn official(&self, id: Uuid) -> StoreResult<Option<Official>>;

    // letter definitions
    async fn insert_letter(&self, letter: Letter) -> StoreResult<()>;
    async fn letter(&self, id: Uuid) -> StoreResult<Option<Letter>>;
    async fn letters_in(&self, scope: &AccessScope) -> StoreResult<Vec<Letter>>;
    async fn insert_letter_template(&self, template: LetterTemplate) -> StoreResult<()>;
    async fn letter_template(&self, letter_id: Uuid) -> StoreResult<Option<LetterTemplate>>;
    async fn insert_letter_attribute(&self, attribute: LetterAttribute) -> StoreResult<()>;
    async fn letter_attributes(&self, letter_id: Uuid) -> StoreResult<Vec<LetterAttribute>>;
    async fn insert_letter_document(&self, document: LetterDocument) -> StoreResult<()>;
    async fn letter_documents(&self, letter_id: Uuid) -> StoreResult<Vec<LetterDocument>>;
    async fn insert_signature_template(
        &self,
        template: LetterSignatureTemplate,
    ) -> StoreResult<()>;
    async fn signature_templates(
        &self,
        letter_id: Uuid,
    ) -> StoreResult<Vec<LetterSignatureTemplate>>;
    async fn insert_letterhead(&self, letterhead: Letterhead) -> StoreResult<()>;
    async fn letterhead(&self, id: Uuid) -> StoreResult<Option<Letterhead>>;

    // submissions
    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission>;
    async fn submission(&self, id: Uuid) -> StoreResult<Option<Submission>>;
    async fn submission_by_token(&self, token: &str) -> StoreResult<Option<Submission>>;
    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Page<Submission>>;
    /// Assign letter number/date and move the submission to `status`, as one
    /// write; listers never observe the number without the state.
    async fn set_verified(
        &self,
        id: Uuid,
        letter_number: &str,
        letter_date: NaiveDate,
        status: SubmissionStatus,
    ) -> StoreResult<Submission>;
    async fn set_status(&self, id: Uuid, status: SubmissionStatus) -> StoreResult<Submission>;
    async fn set_carbon_copy(
        &self,
        id: Uuid,
        carbon_copy: Option<CarbonCopy>,
    ) -> StoreResult<Submission>;
    /// Cascade-deletes all owned child rows.
    async fn delete_submission(&self, id: Uuid) -> StoreResult<()>;

    // owned child rows
    async fn attribute_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterAttributeSubmission>>;
    async fn amend_attribute(
        &self,
        submission_id: Uuid,
        letter_attribute_id: Uuid,
        content: &str,
    ) -> StoreResult<()>;
    async fn document_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<DocumentSubmission>>;
    /// Store a new file path for a document slot, creating the row when the
    /// slot has no stored file yet. Returns the replaced path, if any, so the
    /// caller can delete the old file from disk.
    async fn replace_document(
        &self,
        submission_id: Uuid,
        letter_document_id: Uuid,
        file_path: &str,
    ) -> StoreResult<Option<String>>;
    async fn insert_attachment(&self, attachment: LetterAttachment) -> StoreResult<()>;
    async fn attachments(&self, submission_id: Uuid) -> StoreResult<Vec<LetterAttachment>>;

    // signatures
    async fn submission_signatures(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterSignature>>;
    async fn signature(&self, id: Uuid) -> StoreResult<Option<LetterSignature>>;
    async fn signature_by_token(&self, token: &str) -> StoreResult<Option<LetterSignature>>;
    /// Record a mark on an unsigned slot. The check on `verified_at` and the
    /// write are one atomic step; a second caller observes `Conflict`.
    async fn sign(
        &self,
        id: Uuid,
        mark: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<LetterSignature>;
    /// Clear mark and timestamp and rotate the code. The token is never
    /// touched so already-distributed links stay valid.
    async fn reset_signature(&self, id: Uuid, new_code: &str) -> StoreResult<LetterSignature>;
}
