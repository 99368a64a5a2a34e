//! In-memory Store used by the test suites and local demos.
//!
//! One RwLock guards all tables; write operations take the lock once, so
//! multi-row writes (submission creation, signing) are atomic with respect to
//! every reader.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::access::AccessScope;
use crate::database::models::{
    CarbonCopy, DocumentSubmission, Institution, Letter, LetterAttachment, LetterAttribute,
    LetterAttributeSubmission, LetterDocument, LetterSignature, LetterSignatureTemplate,
    LetterTemplate, Letterhead, Official, Personnel, Student, Submission, SubmissionStatus,
};
use crate::database::store::{
    NewSubmission, Page, Store, StoreError, StoreResult, SubmissionFilter,
};

#[derive(Default)]
struct Tables {
    institutions: HashMap<Uuid, Institution>,
    personnel: HashMap<Uuid, Personnel>,
    students: HashMap<Uuid, Student>,
    officials: HashMap<Uuid, Official>,
    letters: HashMap<Uuid, Letter>,
    letter_templates: HashMap<Uuid, LetterTemplate>,
    letter_attributes: HashMap<Uuid, LetterAttribute>,
    letter_documents: HashMap<Uuid, LetterDocument>,
    signature_templates: HashMap<Uuid, LetterSignatureTemplate>,
    letterheads: HashMap<Uuid, Letterhead>,
    submissions: HashMap<Uuid, Submission>,
    attribute_submissions: HashMap<Uuid, LetterAttributeSubmission>,
    document_submissions: HashMap<Uuid, DocumentSubmission>,
    attachments: HashMap<Uuid, LetterAttachment>,
    signatures: HashMap<Uuid, LetterSignature>,
}

#[derive(Default)]
pub struct MemStore {
    tables: RwLock<Tables>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(submission: &Submission, filter: &SubmissionFilter) -> bool {
    if let Some(kind) = filter.kind {
        if submission.kind != kind {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if submission.status != status {
            return false;
        }
    }
    if !filter.scope.allows(submission.institution_id) {
        return false;
    }
    if let Some(student_id) = filter.student_id {
        if submission.student_id != Some(student_id) {
            return false;
        }
    }
    if let Some(user_id) = filter.user_id {
        if submission.user_id != Some(user_id) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let in_name = submission.name.to_lowercase().contains(&needle);
        let in_number = submission
            .letter_number
            .as_deref()
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if !in_name && !in_number {
            return false;
        }
    }
    true
}

#[async_trait]
impl Store for MemStore {
    async fn insert_institution(&self, institution: Institution) -> StoreResult<()> {
        self.tables.write().await.institutions.insert(institution.id, institution);
        Ok(())
    }

    async fn institution(&self, id: Uuid) -> StoreResult<Option<Institution>> {
        Ok(self.tables.read().await.institutions.get(&id).cloned())
    }

    async fn institutions_in(&self, scope: &AccessScope) -> StoreResult<Vec<Institution>> {
        let tables = self.tables.read().await;
        let mut out: Vec<Institution> = tables
            .institutions
            .values()
            .filter(|i| scope.allows(i.id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn child_institution_ids(&self, parent_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .institutions
            .values()
            .filter(|i| i.parent_id == Some(parent_id))
            .map(|i| i.id)
            .collect())
    }

    async fn insert_personnel(&self, personnel: Personnel) -> StoreResult<()> {
        self.tables.write().await.personnel.insert(personnel.id, personnel);
        Ok(())
    }

    async fn personnel(&self, id: Uuid) -> StoreResult<Option<Personnel>> {
        Ok(self.tables.read().await.personnel.get(&id).cloned())
    }

    async fn insert_student(&self, student: Student) -> StoreResult<()> {
        self.tables.write().await.students.insert(student.id, student);
        Ok(())
    }

    async fn student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn insert_official(&self, official: Official) -> StoreResult<()> {
        self.tables.write().await.officials.insert(official.id, official);
        Ok(())
    }

    async fn official(&self, id: Uuid) -> StoreResult<Option<Official>> {
        Ok(self.tables.read().await.officials.get(&id).cloned())
    }

    async fn insert_letter(&self, letter: Letter) -> StoreResult<()> {
        self.tables.write().await.letters.insert(letter.id, letter);
        Ok(())
    }

    async fn letter(&self, id: Uuid) -> StoreResult<Option<Letter>> {
        Ok(self.tables.read().await.letters.get(&id).cloned())
    }

    async fn letters_in(&self, scope: &AccessScope) -> StoreResult<Vec<Letter>> {
        let tables = self.tables.read().await;
        let mut out: Vec<Letter> = tables
            .letters
            .values()
            .filter(|l| scope.allows(l.institution_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.letter_name.cmp(&b.letter_name));
        Ok(out)
    }

    async fn insert_letter_template(&self, template: LetterTemplate) -> StoreResult<()> {
        self.tables.write().await.letter_templates.insert(template.id, template);
        Ok(())
    }

    async fn letter_template(&self, letter_id: Uuid) -> StoreResult<Option<LetterTemplate>> {
        let tables = self.tables.read().await;
        Ok(tables.letter_templates.values().find(|t| t.letter_id == letter_id).cloned())
    }

    async fn insert_letter_attribute(&self, attribute: LetterAttribute) -> StoreResult<()> {
        self.tables.write().await.letter_attributes.insert(attribute.id, attribute);
        Ok(())
    }

    async fn letter_attributes(&self, letter_id: Uuid) -> StoreResult<Vec<LetterAttribute>> {
        let tables = self.tables.read().await;
        let mut out: Vec<LetterAttribute> = tables
            .letter_attributes
            .values()
            .filter(|a| a.letter_id == letter_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.attribute_name.cmp(&b.attribute_name));
        Ok(out)
    }

    async fn insert_letter_document(&self, document: LetterDocument) -> StoreResult<()> {
        self.tables.write().await.letter_documents.insert(document.id, document);
        Ok(())
    }

    async fn letter_documents(&self, letter_id: Uuid) -> StoreResult<Vec<LetterDocument>> {
        let tables = self.tables.read().await;
        let mut out: Vec<LetterDocument> = tables
            .letter_documents
            .values()
            .filter(|d| d.letter_id == letter_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.document_name.cmp(&b.document_name));
        Ok(out)
    }

    async fn insert_signature_template(
        &self,
        template: LetterSignatureTemplate,
    ) -> StoreResult<()> {
        self.tables.write().await.signature_templates.insert(template.id, template);
        Ok(())
    }

    async fn signature_templates(
        &self,
        letter_id: Uuid,
    ) -> StoreResult<Vec<LetterSignatureTemplate>> {
        let tables = self.tables.read().await;
        let mut out: Vec<LetterSignatureTemplate> = tables
            .signature_templates
            .values()
            .filter(|t| t.letter_id == letter_id)
            .cloned()
            .collect();
        out.sort_by_key(|t| t.position);
        Ok(out)
    }

    async fn insert_letterhead(&self, letterhead: Letterhead) -> StoreResult<()> {
        self.tables.write().await.letterheads.insert(letterhead.id, letterhead);
        Ok(())
    }

    async fn letterhead(&self, id: Uuid) -> StoreResult<Option<Letterhead>> {
        Ok(self.tables.read().await.letterheads.get(&id).cloned())
    }

    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        let submission = new.submission.clone();
        tables.submissions.insert(submission.id, new.submission);
        for attribute in new.attributes {
            tables.attribute_submissions.insert(attribute.id, attribute);
        }
        for document in new.documents {
            tables.document_submissions.insert(document.id, document);
        }
        for signature in new.signatures {
            tables.signatures.insert(signature.id, signature);
        }
        Ok(submission)
    }

    async fn submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        Ok(self.tables.read().await.submissions.get(&id).cloned())
    }

    async fn submission_by_token(&self, token: &str) -> StoreResult<Option<Submission>> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.values().find(|s| s.token == token).cloned())
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Page<Submission>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Submission> = tables
            .submissions
            .values()
            .filter(|s| matches_filter(s, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as i64;
        let data = matched
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(Page { data, total })
    }

    async fn set_verified(
        &self,
        id: Uuid,
        letter_number: &str,
        letter_date: NaiveDate,
        status: SubmissionStatus,
    ) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission.letter_number = Some(letter_number.to_string());
        submission.letter_date = Some(letter_date);
        submission.status = status;
        Ok(submission.clone())
    }

    async fn set_status(&self, id: Uuid, status: SubmissionStatus) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission.status = status;
        Ok(submission.clone())
    }

    async fn set_carbon_copy(
        &self,
        id: Uuid,
        carbon_copy: Option<CarbonCopy>,
    ) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission.carbon_copy = carbon_copy;
        Ok(submission.clone())
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.submissions.remove(&id).is_none() {
            return Err(StoreError::NotFound("Submission not found".to_string()));
        }
        tables.attribute_submissions.retain(|_, a| a.submission_id != id);
        tables.document_submissions.retain(|_, d| d.submission_id != id);
        tables.attachments.retain(|_, a| a.submission_id != id);
        tables.signatures.retain(|_, s| s.submission_id != id);
        Ok(())
    }

    async fn attribute_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterAttributeSubmission>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attribute_submissions
            .values()
            .filter(|a| a.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn amend_attribute(
        &self,
        submission_id: Uuid,
        letter_attribute_id: Uuid,
        content: &str,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables
            .attribute_submissions
            .values_mut()
            .find(|a| {
                a.submission_id == submission_id && a.letter_attribute_id == letter_attribute_id
            })
            .ok_or_else(|| StoreError::NotFound("Attribute submission not found".to_string()))?;
        row.content = content.to_string();
        Ok(())
    }

    async fn document_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<DocumentSubmission>> {
        let tables = self.tables.read().await;
        Ok(tables
            .document_submissions
            .values()
            .filter(|d| d.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn replace_document(
        &self,
        submission_id: Uuid,
        letter_document_id: Uuid,
        file_path: &str,
    ) -> StoreResult<Option<String>> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.document_submissions.values_mut().find(|d| {
            d.submission_id == submission_id && d.letter_document_id == letter_document_id
        }) {
            let old = std::mem::replace(&mut row.file_path, file_path.to_string());
            return Ok(Some(old));
        }
        let row = DocumentSubmission {
            id: Uuid::new_v4(),
            submission_id,
            letter_document_id,
            file_path: file_path.to_string(),
        };
        tables.document_submissions.insert(row.id, row);
        Ok(None)
    }

    async fn insert_attachment(&self, attachment: LetterAttachment) -> StoreResult<()> {
        self.tables.write().await.attachments.insert(attachment.id, attachment);
        Ok(())
    }

    async fn attachments(&self, submission_id: Uuid) -> StoreResult<Vec<LetterAttachment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attachments
            .values()
            .filter(|a| a.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn submission_signatures(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterSignature>> {
        let tables = self.tables.read().await;
        let mut out: Vec<LetterSignature> = tables
            .signatures
            .values()
            .filter(|s| s.submission_id == submission_id)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.position);
        Ok(out)
    }

    async fn signature(&self, id: Uuid) -> StoreResult<Option<LetterSignature>> {
        Ok(self.tables.read().await.signatures.get(&id).cloned())
    }

    async fn signature_by_token(&self, token: &str) -> StoreResult<Option<LetterSignature>> {
        let tables = self.tables.read().await;
        Ok(tables.signatures.values().find(|s| s.token == token).cloned())
    }

    async fn sign(
        &self,
        id: Uuid,
        mark: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<LetterSignature> {
        // Check-and-set under the write lock: concurrent callers serialize
        // here and the loser observes the conflict.
        let mut tables = self.tables.write().await;
        let signature = tables
            .signatures
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Letter signature not found".to_string()))?;
        if signature.verified_at.is_some() {
            return Err(StoreError::Conflict("Signature already recorded".to_string()));
        }
        signature.signature = Some(mark.to_string());
        signature.verified_at = Some(now);
        Ok(signature.clone())
    }

    async fn reset_signature(&self, id: Uuid, new_code: &str) -> StoreResult<LetterSignature> {
        let mut tables = self.tables.write().await;
        let signature = tables
            .signatures
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Letter signature not found".to_string()))?;
        signature.signature = None;
        signature.verified_at = None;
        signature.code = new_code.to_string();
        Ok(signature.clone())
    }
}
