//! Signature collection. Each slot carries a long token shared with the
//! signatory out-of-band and a short rotating code; the token addresses the
//! slot, the code is relayed verbally as a second check by the consuming
//! workflow.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{LetterSignature, SignaturePosition, SubmissionStatus};
use crate::database::store::Store;
use crate::services::{generate_code, ServiceError, ServiceResult};
use crate::types::Identity;

/// Public projection of one signature slot for the signatory page. Carries
/// this slot's own code but never another slot's secrets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureView {
    pub id: Uuid,
    pub official_name: String,
    pub occupation: String,
    pub position: SignaturePosition,
    pub is_acknowledged: bool,
    pub code: String,
    pub signed: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub letter_name: String,
    pub submission_name: String,
    pub letter_number: Option<String>,
    pub letter_date: Option<NaiveDate>,
    pub submission_status: SubmissionStatus,
}

pub struct SignatureService {
    store: Arc<dyn Store>,
}

impl SignatureService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve a signatory link to its slot plus enough display context to
    /// identify the letter being signed.
    pub async fn find_by_token(&self, token: &str) -> ServiceResult<SignatureView> {
        let signature = self
            .store
            .signature_by_token(token)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter signature not found".to_string()))?;

        let submission = self
            .store
            .submission(signature.submission_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Submission not found".to_string()))?;
        let letter = self
            .store
            .letter(submission.letter_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter not found".to_string()))?;

        Ok(SignatureView {
            id: signature.id,
            official_name: signature.official_name,
            occupation: signature.occupation,
            position: signature.position,
            is_acknowledged: signature.is_acknowledged,
            code: signature.code,
            signed: signature.verified_at.is_some(),
            verified_at: signature.verified_at,
            letter_name: letter.letter_name,
            submission_name: submission.name,
            letter_number: submission.letter_number,
            letter_date: submission.letter_date,
            submission_status: submission.status,
        })
    }

    /// Record a signature mark. The store resolves concurrent submissions;
    /// the loser observes Conflict and the first mark stays intact.
    pub async fn submit_mark(&self, id: Uuid, mark: &str) -> ServiceResult<LetterSignature> {
        if mark.trim().is_empty() {
            return Err(ServiceError::validation("signature", "signature mark is required"));
        }
        Ok(self.store.sign(id, mark, Utc::now()).await?)
    }

    /// Staff reset: clear the mark and rotate the code. The token never
    /// changes, so the link already sent to the signatory keeps working.
    pub async fn reset(&self, identity: &Identity, id: Uuid) -> ServiceResult<LetterSignature> {
        if !identity.is_staff() && !identity.is_admin() {
            return Err(ServiceError::Forbidden("Staff role required".to_string()));
        }
        Ok(self.store.reset_signature(id, &generate_code()).await?)
    }

    /// All slots for one submission, for staff progress views.
    pub async fn for_submission(
        &self,
        identity: &Identity,
        submission_id: Uuid,
    ) -> ServiceResult<Vec<LetterSignature>> {
        if !identity.is_staff() && !identity.is_admin() {
            return Err(ServiceError::Forbidden("Staff role required".to_string()));
        }
        Ok(self.store.submission_signatures(submission_id).await?)
    }
}
