use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two concrete submission kinds share one row type and identical
/// lifecycle semantics; they differ only in who the submitter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_kind", rename_all = "snake_case")]
pub enum SubmissionKind {
    Student,
    General,
}

/// Externally observed lifecycle state. Clients polling a submission treat
/// these spellings as the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    WaitingSignature,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }
}

/// Carbon copy is either pre-formatted rich text or a list of recipient lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CarbonCopy {
    Text(String),
    List(Vec<String>),
}

/// One instantiated letter request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    /// Opaque public identifier for unauthenticated letter views; distinct
    /// from the per-signature tokens.
    pub token: String,
    pub name: String,
    pub letter_id: Uuid,
    pub institution_id: Uuid,
    pub student_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub letter_number: Option<String>,
    pub letter_date: Option<NaiveDate>,
    pub status: SubmissionStatus,
    pub carbon_copy: Option<CarbonCopy>,
    pub created_at: DateTime<Utc>,
}

/// Answer for one letter attribute.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterAttributeSubmission {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub letter_attribute_id: Uuid,
    pub content: String,
}

/// Stored file reference for one document slot. The file itself lives under
/// the uploads root; this row only records the relative path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSubmission {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub letter_document_id: Uuid,
    pub file_path: String,
}

/// Supplementary page appended after the letter body.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterAttachment {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub content: String,
    pub is_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_spellings_are_stable() {
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::WaitingSignature).unwrap(),
            "\"waiting_signature\""
        );
        assert_eq!(serde_json::to_string(&SubmissionStatus::Pending).unwrap(), "\"pending\"");
    }

    #[test]
    fn terminal_states() {
        assert!(SubmissionStatus::Approved.is_terminal());
        assert!(SubmissionStatus::Rejected.is_terminal());
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::WaitingSignature.is_terminal());
    }

    #[test]
    fn carbon_copy_accepts_string_or_list() {
        let text: CarbonCopy = serde_json::from_str("\"<p>Arsip</p>\"").unwrap();
        assert_eq!(text, CarbonCopy::Text("<p>Arsip</p>".to_string()));

        let list: CarbonCopy = serde_json::from_str("[\"Dekan\",\"Arsip\"]").unwrap();
        assert_eq!(list, CarbonCopy::List(vec!["Dekan".to_string(), "Arsip".to_string()]));
    }
}
