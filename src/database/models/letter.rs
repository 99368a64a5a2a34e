use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signature::SignaturePosition;

/// Reusable letter-type definition owned by one institution.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub letter_name: String,
    pub reference_number: Option<String>,
    /// Scope at which this letter type is offered.
    pub category: Option<String>,
    pub letterhead_id: Option<Uuid>,
}

/// Rich-text body of the letter, with bracketed placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterTemplate {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub content: String,
}

/// Custom field the submitter fills in; `attribute_name` doubles as the
/// placeholder name in the letter body.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterAttribute {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub attribute_name: String,
    pub is_required: bool,
}

/// File the submitter must attach, with a declared file type.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterDocument {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub document_name: String,
    pub file_type: String,
    pub is_required: bool,
}

impl LetterDocument {
    /// Whether an uploaded MIME type satisfies the declared file type.
    /// Unknown declared types accept anything.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        match self.file_type.to_lowercase().as_str() {
            "pdf" => mime == "application/pdf",
            "jpg" | "jpeg" => mime == "image/jpeg" || mime == "image/jpg",
            "png" => mime == "image/png",
            "gif" => mime == "image/gif",
            "doc" => mime == "application/msword",
            "docx" => {
                mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            "xls" => mime == "application/vnd.ms-excel",
            "xlsx" => {
                mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            "txt" => mime == "text/plain",
            _ => true,
        }
    }
}

/// Signature slot definition on a letter: which official signs, where the
/// block sits on the page, and whether the slot signs as acknowledging.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterSignatureTemplate {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub official_id: Uuid,
    pub position: SignaturePosition,
    pub is_acknowledged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Letterhead {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub header: String,
    pub subheader: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(file_type: &str) -> LetterDocument {
        LetterDocument {
            id: Uuid::new_v4(),
            letter_id: Uuid::new_v4(),
            document_name: "Transkrip".to_string(),
            file_type: file_type.to_string(),
            is_required: true,
        }
    }

    #[test]
    fn pdf_slot_only_accepts_pdf() {
        let d = doc("pdf");
        assert!(d.accepts_mime("application/pdf"));
        assert!(!d.accepts_mime("image/png"));
    }

    #[test]
    fn jpeg_slot_accepts_both_jpeg_spellings() {
        let d = doc("JPG");
        assert!(d.accepts_mime("image/jpeg"));
        assert!(d.accepts_mime("image/jpg"));
        assert!(!d.accepts_mime("image/gif"));
    }

    #[test]
    fn unknown_declared_type_accepts_anything() {
        let d = doc("zip");
        assert!(d.accepts_mime("application/octet-stream"));
    }
}
