use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Layout slot for a signature block on the rendered letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "signature_position", rename_all = "kebab-case")]
pub enum SignaturePosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl SignaturePosition {
    /// Center positions force the signature grid to three columns.
    pub fn is_center(self) -> bool {
        matches!(self, SignaturePosition::TopCenter | SignaturePosition::BottomCenter)
    }

    pub fn css_class(self) -> &'static str {
        match self {
            SignaturePosition::TopLeft => "sig-top-left",
            SignaturePosition::TopCenter => "sig-top-center",
            SignaturePosition::TopRight => "sig-top-right",
            SignaturePosition::BottomLeft => "sig-bottom-left",
            SignaturePosition::BottomCenter => "sig-bottom-center",
            SignaturePosition::BottomRight => "sig-bottom-right",
        }
    }
}

/// One signatory slot bound to a submission.
///
/// `token` is the long secret shared with the signatory out-of-band; `code`
/// is the short human-relayable second factor and is the only part that
/// rotates on reset. Official name and occupation are snapshots taken when
/// the submission was created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LetterSignature {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub official_id: Uuid,
    pub official_name: String,
    pub occupation: String,
    pub unique_code: Option<String>,
    pub position: SignaturePosition,
    pub is_acknowledged: bool,
    #[serde(skip_serializing)]
    pub token: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub signature: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LetterSignature {
    pub fn is_signed(&self) -> bool {
        self.verified_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_serializes_kebab_case() {
        let json = serde_json::to_string(&SignaturePosition::BottomCenter).unwrap();
        assert_eq!(json, "\"bottom-center\"");
    }

    #[test]
    fn only_center_variants_are_center() {
        assert!(SignaturePosition::TopCenter.is_center());
        assert!(SignaturePosition::BottomCenter.is_center());
        assert!(!SignaturePosition::TopLeft.is_center());
        assert!(!SignaturePosition::BottomRight.is_center());
    }
}
