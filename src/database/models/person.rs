use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff account bound to exactly one institution. The institution's type
/// decides what the personnel may see and write.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Personnel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution_id: Uuid,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fullname: String,
    /// Institutional student number.
    pub nim: String,
    pub class_year: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub birthplace: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<String>,
    pub institution_id: Uuid,
}

/// An official who may be named on signature slots. Name and occupation are
/// snapshotted into LetterSignature rows at submission time, so edits here do
/// not rewrite already-issued letters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Official {
    pub id: Uuid,
    pub name: String,
    pub occupation: String,
    pub unique_code: Option<String>,
    pub institution_id: Uuid,
}
