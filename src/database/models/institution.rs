use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node type in the institution tree. Visibility and write rules hang off
/// this: study-program and faculty staff author letters, institution and
/// university staff observe the whole tree read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "institution_type", rename_all = "snake_case")]
pub enum InstitutionType {
    StudyProgram,
    Faculty,
    Institution,
    University,
}

/// One node in the institution tree. Roots (`institution`/`university`) have
/// no parent; `faculty` and `study_program` nodes always point upward.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub institution_type: InstitutionType,
    pub parent_id: Option<Uuid>,
}

impl Institution {
    pub fn is_root(&self) -> bool {
        matches!(
            self.institution_type,
            InstitutionType::Institution | InstitutionType::University
        )
    }
}
