/// Shared types used across the codebase
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Personnel,
    Student,
}

/// Link between a staff caller and their home institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelRef {
    pub id: Uuid,
    pub institution_id: Uuid,
}

/// Resolved caller identity, passed explicitly into every service operation.
///
/// There is deliberately no ambient "current user": operations that need the
/// caller receive this value as a parameter so the core stays testable without
/// a live request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personnel: Option<PersonnelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
}

impl Identity {
    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: Role::Admin, personnel: None, student_id: None }
    }

    pub fn personnel(user_id: Uuid, personnel: PersonnelRef) -> Self {
        Self { user_id, role: Role::Personnel, personnel: Some(personnel), student_id: None }
    }

    pub fn student(user_id: Uuid, student_id: Uuid) -> Self {
        Self { user_id, role: Role::Student, personnel: None, student_id: Some(student_id) }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin-level callers carry no personnel binding and bypass access scoping.
    pub fn is_staff(&self) -> bool {
        self.role == Role::Personnel
    }
}
