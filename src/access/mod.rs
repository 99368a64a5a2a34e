//! Hierarchical institution-access resolution.
//!
//! Personnel visibility follows the institution tree: a study-program
//! operator sees only their own institution, a faculty operator sees the
//! study programs beneath it, and institution/university staff see the whole
//! tree read-only. Admin identities never pass through this module.

use std::collections::HashSet;

use uuid::Uuid;

use crate::database::models::InstitutionType;
use crate::database::store::{Store, StoreError};
use crate::types::PersonnelRef;

/// Result of access resolution. `All` is a sentinel distinct from any finite
/// set: an empty `Ids` means "see nothing", `All` means "no filter at all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    All,
    Ids(HashSet<Uuid>),
}

impl AccessScope {
    pub fn only(id: Uuid) -> Self {
        AccessScope::Ids(HashSet::from([id]))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, AccessScope::All)
    }

    pub fn allows(&self, id: Uuid) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Ids(ids) => ids.contains(&id),
        }
    }
}

/// Compute the set of institution ids a staff member may touch.
pub async fn resolve_accessible_ids(
    store: &dyn Store,
    institution_id: Uuid,
    institution_type: InstitutionType,
) -> Result<AccessScope, StoreError> {
    match institution_type {
        InstitutionType::StudyProgram => Ok(AccessScope::only(institution_id)),
        InstitutionType::Faculty => {
            let children = store.child_institution_ids(institution_id).await?;
            Ok(AccessScope::Ids(children.into_iter().collect()))
        }
        InstitutionType::Institution | InstitutionType::University => Ok(AccessScope::All),
    }
}

/// True only for the types allowed to author letters, letterheads, students
/// and other owned resources.
pub fn has_write_permission(institution_type: InstitutionType) -> bool {
    matches!(institution_type, InstitutionType::StudyProgram | InstitutionType::Faculty)
}

/// Scope plus write eligibility for one staff member.
#[derive(Debug, Clone)]
pub struct PersonnelAccess {
    pub institution_id: Uuid,
    pub institution_type: InstitutionType,
    pub scope: AccessScope,
    pub can_write: bool,
}

/// Load a personnel row and its institution and resolve their access in one
/// step. The stored institution binding wins over whatever the caller's
/// claims carry.
pub async fn resolve_for_personnel(
    store: &dyn Store,
    personnel: &PersonnelRef,
) -> Result<PersonnelAccess, StoreError> {
    let row = store
        .personnel(personnel.id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Personnel not found".to_string()))?;
    let institution = store
        .institution(row.institution_id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Institution not found".to_string()))?;

    let scope =
        resolve_accessible_ids(store, institution.id, institution.institution_type).await?;

    Ok(PersonnelAccess {
        institution_id: institution.id,
        institution_type: institution.institution_type,
        scope,
        can_write: has_write_permission(institution.institution_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_permission_is_exhaustive() {
        assert!(has_write_permission(InstitutionType::StudyProgram));
        assert!(has_write_permission(InstitutionType::Faculty));
        assert!(!has_write_permission(InstitutionType::Institution));
        assert!(!has_write_permission(InstitutionType::University));
    }

    #[test]
    fn all_is_distinct_from_empty() {
        let empty = AccessScope::Ids(HashSet::new());
        assert!(!empty.is_all());
        assert!(!empty.allows(Uuid::new_v4()));
        assert!(AccessScope::All.allows(Uuid::new_v4()));
    }

    #[test]
    fn singleton_scope_contains_its_id() {
        let id = Uuid::new_v4();
        let scope = AccessScope::only(id);
        assert!(scope.allows(id));
        assert!(!scope.allows(Uuid::new_v4()));
    }
}
