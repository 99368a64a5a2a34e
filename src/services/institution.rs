//! Institution tree administration. Creation is admin-only; listing is
//! scoped by the caller's resolved access.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::access::{resolve_for_personnel, AccessScope};
use crate::database::models::{Institution, InstitutionType};
use crate::database::store::Store;
use crate::services::{ServiceError, ServiceResult};
use crate::types::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstitution {
    pub name: String,
    #[serde(rename = "type")]
    pub institution_type: InstitutionType,
    pub parent_id: Option<Uuid>,
}

pub struct InstitutionService {
    store: Arc<dyn Store>,
}

impl InstitutionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateInstitution,
    ) -> ServiceResult<Institution> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden("Admin role required".to_string()));
        }
        if let Some(parent_id) = request.parent_id {
            self.store
                .institution(parent_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Parent institution not found".to_string()))?;
        }
        let institution = Institution {
            id: Uuid::new_v4(),
            name: request.name,
            institution_type: request.institution_type,
            parent_id: request.parent_id,
        };
        self.store.insert_institution(institution.clone()).await?;
        Ok(institution)
    }

    pub async fn find_all(&self, identity: &Identity) -> ServiceResult<Vec<Institution>> {
        let scope = if identity.is_admin() {
            AccessScope::All
        } else {
            let personnel = identity
                .personnel
                .as_ref()
                .ok_or_else(|| ServiceError::Forbidden("Staff role required".to_string()))?;
            resolve_for_personnel(self.store.as_ref(), personnel).await?.scope
        };
        Ok(self.store.institutions_in(&scope).await?)
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<Institution> {
        self.store
            .institution(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Institution not found".to_string()))
    }
}
