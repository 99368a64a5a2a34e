//! People administration: officials named on signature slots, students, and
//! staff accounts. Every creation passes the same write guard as letter
//! authoring, so only admins and writing staff may add people, and only
//! inside their resolved scope.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Official, Personnel, Student};
use crate::database::store::Store;
use crate::services::{write_target, ServiceError, ServiceResult};
use crate::types::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfficial {
    pub name: String,
    pub occupation: String,
    pub unique_code: Option<String>,
    pub institution_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    pub user_id: Uuid,
    pub fullname: String,
    pub nim: String,
    pub class_year: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub birthplace: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<String>,
    pub institution_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonnel {
    pub user_id: Uuid,
    pub position: Option<String>,
    pub institution_id: Option<Uuid>,
}

pub struct PersonService {
    store: Arc<dyn Store>,
}

impl PersonService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register an official so letters can name them on signature slots.
    pub async fn create_official(
        &self,
        identity: &Identity,
        request: CreateOfficial,
    ) -> ServiceResult<Official> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::validation("name", "name is required"));
        }
        let institution_id =
            write_target(self.store.as_ref(), identity, request.institution_id).await?;
        let official = Official {
            id: Uuid::new_v4(),
            name: request.name,
            occupation: request.occupation,
            unique_code: request.unique_code,
            institution_id,
        };
        self.store.insert_official(official.clone()).await?;
        Ok(official)
    }

    pub async fn create_student(
        &self,
        identity: &Identity,
        request: CreateStudent,
    ) -> ServiceResult<Student> {
        if request.nim.trim().is_empty() {
            return Err(ServiceError::validation("nim", "nim is required"));
        }
        let institution_id =
            write_target(self.store.as_ref(), identity, request.institution_id).await?;
        let student = Student {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            fullname: request.fullname,
            nim: request.nim,
            class_year: request.class_year,
            address: request.address,
            phone_number: request.phone_number,
            birthplace: request.birthplace,
            birthday: request.birthday,
            gender: request.gender,
            institution_id,
        };
        self.store.insert_student(student.clone()).await?;
        Ok(student)
    }

    /// Bind a staff account to an institution. The binding decides the
    /// caller's scope from then on.
    pub async fn create_personnel(
        &self,
        identity: &Identity,
        request: CreatePersonnel,
    ) -> ServiceResult<Personnel> {
        let institution_id =
            write_target(self.store.as_ref(), identity, request.institution_id).await?;
        let personnel = Personnel {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            institution_id,
            position: request.position,
        };
        self.store.insert_personnel(personnel.clone()).await?;
        Ok(personnel)
    }
}
