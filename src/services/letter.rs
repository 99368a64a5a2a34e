//! Letter-type and letterhead administration. Mutations pass the write
//! guard: only study-program and faculty staff may author, and only inside
//! their resolved scope. Admin identities bypass the guard but must name the
//! owning institution explicitly.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::access::{resolve_for_personnel, AccessScope};
use crate::database::models::{
    Letter, LetterAttribute, LetterDocument, LetterSignatureTemplate, LetterTemplate, Letterhead,
    SignaturePosition,
};
use crate::database::store::Store;
use crate::services::{ServiceError, ServiceResult};
use crate::types::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttribute {
    pub attribute_name: String,
    #[serde(default)]
    pub is_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub document_name: String,
    pub file_type: String,
    #[serde(default)]
    pub is_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignatureSlot {
    pub official_id: Uuid,
    pub position: SignaturePosition,
    #[serde(default)]
    pub is_acknowledged: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLetter {
    pub letter_name: String,
    pub reference_number: Option<String>,
    pub category: Option<String>,
    pub institution_id: Option<Uuid>,
    pub letterhead_id: Option<Uuid>,
    pub template_content: String,
    #[serde(default)]
    pub attributes: Vec<NewAttribute>,
    #[serde(default)]
    pub documents: Vec<NewDocument>,
    #[serde(default)]
    pub signatures: Vec<NewSignatureSlot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLetterhead {
    pub name: String,
    pub institution_id: Option<Uuid>,
    pub logo: Option<String>,
    pub header: String,
    pub subheader: Option<String>,
    pub address: Option<String>,
}

/// Full letter definition for detail responses.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterDetail {
    #[serde(flatten)]
    pub letter: Letter,
    pub template: Option<LetterTemplate>,
    pub attributes: Vec<LetterAttribute>,
    pub documents: Vec<LetterDocument>,
    pub signatures: Vec<LetterSignatureTemplate>,
}

pub struct LetterService {
    store: Arc<dyn Store>,
}

impl LetterService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve the institution a mutation targets, enforcing the write guard.
    async fn target_institution(
        &self,
        identity: &Identity,
        requested: Option<Uuid>,
    ) -> ServiceResult<Uuid> {
        crate::services::write_target(self.store.as_ref(), identity, requested).await
    }

    async fn read_scope(&self, identity: &Identity) -> ServiceResult<AccessScope> {
        if identity.is_admin() {
            return Ok(AccessScope::All);
        }
        let personnel = identity
            .personnel
            .as_ref()
            .ok_or_else(|| ServiceError::Forbidden("Staff role required".to_string()))?;
        let access = resolve_for_personnel(self.store.as_ref(), personnel).await?;
        Ok(access.scope)
    }

    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateLetter,
    ) -> ServiceResult<LetterDetail> {
        let institution_id = self.target_institution(identity, request.institution_id).await?;

        if let Some(letterhead_id) = request.letterhead_id {
            self.store
                .letterhead(letterhead_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Letterhead not found".to_string()))?;
        }

        let letter = Letter {
            id: Uuid::new_v4(),
            institution_id,
            letter_name: request.letter_name,
            reference_number: request.reference_number,
            category: request.category,
            letterhead_id: request.letterhead_id,
        };
        self.store.insert_letter(letter.clone()).await?;

        let template = LetterTemplate {
            id: Uuid::new_v4(),
            letter_id: letter.id,
            content: request.template_content,
        };
        self.store.insert_letter_template(template.clone()).await?;

        let mut attributes = Vec::new();
        for attribute in request.attributes {
            let row = LetterAttribute {
                id: Uuid::new_v4(),
                letter_id: letter.id,
                attribute_name: attribute.attribute_name,
                is_required: attribute.is_required,
            };
            self.store.insert_letter_attribute(row.clone()).await?;
            attributes.push(row);
        }

        let mut documents = Vec::new();
        for document in request.documents {
            let row = LetterDocument {
                id: Uuid::new_v4(),
                letter_id: letter.id,
                document_name: document.document_name,
                file_type: document.file_type,
                is_required: document.is_required,
            };
            self.store.insert_letter_document(row.clone()).await?;
            documents.push(row);
        }

        let mut signatures = Vec::new();
        for slot in request.signatures {
            self.store
                .official(slot.official_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Official not found".to_string()))?;
            let row = LetterSignatureTemplate {
                id: Uuid::new_v4(),
                letter_id: letter.id,
                official_id: slot.official_id,
                position: slot.position,
                is_acknowledged: slot.is_acknowledged,
            };
            self.store.insert_signature_template(row.clone()).await?;
            signatures.push(row);
        }

        Ok(LetterDetail { letter, template: Some(template), attributes, documents, signatures })
    }

    pub async fn find_all(&self, identity: &Identity) -> ServiceResult<Vec<Letter>> {
        let scope = self.read_scope(identity).await?;
        Ok(self.store.letters_in(&scope).await?)
    }

    pub async fn find_one(&self, identity: &Identity, id: Uuid) -> ServiceResult<LetterDetail> {
        let scope = self.read_scope(identity).await?;
        let letter = self
            .store
            .letter(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letter not found".to_string()))?;
        if !scope.allows(letter.institution_id) {
            return Err(ServiceError::Forbidden(
                "Letter is outside your institution scope".to_string(),
            ));
        }
        Ok(LetterDetail {
            template: self.store.letter_template(id).await?,
            attributes: self.store.letter_attributes(id).await?,
            documents: self.store.letter_documents(id).await?,
            signatures: self.store.signature_templates(id).await?,
            letter,
        })
    }

    pub async fn create_letterhead(
        &self,
        identity: &Identity,
        request: CreateLetterhead,
    ) -> ServiceResult<Letterhead> {
        let institution_id = self.target_institution(identity, request.institution_id).await?;
        let letterhead = Letterhead {
            id: Uuid::new_v4(),
            institution_id,
            name: request.name,
            logo: request.logo,
            header: request.header,
            subheader: request.subheader,
            address: request.address,
        };
        self.store.insert_letterhead(letterhead.clone()).await?;
        Ok(letterhead)
    }

    pub async fn find_letterhead(
        &self,
        identity: &Identity,
        id: Uuid,
    ) -> ServiceResult<Letterhead> {
        let scope = self.read_scope(identity).await?;
        let letterhead = self
            .store
            .letterhead(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Letterhead not found".to_string()))?;
        if !scope.allows(letterhead.institution_id) {
            return Err(ServiceError::Forbidden(
                "Letterhead is outside your institution scope".to_string(),
            ));
        }
        Ok(letterhead)
    }
}
