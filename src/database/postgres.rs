//! Postgres-backed Store.
//!
//! All queries are runtime-checked so the crate builds without a live
//! database. Submission rows carry a JSONB carbon copy column, so they are
//! mapped by hand instead of via FromRow.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::access::AccessScope;
use crate::config::config;
use crate::database::models::{
    CarbonCopy, DocumentSubmission, Institution, Letter, LetterAttachment, LetterAttribute,
    LetterAttributeSubmission, LetterDocument, LetterSignature, LetterSignatureTemplate,
    LetterTemplate, Letterhead, Official, Personnel, Student, Submission, SubmissionStatus,
};
use crate::database::store::{
    NewSubmission, Page, Store, StoreError, StoreResult, SubmissionFilter,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using the pool settings from configuration.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db_config = &config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(db_config.connection_timeout))
            .connect(database_url)
            .await
            .map_err(map_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Internal(other.to_string()),
    }
}

fn submission_from_row(row: &PgRow) -> Result<Submission, sqlx::Error> {
    let carbon_copy: Option<serde_json::Value> = row.try_get("carbon_copy")?;
    let carbon_copy = match carbon_copy {
        Some(value) => Some(serde_json::from_value::<CarbonCopy>(value).map_err(|e| {
            sqlx::Error::ColumnDecode { index: "carbon_copy".to_string(), source: Box::new(e) }
        })?),
        None => None,
    };

    Ok(Submission {
        id: row.try_get("id")?,
        kind: row.try_get("kind")?,
        token: row.try_get("token")?,
        name: row.try_get("name")?,
        letter_id: row.try_get("letter_id")?,
        institution_id: row.try_get("institution_id")?,
        student_id: row.try_get("student_id")?,
        user_id: row.try_get("user_id")?,
        letter_number: row.try_get("letter_number")?,
        letter_date: row.try_get("letter_date")?,
        status: row.try_get("status")?,
        carbon_copy,
        created_at: row.try_get("created_at")?,
    })
}

fn carbon_copy_json(carbon_copy: &Option<CarbonCopy>) -> StoreResult<Option<serde_json::Value>> {
    carbon_copy
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StoreError::Internal(e.to_string()))
}

/// Append the filter's WHERE clause to a builder whose SQL already ends just
/// before WHERE. Used for both the page query and the count query so the two
/// always agree.
fn push_submission_filter(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &SubmissionFilter) {
    builder.push(" WHERE 1=1");
    if let Some(kind) = filter.kind {
        builder.push(" AND kind = ").push_bind(kind);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let AccessScope::Ids(ids) = &filter.scope {
        let ids: Vec<Uuid> = ids.iter().copied().collect();
        builder.push(" AND institution_id = ANY(").push_bind(ids).push(")");
    }
    if let Some(student_id) = filter.student_id {
        builder.push(" AND student_id = ").push_bind(student_id);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR letter_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_institution(&self, institution: Institution) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO institutions (id, name, type, parent_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(institution.id)
        .bind(&institution.name)
        .bind(institution.institution_type)
        .bind(institution.parent_id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn institution(&self, id: Uuid) -> StoreResult<Option<Institution>> {
        sqlx::query_as::<_, Institution>(
            "SELECT id, name, type AS institution_type, parent_id FROM institutions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn institutions_in(&self, scope: &AccessScope) -> StoreResult<Vec<Institution>> {
        match scope {
            AccessScope::All => sqlx::query_as::<_, Institution>(
                "SELECT id, name, type AS institution_type, parent_id FROM institutions \
                 ORDER BY name",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(map_err),
            AccessScope::Ids(ids) => {
                let ids: Vec<Uuid> = ids.iter().copied().collect();
                sqlx::query_as::<_, Institution>(
                    "SELECT id, name, type AS institution_type, parent_id FROM institutions \
                     WHERE id = ANY($1) ORDER BY name",
                )
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)
            }
        }
    }

    async fn child_institution_ids(&self, parent_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM institutions WHERE parent_id = $1")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.iter().map(|row| row.try_get("id").map_err(map_err)).collect()
    }

    async fn insert_personnel(&self, personnel: Personnel) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO personnel (id, user_id, institution_id, position) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(personnel.id)
        .bind(personnel.user_id)
        .bind(personnel.institution_id)
        .bind(&personnel.position)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn personnel(&self, id: Uuid) -> StoreResult<Option<Personnel>> {
        sqlx::query_as::<_, Personnel>(
            "SELECT id, user_id, institution_id, position FROM personnel WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_student(&self, student: Student) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO students (id, user_id, fullname, nim, class_year, address, \
             phone_number, birthplace, birthday, gender, institution_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(student.id)
        .bind(student.user_id)
        .bind(&student.fullname)
        .bind(&student.nim)
        .bind(&student.class_year)
        .bind(&student.address)
        .bind(&student.phone_number)
        .bind(&student.birthplace)
        .bind(student.birthday)
        .bind(&student.gender)
        .bind(student.institution_id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        sqlx::query_as::<_, Student>(
            "SELECT id, user_id, fullname, nim, class_year, address, phone_number, \
             birthplace, birthday, gender, institution_id FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_official(&self, official: Official) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO officials (id, name, occupation, unique_code, institution_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(official.id)
        .bind(&official.name)
        .bind(&official.occupation)
        .bind(&official.unique_code)
        .bind(official.institution_id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn official(&self, id: Uuid) -> StoreResult<Option<Official>> {
        sqlx::query_as::<_, Official>(
            "SELECT id, name, occupation, unique_code, institution_id FROM officials \
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_letter(&self, letter: Letter) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letters (id, institution_id, letter_name, reference_number, \
             category, letterhead_id) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(letter.id)
        .bind(letter.institution_id)
        .bind(&letter.letter_name)
        .bind(&letter.reference_number)
        .bind(&letter.category)
        .bind(letter.letterhead_id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn letter(&self, id: Uuid) -> StoreResult<Option<Letter>> {
        sqlx::query_as::<_, Letter>(
            "SELECT id, institution_id, letter_name, reference_number, category, \
             letterhead_id FROM letters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn letters_in(&self, scope: &AccessScope) -> StoreResult<Vec<Letter>> {
        match scope {
            AccessScope::All => sqlx::query_as::<_, Letter>(
                "SELECT id, institution_id, letter_name, reference_number, category, \
                 letterhead_id FROM letters ORDER BY letter_name",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(map_err),
            AccessScope::Ids(ids) => {
                let ids: Vec<Uuid> = ids.iter().copied().collect();
                sqlx::query_as::<_, Letter>(
                    "SELECT id, institution_id, letter_name, reference_number, category, \
                     letterhead_id FROM letters WHERE institution_id = ANY($1) \
                     ORDER BY letter_name",
                )
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)
            }
        }
    }

    async fn insert_letter_template(&self, template: LetterTemplate) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letter_templates (id, letter_id, content) VALUES ($1, $2, $3)",
        )
        .bind(template.id)
        .bind(template.letter_id)
        .bind(&template.content)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn letter_template(&self, letter_id: Uuid) -> StoreResult<Option<LetterTemplate>> {
        sqlx::query_as::<_, LetterTemplate>(
            "SELECT id, letter_id, content FROM letter_templates WHERE letter_id = $1",
        )
        .bind(letter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_letter_attribute(&self, attribute: LetterAttribute) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letter_attributes (id, letter_id, attribute_name, is_required) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(attribute.id)
        .bind(attribute.letter_id)
        .bind(&attribute.attribute_name)
        .bind(attribute.is_required)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn letter_attributes(&self, letter_id: Uuid) -> StoreResult<Vec<LetterAttribute>> {
        sqlx::query_as::<_, LetterAttribute>(
            "SELECT id, letter_id, attribute_name, is_required FROM letter_attributes \
             WHERE letter_id = $1 ORDER BY attribute_name",
        )
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_letter_document(&self, document: LetterDocument) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letter_documents (id, letter_id, document_name, file_type, \
             is_required) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(document.id)
        .bind(document.letter_id)
        .bind(&document.document_name)
        .bind(&document.file_type)
        .bind(document.is_required)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn letter_documents(&self, letter_id: Uuid) -> StoreResult<Vec<LetterDocument>> {
        sqlx::query_as::<_, LetterDocument>(
            "SELECT id, letter_id, document_name, file_type, is_required \
             FROM letter_documents WHERE letter_id = $1 ORDER BY document_name",
        )
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_signature_template(
        &self,
        template: LetterSignatureTemplate,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letter_signature_templates (id, letter_id, official_id, position, \
             is_acknowledged) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(template.id)
        .bind(template.letter_id)
        .bind(template.official_id)
        .bind(template.position)
        .bind(template.is_acknowledged)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn signature_templates(
        &self,
        letter_id: Uuid,
    ) -> StoreResult<Vec<LetterSignatureTemplate>> {
        sqlx::query_as::<_, LetterSignatureTemplate>(
            "SELECT id, letter_id, official_id, position, is_acknowledged \
             FROM letter_signature_templates WHERE letter_id = $1 ORDER BY position",
        )
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_letterhead(&self, letterhead: Letterhead) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letterheads (id, institution_id, name, logo, header, subheader, \
             address) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(letterhead.id)
        .bind(letterhead.institution_id)
        .bind(&letterhead.name)
        .bind(&letterhead.logo)
        .bind(&letterhead.header)
        .bind(&letterhead.subheader)
        .bind(&letterhead.address)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn letterhead(&self, id: Uuid) -> StoreResult<Option<Letterhead>> {
        sqlx::query_as::<_, Letterhead>(
            "SELECT id, institution_id, name, logo, header, subheader, address \
             FROM letterheads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_submission(&self, new: NewSubmission) -> StoreResult<Submission> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let s = &new.submission;
        sqlx::query(
            "INSERT INTO submissions (id, kind, token, name, letter_id, institution_id, \
             student_id, user_id, letter_number, letter_date, status, carbon_copy, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(s.id)
        .bind(s.kind)
        .bind(&s.token)
        .bind(&s.name)
        .bind(s.letter_id)
        .bind(s.institution_id)
        .bind(s.student_id)
        .bind(s.user_id)
        .bind(&s.letter_number)
        .bind(s.letter_date)
        .bind(s.status)
        .bind(carbon_copy_json(&s.carbon_copy)?)
        .bind(s.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        for attribute in &new.attributes {
            sqlx::query(
                "INSERT INTO letter_attribute_submissions (id, submission_id, \
                 letter_attribute_id, content) VALUES ($1, $2, $3, $4)",
            )
            .bind(attribute.id)
            .bind(attribute.submission_id)
            .bind(attribute.letter_attribute_id)
            .bind(&attribute.content)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        for document in &new.documents {
            sqlx::query(
                "INSERT INTO document_submissions (id, submission_id, letter_document_id, \
                 file_path) VALUES ($1, $2, $3, $4)",
            )
            .bind(document.id)
            .bind(document.submission_id)
            .bind(document.letter_document_id)
            .bind(&document.file_path)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        for signature in &new.signatures {
            sqlx::query(
                "INSERT INTO letter_signatures (id, submission_id, official_id, \
                 official_name, occupation, unique_code, position, is_acknowledged, token, \
                 code, signature, verified_at, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            )
            .bind(signature.id)
            .bind(signature.submission_id)
            .bind(signature.official_id)
            .bind(&signature.official_name)
            .bind(&signature.occupation)
            .bind(&signature.unique_code)
            .bind(signature.position)
            .bind(signature.is_acknowledged)
            .bind(&signature.token)
            .bind(&signature.code)
            .bind(&signature.signature)
            .bind(signature.verified_at)
            .bind(signature.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        tx.commit().await.map_err(map_err)?;
        Ok(new.submission)
    }

    async fn submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        let row = sqlx::query("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(submission_from_row).transpose().map_err(map_err)
    }

    async fn submission_by_token(&self, token: &str) -> StoreResult<Option<Submission>> {
        let row = sqlx::query("SELECT * FROM submissions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(submission_from_row).transpose().map_err(map_err)
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Page<Submission>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM submissions");
        push_submission_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?
            .try_get(0)
            .map_err(map_err)?;

        let mut builder = QueryBuilder::new("SELECT * FROM submissions");
        push_submission_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = builder.build().fetch_all(&self.pool).await.map_err(map_err)?;
        let data = rows
            .iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;

        Ok(Page { data, total })
    }

    async fn set_verified(
        &self,
        id: Uuid,
        letter_number: &str,
        letter_date: NaiveDate,
        status: SubmissionStatus,
    ) -> StoreResult<Submission> {
        let row = sqlx::query(
            "UPDATE submissions SET letter_number = $2, letter_date = $3, status = $4 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(letter_number)
        .bind(letter_date)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission_from_row(&row).map_err(map_err)
    }

    async fn set_status(&self, id: Uuid, status: SubmissionStatus) -> StoreResult<Submission> {
        let row = sqlx::query("UPDATE submissions SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission_from_row(&row).map_err(map_err)
    }

    async fn set_carbon_copy(
        &self,
        id: Uuid,
        carbon_copy: Option<CarbonCopy>,
    ) -> StoreResult<Submission> {
        let row = sqlx::query(
            "UPDATE submissions SET carbon_copy = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(carbon_copy_json(&carbon_copy)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| StoreError::NotFound("Submission not found".to_string()))?;
        submission_from_row(&row).map_err(map_err)
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        // Child rows go with the parent via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Submission not found".to_string()));
        }
        Ok(())
    }

    async fn attribute_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterAttributeSubmission>> {
        sqlx::query_as::<_, LetterAttributeSubmission>(
            "SELECT id, submission_id, letter_attribute_id, content \
             FROM letter_attribute_submissions WHERE submission_id = $1",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn amend_attribute(
        &self,
        submission_id: Uuid,
        letter_attribute_id: Uuid,
        content: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE letter_attribute_submissions SET content = $3 \
             WHERE submission_id = $1 AND letter_attribute_id = $2",
        )
        .bind(submission_id)
        .bind(letter_attribute_id)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Attribute submission not found".to_string()));
        }
        Ok(())
    }

    async fn document_submissions(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<DocumentSubmission>> {
        sqlx::query_as::<_, DocumentSubmission>(
            "SELECT id, submission_id, letter_document_id, file_path \
             FROM document_submissions WHERE submission_id = $1",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn replace_document(
        &self,
        submission_id: Uuid,
        letter_document_id: Uuid,
        file_path: &str,
    ) -> StoreResult<Option<String>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        let old: Option<String> = sqlx::query_scalar(
            "SELECT file_path FROM document_submissions \
             WHERE submission_id = $1 AND letter_document_id = $2 FOR UPDATE",
        )
        .bind(submission_id)
        .bind(letter_document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        if old.is_some() {
            sqlx::query(
                "UPDATE document_submissions SET file_path = $3 \
                 WHERE submission_id = $1 AND letter_document_id = $2",
            )
            .bind(submission_id)
            .bind(letter_document_id)
            .bind(file_path)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        } else {
            sqlx::query(
                "INSERT INTO document_submissions (id, submission_id, letter_document_id, \
                 file_path) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(submission_id)
            .bind(letter_document_id)
            .bind(file_path)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        tx.commit().await.map_err(map_err)?;
        Ok(old)
    }

    async fn insert_attachment(&self, attachment: LetterAttachment) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO letter_attachments (id, submission_id, content, is_visible) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(attachment.id)
        .bind(attachment.submission_id)
        .bind(&attachment.content)
        .bind(attachment.is_visible)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn attachments(&self, submission_id: Uuid) -> StoreResult<Vec<LetterAttachment>> {
        sqlx::query_as::<_, LetterAttachment>(
            "SELECT id, submission_id, content, is_visible FROM letter_attachments \
             WHERE submission_id = $1",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn submission_signatures(
        &self,
        submission_id: Uuid,
    ) -> StoreResult<Vec<LetterSignature>> {
        sqlx::query_as::<_, LetterSignature>(
            "SELECT * FROM letter_signatures WHERE submission_id = $1 ORDER BY position",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn signature(&self, id: Uuid) -> StoreResult<Option<LetterSignature>> {
        sqlx::query_as::<_, LetterSignature>("SELECT * FROM letter_signatures WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn signature_by_token(&self, token: &str) -> StoreResult<Option<LetterSignature>> {
        sqlx::query_as::<_, LetterSignature>(
            "SELECT * FROM letter_signatures WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn sign(
        &self,
        id: Uuid,
        mark: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<LetterSignature> {
        // The predicate on verified_at makes the check-and-set one statement;
        // a concurrent second signer matches zero rows.
        let signed = sqlx::query_as::<_, LetterSignature>(
            "UPDATE letter_signatures SET signature = $2, verified_at = $3 \
             WHERE id = $1 AND verified_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(mark)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        match signed {
            Some(signature) => Ok(signature),
            None => {
                let exists = sqlx::query("SELECT 1 FROM letter_signatures WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_err)?;
                if exists.is_some() {
                    Err(StoreError::Conflict("Signature already recorded".to_string()))
                } else {
                    Err(StoreError::NotFound("Letter signature not found".to_string()))
                }
            }
        }
    }

    async fn reset_signature(&self, id: Uuid, new_code: &str) -> StoreResult<LetterSignature> {
        sqlx::query_as::<_, LetterSignature>(
            "UPDATE letter_signatures SET signature = NULL, verified_at = NULL, code = $2 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| StoreError::NotFound("Letter signature not found".to_string()))
    }
}
