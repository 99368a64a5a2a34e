//! Shared fixture for the integration suites: an in-memory store seeded with
//! an institution tree, people, and a couple of letter definitions.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use surat_api::database::memory::MemStore;
use surat_api::database::models::{
    Institution, InstitutionType, Letter, LetterAttribute, LetterDocument,
    LetterSignatureTemplate, LetterTemplate, Letterhead, Official, Personnel, SignaturePosition,
    Student,
};
use surat_api::database::store::Store;
use surat_api::types::{Identity, PersonnelRef};

static UPLOADS: OnceLock<tempfile::TempDir> = OnceLock::new();

/// Process-wide uploads root, exported before the config singleton is first
/// touched so file cleanup lands in a temp dir.
pub fn uploads_root() -> PathBuf {
    let dir = UPLOADS.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tempdir");
        std::env::set_var("UPLOADS_PUBLIC_DIR", dir.path());
        dir
    });
    dir.path().to_path_buf()
}

pub struct Fixture {
    pub store: Arc<dyn Store>,

    pub university: Uuid,
    pub faculty: Uuid,
    pub study_program: Uuid,
    pub sibling_program: Uuid,
    pub other_faculty: Uuid,

    pub university_staff: PersonnelRef,
    pub faculty_staff: PersonnelRef,
    pub program_staff: PersonnelRef,
    pub sibling_staff: PersonnelRef,
    pub other_faculty_staff: PersonnelRef,

    pub student_id: Uuid,
    pub student_user: Uuid,

    pub official_dean: Uuid,
    pub official_head: Uuid,

    /// Letter with one required attribute, one optional attribute, one
    /// required pdf slot and two signature slots (the dean acknowledging).
    pub letter: Uuid,
    pub attr_purpose: Uuid,
    pub attr_semester: Uuid,
    pub doc_transcript: Uuid,

    /// Letter with no attributes, documents or signature slots.
    pub plain_letter: Uuid,

    pub letterhead: Uuid,
}

impl Fixture {
    pub fn admin(&self) -> Identity {
        Identity::admin(Uuid::new_v4())
    }

    pub fn student(&self) -> Identity {
        Identity::student(self.student_user, self.student_id)
    }

    pub fn staff(&self, personnel: PersonnelRef) -> Identity {
        Identity::personnel(Uuid::new_v4(), personnel)
    }
}

async fn institution(
    store: &dyn Store,
    name: &str,
    institution_type: InstitutionType,
    parent_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    store
        .insert_institution(Institution {
            id,
            name: name.to_string(),
            institution_type,
            parent_id,
        })
        .await
        .expect("insert institution");
    id
}

async fn personnel(store: &dyn Store, institution_id: Uuid) -> PersonnelRef {
    let id = Uuid::new_v4();
    store
        .insert_personnel(Personnel {
            id,
            user_id: Uuid::new_v4(),
            institution_id,
            position: None,
        })
        .await
        .expect("insert personnel");
    PersonnelRef { id, institution_id }
}

pub async fn setup() -> Fixture {
    uploads_root();

    let store: Arc<dyn Store> = Arc::new(MemStore::new());

    let university =
        institution(store.as_ref(), "Universitas Contoh", InstitutionType::University, None).await;
    let faculty = institution(
        store.as_ref(),
        "Fakultas Teknik",
        InstitutionType::Faculty,
        Some(university),
    )
    .await;
    let study_program = institution(
        store.as_ref(),
        "Teknik Informatika",
        InstitutionType::StudyProgram,
        Some(faculty),
    )
    .await;
    let sibling_program = institution(
        store.as_ref(),
        "Teknik Elektro",
        InstitutionType::StudyProgram,
        Some(faculty),
    )
    .await;
    let other_faculty = institution(
        store.as_ref(),
        "Fakultas Ekonomi",
        InstitutionType::Faculty,
        Some(university),
    )
    .await;

    let university_staff = personnel(store.as_ref(), university).await;
    let faculty_staff = personnel(store.as_ref(), faculty).await;
    let program_staff = personnel(store.as_ref(), study_program).await;
    let sibling_staff = personnel(store.as_ref(), sibling_program).await;
    let other_faculty_staff = personnel(store.as_ref(), other_faculty).await;

    let student_id = Uuid::new_v4();
    let student_user = Uuid::new_v4();
    store
        .insert_student(Student {
            id: student_id,
            user_id: student_user,
            fullname: "Budi Santoso".to_string(),
            nim: "2110001".to_string(),
            class_year: Some("2021".to_string()),
            address: Some("Jl. Merdeka 1".to_string()),
            phone_number: Some("081234567890".to_string()),
            birthplace: Some("Bandung".to_string()),
            birthday: chrono::NaiveDate::from_ymd_opt(2003, 5, 14),
            gender: Some("Laki-laki".to_string()),
            institution_id: study_program,
        })
        .await
        .expect("insert student");

    let official_dean = Uuid::new_v4();
    store
        .insert_official(Official {
            id: official_dean,
            name: "Dr. Siti Rahayu".to_string(),
            occupation: "Dekan".to_string(),
            unique_code: Some("DKN-01".to_string()),
            institution_id: faculty,
        })
        .await
        .expect("insert official");
    let official_head = Uuid::new_v4();
    store
        .insert_official(Official {
            id: official_head,
            name: "Ir. Agus Wibowo".to_string(),
            occupation: "Ketua Program Studi".to_string(),
            unique_code: Some("KPS-01".to_string()),
            institution_id: study_program,
        })
        .await
        .expect("insert official");

    let letterhead = Uuid::new_v4();
    store
        .insert_letterhead(Letterhead {
            id: letterhead,
            institution_id: study_program,
            name: "Kop Prodi".to_string(),
            logo: None,
            header: "Universitas Contoh".to_string(),
            subheader: Some("Fakultas Teknik".to_string()),
            address: Some("Jl. Kampus 1, Bandung".to_string()),
        })
        .await
        .expect("insert letterhead");

    let letter = Uuid::new_v4();
    store
        .insert_letter(Letter {
            id: letter,
            institution_id: study_program,
            letter_name: "Surat Keterangan Aktif".to_string(),
            reference_number: Some("SKA".to_string()),
            category: None,
            letterhead_id: Some(letterhead),
        })
        .await
        .expect("insert letter");
    store
        .insert_letter_template(LetterTemplate {
            id: Uuid::new_v4(),
            letter_id: letter,
            content: "<p>Menerangkan bahwa [nama_mahasiswa] ([nim]) dari [program_studi] \
                      memerlukan surat untuk [keperluan]. Nomor: [nomor_surat], tanggal \
                      [tanggal_surat] / [tanggal_hijriah].</p>"
                .to_string(),
        })
        .await
        .expect("insert template");

    let attr_purpose = Uuid::new_v4();
    store
        .insert_letter_attribute(LetterAttribute {
            id: attr_purpose,
            letter_id: letter,
            attribute_name: "keperluan".to_string(),
            is_required: true,
        })
        .await
        .expect("insert attribute");
    let attr_semester = Uuid::new_v4();
    store
        .insert_letter_attribute(LetterAttribute {
            id: attr_semester,
            letter_id: letter,
            attribute_name: "semester".to_string(),
            is_required: false,
        })
        .await
        .expect("insert attribute");

    let doc_transcript = Uuid::new_v4();
    store
        .insert_letter_document(LetterDocument {
            id: doc_transcript,
            letter_id: letter,
            document_name: "Transkrip".to_string(),
            file_type: "pdf".to_string(),
            is_required: true,
        })
        .await
        .expect("insert document");

    store
        .insert_signature_template(LetterSignatureTemplate {
            id: Uuid::new_v4(),
            letter_id: letter,
            official_id: official_dean,
            position: SignaturePosition::BottomLeft,
            is_acknowledged: true,
        })
        .await
        .expect("insert signature template");
    store
        .insert_signature_template(LetterSignatureTemplate {
            id: Uuid::new_v4(),
            letter_id: letter,
            official_id: official_head,
            position: SignaturePosition::BottomRight,
            is_acknowledged: false,
        })
        .await
        .expect("insert signature template");

    let plain_letter = Uuid::new_v4();
    store
        .insert_letter(Letter {
            id: plain_letter,
            institution_id: study_program,
            letter_name: "Surat Pengantar".to_string(),
            reference_number: None,
            category: None,
            letterhead_id: None,
        })
        .await
        .expect("insert letter");
    store
        .insert_letter_template(LetterTemplate {
            id: Uuid::new_v4(),
            letter_id: plain_letter,
            content: "<p>Pengantar untuk [nama_mahasiswa].</p>".to_string(),
        })
        .await
        .expect("insert template");

    Fixture {
        store,
        university,
        faculty,
        study_program,
        sibling_program,
        other_faculty,
        university_staff,
        faculty_staff,
        program_staff,
        sibling_staff,
        other_faculty_staff,
        student_id,
        student_user,
        official_dean,
        official_head,
        letter,
        attr_purpose,
        attr_semester,
        doc_transcript,
        plain_letter,
        letterhead,
    }
}

/// Write a real file under the uploads root and return its relative path.
pub fn stored_file(name: &str) -> String {
    let relative = format!("docs/{}-{}", Uuid::new_v4(), name);
    let path = uploads_root().join(&relative);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, b"%PDF-1.4 test").expect("write");
    relative
}
