//! Submission lifecycle: creation validation, verification, terminal-state
//! rules, scoped listing, and stored-file cleanup.

mod common;

use chrono::NaiveDate;
use common::Fixture;
use surat_api::database::models::{SubmissionKind, SubmissionStatus};
use surat_api::services::files::UploadedFile;
use surat_api::services::submission::{
    AddAttachment, AttributeAnswer, CreateSubmission, ListSubmissions, SubmissionService,
    VerifySubmission,
};
use surat_api::services::ServiceError;

fn service(fx: &Fixture) -> SubmissionService {
    SubmissionService::new(fx.store.clone())
}

fn upload(fx: &Fixture, name: &str, mime: &str) -> surat_api::services::submission::DocumentUpload {
    surat_api::services::submission::DocumentUpload {
        letter_document_id: fx.doc_transcript,
        file: UploadedFile {
            file_path: common::stored_file(name),
            mime_type: mime.to_string(),
        },
    }
}

fn valid_request(fx: &Fixture) -> CreateSubmission {
    CreateSubmission {
        letter_id: fx.letter,
        name: "SKA Budi".to_string(),
        attributes: vec![
            AttributeAnswer {
                letter_attribute_id: fx.attr_purpose,
                content: "pengajuan beasiswa".to_string(),
            },
        ],
        documents: vec![upload(fx, "transkrip.pdf", "application/pdf")],
        carbon_copy: None,
    }
}

fn verify_request() -> VerifySubmission {
    VerifySubmission {
        letter_number: "001/SKA/2024".to_string(),
        letter_date: NaiveDate::from_ymd_opt(2024, 8, 17).unwrap(),
        attributes: vec![],
    }
}

#[tokio::test]
async fn create_rejects_blank_required_attribute_by_name() {
    let fx = common::setup().await;
    let mut request = valid_request(&fx);
    request.attributes[0].content = "   ".to_string();

    let err = service(&fx)
        .create(&fx.student(), SubmissionKind::Student, request)
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation { field, .. } => assert_eq!(field, "keperluan"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn create_requires_exact_document_count() {
    let fx = common::setup().await;
    let mut request = valid_request(&fx);
    request.documents.clear();

    let err = service(&fx)
        .create(&fx.student(), SubmissionKind::Student, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
}

#[tokio::test]
async fn create_rejects_wrong_mime_and_discards_the_files() {
    let fx = common::setup().await;
    let mut request = valid_request(&fx);
    request.documents = vec![upload(&fx, "transkrip.png", "image/png")];
    let stored = common::uploads_root().join(&request.documents[0].file.file_path);
    assert!(stored.exists());

    let err = service(&fx)
        .create(&fx.student(), SubmissionKind::Student, request)
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation { field, .. } => assert_eq!(field, "Transkrip"),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!stored.exists());
}

#[tokio::test]
async fn create_starts_pending_with_signature_snapshots() {
    let fx = common::setup().await;
    let created = service(&fx)
        .create(&fx.student(), SubmissionKind::Student, valid_request(&fx))
        .await
        .unwrap();

    assert_eq!(created.status, SubmissionStatus::Pending);
    assert_eq!(created.institution_id, fx.study_program);
    assert!(!created.token.is_empty());
    assert!(created.letter_number.is_none());

    let slots = fx.store.submission_signatures(created.id).await.unwrap();
    assert_eq!(slots.len(), 2);
    let dean = slots.iter().find(|s| s.official_id == fx.official_dean).unwrap();
    assert_eq!(dean.official_name, "Dr. Siti Rahayu");
    assert_eq!(dean.occupation, "Dekan");
    assert!(dean.is_acknowledged);
    for slot in &slots {
        assert_eq!(slot.code.len(), 6);
        assert!(slot.code.chars().all(|c| c.is_ascii_digit()));
        assert!(slot.verified_at.is_none());
    }
    assert_ne!(slots[0].token, slots[1].token);
}

#[tokio::test]
async fn verify_assigns_number_and_waits_for_signatures() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let mut request = verify_request();
    request.attributes.push(AttributeAnswer {
        letter_attribute_id: fx.attr_purpose,
        content: "pengajuan beasiswa LPDP".to_string(),
    });
    let verified =
        svc.verify(&fx.staff(fx.program_staff), created.id, request).await.unwrap();

    assert_eq!(verified.status, SubmissionStatus::WaitingSignature);
    assert_eq!(verified.letter_number.as_deref(), Some("001/SKA/2024"));
    assert!(verified.letter_date.is_some());

    let answers = fx.store.attribute_submissions(created.id).await.unwrap();
    let purpose = answers.iter().find(|a| a.letter_attribute_id == fx.attr_purpose).unwrap();
    assert_eq!(purpose.content, "pengajuan beasiswa LPDP");
}

#[tokio::test]
async fn verify_with_no_signature_slots_approves_outright() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let request = CreateSubmission {
        letter_id: fx.plain_letter,
        name: "Pengantar".to_string(),
        attributes: vec![],
        documents: vec![],
        carbon_copy: None,
    };
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, request).await.unwrap();

    let verified =
        svc.verify(&fx.staff(fx.program_staff), created.id, verify_request()).await.unwrap();
    assert_eq!(verified.status, SubmissionStatus::Approved);
}

#[tokio::test]
async fn students_cannot_verify() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let err = svc.verify(&fx.student(), created.id, verify_request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn terminal_submissions_are_immutable() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let staff = fx.staff(fx.program_staff);
    svc.change_status(&staff, created.id, SubmissionStatus::Rejected).await.unwrap();

    let err = svc.update_carbon_copy(&staff, created.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    let err = svc
        .change_status(&staff, created.id, SubmissionStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    let err = svc.verify(&staff, created.id, verify_request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn review_is_scoped_to_the_reviewers_institutions() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let err = svc
        .verify(&fx.staff(fx.sibling_staff), created.id, verify_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = svc
        .change_status(&fx.staff(fx.other_faculty_staff), created.id, SubmissionStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Still untouched for the reviewer who actually owns it.
    let row = fx.store.submission(created.id).await.unwrap().unwrap();
    assert_eq!(row.status, SubmissionStatus::Pending);
    assert!(row.letter_number.is_none());
}

#[tokio::test]
async fn staff_attachments_reach_the_rendered_letter_when_visible() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let staff = fx.staff(fx.program_staff);
    svc.add_attachment(
        &staff,
        created.id,
        AddAttachment { content: "<p>Lampiran nilai</p>".to_string(), is_visible: true },
    )
    .await
    .unwrap();
    svc.add_attachment(
        &staff,
        created.id,
        AddAttachment { content: "<p>Catatan internal</p>".to_string(), is_visible: false },
    )
    .await
    .unwrap();

    let detail = svc.find_one(&staff, created.id).await.unwrap();
    assert_eq!(detail.attachments.len(), 2);

    let view = svc.letter_view(&created.token).await.unwrap();
    assert_eq!(view.attachments, vec!["<p>Lampiran nilai</p>".to_string()]);

    // Students may not append pages, and finalized submissions are closed.
    let err = svc
        .add_attachment(
            &fx.student(),
            created.id,
            AddAttachment { content: "<p>x</p>".to_string(), is_visible: true },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    svc.change_status(&staff, created.id, SubmissionStatus::Rejected).await.unwrap();
    let err = svc
        .add_attachment(
            &staff,
            created.id,
            AddAttachment { content: "<p>x</p>".to_string(), is_visible: true },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn listing_is_scoped_by_role_and_institution() {
    let fx = common::setup().await;
    let svc = service(&fx);
    svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let admin_page = svc.find_all(&fx.admin(), ListSubmissions::default()).await.unwrap();
    assert_eq!(admin_page.total, 1);

    let faculty_page = svc
        .find_all(&fx.staff(fx.faculty_staff), ListSubmissions::default())
        .await
        .unwrap();
    assert_eq!(faculty_page.total, 1);

    let sibling_page = svc
        .find_all(&fx.staff(fx.sibling_staff), ListSubmissions::default())
        .await
        .unwrap();
    assert_eq!(sibling_page.total, 0);

    let other_page = svc
        .find_all(&fx.staff(fx.other_faculty_staff), ListSubmissions::default())
        .await
        .unwrap();
    assert_eq!(other_page.total, 0);

    let student_page = svc.find_all(&fx.student(), ListSubmissions::default()).await.unwrap();
    assert_eq!(student_page.total, 1);
}

#[tokio::test]
async fn search_matches_name_and_letter_number() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();
    svc.verify(&fx.staff(fx.program_staff), created.id, verify_request()).await.unwrap();

    let by_name = svc
        .find_all(
            &fx.admin(),
            ListSubmissions { search: Some("budi".to_string()), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(by_name.total, 1);

    let by_number = svc
        .find_all(
            &fx.admin(),
            ListSubmissions { search: Some("001/SKA".to_string()), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(by_number.total, 1);

    let miss = svc
        .find_all(
            &fx.admin(),
            ListSubmissions { search: Some("tidak ada".to_string()), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(miss.total, 0);
}

#[tokio::test]
async fn remove_deletes_the_stored_files() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let created =
        svc.create(&fx.student(), SubmissionKind::Student, valid_request(&fx)).await.unwrap();

    let documents = fx.store.document_submissions(created.id).await.unwrap();
    let stored = common::uploads_root().join(&documents[0].file_path);
    assert!(stored.exists());

    svc.remove(&fx.staff(fx.program_staff), created.id).await.unwrap();
    assert!(!stored.exists());
    assert!(fx.store.submission(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn general_submissions_belong_to_the_issuing_institution() {
    let fx = common::setup().await;
    let svc = service(&fx);
    let request = CreateSubmission {
        letter_id: fx.plain_letter,
        name: "Pengantar umum".to_string(),
        attributes: vec![],
        documents: vec![],
        carbon_copy: None,
    };
    let created = svc
        .create(&fx.staff(fx.program_staff), SubmissionKind::General, request)
        .await
        .unwrap();

    assert_eq!(created.kind, SubmissionKind::General);
    assert_eq!(created.institution_id, fx.study_program);
    assert!(created.student_id.is_none());
}
