//! Signature collection: token resolution, atomic marking, and resets.

mod common;

use common::Fixture;
use surat_api::database::models::SubmissionKind;
use surat_api::database::store::StoreError;
use surat_api::services::files::UploadedFile;
use surat_api::services::signature::SignatureService;
use surat_api::services::submission::{
    AttributeAnswer, CreateSubmission, DocumentUpload, SubmissionService,
};
use surat_api::services::ServiceError;
use uuid::Uuid;

async fn submission_with_slots(fx: &Fixture) -> Uuid {
    let request = CreateSubmission {
        letter_id: fx.letter,
        name: "SKA Budi".to_string(),
        attributes: vec![AttributeAnswer {
            letter_attribute_id: fx.attr_purpose,
            content: "beasiswa".to_string(),
        }],
        documents: vec![DocumentUpload {
            letter_document_id: fx.doc_transcript,
            file: UploadedFile {
                file_path: common::stored_file("transkrip.pdf"),
                mime_type: "application/pdf".to_string(),
            },
        }],
        carbon_copy: None,
    };
    SubmissionService::new(fx.store.clone())
        .create(&fx.student(), SubmissionKind::Student, request)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn token_resolves_to_a_public_safe_view() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slots = fx.store.submission_signatures(submission_id).await.unwrap();
    let svc = SignatureService::new(fx.store.clone());

    let view = svc.find_by_token(&slots[0].token).await.unwrap();
    assert_eq!(view.id, slots[0].id);
    assert_eq!(view.code, slots[0].code);
    assert_eq!(view.letter_name, "Surat Keterangan Aktif");
    assert_eq!(view.submission_name, "SKA Budi");
    assert!(!view.signed);

    let err = svc.find_by_token("no-such-token").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn double_signing_conflicts_and_keeps_the_first_mark() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slot = fx.store.submission_signatures(submission_id).await.unwrap().remove(0);
    let svc = SignatureService::new(fx.store.clone());

    let signed = svc.submit_mark(slot.id, "data:image/png;base64,Zmlyc3Q=").await.unwrap();
    assert!(signed.verified_at.is_some());
    let first_at = signed.verified_at;

    let err = svc.submit_mark(slot.id, "data:image/png;base64,c2Vjb25k").await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));

    let stored = fx.store.signature(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.signature.as_deref(), Some("data:image/png;base64,Zmlyc3Q="));
    assert_eq!(stored.verified_at, first_at);
}

#[tokio::test]
async fn concurrent_marks_produce_exactly_one_winner() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slot = fx.store.submission_signatures(submission_id).await.unwrap().remove(0);

    let a = {
        let store = fx.store.clone();
        let id = slot.id;
        tokio::spawn(async move {
            SignatureService::new(store).submit_mark(id, "mark-a").await
        })
    };
    let b = {
        let store = fx.store.clone();
        let id = slot.id;
        tokio::spawn(async move {
            SignatureService::new(store).submit_mark(id, "mark-b").await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn reset_rotates_the_code_but_not_the_token() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slot = fx.store.submission_signatures(submission_id).await.unwrap().remove(0);
    let svc = SignatureService::new(fx.store.clone());

    svc.submit_mark(slot.id, "mark").await.unwrap();
    let reset = svc.reset(&fx.staff(fx.program_staff), slot.id).await.unwrap();

    assert!(reset.signature.is_none());
    assert!(reset.verified_at.is_none());
    assert_ne!(reset.code, slot.code);
    assert_eq!(reset.code.len(), 6);
    assert_eq!(reset.token, slot.token);

    // The already-distributed link keeps working and signing is possible again.
    let view = svc.find_by_token(&slot.token).await.unwrap();
    assert!(!view.signed);
    svc.submit_mark(slot.id, "mark-again").await.unwrap();
}

#[tokio::test]
async fn reset_requires_staff() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slot = fx.store.submission_signatures(submission_id).await.unwrap().remove(0);
    let svc = SignatureService::new(fx.store.clone());

    let err = svc.reset(&fx.student(), slot.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn empty_marks_are_rejected() {
    let fx = common::setup().await;
    let submission_id = submission_with_slots(&fx).await;
    let slot = fx.store.submission_signatures(submission_id).await.unwrap().remove(0);
    let svc = SignatureService::new(fx.store.clone());

    let err = svc.submit_mark(slot.id, "  ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
    let stored = fx.store.signature(slot.id).await.unwrap().unwrap();
    assert!(stored.verified_at.is_none());
}
