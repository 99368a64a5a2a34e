//! Institution access resolution against the seeded tree, and the write
//! guard on people administration.

mod common;

use std::collections::HashSet;

use surat_api::access::{resolve_for_personnel, AccessScope};
use surat_api::services::institution::InstitutionService;
use surat_api::services::person::{CreateOfficial, CreatePersonnel, CreateStudent, PersonService};
use surat_api::services::ServiceError;
use surat_api::types::PersonnelRef;
use uuid::Uuid;

fn official_request(institution_id: Option<Uuid>) -> CreateOfficial {
    CreateOfficial {
        name: "Dr. Rina Kusuma".to_string(),
        occupation: "Wakil Dekan".to_string(),
        unique_code: None,
        institution_id,
    }
}

#[tokio::test]
async fn study_program_staff_see_only_their_own_institution() {
    let fx = common::setup().await;
    let access = resolve_for_personnel(fx.store.as_ref(), &fx.program_staff).await.unwrap();

    assert!(access.can_write);
    assert_eq!(access.scope, AccessScope::Ids(HashSet::from([fx.study_program])));
}

#[tokio::test]
async fn faculty_staff_see_their_children_not_themselves() {
    let fx = common::setup().await;
    let access = resolve_for_personnel(fx.store.as_ref(), &fx.faculty_staff).await.unwrap();

    assert!(access.can_write);
    let expected = HashSet::from([fx.study_program, fx.sibling_program]);
    assert_eq!(access.scope, AccessScope::Ids(expected));
    assert!(!access.scope.allows(fx.faculty));
    assert!(!access.scope.allows(fx.university));
}

#[tokio::test]
async fn faculty_without_children_sees_nothing_not_everything() {
    let fx = common::setup().await;
    let access =
        resolve_for_personnel(fx.store.as_ref(), &fx.other_faculty_staff).await.unwrap();

    assert!(!access.scope.is_all());
    assert!(!access.scope.allows(fx.study_program));
    assert!(!access.scope.allows(fx.other_faculty));
}

#[tokio::test]
async fn university_staff_see_everything_read_only() {
    let fx = common::setup().await;
    let access =
        resolve_for_personnel(fx.store.as_ref(), &fx.university_staff).await.unwrap();

    assert!(access.scope.is_all());
    assert!(!access.can_write);
}

#[tokio::test]
async fn unknown_personnel_is_rejected() {
    let fx = common::setup().await;
    let ghost = PersonnelRef { id: Uuid::new_v4(), institution_id: fx.faculty };
    assert!(resolve_for_personnel(fx.store.as_ref(), &ghost).await.is_err());
}

#[tokio::test]
async fn institution_listing_is_scoped_by_caller() {
    let fx = common::setup().await;
    let service = InstitutionService::new(fx.store.clone());

    let all = service.find_all(&fx.admin()).await.unwrap();
    assert_eq!(all.len(), 5);

    let faculty_view = service.find_all(&fx.staff(fx.faculty_staff)).await.unwrap();
    let names: Vec<_> = faculty_view.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Teknik Elektro", "Teknik Informatika"]);
}

#[tokio::test]
async fn official_creation_passes_the_write_guard() {
    let fx = common::setup().await;
    let service = PersonService::new(fx.store.clone());

    // Writing staff default to their own institution.
    let own = service
        .create_official(&fx.staff(fx.program_staff), official_request(None))
        .await
        .unwrap();
    assert_eq!(own.institution_id, fx.study_program);
    assert!(fx.store.official(own.id).await.unwrap().is_some());

    // Faculty staff may target their children but not another branch.
    let child = service
        .create_official(
            &fx.staff(fx.faculty_staff),
            official_request(Some(fx.sibling_program)),
        )
        .await
        .unwrap();
    assert_eq!(child.institution_id, fx.sibling_program);
    let err = service
        .create_official(
            &fx.staff(fx.faculty_staff),
            official_request(Some(fx.other_faculty)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // University staff see everything but write nothing.
    let err = service
        .create_official(&fx.staff(fx.university_staff), official_request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn admins_must_name_the_target_institution() {
    let fx = common::setup().await;
    let service = PersonService::new(fx.store.clone());

    let err = service.create_official(&fx.admin(), official_request(None)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));

    let created = service
        .create_official(&fx.admin(), official_request(Some(fx.faculty)))
        .await
        .unwrap();
    assert_eq!(created.institution_id, fx.faculty);
}

#[tokio::test]
async fn registered_students_and_personnel_resolve_afterwards() {
    let fx = common::setup().await;
    let service = PersonService::new(fx.store.clone());

    let student = service
        .create_student(
            &fx.staff(fx.program_staff),
            CreateStudent {
                user_id: Uuid::new_v4(),
                fullname: "Dewi Lestari".to_string(),
                nim: "2110042".to_string(),
                class_year: Some("2021".to_string()),
                address: None,
                phone_number: None,
                birthplace: None,
                birthday: None,
                gender: None,
                institution_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(student.institution_id, fx.study_program);
    assert!(fx.store.student(student.id).await.unwrap().is_some());

    let personnel = service
        .create_personnel(
            &fx.admin(),
            CreatePersonnel {
                user_id: Uuid::new_v4(),
                position: Some("Staf TU".to_string()),
                institution_id: Some(fx.faculty),
            },
        )
        .await
        .unwrap();
    let access = resolve_for_personnel(
        fx.store.as_ref(),
        &PersonnelRef { id: personnel.id, institution_id: personnel.institution_id },
    )
    .await
    .unwrap();
    assert!(access.can_write);
    assert_eq!(access.scope, AccessScope::Ids(HashSet::from([fx.study_program, fx.sibling_program])));
}
