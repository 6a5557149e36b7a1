use super::common::*;
use crate::workflows::enrollment::{
    DegreePatch, Degree, DraftStore, FieldKey, GeneralInfoPatch, GuardianDocumentKind,
    GuardianRelation, GuardiansPatch, DocumentSlot, SectionPatch, SectionSlice, Step,
};

#[test]
fn reset_restores_documented_empty_defaults() {
    let mut store = DraftStore::new();
    store.hydrate(Some(&saved_application()), Vec::new());
    store.reset();

    let draft = store.draft();
    assert_eq!(draft.degree, None);
    assert_eq!(draft.primary_major, None);
    assert_eq!(draft.additional_majors, [None, None, None]);
    assert_eq!(draft.general.first_name, "");
    assert_eq!(draft.general.gender, None);

    assert_eq!(draft.guardians.len(), 2);
    assert_eq!(draft.guardians[0].relation, GuardianRelation::Father);
    assert_eq!(draft.guardians[1].relation, GuardianRelation::Mother);
    assert!(draft.guardians.iter().all(|g| g.documents.is_empty()));

    assert_eq!(draft.educations.len(), 1);
    assert!(draft.educations[0].school_name.is_empty());
    assert!(draft.educations[0].certificates.is_empty());

    assert_eq!(draft.awards.len(), 1);
    assert!(draft.awards[0].description.is_empty());
    assert!(draft.awards[0].files.is_empty());

    assert!(draft.other_documents.attached().next().is_none());
}

#[test]
fn hydrate_seeds_every_section_from_server_record() {
    let mut store = DraftStore::new();
    store.hydrate(Some(&saved_application()), Vec::new());

    let draft = store.draft();
    assert_eq!(draft.degree, Some(Degree::Bachelor));
    assert_eq!(draft.primary_major, Some(5));
    assert_eq!(draft.additional_majors, [Some(7), None, None]);
    assert_eq!(draft.general.first_name, "Merdan");
    assert_eq!(draft.guardians.len(), 2);
    assert_eq!(draft.guardians[0].id, Some(71));
    assert_eq!(
        draft.guardians[0]
            .document(GuardianDocumentKind::Passport)
            .map(|file| file.id),
        Some(11)
    );
    assert_eq!(draft.educations[0].certificates[0].id, 21);
    assert_eq!(draft.awards[0].files[0].id, 31);
    assert_eq!(
        draft
            .other_documents
            .get(DocumentSlot::MedicalRecord)
            .map(|file| file.id),
        Some(41)
    );
}

#[test]
fn cached_slices_take_priority_over_server_data() {
    let mut store = DraftStore::new();
    let cached = vec![SectionSlice::GeneralInfo({
        let mut general = filled_general();
        general.first_name = "Kerim".to_string();
        general
    })];
    store.hydrate(Some(&saved_application()), cached);

    let draft = store.draft();
    // in-flight edit wins
    assert_eq!(draft.general.first_name, "Kerim");
    // untouched sections still come from the server record
    assert_eq!(draft.primary_major, Some(5));
    assert_eq!(draft.guardians[0].id, Some(71));
}

#[test]
fn patch_merges_without_disturbing_other_sections() {
    let mut store = DraftStore::new();
    store.apply_patch(SectionPatch::Degree(DegreePatch {
        degree: Some(Degree::Bachelor),
        primary_major: Some(5),
        additional_majors: None,
    }));
    store.apply_patch(SectionPatch::GeneralInfo(GeneralInfoPatch {
        first_name: Some("Merdan".to_string()),
        ..GeneralInfoPatch::default()
    }));

    let draft = store.draft();
    assert_eq!(draft.degree, Some(Degree::Bachelor));
    assert_eq!(draft.general.first_name, "Merdan");
    // fields the patch left out keep their values
    assert_eq!(draft.general.last_name, "");
    assert_eq!(draft.guardians.len(), 2);
}

#[test]
fn switching_to_master_clears_additional_majors() {
    let mut store = DraftStore::new();
    store.apply_patch(SectionPatch::Degree(DegreePatch {
        degree: Some(Degree::Bachelor),
        primary_major: Some(5),
        additional_majors: Some([Some(7), Some(8), None]),
    }));
    store.apply_patch(SectionPatch::Degree(DegreePatch {
        degree: Some(Degree::Master),
        primary_major: None,
        additional_majors: None,
    }));

    let draft = store.draft();
    assert_eq!(draft.degree, Some(Degree::Master));
    assert_eq!(draft.primary_major, Some(5));
    assert_eq!(draft.additional_majors, [None, None, None]);
}

#[test]
fn guardian_replacement_keeps_parents_in_front() {
    let mut store = DraftStore::new();
    store.apply_patch(SectionPatch::Guardians(GuardiansPatch {
        entries: vec![
            filled_guardian(GuardianRelation::Uncle, 13),
            filled_guardian(GuardianRelation::Mother, 12),
            filled_guardian(GuardianRelation::Father, 11),
        ],
    }));

    let relations: Vec<_> = store
        .draft()
        .guardians
        .iter()
        .map(|guardian| guardian.relation)
        .collect();
    assert_eq!(
        relations,
        vec![
            GuardianRelation::Father,
            GuardianRelation::Mother,
            GuardianRelation::Uncle
        ]
    );
}

#[test]
fn slices_round_trip_through_apply() {
    let mut store = DraftStore::new();
    store.hydrate(Some(&saved_application()), Vec::new());

    let mut copy = DraftStore::new();
    for step in Step::ordered() {
        copy.apply_slice(store.slice(step));
    }
    assert_eq!(copy.draft(), store.draft());
}

#[test]
fn attach_replaces_guardian_document_of_same_kind() {
    let mut store = DraftStore::new();
    let field = FieldKey::GuardianDocument {
        guardian: 0,
        document: GuardianDocumentKind::Passport,
    };

    store.attach(&field, file(1, "old.pdf")).expect("attach");
    store.attach(&field, file(2, "new.pdf")).expect("attach");

    let documents = &store.draft().guardians[0].documents;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].file.id, 2);

    store.detach(&field).expect("detach");
    assert!(store.draft().guardians[0].documents.is_empty());
}

#[test]
fn attach_rejects_out_of_range_guardian() {
    let mut store = DraftStore::new();
    let field = FieldKey::GuardianDocument {
        guardian: 9,
        document: GuardianDocumentKind::Passport,
    };
    assert!(store.attach(&field, file(1, "passport.pdf")).is_err());
    assert!(!store.field_exists(&field));
}
