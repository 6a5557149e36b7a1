use super::common::*;
use crate::workflows::enrollment::{
    assemble, AssembleError, AwardTier, Degree, DocumentSlot, DraftStore, Gender,
    GuardianRelation,
};

#[test]
fn payload_mirrors_a_complete_draft() {
    let draft = complete_draft();
    let payload = assemble(&draft, None).expect("complete draft assembles");

    assert_eq!(payload.id, None);
    assert_eq!(payload.degree, Degree::Bachelor);
    assert_eq!(payload.primary_major, 5);
    assert_eq!(payload.admission_major, vec![7]);
    assert_eq!(payload.user.first_name, "Merdan");
    assert_eq!(payload.user.date_of_birth, "2007-03-12");
    assert_eq!(payload.guardians.len(), 2);
    assert_eq!(payload.institutions[0].certificates, vec![21]);
    assert_eq!(payload.olympics[0].tier, AwardTier::State);
    assert_eq!(payload.olympics[0].files, vec![31]);
    assert_eq!(payload.documents.len(), 7);
}

#[test]
fn documents_array_carries_exactly_the_attached_slots() {
    let mut draft = complete_draft();
    // only the medical record remains attached
    for slot in DocumentSlot::ordered() {
        if slot != DocumentSlot::MedicalRecord {
            draft.other_documents.set(slot, None);
        }
    }

    let payload = assemble(&draft, None).expect("assembles");
    assert_eq!(payload.documents.len(), 1);
    assert_eq!(payload.documents[0].kind, "medical_record");
    assert_eq!(payload.documents[0].file, 41);
}

#[test]
fn empty_additional_major_positions_are_filtered_out() {
    let mut draft = complete_draft();
    draft.additional_majors = [None, Some(9), None];
    let payload = assemble(&draft, None).expect("assembles");
    assert_eq!(payload.admission_major, vec![9]);
}

#[test]
fn master_applicants_send_no_additional_majors() {
    let mut draft = complete_draft();
    draft.degree = Some(Degree::Master);
    draft.additional_majors = [Some(7), None, None];
    let payload = assemble(&draft, None).expect("assembles");
    assert!(payload.admission_major.is_empty());
}

#[test]
fn deceased_guardian_contact_fields_are_dropped() {
    let mut draft = complete_draft();
    draft.guardians[0] = deceased_guardian(GuardianRelation::Father, 15);

    let payload = assemble(&draft, None).expect("assembles");
    let father = &payload.guardians[0];
    assert_eq!(father.is_deceased, Some(true));
    assert_eq!(father.phone, None);
    assert_eq!(father.address, None);
    assert_eq!(father.work_place, None);
    assert_eq!(father.documents.len(), 1);
    assert_eq!(father.documents[0].kind, "death_certificate");
    assert_eq!(father.documents[0].file, 15);

    let mother = &payload.guardians[1];
    assert_eq!(mother.phone.as_deref(), Some("+99361234567"));
}

#[test]
fn incomplete_drafts_are_refused() {
    let mut draft = complete_draft();
    draft.degree = None;
    assert_eq!(assemble(&draft, None), Err(AssembleError::DegreeUnset));

    let mut draft = complete_draft();
    draft.general.gender = None;
    assert_eq!(assemble(&draft, None), Err(AssembleError::GenderUnset));

    let mut draft = complete_draft();
    draft.awards[0].tier = None;
    assert_eq!(
        assemble(&draft, None),
        Err(AssembleError::AwardTierUnset { index: 0 })
    );
}

#[test]
fn female_applicants_simply_omit_the_military_document() {
    let mut draft = complete_draft();
    draft.general.gender = Some(Gender::Female);
    draft
        .other_documents
        .set(DocumentSlot::MilitaryDocument, None);

    let payload = assemble(&draft, None).expect("assembles");
    assert!(payload
        .documents
        .iter()
        .all(|document| document.kind != "military_document"));
    assert_eq!(payload.documents.len(), 6);
}

#[test]
fn hydrate_then_assemble_loses_no_data() {
    let saved = saved_application();
    let mut store = DraftStore::new();
    store.hydrate(Some(&saved), Vec::new());

    let payload = assemble(store.draft(), Some(saved.id)).expect("assembles");

    assert_eq!(payload.id, Some(900));
    assert_eq!(payload.degree, saved.degree);
    assert_eq!(payload.primary_major, saved.primary_major);
    assert_eq!(payload.admission_major, saved.admission_major);
    assert_eq!(payload.user.first_name, saved.user.first_name);
    assert_eq!(payload.user.date_of_birth, "2007-03-12");
    assert_eq!(payload.user.phone, saved.user.phone);

    let guardian_ids: Vec<_> = payload.guardians.iter().map(|g| g.id).collect();
    assert_eq!(guardian_ids, vec![Some(71), Some(72)]);
    let guardian_files: Vec<_> = payload
        .guardians
        .iter()
        .flat_map(|g| g.documents.iter().map(|d| d.file))
        .collect();
    assert_eq!(guardian_files, vec![11, 12]);

    assert_eq!(payload.institutions[0].id, Some(81));
    assert_eq!(payload.institutions[0].certificates, vec![21]);
    assert_eq!(payload.olympics[0].id, Some(91));
    assert_eq!(payload.olympics[0].files, vec![31]);

    let document_files: Vec<_> = payload.documents.iter().map(|d| d.file).collect();
    assert_eq!(document_files, vec![41, 42, 43, 44, 45, 46, 47]);
    let document_kinds: Vec<_> = payload
        .documents
        .iter()
        .map(|d| d.kind.as_str())
        .collect();
    assert_eq!(
        document_kinds,
        DocumentSlot::ordered()
            .iter()
            .map(|slot| slot.tag())
            .collect::<Vec<_>>()
    );
}

#[test]
fn payload_serializes_with_backend_field_names() {
    let payload = assemble(&complete_draft(), None).expect("assembles");
    let json = serde_json::to_value(&payload).expect("serializes");

    assert!(json.get("id").is_none());
    assert_eq!(json["degree"], "bachelor");
    assert_eq!(json["olympics"][0]["type"], "state");
    assert_eq!(json["documents"][0]["type"], "medical_record");
    assert_eq!(json["user"]["date_of_birth"], "2007-03-12");
    // deceased=false guardians still serialize their contact details
    assert_eq!(json["guardians"][0]["phone"], "+99361234567");
}
