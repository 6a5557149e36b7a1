use crate::infra::{InMemoryApplicationsGateway, InMemoryDraftCache, InMemoryFileGateway};
use admission_desk::error::AppError;
use admission_desk::workflows::enrollment::{
    ApplicationsGateway, AwardInfo, AwardTier, AwardsPatch, Degree, DegreePatch, DocumentSlot,
    EducationInfo, EducationPatch, FieldKey, Gender, GeneralInfoPatch, Guardian,
    GuardianDocumentKind, GuardianRelation, GuardiansPatch, SectionPatch, SessionId,
    UploadOutcome, WizardError, WizardService,
};
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Applicant date of birth for the scripted run (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date_of_birth: Option<NaiveDate>,
    /// Walk every step but stop short of the final submission
    #[arg(long)]
    pub(crate) skip_submit: bool,
}

type DemoService =
    WizardService<InMemoryDraftCache, InMemoryFileGateway, InMemoryApplicationsGateway>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date_of_birth = args
        .date_of_birth
        .or_else(|| NaiveDate::from_ymd_opt(2007, 3, 12))
        .unwrap_or_default();

    println!("Admissions intake wizard demo");

    let cache = Arc::new(InMemoryDraftCache::default());
    let files = Arc::new(InMemoryFileGateway::default());
    let applications = Arc::new(InMemoryApplicationsGateway::new(files.clone()));
    let service: Arc<DemoService> =
        Arc::new(WizardService::new(cache, files, applications.clone()));

    let snapshot = match service.open(None).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            println!("  Could not open a session: {err}");
            return Ok(());
        }
    };
    let id = snapshot.session_id;
    println!(
        "- Session {} opened at step '{}'",
        id,
        snapshot
            .step
            .map(|step| step.label())
            .unwrap_or("submitted")
    );

    // advancing an untouched draft fails the degree rules; the wizard
    // surfaces the condition and stays in place
    match service.advance(&id) {
        Err(WizardError::Validation(err)) => {
            println!("- Advance on an empty draft rejected: {err}");
        }
        other => println!("- Unexpected advance outcome: {other:?}"),
    }

    service
        .apply_patch(
            &id,
            SectionPatch::Degree(DegreePatch {
                degree: Some(Degree::Bachelor),
                primary_major: Some(5),
                additional_majors: Some([Some(7), None, None]),
            }),
        )
        .map_err(demo_failure)?;
    advance(&service, &id, "degree")?;

    service
        .apply_patch(
            &id,
            SectionPatch::GeneralInfo(GeneralInfoPatch {
                first_name: Some("Merdan".to_string()),
                last_name: Some("Annayev".to_string()),
                father_name: Some("Batyr".to_string()),
                gender: Some(Gender::Male),
                nationality: Some("Turkmen".to_string()),
                date_of_birth: Some(date_of_birth),
                area: Some(2),
                address: Some("Ashgabat, Garashsyzlyk 12".to_string()),
                place_of_birth: Some("Ashgabat".to_string()),
                phone: Some("+99365123456".to_string()),
                home_phone: Some("12345".to_string()),
                email: Some("merdan.annayev@example.edu".to_string()),
            }),
        )
        .map_err(demo_failure)?;
    advance(&service, &id, "general information")?;

    service
        .apply_patch(
            &id,
            SectionPatch::Guardians(GuardiansPatch {
                entries: vec![
                    demo_guardian(GuardianRelation::Father, "Batyr"),
                    demo_guardian(GuardianRelation::Mother, "Aygul"),
                ],
            }),
        )
        .map_err(demo_failure)?;
    for guardian in 0..2 {
        upload(
            &service,
            &id,
            FieldKey::GuardianDocument {
                guardian,
                document: GuardianDocumentKind::Passport,
            },
            "passport.pdf",
        )
        .await?;
    }
    advance(&service, &id, "guardians")?;

    service
        .apply_patch(
            &id,
            SectionPatch::Education(EducationPatch {
                entries: vec![EducationInfo {
                    id: None,
                    school_name: "Ashgabat secondary school 27".to_string(),
                    gpa: Some(4.3),
                    graduated_year: 2024,
                    certificates: Vec::new(),
                }],
            }),
        )
        .map_err(demo_failure)?;
    upload(
        &service,
        &id,
        FieldKey::EducationCertificate { education: 0 },
        "certificate.pdf",
    )
    .await?;
    advance(&service, &id, "education")?;

    service
        .apply_patch(
            &id,
            SectionPatch::Awards(AwardsPatch {
                entries: vec![AwardInfo {
                    id: None,
                    tier: Some(AwardTier::State),
                    description: "State mathematics olympiad, second place".to_string(),
                    files: Vec::new(),
                }],
            }),
        )
        .map_err(demo_failure)?;
    upload(&service, &id, FieldKey::AwardFile { award: 0 }, "diploma.pdf").await?;
    advance(&service, &id, "awards")?;

    for slot in DocumentSlot::ordered() {
        upload(
            &service,
            &id,
            FieldKey::OtherDocument { slot },
            &format!("{}.pdf", slot.tag()),
        )
        .await?;
    }
    println!("- All document slots attached");

    if args.skip_submit {
        println!("- Submission skipped; the draft stays cached for this session");
        return Ok(());
    }

    match service.submit(&id).await {
        Ok(receipt) => {
            println!(
                "- Application {} accepted; the draft has been reset",
                receipt.application_id
            );
            if let Ok(Some(saved)) = applications.fetch(receipt.application_id).await {
                println!(
                    "  Stored record: {} {} -> {} documents, {} guardians",
                    saved.user.first_name,
                    saved.user.last_name,
                    saved.documents.len(),
                    saved.guardians.len()
                );
            }
        }
        Err(err) => println!("- Submission failed, draft preserved: {err}"),
    }

    Ok(())
}

fn demo_guardian(relation: GuardianRelation, first_name: &str) -> Guardian {
    let mut guardian = Guardian::with_relation(relation);
    guardian.first_name = first_name.to_string();
    guardian.last_name = "Annayev".to_string();
    guardian.father_name = "Soltan".to_string();
    guardian.date_of_birth = NaiveDate::from_ymd_opt(1978, 11, 2);
    guardian.place_of_birth = "Mary".to_string();
    guardian.phone = "+99361234567".to_string();
    guardian.address = "Ashgabat, Bitarap 4".to_string();
    guardian.work_place = "Ashgabat textile complex".to_string();
    guardian.deceased = Some(false);
    guardian
}

fn advance(service: &DemoService, id: &SessionId, label: &str) -> Result<(), AppError> {
    match service.advance(id) {
        Ok(snapshot) => {
            println!(
                "- {} complete, now at '{}'",
                label,
                snapshot
                    .step
                    .map(|step| step.label())
                    .unwrap_or("submitted")
            );
            Ok(())
        }
        Err(err) => {
            println!("- Could not leave the {label} step: {err}");
            Err(demo_failure(err))
        }
    }
}

async fn upload(
    service: &DemoService,
    id: &SessionId,
    field: FieldKey,
    name: &str,
) -> Result<(), AppError> {
    match service
        .upload(id, field, name.to_string(), b"%PDF-1.4 demo".to_vec())
        .await
    {
        Ok(UploadOutcome::Applied) => Ok(()),
        Ok(UploadOutcome::Discarded) => {
            println!("  Upload response for {name} was discarded as stale");
            Ok(())
        }
        Err(err) => {
            println!("  Upload of {name} failed: {err}");
            Err(demo_failure(err))
        }
    }
}

fn demo_failure(err: WizardError) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("demo aborted: {err}"),
    ))
}
