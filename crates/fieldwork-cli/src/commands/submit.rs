use fieldwork_core::api::WorksApi;
use fieldwork_core::config::FieldConfig;
use fieldwork_core::location::{acquire_location, CommandLocationProvider, LocationFix};
use fieldwork_core::models::{Coordinates, Photo};
use fieldwork_core::submit::{
    AlwaysSaveOffline, FieldSubmitter, InspectionDraft, NeverSaveOffline, OfflineChoice,
    SubmitOutcome,
};

use crate::cli::{OfflineMode, SubmitArgs};
use crate::commands::common::{build_api, confirm_on_terminal, open_queue};
use crate::error::CliError;

pub const SAVE_OFFLINE_PROMPT: &str = "Network request failed. Save offline?";

pub async fn run_submit(args: SubmitArgs, config: &FieldConfig) -> Result<(), CliError> {
    let photo = Photo::from_path(&args.photo)?;
    let manual_location = manual_coordinates(args.latitude, args.longitude);
    let gps_location = if args.no_gps {
        None
    } else {
        read_gps(config).await?
    };

    let draft = InspectionDraft {
        gps_location,
        manual_location,
        photo: Some(photo),
        remarks: args.remarks,
        ..InspectionDraft::new(args.work_id, args.status)
    };

    let api = build_api(config)?;
    tracing::info!(
        work_id = args.work_id,
        "Submitting inspection to {}",
        api.base_url()
    );
    let submitter = FieldSubmitter::new(open_queue(config).await?, api);
    let outcome = submit_with_mode(&submitter, &draft, args.offline).await?;
    report_outcome(args.work_id, outcome)
}

/// Pair the manual coordinate flags; the server judges whether they are plausible.
pub fn manual_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    latitude
        .zip(longitude)
        .map(|(latitude, longitude)| Coordinates::new(latitude, longitude))
}

async fn read_gps(config: &FieldConfig) -> Result<Option<Coordinates>, CliError> {
    let Some(command_line) = config.gps_command.as_deref() else {
        return Ok(None);
    };
    let provider = CommandLocationProvider::from_command_line(command_line)?;

    match acquire_location(&provider, config.gps_timeout).await {
        LocationFix::Gps(coordinates) => {
            eprintln!("GPS fix: {coordinates}");
            Ok(Some(coordinates))
        }
        LocationFix::ManualRequired { reason } => {
            eprintln!("GPS unavailable ({reason}). Use --latitude and --longitude to enter coordinates manually.");
            Ok(None)
        }
    }
}

async fn submit_with_mode<A: WorksApi>(
    submitter: &FieldSubmitter<A>,
    draft: &InspectionDraft,
    mode: OfflineMode,
) -> Result<SubmitOutcome, CliError> {
    let outcome = match mode {
        OfflineMode::Always => submitter.submit(draft, &AlwaysSaveOffline).await?,
        OfflineMode::Never => submitter.submit(draft, &NeverSaveOffline).await?,
        OfflineMode::Ask => {
            let ask = |error: &fieldwork_core::Error| {
                eprintln!("{error}");
                ask_save_offline(confirm_on_terminal(SAVE_OFFLINE_PROMPT))
            };
            submitter.submit(draft, &ask).await?
        }
    };
    Ok(outcome)
}

/// Map a terminal answer to a choice; no terminal means no consent.
pub fn ask_save_offline(answer: Option<bool>) -> OfflineChoice {
    match answer {
        Some(true) => OfflineChoice::SaveOffline,
        Some(false) => OfflineChoice::Discard,
        None => {
            eprintln!("Not running on a terminal; pass --offline always to queue failed submissions.");
            OfflineChoice::Discard
        }
    }
}

fn report_outcome(work_id: i64, outcome: SubmitOutcome) -> Result<(), CliError> {
    match outcome {
        SubmitOutcome::Delivered => {
            println!("Inspection submitted for work {work_id}");
            Ok(())
        }
        SubmitOutcome::SavedOffline { id, error } => {
            eprintln!("Direct submission failed: {error}");
            println!("Saved offline as update #{id}. Run `fieldwork sync` when back online.");
            Ok(())
        }
        SubmitOutcome::Discarded { error } => Err(CliError::Discarded(error)),
    }
}
