use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lumos_intake::IntakeError;
use lumos_intake::api::{
    CandidateFile, Credential, DocumentCategory, IntakeClient, ProfileService, UploadService,
};
use lumos_intake::cli::{Cli, Command};
use lumos_intake::config::IntakeConfig;
use lumos_intake::ui::{self, UploadProgress, WizardUi};
use lumos_intake::upload::{SimulatedExtraction, SlotPhase, UploadEngine, UploadSlot};
use lumos_intake::wizard::{AnswerSheet, DocumentFiles, StageId, Wizard, WizardTransition};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => IntakeConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => IntakeConfig::load()?,
    };
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let client = Arc::new(IntakeClient::from_config(&config)?);
    let credential = Credential::from_env();
    if !credential.is_present() {
        warn!("LUMOS_TOKEN is not set; authenticated calls will be refused");
    }
    info!(api = %config.api_base_url, "lumos-intake starting");

    match cli.command {
        Command::Run { answers, no_wait } => {
            run_wizard(client, credential, &config, &answers, no_wait).await
        }
        Command::Upload { category, path } => {
            upload_one(client, credential, &config, category.into(), &path).await
        }
        Command::Delete {
            category,
            public_id,
        } => delete_one(&client, &credential, category.into(), &public_id).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_wizard(
    client: Arc<IntakeClient>,
    credential: Credential,
    config: &IntakeConfig,
    answers: &Path,
    no_wait: bool,
) -> Result<()> {
    let sheet = AnswerSheet::load(answers)
        .with_context(|| format!("reading answers from {}", answers.display()))?;
    let ui = WizardUi::default();
    let mut wizard = Wizard::open(client.clone(), client, credential, config);

    while let Some(stage) = wizard.current_stage() {
        ui.stage_header(stage);
        let transition = if stage == StageId::Documents {
            let files = if sheet.skips(stage) {
                DocumentFiles::default()
            } else {
                sheet.read_documents().await?
            };
            if files.is_empty() {
                wizard.skip().await
            } else {
                upload_documents(&mut wizard, files).await;
                wizard.next().await
            }
        } else if let Some(payload) = sheet.payload_for(stage) {
            wizard.set_draft(payload)?;
            ui.advisories(&wizard.advisories());
            wizard.next().await
        } else {
            wizard.skip().await
        };
        ui.transition(&transition);

        match transition {
            WizardTransition::Stayed { stage, error } => {
                wizard.close();
                bail!("{} was not saved: {error}", stage.title());
            }
            WizardTransition::Unchanged => {
                wizard.close();
                bail!("{} cannot be skipped", stage.title());
            }
            _ => {}
        }
    }

    ui.completeness(wizard.session().completeness());
    if let Some(mut screen) = wizard.start_processing() {
        if no_wait {
            screen.stop();
        }
        ui.processing(screen.subscribe()).await;
    }
    Ok(())
}

async fn upload_documents<P: ProfileService, U: UploadService>(
    wizard: &mut Wizard<P, U>,
    files: DocumentFiles,
) {
    let Some(docs) = wizard.documents_mut() else {
        return;
    };
    let resume_bar = files
        .resume
        .as_ref()
        .map(|f| (bar_for(DocumentCategory::Resume, f), docs.resume.subscribe()));
    let transcript_bar = files
        .transcript
        .as_ref()
        .map(|f| (bar_for(DocumentCategory::Transcript, f), docs.transcript.subscribe()));

    tokio::join!(
        docs.upload_batch(files.resume, files.transcript, files.others),
        follow_slot(resume_bar.as_ref()),
        follow_slot(transcript_bar.as_ref()),
    );

    for (bar, rx) in resume_bar.iter().chain(transcript_bar.iter()) {
        bar.finish(&rx.borrow());
    }
    for engine in docs.others() {
        ui::print_slot_outcome(&engine.snapshot());
    }
    if let Some(job) = docs.resume.extraction() {
        ui::follow_extraction(job.updates()).await;
    }
}

fn bar_for(category: DocumentCategory, file: &CandidateFile) -> UploadProgress {
    UploadProgress::start(category.label(), &file.name, &file.size_label())
}

async fn follow_slot(entry: Option<&(UploadProgress, watch::Receiver<UploadSlot>)>) {
    if let Some((bar, rx)) = entry {
        bar.follow(rx.clone()).await;
    }
}

async fn upload_one(
    client: Arc<IntakeClient>,
    credential: Credential,
    config: &IntakeConfig,
    category: DocumentCategory,
    path: &Path,
) -> Result<()> {
    let file = CandidateFile::from_path(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let mut engine = UploadEngine::new(category, client, credential, config.max_upload_bytes);
    if category == DocumentCategory::Resume {
        engine = engine.with_extraction(Arc::new(SimulatedExtraction::new(
            config.extraction_duration(),
            config.extraction_poll_interval(),
        )));
    }

    let bar = bar_for(category, &file);
    let rx = engine.subscribe();
    let (phase, _) = tokio::join!(engine.submit(file), bar.follow(rx));
    bar.finish(&engine.snapshot());

    if phase != SlotPhase::Success {
        bail!("{} upload ended in {phase}", category.label());
    }
    if let Some(job) = engine.extraction() {
        ui::follow_extraction(job.updates()).await;
    }
    Ok(())
}

async fn delete_one(
    client: &IntakeClient,
    credential: &Credential,
    category: DocumentCategory,
    public_id: &str,
) -> Result<()> {
    let token = credential.bearer()?;
    client
        .delete(category, public_id, token)
        .await
        .map_err(|e| IntakeError::from_api(e, &format!("delete {}", category.label())))?;
    println!("  {} {public_id} deleted", console::style("✓").green().bold());
    Ok(())
}
