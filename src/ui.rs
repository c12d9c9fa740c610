//! Interface de terminal do lumos-intake: barras de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para as barras de envio e extração e `console`
//! para estilização com cores. O [`UploadProgress`] acompanha visualmente
//! um slot de upload; o [`WizardUi`] imprime o andamento das etapas.

use std::time::Duration;

use console::Style;
use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

use crate::upload::{ExtractionStatus, SlotPhase, UploadSlot};
use crate::wizard::{ProcessingPhase, StageId, WizardTransition};

// Modelo da barra de envio e de extração.
const BAR_TEMPLATE: &str = "{prefix:>12.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Barra de progresso de um slot de upload no terminal.
pub struct UploadProgress {
    pb: ProgressBar,
}

impl UploadProgress {
    /// Cria a barra com o rótulo do documento e o tamanho do arquivo.
    pub fn start(label: &str, file_name: &str, size_label: &str) -> Self {
        let pb = ProgressBar::new(100);
        pb.set_style(bar_style());
        pb.set_prefix(label.to_string());
        pb.set_message(format!("{file_name} ({size_label})"));
        Self { pb }
    }

    /// Acompanha o slot até ele sair de `Uploading` ou o canal fechar.
    pub async fn follow(&self, mut rx: watch::Receiver<UploadSlot>) {
        loop {
            let slot = rx.borrow_and_update().clone();
            self.pb.set_position(u64::from(slot.progress()));
            if matches!(slot.phase(), SlotPhase::Success | SlotPhase::Error) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Finaliza a barra e imprime o resultado final do slot.
    pub fn finish(&self, slot: &UploadSlot) {
        self.pb.finish_and_clear();
        print_slot_outcome(slot);
    }
}

/// Imprime o resultado de um slot: sucesso em verde, erro em vermelho.
pub fn print_slot_outcome(slot: &UploadSlot) {
    let label = slot.category().label();
    match (slot.phase(), slot.remote(), slot.error_message()) {
        (SlotPhase::Success, Some(remote), _) => println!(
            "  {} {label} uploaded: {}",
            Style::new().green().bold().apply_to("✓"),
            remote.public_id
        ),
        (_, _, Some(message)) => println!(
            "  {} {label}: {message}",
            Style::new().red().bold().apply_to("✗")
        ),
        (phase, _, _) => println!("  {label} {phase}"),
    }
}

/// Acompanha a extração do currículo até ela terminar ou ser cancelada.
pub async fn follow_extraction(
    updates: impl Stream<Item = ExtractionStatus>,
) -> Option<ExtractionStatus> {
    let pb = ProgressBar::new(100);
    pb.set_style(bar_style());
    pb.set_prefix("extraction");
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut last = None;
    let mut updates = std::pin::pin!(updates);
    while let Some(status) = updates.next().await {
        pb.set_position(u64::from(status.progress_percent));
        if let Some(summary) = &status.result_summary {
            pb.set_message(summary.clone());
        }
        last = Some(status);
    }
    pb.finish_and_clear();
    if let Some(summary) = last.as_ref().and_then(|s| s.result_summary.as_deref()) {
        println!("  {} {summary}", Style::new().green().bold().apply_to("✓"));
    }
    last
}

/// Saída colorida do andamento do wizard.
pub struct WizardUi {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Default for WizardUi {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }
}

impl WizardUi {
    pub fn stage_header(&self, stage: StageId) {
        println!();
        println!(
            "{} {}",
            self.dim.apply_to(format!("[{:>3}%]", stage.progress_percent())),
            stage
        );
    }

    pub fn advisories(&self, notes: &[String]) {
        for note in notes {
            println!("  {} {note}", self.yellow.apply_to("!"));
        }
    }

    pub fn transition(&self, transition: &WizardTransition) {
        let line = describe_transition(transition);
        match transition {
            WizardTransition::Stayed { .. } => println!("  {} {line}", self.red.apply_to("✗")),
            WizardTransition::Unchanged => println!("  {}", self.dim.apply_to(line)),
            _ => println!("  {} {line}", self.green.apply_to("✓")),
        }
    }

    pub fn completeness(&self, percent: u8) {
        println!();
        println!(
            "{} {percent}%",
            self.green.apply_to("─── Profile completeness:")
        );
    }

    /// Spinner da tela de processamento; encerra quando a fase muda.
    pub async fn processing(&self, mut rx: watch::Receiver<ProcessingPhase>) -> ProcessingPhase {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Processing your profile...");
        pb.enable_steady_tick(Duration::from_millis(100));

        let phase = rx
            .wait_for(|p| *p != ProcessingPhase::Running)
            .await
            .map(|p| *p);
        let phase = phase.unwrap_or_else(|_| *rx.borrow());
        pb.finish_and_clear();
        println!("  {} Processing {phase}", self.green.apply_to("✓"));
        phase
    }
}

/// Texto de uma transição do wizard, sem estilo.
pub fn describe_transition(transition: &WizardTransition) -> String {
    match transition {
        WizardTransition::Advanced { from, to } => {
            format!("{} saved, moving to {}", from.title(), to.title())
        }
        WizardTransition::Stayed { stage, error } => format!("{}: {error}", stage.title()),
        WizardTransition::Retreated { from, to } => {
            format!("Back from {} to {}", from.title(), to.title())
        }
        WizardTransition::Completed => "Profile complete".to_string(),
        WizardTransition::Closed => "Wizard closed".to_string(),
        WizardTransition::Unchanged => "Nothing to do".to_string(),
    }
}
