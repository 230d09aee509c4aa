use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use scaffviz::engine::progress::{Progress, ProgressCallback};
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::warn;

const EVENT_BUFFER: usize = 1024;
const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// The bar of the pipeline phase currently running.
struct Phase {
    bar: ProgressBar,
    name: &'static str,
}

/// Owns the terminal: one bar per pipeline phase, log lines printed above it.
pub struct UiManager {
    terminal: MultiProgress,
    phase: Option<Phase>,
    completed: usize,
    events: mpsc::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
    anchor: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, events) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_sender, shutdown) = watch::channel(false);
        let terminal = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        // Keeps the draw target alive between phases.
        let anchor = terminal.add(ProgressBar::hidden());
        let manager = Self {
            terminal,
            phase: None,
            completed: 0,
            events,
            shutdown,
            anchor,
        };
        (manager, event_sender, shutdown_sender)
    }

    /// Draws events until shutdown is signalled, then flushes whatever is still queued.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.handle_event(event),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
        if let Some(phase) = self.phase.take() {
            phase.bar.finish_and_clear();
        }
        self.anchor.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.print(line),
            UiEvent::Progress(Progress::PhaseStart { name }) => self.begin_phase(name),
            UiEvent::Progress(Progress::PhaseFinish) => self.finish_phase(),
            UiEvent::Progress(Progress::TaskStart { total }) => {
                if let Some(phase) = &self.phase {
                    phase.bar.disable_steady_tick();
                    phase.bar.set_style(molecule_bar_style());
                    phase.bar.set_length(total);
                    phase.bar.set_position(0);
                }
            }
            UiEvent::Progress(Progress::TaskIncrement { amount }) => {
                if let Some(phase) = &self.phase {
                    phase.bar.inc(amount);
                }
            }
            UiEvent::Progress(Progress::TaskFinish) => {
                if let Some(phase) = &self.phase {
                    phase.bar.finish();
                }
            }
            UiEvent::Progress(Progress::StatusUpdate { text }) => {
                if let Some(phase) = &self.phase {
                    phase.bar.set_message(format!("{}: {}", phase.name, text));
                }
            }
            UiEvent::Progress(Progress::Message(text)) => self.print(format!("    {}", text)),
        }
    }

    fn begin_phase(&mut self, name: &'static str) {
        if let Some(previous) = self.phase.take() {
            previous.bar.finish_and_clear();
        }
        let bar = self.terminal.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_prefix(format!("[{}]", self.completed + 1));
        bar.set_message(name);
        bar.enable_steady_tick(Duration::from_millis(80));
        self.phase = Some(Phase { bar, name });
    }

    fn finish_phase(&mut self) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        let elapsed = phase.bar.elapsed();
        phase.bar.finish_and_clear();
        self.completed += 1;
        self.print(format!(
            "✓ {} ({:.1}s)",
            phase.name,
            elapsed.as_secs_f64()
        ));
    }

    fn print(&self, line: String) {
        let _ = self.terminal.println(line);
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.dim} {spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_TICKS)
}

fn molecule_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.dim} {msg:<32} [{bar:36.cyan/blue}] {pos}/{len} molecules ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let _ = write!(w, "{:.0}s left", state.eta().as_secs_f64());
    })
    .progress_chars("━╸ ")
}

/// Forwards library progress events to the [`UiManager`] channel.
#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Dropped a progress update for the terminal: {}", e);
            }
        })
    }
}
