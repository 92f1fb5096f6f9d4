//! Per-session display state and result publication.

use crate::pipeline::{run_pipeline, PipelineError, PipelineReport, PipelineRequest};
use crate::source::SeriesSource;
use tracing::debug;

/// Whether the separate actual and predicted plots are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlotVisibility {
    #[default]
    Hidden,
    Shown,
}

impl PlotVisibility {
    pub fn is_shown(&self) -> bool {
        matches!(self, PlotVisibility::Shown)
    }
}

/// Identifies one run; only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// State owned by one dashboard user.
///
/// Every interaction re-runs the pipeline. A run started earlier can finish
/// later than a newer one; [`Session::publish`] discards such superseded
/// results so the page always shows the latest request.
#[derive(Debug, Default)]
pub struct Session {
    visibility: PlotVisibility,
    generation: u64,
    latest: Option<Result<PipelineReport, PipelineError>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plot_visibility(&self) -> PlotVisibility {
        self.visibility
    }

    pub fn show_plots(&mut self) {
        self.visibility = PlotVisibility::Shown;
    }

    pub fn hide_plots(&mut self) {
        self.visibility = PlotVisibility::Hidden;
    }

    /// Start a run; supersedes every earlier ticket.
    pub fn begin_run(&mut self) -> RunTicket {
        self.generation += 1;
        RunTicket(self.generation)
    }

    /// Store an outcome if `ticket` is still the latest. Returns whether it
    /// was accepted.
    pub fn publish(
        &mut self,
        ticket: RunTicket,
        outcome: Result<PipelineReport, PipelineError>,
    ) -> bool {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                latest = self.generation,
                "discarding superseded run"
            );
            return false;
        }
        self.latest = Some(outcome);
        true
    }

    /// Run the pipeline and publish its outcome.
    pub fn run<S>(&mut self, source: &S, request: &PipelineRequest) -> bool
    where
        S: SeriesSource + ?Sized,
    {
        let ticket = self.begin_run();
        let outcome = run_pipeline(source, request);
        self.publish(ticket, outcome)
    }

    /// The most recently published outcome.
    pub fn latest(&self) -> Option<&Result<PipelineReport, PipelineError>> {
        self.latest.as_ref()
    }
}
