use std::time::Duration;

/// Default number of steps between progress log lines.
pub const DEFAULT_REPORT_EVERY: usize = 100;

/// Per-run logging and profiling state.
///
/// A context is moved into exactly one solver run and handed back, as a
/// [`StepProfile`], inside the run outcome. Nothing here is global, so
/// concurrent runs never share counters.
#[derive(Debug, Clone)]
pub struct RunContext {
    label: String,
    verbose: bool,
    report_every: usize,
    profile: StepProfile,
}

impl RunContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            verbose: false,
            report_every: DEFAULT_REPORT_EVERY,
            profile: StepProfile::default(),
        }
    }

    /// Log periodic progress at `info` instead of `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Steps between progress lines. Zero disables them.
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Account for one finished step.
    pub fn record_step(&mut self, iteration: usize, delta: f64, elapsed: Duration) {
        self.profile.record(elapsed);

        if self.report_every == 0 || iteration % self.report_every != 0 {
            return;
        }
        if self.verbose {
            log::info!("[{}] step {iteration}: delta {delta:.6}", self.label);
        } else {
            log::debug!("[{}] step {iteration}: delta {delta:.6}", self.label);
        }
    }

    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    pub fn into_profile(self) -> StepProfile {
        self.profile
    }
}

/// Wall-clock timing of the steps of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepProfile {
    pub steps: usize,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl StepProfile {
    fn record(&mut self, elapsed: Duration) {
        self.steps += 1;
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = Some(self.max.map_or(elapsed, |m| m.max(elapsed)));
    }

    /// Average step time, `None` before the first step.
    pub fn mean(&self) -> Option<Duration> {
        if self.steps == 0 {
            return None;
        }
        Some(self.total / self.steps as u32)
    }
}
