use std::{cmp::min, io::Write, time::Duration};

use colored::Colorize;
use tracing::{debug, info, trace};

use libinterrupt::{err::InterruptResult, InterruptMonitor};

use super::config::SuiteConfig;

/// How a single spec ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecOutcome {
    Passed,
    /// An interrupt arrived while the spec was running.
    Interrupted,
    /// The suite was already interrupted when the spec came up.
    Skipped,
}

/// Counts of spec outcomes for a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub interrupted: usize,
    pub skipped: usize,
    /// Specs left out by the focus filter.
    pub unfocused: usize,
}

impl SuiteSummary {
    fn record(&mut self, outcome: SpecOutcome) {
        match outcome {
            SpecOutcome::Passed => self.passed += 1,
            SpecOutcome::Interrupted => self.interrupted += 1,
            SpecOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Return whether the run was cut short by an interrupt.
    pub fn was_interrupted(&self) -> bool {
        self.interrupted > 0 || self.skipped > 0
    }
}

/// A toy spec runner that stops cooperatively when interrupted.
///
/// Each spec "works" for the configured duration in small steps, waiting on
/// the interrupt notifier between steps instead of sleeping.
pub struct SuiteRunner<'a, W: Write> {
    monitor: &'a dyn InterruptMonitor,
    config: SuiteConfig,
    out: W,
}

impl<'a, W: Write> SuiteRunner<'a, W> {
    pub fn new(
        monitor: &'a dyn InterruptMonitor,
        config: SuiteConfig,
        out: W,
    ) -> Self {
        Self {
            monitor,
            config,
            out,
        }
    }

    //==================================================
    // Main Loop
    //==================================================

    /// Run every focused spec and return the summary.
    pub fn main_loop(&mut self) -> InterruptResult<SuiteSummary> {
        let mut summary = SuiteSummary::default();

        for i in 1..=self.config.specs {
            let name = format!("spec-{}", i);
            if let Some(focus) = &self.config.focus {
                if !focus.is_match(&name) {
                    trace!(spec = %name, "not focused");
                    summary.unfocused += 1;
                    continue;
                }
            }

            if self.config.interrupt_report {
                self.monitor.set_message(&format!(
                    "\nInterrupted while running spec {:?}",
                    name
                ));
            }

            let outcome = self.run_spec(&name);
            debug!(spec = %name, ?outcome, "spec finished");
            self.report_spec(&name, outcome)?;
            summary.record(outcome);
        }

        self.monitor.clear_message();
        self.report_summary(&summary)?;
        info!(?summary, "suite finished");

        Ok(summary)
    }

    /// Work through one spec, checking for an interrupt after every step.
    fn run_spec(&self, name: &str) -> SpecOutcome {
        let status = self.monitor.status();
        if status.interrupted {
            return SpecOutcome::Skipped;
        }

        let mut remaining = self.config.spec_duration;
        while remaining > Duration::ZERO {
            let step = min(self.config.step, remaining);
            if status.wait_timeout(step) {
                trace!(spec = name, "interrupted mid-spec");
                return SpecOutcome::Interrupted;
            }
            remaining -= step;
        }

        SpecOutcome::Passed
    }

    //==================================================
    // Output
    //==================================================

    fn report_spec(
        &mut self,
        name: &str,
        outcome: SpecOutcome,
    ) -> InterruptResult<()> {
        let tag = match outcome {
            SpecOutcome::Passed => "PASS".green().bold(),
            SpecOutcome::Interrupted => "ABORT".red().bold(),
            SpecOutcome::Skipped => "SKIP".yellow().bold(),
        };
        writeln!(self.out, "{} {}", tag, name)?;
        self.out.flush()?;
        Ok(())
    }

    fn report_summary(
        &mut self,
        summary: &SuiteSummary,
    ) -> InterruptResult<()> {
        writeln!(
            self.out,
            "\n{} passed, {} interrupted, {} skipped, {} unfocused",
            summary.passed,
            summary.interrupted,
            summary.skipped,
            summary.unfocused
        )?;
        if summary.was_interrupted() {
            writeln!(self.out, "{}", "Suite interrupted by user.".red())?;
        }
        self.out.flush()?;
        Ok(())
    }
}
