use crate::logging::{log, LogLevel};
use std::collections::BTreeMap;
use std::time::Duration;

pub const PHASE_MENU: &str = "Menu Fetch";
pub const PHASE_LISTING: &str = "Listing Fetch";
pub const PHASE_DETAIL: &str = "Detail Fetch";
pub const PHASE_SAVE: &str = "Save Output";

const PHASE_ORDER: [&str; 4] = [PHASE_MENU, PHASE_LISTING, PHASE_DETAIL, PHASE_SAVE];
const FETCH_PHASES: [&str; 3] = [PHASE_MENU, PHASE_LISTING, PHASE_DETAIL];

#[derive(Debug, Clone, Default)]
pub struct PhaseStats {
    pub ok: usize,
    pub fail: usize,
    pub skip_or_empty: usize,
    pub total_tasks: usize,
}

impl PhaseStats {
    pub fn add_ok(&mut self) {
        self.ok += 1;
    }
    pub fn add_fail(&mut self) {
        self.fail += 1;
    }
    pub fn add_skip(&mut self) {
        self.skip_or_empty += 1;
    }
    pub fn add_total(&mut self, n: usize) {
        self.total_tasks += n;
    }
    pub fn get_processed(&self) -> usize {
        self.ok + self.fail + self.skip_or_empty
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    phases: BTreeMap<&'static str, PhaseStats>,
    pub sections: usize,
    pub records: usize,
    pub duplicates: usize,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            phases: PHASE_ORDER
                .iter()
                .map(|&p| (p, PhaseStats::default()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn phase(&mut self, name: &'static str) -> &mut PhaseStats {
        self.phases.entry(name).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&PhaseStats> {
        self.phases.get(name)
    }

    pub fn fetch_failures(&self) -> usize {
        FETCH_PHASES
            .iter()
            .filter_map(|p| self.phases.get(p))
            .map(|s| s.fail)
            .sum()
    }
}

pub fn print_summary(stats: &RunStats, duration: Duration) {
    let sep = "=".repeat(60);
    println!("\n{}\n{:^60}\n{}", sep, "Crawl Summary", sep);
    println!("Total Run Time:    {:.3?}", duration);
    println!("Sections:          {}", stats.sections);
    println!(
        "Products:          {} ({} duplicate(s) dropped)",
        stats.records, stats.duplicates
    );
    println!("{}", "-".repeat(60));

    println!(
        "{:<17} {:<8} {:<12} {:<8} {:<8}",
        "Phase", "OK", "Skip/Empty", "Fail", "Total"
    );
    println!("{}", "-".repeat(60));

    for &phase in &PHASE_ORDER {
        if let Some(s) = stats.get(phase) {
            println!(
                "{:<17} {:<8} {:<12} {:<8} {:<8}",
                phase, s.ok, s.skip_or_empty, s.fail, s.total_tasks
            );
        }
    }
    println!("{}", sep);

    log_overall_status(stats);

    let end_ts_str = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    log(
        LogLevel::Step,
        &format!("--- Run Finished at {} ---", end_ts_str),
    );
}

fn log_overall_status(stats: &RunStats) {
    let save_failures = stats.get(PHASE_SAVE).map_or(0, |s| s.fail);
    let fetch_failures = stats.fetch_failures();

    if save_failures > 0 {
        log(LogLevel::Error, "Run failed: output could not be saved.");
    } else if fetch_failures > 0 {
        log(
            LogLevel::Warning,
            &format!(
                "Run completed; {} fetch task(s) were dropped. Check logs.",
                fetch_failures
            ),
        );
    } else {
        log(LogLevel::Success, "Run completed successfully.");
    }
}

/// Dropped units of work are reported but never fail the run; only saving does.
pub fn determine_exit_code(stats: &RunStats) -> i32 {
    if stats.get(PHASE_SAVE).map_or(0, |s| s.fail) > 0 {
        1
    } else {
        0
    }
}
