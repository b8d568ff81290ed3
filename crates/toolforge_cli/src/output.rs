//! Console output.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use toolforge_plan::DeclaredIo;
use toolforge_runtime::RunReport;

/// Spinner shown while a run is in progress; hidden when stderr is not a
/// terminal
pub fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// One block per run: outcome, archive, warnings
pub fn summary(report: &RunReport) {
    let status = if report.succeeded() {
        style("ok").green().bold()
    } else {
        style("FAILED").red().bold()
    };
    println!("{} {}", style(&report.tool_name).bold(), status);
    if let Some(mode) = report.mode {
        println!("  mode     {:?}", mode);
    }
    println!("  command  {}", report.command);
    if let Some(archive) = &report.archive {
        println!("  archive  {}", archive.display());
    }
    if let Some(failure) = &report.failure {
        println!("  {} {}", style("error").red(), failure);
    }
    for warning in &report.warnings {
        println!("  {} {}", style("warning").yellow(), warning);
    }
}

/// Table of declared data
pub fn declared(io: &DeclaredIo) {
    println!("{}", style("inputs").bold());
    for d in &io.inputs {
        println!("  {:<24} {}", d.name, style(&d.format).dim());
    }
    println!("{}", style("outputs").bold());
    for d in &io.outputs {
        println!("  {:<24} {}", d.name, style(&d.format).dim());
    }
    for c in &io.collections {
        println!("  {:<24} {}", c, style("collection").dim());
    }
}
