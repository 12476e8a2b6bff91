// bases/mirror_ctl/src/output.rs
use std::fmt::Write;

use tokio::sync::mpsc;
use zfs_mirror::{
    ExecutionMode, ExecutionProgress, HostApplyResult, HostStatus, MirrorApplyResult, StageResult,
    StageStatus,
};

/// Line break that keeps later plan commands under the first one in a stage line
const PLAN_CONTINUATION: &str = "\n                                      ";

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn print_apply(&self, result: &HostApplyResult, mode: ExecutionMode) {
        print!("{}", self.render_apply(result, mode));
    }

    pub fn print_status(&self, status: &HostStatus) {
        print!("{}", render_status(status));
    }

    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> color_eyre::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }

    pub fn render_apply(&self, result: &HostApplyResult, mode: ExecutionMode) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} [{}] ==", result.host, mode);

        if result.mirrors.is_empty() {
            let _ = writeln!(out, "no mirrors configured");
        }
        for mirror in &result.mirrors {
            self.render_mirror(&mut out, mirror);
        }

        let verdict = if result.success { "OK" } else { "FAILED" };
        let _ = writeln!(out, "Result: {}", verdict);
        out
    }

    fn render_mirror(&self, out: &mut String, mirror: &MirrorApplyResult) {
        let _ = writeln!(
            out,
            "{}: {} + {} -> {}",
            mirror.pool, mirror.existing_disk, mirror.new_disk, mirror.status
        );

        if let Some(report) = &mirror.preflight {
            let failed = report.failed();
            if self.verbose || !failed.is_empty() {
                let _ = writeln!(out, "  preflight:");
                for check in report.iter().filter(|c| self.verbose || !c.passed) {
                    let mark = if check.passed { "ok  " } else { "FAIL" };
                    let _ = writeln!(out, "    {} {:<22} {}", mark, check.name, check.detail);
                }
            }
        }

        if !mirror.blocking_checks.is_empty() {
            let names: Vec<&str> = mirror.blocking_checks.iter().map(|c| c.as_str()).collect();
            let _ = writeln!(out, "  blocked by: {}", names.join(", "));
        }

        if !mirror.stages.is_empty() {
            let _ = writeln!(out, "  stages:");
            for stage in &mirror.stages {
                let _ = writeln!(out, "    {}", self.stage_line(stage));
            }
        }

        if let Some(resilver) = &mirror.resilver {
            let _ = writeln!(
                out,
                "  pool: state={} mirror={} scan: {}",
                resilver.state,
                resilver.is_mirror,
                if resilver.scan.is_empty() { "none" } else { resilver.scan.as_str() }
            );
        }
    }

    fn stage_line(&self, stage: &StageResult) -> String {
        let detail = match stage.status {
            StageStatus::Skipped => stage.reason.clone(),
            StageStatus::WouldExecute => stage
                .command
                .as_deref()
                .map(|plan| plan.lines().collect::<Vec<_>>().join(PLAN_CONTINUATION)),
            StageStatus::Failed => stage.error.clone(),
            StageStatus::Done if self.verbose => stage.output.clone(),
            StageStatus::Done => None,
        };
        match detail {
            Some(detail) => format!("{:<18} {:<14} {}", stage.stage, stage.status, detail),
            None => format!("{:<18} {}", stage.stage, stage.status),
        }
    }
}

pub fn render_status(status: &HostStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", status.host);

    if status.mirrors.is_empty() {
        let _ = writeln!(out, "no mirrors configured");
    }
    for mirror in &status.mirrors {
        let layout = if mirror.is_mirror { "mirror" } else { "single" };
        let _ = writeln!(out, "{}: {} ({})", mirror.pool, mirror.state, layout);
        let _ = writeln!(out, "  existing: {}", mirror.existing_disk);
        let _ = writeln!(out, "  new:      {}", mirror.new_disk);
        if !mirror.scan.is_empty() {
            let _ = writeln!(out, "  scan:     {}", mirror.scan);
        }
        for disk in &mirror.vdev_disks {
            let _ = writeln!(out, "  vdev:     {}", disk);
        }
    }
    out
}

/// Print progress events until the sender side goes away
pub async fn print_progress(mut rx: mpsc::Receiver<ExecutionProgress>) {
    while let Some(event) = rx.recv().await {
        match event {
            ExecutionProgress::Started { id, description } => {
                eprintln!("▶ {}: {}", id, description)
            }
            ExecutionProgress::Progress { id, message } => eprintln!("  {}: {}", id, message),
            ExecutionProgress::Skipped { id, reason } => eprintln!("⏭ {}: {}", id, reason),
            ExecutionProgress::Complete { id } => eprintln!("✔ {}", id),
            ExecutionProgress::Failed { id, error } => eprintln!("✘ {}: {}", id, error),
        }
    }
}
