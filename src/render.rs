//! Text and JSON output for the `ctx` command

use colored::Colorize;
use ctx::{
    CreatedRepository, CtxError, DiffReport, MergePreview, MergeRejection, Outcome, Report,
    RepositoryManager, RepositoryRecord, RepositoryStatus,
};
use dialoguer::Confirm;
use serde::Serialize;

type OpResult<T> = Result<Outcome<T>, CtxError>;

/// Prints operation results either as text or as a JSON [`Report`]
pub struct Printer {
    json: bool,
    default_branch: String,
}

impl Printer {
    pub fn new(json: bool, default_branch: impl Into<String>) -> Self {
        Self {
            json,
            default_branch: default_branch.into(),
        }
    }

    fn report(&self, report: &Report) -> bool {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing to JSON: {}", e),
        }
        report.success
    }

    /// Print `result` as JSON, or run `show` on success / print the error
    fn print<T: Serialize>(&self, result: OpResult<T>, show: impl FnOnce(&Outcome<T>)) -> bool {
        if self.json {
            return self.report(&Report::from(result));
        }
        match result {
            Ok(outcome) => {
                show(&outcome);
                true
            }
            Err(e) => {
                failure(&e);
                false
            }
        }
    }

    pub fn simple<T: Serialize>(&self, result: OpResult<T>) -> bool {
        self.print(result, |outcome| {
            println!("{} {}", "✓".bright_green().bold(), outcome.message)
        })
    }

    pub fn created(&self, result: OpResult<CreatedRepository>) -> bool {
        self.print(result, |outcome| {
            let created = &outcome.data;
            for file in &created.copied_files {
                println!("  {} {}", "Copied".bright_black(), file);
            }
            println!("{} {}", "✓".bright_green().bold(), outcome.message);
            println!(
                "{} Files committed with 'first commit' message",
                "✓".bright_green().bold()
            );
            println!("\n{}", "Next steps:".bright_cyan().bold());
            println!(
                "  1. Edit the files in {} with your context",
                created.relative_path.bright_blue()
            );
            println!("  2. Start exploring ideas with 'ctx explore <topic>'");
        })
    }

    pub fn status(&self, result: OpResult<RepositoryStatus>) -> bool {
        self.print(result, |outcome| {
            let status = &outcome.data;
            println!(
                "{} {}",
                "Repository:".bright_cyan().bold(),
                status.repository.name.bright_blue()
            );
            println!(
                "{} {}",
                "Current branch:".bright_cyan().bold(),
                self.branch_colored(&status.current_branch)
            );
            let branches: Vec<String> = status
                .branches
                .iter()
                .map(|b| self.branch_colored(b).to_string())
                .collect();
            println!(
                "{} {}",
                "All branches:".bright_cyan().bold(),
                branches.join(", ")
            );

            if status.is_dirty {
                println!("\n{}", "Uncommitted changes:".yellow().bold());
                for change in &status.changes {
                    println!("  {:>2} {}", change.code.yellow(), change.path);
                }
            } else {
                println!("\n{}", "Working tree clean".green());
            }
        })
    }

    pub fn list(&self, result: OpResult<Vec<RepositoryRecord>>) -> bool {
        self.print(result, |outcome| {
            if outcome.data.is_empty() {
                println!("{}", outcome.message);
                println!("Create one with 'ctx new'.");
                return;
            }
            println!("{}", "ctx repositories:".bright_cyan().bold());
            for record in &outcome.data {
                let marker = if record.is_active {
                    "*".bright_green().bold()
                } else {
                    " ".normal()
                };
                let state = if record.is_valid {
                    "ok".green()
                } else if record.exists {
                    "not a ctx repository".bright_red()
                } else {
                    "missing".bright_red()
                };
                println!(
                    "{} {} {} ({})",
                    marker,
                    record.name.bright_blue(),
                    record.absolute_path.display().to_string().white(),
                    state
                );
            }
        })
    }

    fn branch_colored(&self, branch: &str) -> colored::ColoredString {
        if is_primary(branch, &self.default_branch) {
            branch.bright_white().bold()
        } else {
            branch.bright_magenta()
        }
    }

    pub fn diff(&self, result: OpResult<DiffReport>) -> bool {
        self.print(result, |outcome| {
            if outcome.data.has_changes {
                print!("{}", outcome.data.diff);
            } else {
                println!("No changes");
            }
        })
    }
}

/// Run the integrate command: preview, confirm if needed, then merge
pub fn integrate(
    manager: &RepositoryManager,
    out: &Printer,
    exploration: &str,
    target: Option<&str>,
    preview_only: bool,
    yes: bool,
) -> bool {
    let preview = match manager.preview_integration(exploration, target) {
        Ok(outcome) => outcome,
        Err(e) => return out.print::<MergePreview>(Err(e), |_| {}),
    };

    if out.json {
        if preview_only {
            return out.report(&Report::from(Ok::<_, CtxError>(preview)));
        }
        if preview.data.has_conflicts() && !yes {
            let mut report = Report::from(Ok::<_, CtxError>(preview));
            report.success = false;
            report.error = Some("Conflicts predicted; re-run with --yes to integrate anyway".into());
            return out.report(&report);
        }
    } else {
        show_preview(&preview.data);
        if preview_only {
            return true;
        }
        if preview.data.has_conflicts() && !yes {
            let proceed = Confirm::new()
                .with_prompt("Conflicts detected. Proceed with integration anyway?")
                .default(false)
                .interact()
                .unwrap_or(false);
            if !proceed {
                println!("Integration cancelled.");
                return true;
            }
        }
        println!("\nProceeding with integration...");
    }

    out.simple(manager.perform_integration(exploration, target))
}

fn show_preview(preview: &MergePreview) {
    println!(
        "{}",
        format!("Merge preview: {} → {}", preview.source(), preview.target())
            .bright_cyan()
            .bold()
    );

    if !preview.has_changes() {
        println!("No changes to merge.");
        return;
    }

    let count = preview.changed_files().len();
    println!("Files that would be affected: {}", count.to_string().bright_blue().bold());
    for file in preview.changed_files() {
        println!("  {} {}", "•".bright_black(), file);
    }

    if preview.has_conflicts() {
        let conflicts = preview.conflicts();
        let warn_text = format!(
            "⚠ {} potential conflict{}",
            conflicts.len(),
            if conflicts.len() == 1 { "" } else { "s" }
        );
        println!("\n{}", warn_text.bright_yellow().bold());
        for conflict in conflicts {
            println!("  {} {}", "→".bright_red(), conflict.path.yellow());
        }
    } else {
        println!(
            "\n{} {}",
            "✓".bright_green().bold(),
            "No conflicts detected. Merge should be clean.".green()
        );
    }
}

/// Whether `branch` is the branch explorations integrate into
fn is_primary(branch: &str, default_branch: &str) -> bool {
    branch == default_branch
}

fn failure(e: &CtxError) {
    eprintln!("{} {}", "Error:".bright_red().bold(), e);
    match e {
        CtxError::UnknownRepository { available, .. } if !available.is_empty() => {
            eprintln!("Available repositories: {}", available.join(", "));
        }
        CtxError::InvalidMergeRequest(MergeRejection::UnknownSource { available, .. }) => {
            eprintln!("Available explorations: {}", available.join(", "));
        }
        CtxError::UnknownRevision { available } => {
            eprintln!("Available branches: {}", available.join(", "));
        }
        _ => {}
    }
}
