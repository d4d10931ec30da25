//! Full-frame text layout of one screen.

use topic_core::{AppViewModel, OutcomeView, RunState, Screen, Settings, SlotView};

use super::constants::{HELP_LINES, PROGRESS_BAR_WIDTH, RULE_WIDTH};

pub fn tab_bar(active: Screen) -> String {
    Screen::ALL
        .iter()
        .map(|screen| {
            if *screen == active {
                format!("[{}]", screen.title())
            } else {
                format!(" {} ", screen.title())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled),
        percent
    )
}

pub fn help() -> Vec<String> {
    HELP_LINES.iter().map(|line| format!("  {line}")).collect()
}

/// One-line status of a slot, e.g. `modeling: Running job #3 [####....]  40% Clustering`.
pub fn status_line(slot: &SlotView) -> String {
    let mut line = format!("{}: {}", slot.slot, slot.run_state.label());
    if let Some(job_id) = slot.job_id {
        line.push_str(&format!(" job #{job_id}"));
    }
    if slot.run_state == RunState::Running {
        if let Some(percent) = slot.progress {
            line.push(' ');
            line.push_str(&progress_bar(percent));
        }
        if let Some(step) = &slot.step {
            line.push(' ');
            line.push_str(step);
        }
        if slot.cancel_requested {
            line.push_str(" (cancelling)");
        }
    }
    line
}

pub fn outcome_lines(slot: &SlotView) -> Vec<String> {
    let tag = format!("[{}]", slot.slot);
    let job = slot
        .job_id
        .map(|id| format!("job #{id}"))
        .unwrap_or_else(|| "job".to_string());
    match &slot.outcome {
        Some(OutcomeView::Result {
            output_dir,
            artifacts,
            summary,
        }) => {
            let mut lines = vec![format!(
                "{tag} {job} succeeded, output in {}",
                output_dir.display()
            )];
            if let Some(summary) = summary {
                lines.push(format!("{tag}   {summary}"));
            }
            lines.extend(
                artifacts
                    .iter()
                    .map(|artifact| format!("{tag}   {}: {}", artifact.name, artifact.path.display())),
            );
            lines
        }
        Some(OutcomeView::Error { description }) => {
            vec![format!("{tag} {job} failed: {description}")]
        }
        Some(OutcomeView::Cancelled) => vec![format!("{tag} {job} cancelled")],
        None => Vec::new(),
    }
}

pub fn full_frame(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![tab_bar(view.screen), rule()];
    match view.screen.slot().and_then(|slot| view.slot(slot)) {
        Some(slot) => lines.extend(slot_panel(slot)),
        None => lines.extend(settings_panel(&view.settings, view.settings_error.as_deref())),
    }
    lines.push(rule());
    lines.extend(view.slots.iter().map(status_line));
    lines
}

fn slot_panel(slot: &SlotView) -> Vec<String> {
    let mut lines = vec![status_line(slot), String::new()];
    let width = slot
        .form
        .iter()
        .map(|entry| entry.field.name().len())
        .max()
        .unwrap_or(0);
    for entry in &slot.form {
        let mut line = format!("  {:<width$} = {}", entry.field.name(), entry.value);
        if let Some(error) = &entry.error {
            line.push_str(&format!("   <- {error}"));
        }
        lines.push(line);
    }
    if !slot.validation_errors.is_empty() {
        lines.push(String::new());
        lines.push("Cannot submit:".to_string());
        lines.extend(slot.validation_errors.iter().map(|err| format!("  - {err}")));
    }
    let outcome = outcome_lines(slot);
    if !outcome.is_empty() {
        lines.push(String::new());
        lines.extend(outcome);
    }
    if !slot.log_tail.is_empty() {
        lines.push(String::new());
        if slot.dropped_log_lines > 0 {
            lines.push(format!("({} earlier log lines dropped)", slot.dropped_log_lines));
        }
        lines.extend(
            slot.log_tail
                .iter()
                .map(|line| format!("{:<5} {}", line.severity.label(), line.text)),
        );
    }
    lines
}

fn settings_panel(settings: &Settings, error: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        format!("  device              = {}", settings.hardware.device.name()),
        format!("  tokenizer_processes = {}", settings.hardware.tokenizer_processes),
        format!("  llm.provider        = {}", settings.llm.provider.name()),
    ];
    if let Some(active) = settings.llm.active() {
        lines.extend([
            format!("  llm.api_key         = {}", active.masked_key()),
            format!("  llm.base_url        = {}", active.base_url),
            format!("  llm.model           = {}", active.model),
        ]);
    }
    lines.extend([
        format!("  worker.program      = {}", settings.worker.program),
        format!("  worker.args         = {}", settings.worker.args.join(" ")),
        format!("  output_dir          = {}", settings.output_dir.display()),
        format!("  console_max_lines   = {}", settings.console_max_lines),
        format!("  display_log_lines   = {}", settings.display_log_lines),
    ]);
    if let Some(error) = error {
        lines.push(String::new());
        lines.push(format!("Last change rejected: {error}"));
    }
    lines
}
