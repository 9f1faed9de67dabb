//! Interface de terminal do runner: banner, spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner (em stderr) e `console` para as cores.
//! As mensagens de log do job vão para stdout, na ordem recebida.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::RunnerError;
use crate::logs::LogSink;
use crate::rpc::{TaskRow, TaskState};
use crate::state_machine::{JobRequest, RunReport};

/// Acompanha visualmente a execução de um job no terminal.
pub struct JobProgress {
    pb: ProgressBar,
    task: String,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    /// Imprime o banner de início e liga o spinner.
    pub fn start(request: &JobRequest) -> Self {
        let bold = Style::new().bold();
        println!("INFO: dbt {} starting ...", bold.apply_to(&request.task));
        println!("\nRUN LOGS:");
        println!("{}", "-".repeat(54));

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("{}: submitting", request.task));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            task: request.task.clone(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e mostra o estado terminal do job.
    pub fn complete(&self, report: &RunReport) {
        self.pb.finish_and_clear();
        println!("{}", "-".repeat(54));
        if report.succeeded() {
            println!(
                "  {} {} finished: {} ({} ms)",
                self.green.apply_to("✓"),
                report.task,
                report.final_state,
                report.duration_ms
            );
        } else {
            println!(
                "  {} {} finished: {} ({} ms)",
                self.red.apply_to("✗"),
                report.task,
                self.red.apply_to(&report.final_state),
                report.duration_ms
            );
        }
    }

    /// Finaliza o spinner após um erro do runner (timeout, cancelamento, RPC).
    pub fn abort(&self, err: &RunnerError) {
        self.pb.finish_and_clear();
        let marker = match err {
            RunnerError::Cancelled { .. } | RunnerError::TimedOut { .. } => self.yellow.apply_to("⏹"),
            _ => self.red.apply_to("✗"),
        };
        eprintln!("  {marker} {}: {err}", self.task);
    }

    /// Imprime o relatório da execução em JSON.
    pub fn print_report(&self, report: &RunReport) {
        let style = if report.succeeded() { &self.green } else { &self.red };
        println!();
        println!("{}", style.apply_to("─── Run Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

impl LogSink for JobProgress {
    fn emit(&mut self, message: &str) {
        self.pb.suspend(|| println!("{message}"));
    }

    fn observe(&mut self, state: &TaskState) {
        self.pb.set_message(format!("{}: {state}", self.task));
    }
}

/// Lista as tarefas conhecidas pelo servidor, uma por linha.
pub fn print_tasks(rows: &[TaskRow]) {
    if rows.is_empty() {
        println!("{}", Style::new().yellow().apply_to("No tasks found."));
        return;
    }

    for row in rows {
        let state_style = match row.state {
            TaskState::Success => Style::new().green(),
            TaskState::Running => Style::new().cyan(),
            _ => Style::new().red(),
        };
        println!(
            "  {}  {:<14} {}",
            row.task_id,
            row.method.as_deref().unwrap_or("-"),
            state_style.apply_to(&row.state)
        );
    }
}
