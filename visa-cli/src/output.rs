//! Output Formatting
//!
//! Utilities for formatting CLI output in various formats.

use crate::commands::OutputFormat;
use serde::Serialize;
use visa_client::api::{FormProgress, SubmitResult};
use visa_client::TransitionAttempt;
use visa_core::{
    status_meta, ActivityEntry, Actor, Case, CaseLink, CaseTrigger, DiagnosisReport, Notification, Paginated,
    StatisticsOverview, StatusCount, Timestamp, TranslationComparison, TranslationField, TrendPoint,
    ValidationErrors, VisaTypeCount,
};

/// Format and print data based on output format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table | OutputFormat::Plain => print_json(data),
    }
}

/// Print as JSON
pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

fn heading(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count().max(20)));
}

fn format_time(t: &Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn actions_line(actions: &[CaseTrigger]) -> String {
    if actions.is_empty() {
        return "-".to_string();
    }
    actions
        .iter()
        .map(|t| format!("{} ({})", t.as_str(), t.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print one case with the actions currently offered
pub fn print_case(case: &Case, actions: &[CaseTrigger], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(case),
        OutputFormat::Table => {
            heading(&format!("Case {}", case.case_number));
            print_row("ID:", case.id.as_str());
            print_row("Visa Type:", case.visa_type.label());
            print_row("Status:", &format!("{} ({})", status_meta(case.status).label, case.status));
            print_row("Review Round:", &case.review_round.to_string());
            if let Some(applicant) = &case.applicant {
                print_row("Applicant:", &applicant.name);
                if !applicant.email.is_empty() {
                    print_row("Email:", &applicant.email);
                }
            }
            print_row("Created:", &format_time(&case.created_at));
            print_row("Updated:", &format_time(&case.updated_at));
            print_row("Actions:", &actions_line(actions));
        }
        OutputFormat::Plain => println!("{} {} {}", case.id, case.case_number, case.status),
    }
}

pub fn print_case_list(page: &Paginated<Case>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(page),
        OutputFormat::Table => {
            println!(
                "{:<24} {:<18} {:<8} {:<16} {}",
                "ID", "NUMBER", "TYPE", "APPLICANT", "STATUS"
            );
            print_separator();
            for case in &page.items {
                let applicant = case.applicant.as_ref().map(|a| a.name.as_str()).unwrap_or("-");
                println!(
                    "{:<24} {:<18} {:<8} {:<16} {}",
                    case.id,
                    case.case_number,
                    case.visa_type,
                    applicant,
                    status_meta(case.status).label
                );
            }
            println!();
            println!(
                "Page {}/{} ({} total)",
                page.page,
                page.total_pages().max(1),
                page.total
            );
        }
        OutputFormat::Plain => {
            for case in &page.items {
                println!("{} {}", case.id, case.status);
            }
        }
    }
}

fn actor_line(actor: &Actor) -> String {
    match actor {
        Actor::Consultant(id) => format!("consultant {}", id),
        Actor::Client(_) => "client".to_string(),
        Actor::System => "system".to_string(),
    }
}

pub fn print_timeline(entries: &[ActivityEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Table | OutputFormat::Plain => {
            for entry in entries {
                print!(
                    "{}  {:<16} {}",
                    format_time(&entry.timestamp),
                    status_meta(entry.status).label,
                    actor_line(&entry.actor)
                );
                if let Some(note) = &entry.note {
                    print!("  {}", note);
                }
                println!();
            }
        }
    }
}

/// Outcome of a lifecycle action
pub fn print_transition(attempt: &TransitionAttempt, format: OutputFormat) {
    #[derive(Serialize)]
    struct Row<'a> {
        trigger: CaseTrigger,
        from: visa_core::CaseStatus,
        requested: visa_core::CaseStatus,
        applied: bool,
        case: Option<&'a Case>,
        error: Option<String>,
    }

    match format {
        OutputFormat::Json => print_json(&Row {
            trigger: attempt.trigger,
            from: attempt.from,
            requested: attempt.requested,
            applied: attempt.applied(),
            case: attempt.case.as_ref(),
            error: attempt.outcome.as_ref().err().map(|e| e.user_message()),
        }),
        OutputFormat::Table | OutputFormat::Plain => {
            let now = attempt.case.as_ref().map(|c| c.status).unwrap_or(attempt.from);
            println!(
                "{}: {} -> {}",
                attempt.trigger.label(),
                status_meta(attempt.from).label,
                status_meta(now).label
            );
            if !attempt.applied() && attempt.outcome.is_ok() {
                print_warning("Request accepted but the status has not changed yet");
            }
        }
    }
}

pub fn print_statuses(format: OutputFormat) {
    #[derive(Serialize)]
    struct Row {
        status: visa_core::CaseStatus,
        label: &'static str,
        label_en: &'static str,
        actions: Vec<CaseTrigger>,
    }

    let rows: Vec<Row> = visa_core::all_status_meta()
        .into_iter()
        .map(|m| Row {
            status: m.status,
            label: m.label,
            label_en: m.label_en,
            actions: m.allowed_actions.clone(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table | OutputFormat::Plain => {
            for row in &rows {
                println!(
                    "{:<26} {:<12} {}",
                    row.status.as_str(),
                    row.label,
                    row.actions.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
                );
            }
        }
    }
}

pub fn print_link(link: &CaseLink, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(link),
        OutputFormat::Table => {
            let now = chrono::Utc::now();
            heading("Client Link");
            print_row("Token:", link.token.as_str());
            print_row("Status:", link.effective_status(now).as_str());
            print_row("URL:", &link.access_url);
            print_row("Expires:", &format_time(&link.expires_at));
            print_row("Remaining:", &format!("{}h", link.remaining(now).num_hours()));
        }
        OutputFormat::Plain => println!("{}", link.access_url),
    }
}

pub fn print_report(report: &DiagnosisReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table | OutputFormat::Plain => {
            heading(&format!("Diagnosis Report (round {})", report.review_round));
            print_row("Report ID:", report.id.as_str());
            print_row("Risk Score:", &report.risk_score.to_string());
            print_row(
                "Issues:",
                &format!(
                    "{} blocker, {} warning, {} info",
                    report.counts.blocker, report.counts.warning, report.counts.info
                ),
            );
            if let Some(notes) = &report.consultant_notes {
                print_row("Notes:", notes);
            }
            println!();
            for issue in report.issues_by_priority() {
                let mark = if issue.fixed { "x" } else { " " };
                println!(
                    "[{}] {:<6} {:<20} {}",
                    mark,
                    issue.severity.label(),
                    issue.field_name,
                    issue.description
                );
                if !issue.suggestion.is_empty() {
                    println!("    建议: {}", issue.suggestion);
                }
                if let Some(note) = &issue.consultant_note {
                    println!("    备注: {}", note);
                }
                println!("    id: {}", issue.id);
            }
            if report.has_unfixed_blockers() {
                println!();
                print_warning("Unfixed blocker issues prevent approval");
            }
        }
    }
}

fn print_field(field: &TranslationField) {
    let flag = if field.needs_review() { "!" } else if field.edited { "*" } else { " " };
    println!("{} {:<12} {}", flag, field.id, field.label);
    println!("    {} => {}", field.source_value, field.translated_value);
}

pub fn print_comparison(comparison: &TranslationComparison, review_only: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json if review_only => print_json(&comparison.review_queue()),
        OutputFormat::Json => print_json(comparison),
        OutputFormat::Table | OutputFormat::Plain => {
            heading("Translation");
            if review_only {
                for field in comparison.review_queue() {
                    print_field(field);
                }
            } else {
                for field in &comparison.fields {
                    print_field(field);
                }
            }
        }
    }
}

pub fn print_validation_errors(errors: &ValidationErrors, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(errors),
        OutputFormat::Table | OutputFormat::Plain => {
            heading("Validation Errors");
            for (path, messages) in errors.iter() {
                for message in messages {
                    print_row(path, message);
                }
            }
        }
    }
}

pub fn print_progress(progress: &FormProgress, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(progress),
        OutputFormat::Table | OutputFormat::Plain => {
            heading("Questionnaire Progress");
            print_row("Completed:", &format!("{}%", progress.percentage));
            for step in visa_core::WizardStep::ALL {
                let mark = if progress.completed_steps.contains(&step) { "x" } else { " " };
                println!("[{}] {:<20} {}", mark, step.slug(), step.label());
            }
            if let Some(step) = progress.resume_at() {
                println!();
                print_row("Resume at:", step.slug());
            }
        }
    }
}

pub fn print_submit(result: &SubmitResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Table | OutputFormat::Plain => {
            print_success(result.message.as_deref().unwrap_or("Submitted"));
            print_row("Case status:", status_meta(result.case_status).label);
        }
    }
}

pub fn print_overview(overview: &StatisticsOverview, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(overview),
        OutputFormat::Table | OutputFormat::Plain => {
            heading("Overview");
            print_row("Total cases:", &overview.total_cases.to_string());
            print_row("Active:", &overview.active_cases.to_string());
            print_row("Completed:", &overview.completed_cases.to_string());
            print_row("Pending review:", &overview.pending_review.to_string());
            print_row("New this month:", &overview.new_this_month.to_string());
            print_row("Completion rate:", &format!("{:.1}%", overview.completion_rate()));
        }
    }
}

pub fn print_trend(points: &[TrendPoint], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&points),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("{:<12} {:>8} {:>10}", "DATE", "CREATED", "COMPLETED");
            for p in points {
                println!("{:<12} {:>8} {:>10}", p.date, p.created, p.completed);
            }
        }
    }
}

pub fn print_status_counts(counts: &[StatusCount], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&counts),
        OutputFormat::Table | OutputFormat::Plain => {
            for c in counts {
                print_row(status_meta(c.status).label, &c.count.to_string());
            }
        }
    }
}

pub fn print_visa_type_counts(counts: &[VisaTypeCount], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&counts),
        OutputFormat::Table | OutputFormat::Plain => {
            for c in counts {
                print_row(c.visa_type.as_str(), &c.count.to_string());
            }
        }
    }
}

pub fn print_notifications(page: &Paginated<Notification>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(page),
        OutputFormat::Table | OutputFormat::Plain => {
            for n in &page.items {
                let mark = if n.read { " " } else { "*" };
                println!("{} {:<24} {}  {}", mark, n.id, format_time(&n.created_at), n.title);
            }
            println!();
            println!("Page {}/{} ({} total)", page.page, page.total_pages().max(1), page.total);
        }
    }
}

/// Print error message
pub fn print_error(error: &crate::error::CliError) {
    eprintln!("Error: {}", error.user_message());
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("⚠ {}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{}", message);
}

/// Print a table row
pub fn print_row(key: &str, value: &str) {
    println!("{:<20} {}", key, value);
}

/// Print a separator line
pub fn print_separator() {
    println!("{}", "-".repeat(40));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_line() {
        assert_eq!(actions_line(&[]), "-");
        assert_eq!(
            actions_line(&[CaseTrigger::SendLink]),
            format!("send_link ({})", CaseTrigger::SendLink.label())
        );
    }

    #[test]
    fn test_actor_line_hides_token() {
        let line = actor_line(&Actor::Client(visa_core::LinkToken::new("secret")));
        assert_eq!(line, "client");
    }

    #[test]
    fn test_print_row_format() {
        print_row("Key", "Value");
    }
}
