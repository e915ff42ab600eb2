//! Command Handlers
//!
//! Handler functions for CLI commands.

use crate::commands::{
    case::{CaseCommands, LinkCommands},
    dashboard::{NotificationCommands, StatsCommands},
    diagnosis::{DiagnosisCommands, TranslationCommands},
    wizard::WizardCommands,
    Cli, Commands, OutputFormat,
};
use crate::error::{CliError, CliResult};
use crate::output;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use visa_client::api::NotificationQuery;
use visa_client::{
    ApiClient, CaseWorkflow, ClientConfig, ClientError, FileCredentialStore, PollConfig, SessionContext,
    TranslationEditor,
};
use visa_core::validation::{validate_step, UploadKind};
use visa_core::{
    status_meta, CaseId, CaseListQuery, CaseStatus, CaseTrigger, CreateCaseRequest, GenerateLinkRequest,
    GuardContext, IssueId, LinkToken, NewApplicant, NotificationId, ReportId, SaveMode, SortOrder,
    TranslationFieldId, VisaType, WizardStep,
};

/// Connection settings extracted from CLI
struct Context {
    client: ApiClient,
    poll: PollConfig,
    format: OutputFormat,
}

impl Context {
    async fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut config = ClientConfig::from_env().with_api_url(cli.api_url.clone());
        config.api_prefix = cli.api_prefix.clone();
        debug!(base_url = %config.base_url(), "Using backend");

        let session = SessionContext::with_store(Arc::new(FileCredentialStore::new(&cli.session_file)));
        session.restore().await?;
        let client = ApiClient::from_config(&config, session)?;
        Ok(Self {
            client,
            poll: config.poll,
            format: cli.format,
        })
    }
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    // Offline commands need no backend
    match &cli.command {
        Commands::Wizard(WizardCommands::Steps) => return handle_steps(cli.format),
        Commands::Wizard(WizardCommands::Validate { step, file, draft }) => {
            return handle_validate(step, file, *draft, cli.format)
        }
        Commands::Case(CaseCommands::Statuses) => {
            output::print_statuses(cli.format);
            return Ok(());
        }
        _ => {}
    }

    let ctx = Context::from_cli(&cli).await?;
    match cli.command {
        Commands::Login {
            email,
            password,
            remember_me,
        } => handle_login(&ctx, &email, &password, remember_me).await,
        Commands::Logout => {
            ctx.client.auth().logout().await;
            output::print_success("Signed out");
            Ok(())
        }
        Commands::Whoami => handle_whoami(&ctx).await,
        Commands::Case(cmd) => handle_case(&ctx, cmd).await,
        Commands::Link(cmd) => handle_link(&ctx, cmd).await,
        Commands::Diagnosis(cmd) => handle_diagnosis(&ctx, cmd).await,
        Commands::Translation(cmd) => handle_translation(&ctx, cmd).await,
        Commands::Wizard(cmd) => handle_wizard(&ctx, cmd).await,
        Commands::Stats(cmd) => handle_stats(&ctx, cmd).await,
        Commands::Notifications(cmd) => handle_notifications(&ctx, cmd).await,
    }
}

async fn handle_login(ctx: &Context, email: &str, password: &str, remember_me: bool) -> CliResult<()> {
    let user = ctx.client.auth().login(email, password, remember_me).await?;
    match ctx.format {
        OutputFormat::Json => output::print_json(&user),
        _ => {
            output::print_success(&format!("Signed in as {}", user.email));
            if !remember_me {
                output::print_warning("Session not stored; pass --remember-me to stay signed in");
            }
        }
    }
    Ok(())
}

async fn handle_whoami(ctx: &Context) -> CliResult<()> {
    if !ctx.client.session().is_signed_in().await {
        return Err(ClientError::NotSignedIn.into());
    }
    let user = ctx.client.auth().me().await?;
    match ctx.format {
        OutputFormat::Json => output::print_json(&user),
        _ => {
            output::print_row("Email:", &user.email);
            output::print_row("Name:", &user.full_name);
            output::print_row("Role:", &user.role);
        }
    }
    Ok(())
}

async fn handle_case(ctx: &Context, cmd: CaseCommands) -> CliResult<()> {
    let cases = ctx.client.cases();
    match cmd {
        CaseCommands::List {
            page,
            per_page,
            status,
            search,
            asc,
        } => {
            let query = CaseListQuery {
                page,
                per_page,
                status: status.as_deref().map(CaseStatus::parse).transpose()?,
                search,
                sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
                ..Default::default()
            };
            let page = cases.list(&query).await?;
            output::print_case_list(&page, ctx.format);
        }
        CaseCommands::Show { id } => {
            let id = CaseId::new(id);
            let case = cases.get(&id).await?;
            let report = ctx.client.diagnosis().latest(&id).await?;
            let guard = GuardContext {
                latest_report: report.as_ref(),
            };
            let actions: Vec<CaseTrigger> = status_meta(case.status)
                .allowed_actions
                .iter()
                .copied()
                .filter(|t| case.can_apply(*t, &guard))
                .collect();
            output::print_case(&case, &actions, ctx.format);
        }
        CaseCommands::Create {
            visa_type,
            name,
            pinyin,
            email,
            phone,
            passport,
            notes,
        } => {
            let visa_type = VisaType::parse(&visa_type)
                .ok_or_else(|| CliError::invalid_arg(format!("unknown visa type: {}", visa_type)))?;
            let request = CreateCaseRequest {
                visa_type,
                applicant: NewApplicant {
                    name,
                    name_pinyin: pinyin.unwrap_or_default(),
                    email: email.unwrap_or_default(),
                    phone: phone.unwrap_or_default(),
                    passport_number: passport.unwrap_or_default(),
                },
                notes,
            };
            let case = cases.create(&request).await?;
            output::print_case(&case, &status_meta(case.status).allowed_actions, ctx.format);
        }
        CaseCommands::Delete { id } => {
            cases.delete(&CaseId::new(id.as_str())).await?;
            output::print_success(&format!("Case {} deleted", id));
        }
        CaseCommands::Timeline { id } => {
            let entries = cases.timeline(&CaseId::new(id)).await?;
            output::print_timeline(&entries, ctx.format);
        }
        CaseCommands::Act { id, trigger, wait } => {
            handle_act(ctx, CaseId::new(id), CaseTrigger::parse(&trigger)?, wait).await?;
        }
        CaseCommands::Statuses => output::print_statuses(ctx.format),
    }
    Ok(())
}

async fn handle_act(ctx: &Context, case_id: CaseId, trigger: CaseTrigger, wait: bool) -> CliResult<()> {
    let workflow = CaseWorkflow::new(ctx.client.clone());
    let attempt = workflow.perform(&case_id, trigger).await?;
    output::print_transition(&attempt, ctx.format);

    let pending_ai = attempt
        .case
        .as_ref()
        .map(|c| c.status.is_ai_pending())
        .unwrap_or(false);
    let applied = attempt.applied();
    attempt.outcome?;

    if wait && applied && pending_ai {
        output::print_info("Waiting for AI job...");
        let case = workflow.await_ai(&case_id, &ctx.poll).await?;
        output::print_case(&case, &status_meta(case.status).allowed_actions, ctx.format);
    }
    Ok(())
}

async fn handle_link(ctx: &Context, cmd: LinkCommands) -> CliResult<()> {
    let links = ctx.client.links();
    match cmd {
        LinkCommands::Show { case_id } => match links.current(&CaseId::new(case_id)).await? {
            Some(link) => output::print_link(&link, ctx.format),
            None => output::print_info("No link issued"),
        },
        LinkCommands::Generate { case_id, days } => {
            if days == 0 {
                return Err(CliError::invalid_arg("days must be at least 1"));
            }
            let request = GenerateLinkRequest { expires_in_days: days };
            let link = links.generate(&CaseId::new(case_id), &request).await?;
            output::print_link(&link, ctx.format);
        }
        LinkCommands::Revoke { token } => {
            links.revoke(&LinkToken::new(token)).await?;
            output::print_success("Link revoked");
        }
    }
    Ok(())
}

async fn handle_diagnosis(ctx: &Context, cmd: DiagnosisCommands) -> CliResult<()> {
    let diagnosis = ctx.client.diagnosis();
    match cmd {
        DiagnosisCommands::Show { case_id, history } => {
            let case_id = CaseId::new(case_id);
            if history {
                let history = diagnosis.history(&case_id).await?;
                match ctx.format {
                    OutputFormat::Json => output::print_json(&history.iter().collect::<Vec<_>>()),
                    _ => history.iter().for_each(|r| output::print_report(r, ctx.format)),
                }
            } else {
                match diagnosis.latest(&case_id).await? {
                    Some(report) => output::print_report(&report, ctx.format),
                    None => output::print_info("No diagnosis report yet"),
                }
            }
        }
        DiagnosisCommands::Start { case_id } => {
            let job = diagnosis.start(&CaseId::new(case_id)).await?;
            output::print_output(&job, ctx.format);
        }
        DiagnosisCommands::Watch {
            case_id,
            interval,
            timeout,
        } => {
            let config = PollConfig {
                interval: Duration::from_secs(interval.max(1)),
                window: Duration::from_secs(timeout),
            };
            let report = diagnosis.wait_for_report(&CaseId::new(case_id), &config).await?;
            output::print_report(&report, ctx.format);
        }
        DiagnosisCommands::Note {
            case_id,
            issue_id,
            note,
        } => {
            let mut history = diagnosis.history(&CaseId::new(case_id)).await?;
            let issue = diagnosis
                .update_note(&mut history, &IssueId::new(issue_id), &note)
                .await?;
            output::print_output(&issue, ctx.format);
        }
        DiagnosisCommands::Fix {
            case_id,
            issue_id,
            reopen,
        } => {
            let mut history = diagnosis.history(&CaseId::new(case_id)).await?;
            let issue = diagnosis
                .set_fixed(&mut history, &IssueId::new(issue_id), !reopen)
                .await?;
            output::print_output(&issue, ctx.format);
        }
        DiagnosisCommands::AutoFix { report_id } => {
            let result = diagnosis.auto_fix(&ReportId::new(report_id)).await?;
            output::print_output(&result, ctx.format);
        }
        DiagnosisCommands::Generate { report_id } => {
            diagnosis.generate(&ReportId::new(report_id)).await?;
            output::print_success("Document generation started");
        }
        DiagnosisCommands::SendClient { report_id } => {
            diagnosis.send_to_client(&ReportId::new(report_id)).await?;
            output::print_success("Report sent to client");
        }
    }
    Ok(())
}

async fn handle_translation(ctx: &Context, cmd: TranslationCommands) -> CliResult<()> {
    match cmd {
        TranslationCommands::Show { case_id, review } => {
            let comparison = ctx.client.translation().comparison(&CaseId::new(case_id)).await?;
            output::print_comparison(&comparison, review, ctx.format);
        }
        TranslationCommands::Edit {
            case_id,
            field_id,
            value,
        } => {
            let field_id = TranslationFieldId::new(field_id);
            let mut editor = TranslationEditor::load(ctx.client.clone(), &CaseId::new(case_id)).await?;
            editor.edit(&field_id, &value).await?;
            if let Some(field) = editor.field(&field_id) {
                output::print_output(field, ctx.format);
            }
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> CliResult<Value> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn save_mode(draft: bool) -> SaveMode {
    if draft {
        SaveMode::Draft
    } else {
        SaveMode::Continue
    }
}

fn handle_steps(format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => output::print_json(&WizardStep::ALL),
        _ => {
            for step in WizardStep::ALL {
                println!("{:>2}. {:<20} {}", step.order() + 1, step.slug(), step.label());
            }
        }
    }
    Ok(())
}

fn handle_validate(step: &str, file: &Path, draft: bool, format: OutputFormat) -> CliResult<()> {
    let step = WizardStep::parse(step)?;
    let input = read_json(file)?;
    match validate_step(step, &input, save_mode(draft)) {
        Ok(validated) => {
            match format {
                OutputFormat::Json => output::print_json(&validated.to_value()),
                _ => output::print_success(&format!("{} is valid", step.label())),
            }
            Ok(())
        }
        Err(errors) => {
            output::print_validation_errors(&errors, format);
            Err(errors.into())
        }
    }
}

async fn handle_wizard(ctx: &Context, cmd: WizardCommands) -> CliResult<()> {
    let ds160 = ctx.client.ds160();
    match cmd {
        WizardCommands::Steps => handle_steps(ctx.format)?,
        WizardCommands::Validate { step, file, draft } => handle_validate(&step, &file, draft, ctx.format)?,
        WizardCommands::Show { token, step } => {
            let step = WizardStep::parse(&step)?;
            match ds160.get_step(&LinkToken::new(token), step).await? {
                Some(record) => output::print_output(&record, ctx.format),
                None => output::print_info("Step not saved yet"),
            }
        }
        WizardCommands::Save {
            token,
            step,
            file,
            draft,
        } => {
            let step = WizardStep::parse(&step)?;
            let input = read_json(&file)?;
            match ds160.save(&LinkToken::new(token), step, &input, save_mode(draft)).await {
                Ok(_) => output::print_success(&format!("{} saved", step.label())),
                Err(ClientError::Validation(errors)) => {
                    output::print_validation_errors(&errors, ctx.format);
                    return Err(errors.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        WizardCommands::Upload { token, kind, file } => {
            let kind = UploadKind::parse(&kind)
                .ok_or_else(|| CliError::invalid_arg(format!("unknown document kind: {}", kind)))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CliError::invalid_arg("file path has no file name"))?
                .to_string();
            let bytes = std::fs::read(&file)?;
            let attachment = ds160.upload(&LinkToken::new(token), kind, &file_name, bytes).await?;
            output::print_output(&attachment, ctx.format);
        }
        WizardCommands::Progress { token } => {
            let progress = ds160.progress(&LinkToken::new(token)).await?;
            output::print_progress(&progress, ctx.format);
        }
        WizardCommands::Submit { token } => {
            let result = ds160.submit(&LinkToken::new(token)).await?;
            output::print_submit(&result, ctx.format);
        }
    }
    Ok(())
}

async fn handle_stats(ctx: &Context, cmd: StatsCommands) -> CliResult<()> {
    let stats = ctx.client.statistics();
    match cmd {
        StatsCommands::Overview => output::print_overview(&stats.overview().await?, ctx.format),
        StatsCommands::Trend { days } => output::print_trend(&stats.case_trend(days).await?, ctx.format),
        StatsCommands::Status => output::print_status_counts(&stats.status_distribution().await?, ctx.format),
        StatsCommands::VisaTypes => {
            output::print_visa_type_counts(&stats.visa_type_distribution().await?, ctx.format)
        }
    }
    Ok(())
}

async fn handle_notifications(ctx: &Context, cmd: NotificationCommands) -> CliResult<()> {
    let notifications = ctx.client.notifications();
    match cmd {
        NotificationCommands::List {
            page,
            per_page,
            unread,
        } => {
            let query = NotificationQuery {
                page,
                per_page,
                unread_only: unread,
            };
            output::print_notifications(&notifications.list(&query).await?, ctx.format);
        }
        NotificationCommands::Read { id, all } => {
            if all {
                notifications.mark_all_read().await?;
                output::print_success("All notifications marked read");
            } else if let Some(id) = id {
                notifications.mark_read(&NotificationId::new(id)).await?;
                output::print_success("Notification marked read");
            }
        }
        NotificationCommands::Unread => {
            let unread = notifications.unread_count().await?;
            match ctx.format {
                OutputFormat::Json => output::print_json(&visa_core::UnreadCount { unread }),
                _ => println!("{}", unread),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("visa-cli-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let path = temp_file("empty.json", "{}");
        let err = handle_validate("basic-info", &path, false, OutputFormat::Json).unwrap_err();
        match err {
            CliError::ValidationError(errors) => assert!(errors.contains("surname")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            handle_validate("basic-info", &path, false, OutputFormat::Json)
                .unwrap_err()
                .exit_code(),
            3
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_validate_draft_accepts_partial() {
        let path = temp_file("draft.json", r#"{"surname": "ZHANG"}"#);
        assert!(handle_validate("basic-info", &path, true, OutputFormat::Json).is_ok());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_validate_unknown_step() {
        let path = temp_file("any.json", "{}");
        assert!(matches!(
            handle_validate("no-such-step", &path, true, OutputFormat::Json),
            Err(CliError::CoreError(_))
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_mode() {
        assert_eq!(save_mode(true), SaveMode::Draft);
        assert_eq!(save_mode(false), SaveMode::Continue);
    }
}
