use std::{fmt::Write as _, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use models::models::{
    auth::{SignInCommand, SignUpCommand},
    calendar::{CalendarDay, CalendarMonth},
    plant::{CreatePlantCommand, ListPlantsQuery},
    watering_plan::{TasksRegenerated, WateringPlan, WateringPlanConfig},
};
use serde::Serialize;
use services::services::{
    ai_quota::AiQuotaClient,
    api_error::{ApiError, FieldErrors},
    auth::AuthClient,
    calendar::CalendarClient,
    config::ClientConfig,
    create_plant::CreatePlant,
    plan_save::PlanSave,
    plant_delete::PlantDelete,
    plant_search::PlantSearch,
    plants::{PlantsApi, PlantsClient},
    view_models::{
        AiSuggestionState, CreatePlantState, ErrorVm, PlanSaveState, PlantDeleteState,
        PlantListState, QuotaVm, plant_page_to_state,
    },
    watering_plan_form::{SuggestionOrigin, WateringPlanFormValues},
    watering_plans::{WateringPlansApi, WateringPlansClient},
    watering_suggestion::WateringSuggestion,
};
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::{
    cli::{AuthCommand, CalendarCommand, Command, Credentials, PlanCommand, PlanValues, PlantsCommand},
    session::Session,
};

pub struct App {
    pub config: ClientConfig,
    pub session: Session,
    pub json: bool,
}

impl App {
    fn plants(&self) -> PlantsClient {
        PlantsClient::new(self.session.api().clone())
    }

    fn plans(&self) -> WateringPlansClient {
        WateringPlansClient::new(self.session.api().clone(), self.config.suggestion_timeout())
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

pub async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Auth(command) => auth(app, command).await,
        Command::Plants(command) => plants(app, command).await,
        Command::Plan(command) => plan(app, command).await,
        Command::Quota => quota(app).await,
        Command::Calendar(command) => calendar(app, command).await,
    }
}

fn api_failure(error: ApiError) -> anyhow::Error {
    anyhow!("{}", ErrorVm::from(&error))
}

fn invalid(message: &str, field_errors: &FieldErrors) -> anyhow::Error {
    let mut out = message.to_string();
    for (field, messages) in field_errors {
        let _ = write!(out, "\n  {field}: {}", messages.join(", "));
    }
    anyhow!(out)
}

/// Wait until the operation publishes a state matching `done`.
async fn settle<S: Clone>(
    rx: &mut watch::Receiver<S>,
    done: impl FnMut(&S) -> bool,
) -> Result<S> {
    let state = rx
        .wait_for(done)
        .await
        .context("operation ended without a result")?;
    Ok(state.clone())
}

async fn auth(app: &App, command: AuthCommand) -> Result<()> {
    let client = AuthClient::new(app.session.api().clone());
    match command {
        AuthCommand::SignIn(Credentials { email, password }) => {
            let response = client
                .sign_in(&SignInCommand { email, password })
                .await
                .map_err(api_failure)?;
            app.emit(&response.data, || format!("Signed in as {}", response.data.user.email))
        }
        AuthCommand::SignUp(Credentials { email, password }) => {
            let response = client
                .sign_up(&SignUpCommand { email, password })
                .await
                .map_err(api_failure)?;
            app.emit(&response.data, || {
                if response.data.requires_email_confirmation {
                    "Account created. Confirm your email address, then sign in.".to_string()
                } else {
                    "Account created and signed in".to_string()
                }
            })
        }
        AuthCommand::SignOut => {
            client.sign_out().await.map_err(api_failure)?;
            app.session.forget()?;
            println!("Signed out");
            Ok(())
        }
    }
}

async fn plants(app: &App, command: PlantsCommand) -> Result<()> {
    match command {
        PlantsCommand::List {
            sort,
            order,
            page,
            limit,
        } => {
            match app.session.stash().plants_flash().consume() {
                Ok(Some(flash)) if !app.json => println!("[{}] {}", flash.kind, flash.message),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "failed to read flash message"),
            }
            let query = ListPlantsQuery {
                q: None,
                sort,
                order,
                page,
                limit,
            };
            let response = app.plants().list_plants(&query).await.map_err(api_failure)?;
            let state = plant_page_to_state("", &response.data);
            app.emit(&state, || render_plant_list(&state, page))
        }
        PlantsCommand::Search { query } => {
            let mut search = PlantSearch::new(Arc::new(app.plants()), &app.config);
            let mut rx = search.subscribe();
            search.set_query(&query);
            if search.state() == PlantListState::Idle {
                bail!(
                    "search needs at least {} characters",
                    app.config.search_min_query_len
                );
            }
            let state = settle(&mut rx, |s| {
                !matches!(s, PlantListState::Idle | PlantListState::Loading { .. })
            })
            .await?;
            if let PlantListState::Error(vm) = &state {
                bail!("{vm}");
            }
            app.emit(&state, || render_plant_list(&state, 1))
        }
        PlantsCommand::Create {
            species_name,
            nickname,
            description,
            purchase_date,
            no_suggestion,
        } => {
            let command = CreatePlantCommand {
                nickname,
                description,
                purchase_date,
                generate_watering_suggestion: !no_suggestion,
                ..CreatePlantCommand::new(species_name)
            };
            let mut create = CreatePlant::new(Arc::new(app.plants()), app.session.stash().clone());
            let mut rx = create.subscribe();
            create.submit(command);
            let state = settle(&mut rx, |s| {
                !matches!(s, CreatePlantState::Idle | CreatePlantState::Submitting)
            })
            .await?;
            match &state {
                CreatePlantState::Created {
                    plant_id,
                    redirect_to,
                    suggestion,
                } => app.emit(&state, || {
                    format!(
                        "Created plant {plant_id}\n{}\nNext: {redirect_to} (plant-planner plan set {plant_id} --accept-suggestion)",
                        render_suggestion(suggestion)
                    )
                }),
                CreatePlantState::Invalid {
                    message,
                    field_errors,
                } => Err(invalid(message, field_errors)),
                CreatePlantState::Error(vm) => bail!("{vm}"),
                CreatePlantState::Idle | CreatePlantState::Submitting => {
                    bail!("plant creation ended without a result")
                }
            }
        }
        PlantsCommand::Delete { plant_id } => {
            let plants = app.plants();
            let plant = plants.get(plant_id).await.map_err(api_failure)?.data;
            let mut delete = PlantDelete::new(Arc::new(plants), app.session.stash().clone());
            let mut rx = delete.subscribe();
            delete.delete(plant_id, &plant.display_name());
            let state = settle(&mut rx, |s| {
                matches!(s, PlantDeleteState::Deleted { .. } | PlantDeleteState::Error(_))
            })
            .await?;
            if let PlantDeleteState::Error(vm) = &state {
                bail!("{vm}");
            }
            app.emit(&state, || format!("Deleted {}", plant.display_name()))
        }
    }
}

async fn plan(app: &App, command: PlanCommand) -> Result<()> {
    match command {
        PlanCommand::Show { plant_id } => {
            let plan = app.plans().get_plan(plant_id).await.map_err(api_failure)?.data;
            app.emit(&plan, || match &plan {
                Some(plan) => render_plan(plan),
                None => format!("No watering plan yet. Try: plant-planner plan suggest {plant_id}"),
            })
        }
        PlanCommand::Suggest { plant_id, refresh } => {
            let mut suggestion =
                WateringSuggestion::new(Arc::new(app.plans())).with_stash(app.session.stash().clone());
            let seeded = !refresh && suggestion.seed_from_stash(plant_id);
            if !seeded {
                let plant = app.plants().get(plant_id).await.map_err(api_failure)?.data;
                let mut rx = suggestion.subscribe();
                suggestion.request(plant_id, &plant.species_name);
                settle(&mut rx, AiSuggestionState::is_terminal).await?;
            }
            let state = suggestion.state();
            app.emit(&state, || render_suggestion(&state))
        }
        PlanCommand::Set {
            plant_id,
            accept_suggestion,
            values,
        } => set_plan(app, plant_id, accept_suggestion, values).await,
    }
}

async fn set_plan(app: &App, plant_id: Uuid, accept_suggestion: bool, overrides: PlanValues) -> Result<()> {
    let plans = app.plans();
    let mut origin = None;
    let base = if accept_suggestion {
        // takes the creation-time suggestion on first use, the plan context after that
        let mut suggestion =
            WateringSuggestion::new(Arc::new(app.plans())).with_stash(app.session.stash().clone());
        suggestion.seed_from_stash(plant_id);
        let state = suggestion.state();
        origin = SuggestionOrigin::from_state(&state);
        if origin.is_none() {
            bail!(
                "no suggestion available for this plant; run `plant-planner plan suggest {plant_id}` first"
            );
        }
        WateringPlanFormValues::from_suggestion_state(&state)
    } else {
        match plans.get_plan(plant_id).await.map_err(api_failure)?.data {
            Some(current) => WateringPlanFormValues::from_plan(&current),
            None => WateringPlanFormValues::default(),
        }
    };
    let values = apply_overrides(base, overrides);
    let source = values.source(origin.as_ref());

    let mut save = PlanSave::new(Arc::new(plans)).with_stash(app.session.stash().clone());
    let mut rx = save.subscribe();
    save.save(plant_id, &values, Some(source));
    let state = settle(&mut rx, |s| !matches!(s, PlanSaveState::Idle | PlanSaveState::Saving)).await?;
    match &state {
        PlanSaveState::Saved {
            plan,
            tasks_regenerated,
        } => app.emit(&state, || {
            let mut out = format!("Saved watering plan\n{}", render_plan(plan));
            if let Some(TasksRegenerated { from, to, count }) = tasks_regenerated {
                let _ = write!(out, "\nScheduled {count} waterings from {from} to {to}");
            }
            out
        }),
        PlanSaveState::Invalid {
            message,
            field_errors,
        } => Err(invalid(message, field_errors)),
        PlanSaveState::Error(vm) => bail!("{vm}"),
        PlanSaveState::Idle | PlanSaveState::Saving => bail!("plan save ended without a result"),
    }
}

fn apply_overrides(mut values: WateringPlanFormValues, overrides: PlanValues) -> WateringPlanFormValues {
    if let Some(v) = overrides.interval_days {
        values.interval_days = v;
    }
    if let Some(v) = overrides.horizon_days {
        values.horizon_days = v;
    }
    if let Some(v) = overrides.schedule_basis {
        values.schedule_basis = v;
    }
    if let Some(v) = overrides.start_from {
        values.start_from = v;
    }
    if overrides.custom_start_on.is_some() {
        values.custom_start_on = overrides.custom_start_on;
    }
    if let Some(v) = overrides.overdue_policy {
        values.overdue_policy = v;
    }
    values
}

async fn quota(app: &App) -> Result<()> {
    let quota = AiQuotaClient::new(app.session.api().clone())
        .get()
        .await
        .map_err(api_failure)?
        .data;
    let vm = QuotaVm::from(&quota);
    app.emit(&vm, || vm.label.clone())
}

async fn calendar(app: &App, command: CalendarCommand) -> Result<()> {
    let client = CalendarClient::new(app.session.api().clone());
    match command {
        CalendarCommand::Month { month, status } => {
            let month = client.month(&month, status).await.map_err(api_failure)?.data;
            app.emit(&month, || render_month(&month))
        }
        CalendarCommand::Day { date, status } => {
            let day = client.day(date, status).await.map_err(api_failure)?.data;
            app.emit(&day, || render_day(&day))
        }
    }
}

fn render_plant_list(state: &PlantListState, page: u32) -> String {
    match state {
        PlantListState::Loaded { items, total, .. } => {
            let mut out = String::new();
            for item in items {
                let due = match (item.has_watering_plan, item.next_due_on) {
                    (_, Some(due)) => format!("next watering {due}"),
                    (true, None) => "nothing due".to_string(),
                    (false, None) => "no watering plan".to_string(),
                };
                let _ = writeln!(out, "{}  {}  ({due})", item.id, item.display_name);
            }
            match total {
                Some(total) => {
                    let _ = write!(out, "page {page}, {total} plants in total");
                }
                None => {
                    let _ = write!(out, "page {page}");
                }
            }
            out
        }
        PlantListState::Empty { query } if query.is_empty() => "No plants yet".to_string(),
        PlantListState::Empty { query } => format!("No plants match {query:?}"),
        PlantListState::Error(vm) => vm.to_string(),
        PlantListState::Idle | PlantListState::Loading { .. } => String::new(),
    }
}

fn render_config(config: &WateringPlanConfig) -> String {
    let mut out = format!(
        "  every {} days for {} days\n  schedule basis: {}\n  start from: {}",
        config.interval_days, config.horizon_days, config.schedule_basis, config.start_from
    );
    if let Some(date) = config.custom_start_on {
        let _ = write!(out, " ({date})");
    }
    let _ = write!(out, "\n  overdue: {}", config.overdue_policy);
    out
}

fn render_plan(plan: &WateringPlan) -> String {
    let origin = match plan.was_ai_accepted_without_changes {
        _ if !plan.was_ai_suggested => "entered manually",
        Some(true) => "AI suggestion, accepted as is",
        _ => "AI suggestion, edited",
    };
    format!("{}\n  origin: {origin}", render_config(&plan.config))
}

fn render_suggestion(state: &AiSuggestionState) -> String {
    match state {
        AiSuggestionState::Available {
            plan, explanation, ..
        } => {
            let mut out = format!("Suggested watering plan:\n{}", render_config(plan));
            if let Some(explanation) = explanation {
                let _ = write!(out, "\n  why: {explanation}");
            }
            out
        }
        AiSuggestionState::RateLimited {
            unlock_at, message, ..
        } => match unlock_at {
            Some(at) => format!("{message}. Suggestions unlock at {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => message.clone(),
        },
        AiSuggestionState::Timeout { message, request_id }
        | AiSuggestionState::ProviderError { message, request_id }
        | AiSuggestionState::Unauthenticated { message, request_id }
        | AiSuggestionState::NotFound { message, request_id }
        | AiSuggestionState::UnknownError { message, request_id } => match request_id {
            Some(id) => format!("No suggestion: {message} (request id: {id})"),
            None => format!("No suggestion: {message}"),
        },
        AiSuggestionState::Skipped { reason } => format!("No suggestion requested ({reason})"),
        AiSuggestionState::Idle | AiSuggestionState::Loading => "No suggestion yet".to_string(),
    }
}

fn render_month(month: &CalendarMonth) -> String {
    if month.days.is_empty() {
        return format!("Nothing to water in {}", month.month);
    }
    month
        .days
        .iter()
        .map(|day| format!("{}  {} plant(s)", day.date, day.count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_day(day: &CalendarDay) -> String {
    if day.items.is_empty() {
        return format!("Nothing to water on {}", day.date);
    }
    day.items
        .iter()
        .map(|item| format!("{}  {} ({})", item.task.due_on, item.plant.display_name, item.task.status))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use models::models::watering_plan::{OverduePolicy, StartFrom};

    use super::*;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let values = apply_overrides(
            WateringPlanFormValues::default(),
            PlanValues {
                interval_days: Some(3),
                start_from: Some(StartFrom::CustomDate),
                custom_start_on: NaiveDate::from_ymd_opt(2026, 6, 1),
                ..Default::default()
            },
        );
        assert_eq!(values.interval_days, 3);
        assert_eq!(values.horizon_days, 90);
        assert_eq!(values.start_from, StartFrom::CustomDate);
        assert_eq!(values.overdue_policy, OverduePolicy::CarryForward);
        assert!(values.validate().is_ok());
    }

    #[test]
    fn test_invalid_lists_every_field() {
        let errors = FieldErrors::from([
            ("horizon_days".to_string(), vec!["too long".to_string()]),
            ("interval_days".to_string(), vec!["too short".to_string()]),
        ]);
        let message = invalid("Check the highlighted fields", &errors).to_string();
        assert_eq!(
            message,
            "Check the highlighted fields\n  horizon_days: too long\n  interval_days: too short"
        );
    }

    #[test]
    fn test_rate_limited_suggestion_shows_unlock_time() {
        let state = AiSuggestionState::RateLimited {
            unlock_at: Some("2026-05-01T10:00:00Z".parse().unwrap()),
            message: "Suggestion limit reached".to_string(),
            request_id: None,
        };
        assert_eq!(
            render_suggestion(&state),
            "Suggestion limit reached. Suggestions unlock at 2026-05-01 10:00 UTC"
        );
    }
}
