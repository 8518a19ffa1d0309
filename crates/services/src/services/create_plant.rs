//! Plant creation flow: local checks, the create call, then handing the
//! creation-time suggestion over to the watering-plan screen.

use std::sync::Arc;

use models::models::plant::CreatePlantCommand;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    api_error::FieldErrors,
    operation::Operation,
    plants::PlantsApi,
    stash::{CreatePlantResultPayload, SessionStash},
    view_models::{
        AiSuggestionState, CreatePlantState, create_plant_error_to_state,
        creation_suggestion_to_state,
    },
};

pub const MAX_SPECIES_NAME_LEN: usize = 120;
pub const MAX_NICKNAME_LEN: usize = 80;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

pub const SKIP_AI_DISABLED: &str = "ai_disabled";
pub const SKIP_NOT_RETURNED: &str = "not_returned";

pub fn redirect_target(plant_id: Uuid) -> String {
    format!("/plants/{plant_id}/watering-plan")
}

/// Trim the command and check lengths. Blank optional fields become `None`.
pub fn normalize(command: CreatePlantCommand) -> Result<CreatePlantCommand, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut too_long = |field: &str, value: &str, max: usize| {
        if value.chars().count() > max {
            errors
                .entry(field.to_string())
                .or_default()
                .push(format!("must be at most {max} characters"));
        }
    };

    let species_name = command.species_name.trim().to_string();
    too_long("species_name", &species_name, MAX_SPECIES_NAME_LEN);
    let nickname = blank_to_none(command.nickname);
    if let Some(nickname) = &nickname {
        too_long("nickname", nickname, MAX_NICKNAME_LEN);
    }
    let description = blank_to_none(command.description);
    if let Some(description) = &description {
        too_long("description", description, MAX_DESCRIPTION_LEN);
    }
    if species_name.is_empty() {
        errors
            .entry("species_name".to_string())
            .or_default()
            .push("is required".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CreatePlantCommand {
        species_name,
        nickname,
        description,
        photo_path: blank_to_none(command.photo_path),
        ..command
    })
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct CreatePlant {
    api: Arc<dyn PlantsApi>,
    stash: SessionStash,
    op: Operation<CreatePlantState>,
}

impl CreatePlant {
    pub fn new(api: Arc<dyn PlantsApi>, stash: SessionStash) -> Self {
        Self {
            api,
            stash,
            op: Operation::new(CreatePlantState::Idle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CreatePlantState> {
        self.op.subscribe()
    }

    pub fn state(&self) -> CreatePlantState {
        self.op.state()
    }

    pub fn submit(&mut self, command: CreatePlantCommand) {
        let command = match normalize(command) {
            Ok(command) => command,
            Err(field_errors) => {
                self.op.reset(CreatePlantState::Invalid {
                    message: "Check the highlighted fields".to_string(),
                    field_errors,
                });
                return;
            }
        };

        let api = self.api.clone();
        let stash = self.stash.clone();
        self.op.start(CreatePlantState::Submitting, move |commit| async move {
            let Some(result) = commit.run(api.create_plant(&command)).await else {
                return;
            };
            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(species = %command.species_name, kind = %e.kind, error = %e, "creating plant failed");
                    commit.commit(create_plant_error_to_state(&e));
                    return;
                }
            };

            let plant = response.data.plant;
            let suggestion = if !command.generate_watering_suggestion {
                AiSuggestionState::Skipped {
                    reason: SKIP_AI_DISABLED.to_string(),
                }
            } else {
                match &response.data.watering_suggestion {
                    Some(dto) => creation_suggestion_to_state(dto, response.request_id.clone()),
                    None => AiSuggestionState::Skipped {
                        reason: SKIP_NOT_RETURNED.to_string(),
                    },
                }
            };
            info!(plant_id = %plant.id, species = %plant.species_name, "plant created");

            let payload = CreatePlantResultPayload {
                plant_id: plant.id,
                species_name: plant.species_name,
                watering_suggestion: suggestion.clone(),
                created_at: stash.now(),
            };
            let committed = commit.commit(CreatePlantState::Created {
                plant_id: plant.id,
                redirect_to: redirect_target(plant.id),
                suggestion,
            });
            if !committed {
                return;
            }
            if let Err(e) = stash.save_create_plant_result(&payload) {
                warn!(plant_id = %plant.id, error = %e, "failed to stash creation result");
            }
        });
    }

    pub fn reset(&mut self) {
        self.op.reset(CreatePlantState::Idle);
    }
}
