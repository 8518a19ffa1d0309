//! Fetching an AI watering-plan suggestion for one plant.

use std::sync::Arc;

use models::models::ai::SuggestWateringPlanCommand;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    operation::Operation,
    stash::{SessionStash, WateringPlanContext},
    view_models::{AiSuggestionState, suggestion_error_to_state, suggestion_to_state},
    watering_plans::WateringPlansApi,
};

pub const SKIP_MISSING_SPECIES: &str = "missing_species";

pub struct WateringSuggestion {
    api: Arc<dyn WateringPlansApi>,
    stash: Option<SessionStash>,
    op: Operation<AiSuggestionState>,
}

impl WateringSuggestion {
    pub fn new(api: Arc<dyn WateringPlansApi>) -> Self {
        Self {
            api,
            stash: None,
            op: Operation::new(AiSuggestionState::Idle),
        }
    }

    /// Remember every terminal suggestion in the per-plant stash context.
    pub fn with_stash(mut self, stash: SessionStash) -> Self {
        self.stash = Some(stash);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AiSuggestionState> {
        self.op.subscribe()
    }

    pub fn state(&self) -> AiSuggestionState {
        self.op.state()
    }

    /// Ask for a suggestion, abandoning any request still in flight.
    pub fn request(&mut self, plant_id: Uuid, species_name: &str) {
        let species_name = species_name.trim().to_string();
        if species_name.is_empty() {
            self.skip(SKIP_MISSING_SPECIES);
            return;
        }

        let api = self.api.clone();
        let stash = self.stash.clone();
        self.op.start(AiSuggestionState::Loading, move |commit| async move {
            let command = SuggestWateringPlanCommand::for_species(species_name.clone());
            let Some(result) = commit.run(api.suggest(plant_id, &command)).await else {
                debug!(plant_id = %plant_id, "suggestion request abandoned");
                return;
            };
            let state = match result {
                Ok(response) => suggestion_to_state(&response.data),
                Err(e) => {
                    warn!(
                        plant_id = %plant_id,
                        kind = %e.kind,
                        request_id = e.request_id.as_deref().unwrap_or("-"),
                        "watering suggestion failed"
                    );
                    suggestion_error_to_state(&e)
                }
            };
            if commit.commit(state.clone()) {
                if let Some(stash) = stash {
                    remember(&stash, plant_id, &species_name, state);
                }
            }
        });
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        self.op.reset(AiSuggestionState::Skipped {
            reason: reason.into(),
        });
    }

    /// Replace the state with one obtained elsewhere (e.g. at plant creation).
    pub fn seed(&mut self, state: AiSuggestionState) {
        self.op.reset(state);
    }

    /// Seed from the stash when it holds something for this plant: first the
    /// one-shot creation result, then the per-plant context. Returns whether
    /// anything was found.
    pub fn seed_from_stash(&mut self, plant_id: Uuid) -> bool {
        let Some(stash) = self.stash.clone() else {
            return false;
        };

        match stash.consume_create_plant_result() {
            Ok(Some(created)) if created.plant_id == plant_id => {
                info!(plant_id = %plant_id, "using suggestion from plant creation");
                remember(
                    &stash,
                    plant_id,
                    &created.species_name,
                    created.watering_suggestion.clone(),
                );
                self.seed(created.watering_suggestion);
                return true;
            }
            Ok(Some(other)) => {
                debug!(expected = %plant_id, found = %other.plant_id, "discarding creation result for another plant");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read creation result"),
        }

        match stash.watering_plan_context(plant_id).peek() {
            Ok(Some(WateringPlanContext {
                suggestion: Some(suggestion),
                ..
            })) => {
                self.seed(suggestion);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "failed to read watering plan context");
                false
            }
        }
    }

    /// Abandon the request in flight and go back to idle.
    pub fn cancel(&mut self) {
        self.op.reset(AiSuggestionState::Idle);
    }
}

fn remember(stash: &SessionStash, plant_id: Uuid, species_name: &str, state: AiSuggestionState) {
    let context = WateringPlanContext {
        plant_id,
        species_name: species_name.to_string(),
        suggestion: Some(state),
        updated_at: stash.now(),
    };
    if let Err(e) = stash.watering_plan_context(plant_id).save(&context) {
        warn!(plant_id = %plant_id, error = %e, "failed to stash watering plan context");
    }
}
