//! Saving a watering plan. Form values are validated locally first; only a
//! valid draft reaches the API.

use std::sync::Arc;

use models::models::watering_plan::WateringPlanSource;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    operation::Operation,
    stash::SessionStash,
    view_models::{PlanSaveState, plan_save_error_to_state},
    watering_plan_form::WateringPlanFormValues,
    watering_plans::WateringPlansApi,
};

pub const INVALID_PLAN_MESSAGE: &str = "Check the highlighted fields";

/// Saves a watering plan draft for one plant.
pub struct PlanSave {
    api: Arc<dyn WateringPlansApi>,
    stash: Option<SessionStash>,
    op: Operation<PlanSaveState>,
}

impl PlanSave {
    pub fn new(api: Arc<dyn WateringPlansApi>) -> Self {
        Self {
            api,
            stash: None,
            op: Operation::new(PlanSaveState::Idle),
        }
    }

    /// Drop the plant's watering-plan context once a save succeeds.
    pub fn with_stash(mut self, stash: SessionStash) -> Self {
        self.stash = Some(stash);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PlanSaveState> {
        self.op.subscribe()
    }

    pub fn state(&self) -> PlanSaveState {
        self.op.state()
    }

    /// Validate `values` locally and, if they pass, send them. An invalid
    /// draft never reaches the server.
    pub fn save(
        &mut self,
        plant_id: Uuid,
        values: &WateringPlanFormValues,
        source: Option<WateringPlanSource>,
    ) {
        let command = match values.to_command(source) {
            Ok(command) => command,
            Err(field_errors) => {
                self.op.reset(PlanSaveState::Invalid {
                    message: INVALID_PLAN_MESSAGE.to_string(),
                    field_errors,
                });
                return;
            }
        };

        let api = self.api.clone();
        let stash = self.stash.clone();
        self.op.start(PlanSaveState::Saving, move |commit| async move {
            let Some(result) = commit.run(api.set_plan(plant_id, &command)).await else {
                return;
            };
            match result {
                Ok(response) => {
                    let saved = response.data;
                    info!(
                        plant_id = %plant_id,
                        plan_id = %saved.plan.id,
                        source = ?command.source,
                        "watering plan saved"
                    );
                    let committed = commit.commit(PlanSaveState::Saved {
                        plan: saved.plan,
                        tasks_regenerated: saved.tasks_regenerated,
                    });
                    if !committed {
                        return;
                    }
                    if let Some(stash) = stash {
                        if let Err(e) = stash.watering_plan_context(plant_id).clear() {
                            warn!(plant_id = %plant_id, error = %e, "failed to clear watering plan context");
                        }
                    }
                }
                Err(e) => {
                    warn!(plant_id = %plant_id, kind = %e.kind, error = %e, "saving watering plan failed");
                    commit.commit(plan_save_error_to_state(&e));
                }
            }
        });
    }

    pub fn reset(&mut self) {
        self.op.reset(PlanSaveState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, time::Duration};

    use super::*;
    use crate::services::{
        api_error::{ApiError, ApiErrorKind},
        stash::WateringPlanContext,
        test_support::FakeWateringPlansApi,
    };
    use models::models::watering_plan::StartFrom;

    fn settled(state: &PlanSaveState) -> bool {
        !matches!(state, PlanSaveState::Idle | PlanSaveState::Saving)
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_draft_is_not_sent() {
        let api = FakeWateringPlansApi::default().shared();
        let mut save = PlanSave::new(api.clone());
        let values = WateringPlanFormValues {
            start_from: StartFrom::CustomDate,
            ..Default::default()
        };

        save.save(Uuid::new_v4(), &values, None);
        match save.state() {
            PlanSaveState::Invalid { field_errors, .. } => {
                assert!(field_errors.contains_key("custom_start_on"))
            }
            other => panic!("unexpected {other:?}"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.set_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_save_records_source_and_clears_context() {
        let plant_id = Uuid::new_v4();
        let stash = SessionStash::in_memory();
        let context = stash.watering_plan_context(plant_id);
        context
            .save(&WateringPlanContext {
                plant_id,
                species_name: "Pilea".to_string(),
                suggestion: None,
                updated_at: stash.now(),
            })
            .unwrap();

        let api = FakeWateringPlansApi::default().shared();
        let mut save = PlanSave::new(api.clone()).with_stash(stash.clone());
        let mut rx = save.subscribe();
        let ai_request_id = Uuid::new_v4();
        save.save(
            plant_id,
            &WateringPlanFormValues::default(),
            Some(WateringPlanSource::Ai {
                ai_request_id,
                accepted_without_changes: true,
            }),
        );
        assert_eq!(save.state(), PlanSaveState::Saving);

        let state = rx.wait_for(settled).await.unwrap().clone();
        assert!(matches!(state, PlanSaveState::Saved { ref plan, .. } if plan.plant_id == plant_id));

        let calls = api.set_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1.source,
            WateringPlanSource::Ai {
                ai_request_id,
                accepted_without_changes: true,
            }
        );
        assert!(context.peek().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_validation_error_becomes_invalid_state() {
        let api = FakeWateringPlansApi::default().shared();
        let field_errors = BTreeMap::from([(
            "interval_days".to_string(),
            vec!["too frequent for this species".to_string()],
        )]);
        *api.set_result.lock().unwrap() = Some(Err(ApiError::validation(
            "Invalid plan",
            field_errors.clone(),
        )));
        let mut save = PlanSave::new(api);
        let mut rx = save.subscribe();

        save.save(Uuid::new_v4(), &WateringPlanFormValues::default(), None);
        let state = rx.wait_for(settled).await.unwrap().clone();
        assert_eq!(
            state,
            PlanSaveState::Invalid {
                message: "Invalid plan".to_string(),
                field_errors,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_maps_to_error_state() {
        let api = FakeWateringPlansApi::default().shared();
        let mut conflict = ApiError::network("plan changed");
        conflict.kind = ApiErrorKind::Conflict;
        conflict.status = Some(409);
        *api.set_result.lock().unwrap() = Some(Err(conflict));
        let mut save = PlanSave::new(api);
        let mut rx = save.subscribe();

        save.save(Uuid::new_v4(), &WateringPlanFormValues::default(), None);
        match rx.wait_for(settled).await.unwrap().clone() {
            PlanSaveState::Error(vm) => {
                assert_eq!(vm.kind, ApiErrorKind::Conflict);
                assert!(!vm.can_retry);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
