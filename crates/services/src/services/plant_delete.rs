//! Plant deletion: one DELETE per call, then cleanup of the stash entries
//! that pointed at the plant and a flash message for the list.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    operation::Operation,
    plants::PlantsApi,
    stash::{FlashKind, SessionStash},
    view_models::{PlantDeleteState, plant_delete_error_to_state},
};

/// Deletes a plant and leaves a flash message for the plant list.
pub struct PlantDelete {
    api: Arc<dyn PlantsApi>,
    stash: SessionStash,
    op: Operation<PlantDeleteState>,
}

impl PlantDelete {
    pub fn new(api: Arc<dyn PlantsApi>, stash: SessionStash) -> Self {
        Self {
            api,
            stash,
            op: Operation::new(PlantDeleteState::Idle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlantDeleteState> {
        self.op.subscribe()
    }

    pub fn state(&self) -> PlantDeleteState {
        self.op.state()
    }

    pub fn delete(&mut self, plant_id: Uuid, display_name: &str) {
        let api = self.api.clone();
        let stash = self.stash.clone();
        let display_name = display_name.to_string();
        self.op.start(PlantDeleteState::Deleting { plant_id }, move |commit| async move {
            let Some(result) = commit.run(api.delete_plant(plant_id)).await else {
                return;
            };
            match result {
                Ok(_) => {
                    info!(plant_id = %plant_id, "plant deleted");
                    if !commit.commit(PlantDeleteState::Deleted { plant_id }) {
                        return;
                    }
                    if let Err(e) = stash.watering_plan_context(plant_id).clear() {
                        warn!(plant_id = %plant_id, error = %e, "failed to clear watering plan context");
                    }
                    match stash.peek_create_plant_result() {
                        Ok(Some(created)) if created.plant_id == plant_id => {
                            if let Err(e) = stash.create_plant_result().clear() {
                                warn!(plant_id = %plant_id, error = %e, "failed to clear creation result");
                            }
                        }
                        Ok(_) => {}
                        Err(e) => warn!(plant_id = %plant_id, error = %e, "failed to read creation result"),
                    }
                    if let Err(e) = stash.flash(FlashKind::Success, format!("Deleted {display_name}")) {
                        warn!(plant_id = %plant_id, error = %e, "failed to stash delete flash");
                    }
                }
                Err(e) => {
                    warn!(plant_id = %plant_id, kind = %e.kind, error = %e, "deleting plant failed");
                    commit.commit(plant_delete_error_to_state(&e));
                }
            }
        });
    }

    pub fn reset(&mut self) {
        self.op.reset(PlantDeleteState::Idle);
    }
}
