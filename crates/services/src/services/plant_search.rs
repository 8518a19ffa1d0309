//! Debounced plant search.

use std::{sync::Arc, time::Duration};

use models::models::plant::ListPlantsQuery;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{
    config::ClientConfig,
    operation::Operation,
    plants::PlantsApi,
    view_models::{PlantListState, plant_list_error_to_state, plant_page_to_state},
};

pub struct PlantSearch {
    api: Arc<dyn PlantsApi>,
    debounce: Duration,
    min_query_len: usize,
    op: Operation<PlantListState>,
}

impl PlantSearch {
    pub fn new(api: Arc<dyn PlantsApi>, config: &ClientConfig) -> Self {
        Self::with_settings(api, config.search_debounce(), config.search_min_query_len)
    }

    pub fn with_settings(api: Arc<dyn PlantsApi>, debounce: Duration, min_query_len: usize) -> Self {
        Self {
            api,
            debounce,
            min_query_len,
            op: Operation::new(PlantListState::Idle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlantListState> {
        self.op.subscribe()
    }

    pub fn state(&self) -> PlantListState {
        self.op.state()
    }

    /// Feed the latest contents of the search box. Every call restarts the
    /// quiet period; the request goes out only once it elapses.
    pub fn set_query(&mut self, query: &str) {
        let query = query.trim().to_string();
        if query.chars().count() < self.min_query_len {
            self.op.reset(PlantListState::Idle);
            return;
        }

        let api = self.api.clone();
        let debounce = self.debounce;
        self.op.start(
            PlantListState::Loading {
                query: query.clone(),
            },
            move |commit| async move {
                if !commit.sleep(debounce).await {
                    return;
                }
                debug!(query = %query, "searching plants");
                let request = ListPlantsQuery::search(query.clone());
                let Some(result) = commit.run(api.list_plants(&request)).await else {
                    return;
                };
                let state = match result {
                    Ok(response) => plant_page_to_state(&query, &response.data),
                    Err(e) => {
                        warn!(query = %query, kind = %e.kind, error = %e, "plant search failed");
                        plant_list_error_to_state(&e)
                    }
                };
                commit.commit(state);
            },
        );
    }

    pub fn clear(&mut self) {
        self.op.reset(PlantListState::Idle);
    }
}
