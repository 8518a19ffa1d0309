//! Helpers shared by the unit tests: an in-process API fake and canned DTOs.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use chrono::{TimeZone, Utc};
use models::models::{
    ai::{SuggestWateringPlanCommand, WateringPlanSuggestion},
    plant::{CreatePlantCommand, CreatePlantResult, ListPlantsQuery, Plant, PlantListItem, PlantPage},
    watering_plan::{
        OverduePolicy, ScheduleBasis, SetWateringPlanCommand, SetWateringPlanResult, StartFrom,
        WateringPlan, WateringPlanConfig,
    },
};
use uuid::Uuid;

use super::{
    api_client::ApiResponse,
    api_error::ApiError,
    plants::PlantsApi,
    watering_plans::WateringPlansApi,
};

/// Serve `router` on an ephemeral local port and return its base url.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn ok<T>(data: T) -> Result<ApiResponse<T>, ApiError> {
    Ok(ApiResponse {
        data,
        request_id: Some("req-test".to_string()),
        meta: None,
    })
}

pub fn sample_config() -> WateringPlanConfig {
    WateringPlanConfig {
        interval_days: 7,
        horizon_days: 90,
        schedule_basis: ScheduleBasis::DueOn,
        start_from: StartFrom::Today,
        custom_start_on: None,
        overdue_policy: OverduePolicy::CarryForward,
    }
}

pub fn sample_plant(id: Uuid, species_name: &str) -> Plant {
    let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
    Plant {
        id,
        species_name: species_name.to_string(),
        duplicate_index: 0,
        nickname: None,
        description: None,
        purchase_date: None,
        photo_path: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn sample_list_item(species_name: &str) -> PlantListItem {
    PlantListItem {
        id: Uuid::new_v4(),
        species_name: species_name.to_string(),
        duplicate_index: 0,
        nickname: None,
        photo_path: None,
        next_due_on: None,
        has_watering_plan: false,
        created_at: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
    }
}

pub fn sample_plan(plant_id: Uuid, config: WateringPlanConfig) -> WateringPlan {
    WateringPlan {
        id: Uuid::new_v4(),
        plant_id,
        config,
        is_active: true,
        valid_from: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
        valid_to: None,
        was_ai_suggested: false,
        was_ai_accepted_without_changes: None,
        ai_request_id: None,
    }
}

/// Programmable plants API recording every call it receives.
#[derive(Default)]
pub struct FakePlantsApi {
    pub searches: Mutex<Vec<Option<String>>>,
    pub list_delay: Option<Duration>,
    pub list_result: Mutex<Option<Result<ApiResponse<PlantPage>, ApiError>>>,
    pub create_result: Mutex<Option<Result<ApiResponse<CreatePlantResult>, ApiError>>>,
    pub created: Mutex<Vec<CreatePlantCommand>>,
    pub delete_result: Mutex<Option<Result<ApiResponse<()>, ApiError>>>,
    pub deleted: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl PlantsApi for FakePlantsApi {
    async fn list_plants(&self, query: &ListPlantsQuery) -> Result<ApiResponse<PlantPage>, ApiError> {
        self.searches.lock().unwrap().push(query.q.clone());
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let canned = self.list_result.lock().unwrap().clone();
        canned.unwrap_or_else(|| {
            let name = query.q.clone().unwrap_or_default();
            ok(PlantPage {
                items: vec![sample_list_item(&name)],
                page: query.page,
                limit: query.limit,
                total: Some(1),
            })
        })
    }

    async fn create_plant(
        &self,
        command: &CreatePlantCommand,
    ) -> Result<ApiResponse<CreatePlantResult>, ApiError> {
        self.created.lock().unwrap().push(command.clone());
        let canned = self.create_result.lock().unwrap().clone();
        canned.unwrap_or_else(|| {
            ok(CreatePlantResult {
                plant: sample_plant(Uuid::new_v4(), &command.species_name),
                watering_suggestion: None,
            })
        })
    }

    async fn delete_plant(&self, plant_id: Uuid) -> Result<ApiResponse<()>, ApiError> {
        self.deleted.lock().unwrap().push(plant_id);
        let canned = self.delete_result.lock().unwrap().clone();
        canned.unwrap_or_else(|| ok(()))
    }
}

/// Programmable watering-plan API; per-plant delays let tests resolve calls out of order.
#[derive(Default)]
pub struct FakeWateringPlansApi {
    pub delays: HashMap<Uuid, Duration>,
    pub suggest_errors: HashMap<Uuid, ApiError>,
    pub suggest_calls: Mutex<Vec<Uuid>>,
    pub set_result: Mutex<Option<Result<ApiResponse<SetWateringPlanResult>, ApiError>>>,
    pub set_calls: Mutex<Vec<(Uuid, SetWateringPlanCommand)>>,
}

impl FakeWateringPlansApi {
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl WateringPlansApi for FakeWateringPlansApi {
    async fn get_plan(&self, plant_id: Uuid) -> Result<ApiResponse<Option<WateringPlan>>, ApiError> {
        ok(Some(sample_plan(plant_id, sample_config())))
    }

    async fn set_plan(
        &self,
        plant_id: Uuid,
        command: &SetWateringPlanCommand,
    ) -> Result<ApiResponse<SetWateringPlanResult>, ApiError> {
        self.set_calls.lock().unwrap().push((plant_id, command.clone()));
        if let Some(delay) = self.delays.get(&plant_id) {
            tokio::time::sleep(*delay).await;
        }
        let canned = self.set_result.lock().unwrap().clone();
        canned.unwrap_or_else(|| {
            ok(SetWateringPlanResult {
                plan: sample_plan(plant_id, command.config),
                tasks_regenerated: None,
            })
        })
    }

    async fn suggest(
        &self,
        plant_id: Uuid,
        _command: &SuggestWateringPlanCommand,
    ) -> Result<ApiResponse<WateringPlanSuggestion>, ApiError> {
        self.suggest_calls.lock().unwrap().push(plant_id);
        if let Some(delay) = self.delays.get(&plant_id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.suggest_errors.get(&plant_id) {
            return Err(error.clone());
        }
        ok(WateringPlanSuggestion {
            ai_request_id: plant_id,
            suggestion: sample_config(),
            explanation: Some(format!("suggested for {plant_id}")),
        })
    }
}
