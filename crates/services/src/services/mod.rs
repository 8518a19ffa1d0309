pub mod ai_quota;
pub mod api_client;
pub mod api_error;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod create_plant;
pub mod operation;
pub mod plan_save;
pub mod plant_delete;
pub mod plant_search;
pub mod plants;
pub mod stash;
pub mod view_models;
pub mod watering_plan_form;
pub mod watering_plans;
pub mod watering_suggestion;

#[cfg(test)]
mod test_support;
