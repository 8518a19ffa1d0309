pub mod ai;
pub mod auth;
pub mod calendar;
pub mod plant;
pub mod watering_plan;
