//! Command-line arguments for `plant-planner`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use models::models::{
    calendar::CalendarStatusFilter,
    plant::{PlantSortField, SortOrder},
    watering_plan::{OverduePolicy, ScheduleBasis, StartFrom},
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "plant-planner",
    version,
    about = "Manage houseplants and their watering plans",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// API base url; overrides the config file
    #[arg(long, global = true, env = "PLANT_PLANNER_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the session and the short-lived stash
    #[arg(long, global = true, value_name = "DIR", env = "PLANT_PLANNER_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in, sign up or sign out
    #[command(subcommand)]
    Auth(AuthCommand),
    /// List, search, create and delete plants
    #[command(subcommand)]
    Plants(PlantsCommand),
    /// Show, suggest and set a plant's watering plan
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Show the remaining AI suggestion quota
    Quota,
    /// Show watering tasks by month or day
    #[command(subcommand)]
    Calendar(CalendarCommand),
}

#[derive(Args, Debug)]
pub struct Credentials {
    #[arg(long, env = "PLANT_PLANNER_EMAIL")]
    pub email: String,
    #[arg(long, env = "PLANT_PLANNER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    SignIn(Credentials),
    SignUp(Credentials),
    SignOut,
}

#[derive(Subcommand, Debug)]
pub enum PlantsCommand {
    /// List plants page by page
    List {
        #[arg(long, default_value = "species_name")]
        sort: PlantSortField,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Search plants by species or nickname
    Search { query: String },
    /// Create a plant, optionally asking for a watering suggestion
    Create {
        species_name: String,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        purchase_date: Option<NaiveDate>,
        /// Do not ask the AI for a watering suggestion
        #[arg(long)]
        no_suggestion: bool,
    },
    /// Delete a plant
    Delete { plant_id: Uuid },
}

#[derive(Args, Debug, Default)]
pub struct PlanValues {
    #[arg(long)]
    pub interval_days: Option<i32>,
    #[arg(long)]
    pub horizon_days: Option<i32>,
    #[arg(long)]
    pub schedule_basis: Option<ScheduleBasis>,
    #[arg(long)]
    pub start_from: Option<StartFrom>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub custom_start_on: Option<NaiveDate>,
    #[arg(long)]
    pub overdue_policy: Option<OverduePolicy>,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Show the active watering plan
    Show { plant_id: Uuid },
    /// Ask the AI for a watering plan suggestion
    Suggest {
        plant_id: Uuid,
        /// Ignore a suggestion kept from an earlier step and ask again
        #[arg(long)]
        refresh: bool,
    },
    /// Save a watering plan
    Set {
        plant_id: Uuid,
        /// Start from the last suggestion for this plant
        #[arg(long)]
        accept_suggestion: bool,
        #[command(flatten)]
        values: PlanValues,
    },
}

#[derive(Subcommand, Debug)]
pub enum CalendarCommand {
    Month {
        /// YYYY-MM
        month: String,
        #[arg(long, default_value = "pending")]
        status: CalendarStatusFilter,
    },
    Day {
        date: NaiveDate,
        #[arg(long, default_value = "pending")]
        status: CalendarStatusFilter,
    },
}
