use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::ai::CreationSuggestion;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct Plant {
    pub id: Uuid,
    pub species_name: String,
    pub duplicate_index: i32, // 0 for the first plant of a species, then 1, 2, ...
    pub nickname: Option<String>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plant {
    /// "Monstera", "Monstera #2", or "Monstera (Bob)" when a nickname exists.
    pub fn display_name(&self) -> String {
        display_name(&self.species_name, self.duplicate_index, self.nickname.as_deref())
    }
}

pub fn display_name(species_name: &str, duplicate_index: i32, nickname: Option<&str>) -> String {
    let base = if duplicate_index > 0 {
        format!("{} #{}", species_name, duplicate_index + 1)
    } else {
        species_name.to_string()
    };
    match nickname.map(str::trim).filter(|n| !n.is_empty()) {
        Some(nickname) => format!("{base} ({nickname})"),
        None => base,
    }
}

/// Row returned by `GET /api/plants`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct PlantListItem {
    pub id: Uuid,
    pub species_name: String,
    pub duplicate_index: i32,
    pub nickname: Option<String>,
    pub photo_path: Option<String>,
    pub next_due_on: Option<NaiveDate>,
    pub has_watering_plan: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlantSortField {
    #[default]
    SpeciesName,
    CreatedAt,
    UpdatedAt,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query string for `GET /api/plants`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
pub struct ListPlantsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    pub sort: PlantSortField,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl ListPlantsQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn search(query: impl Into<String>) -> Self {
        Self {
            q: Some(query.into()),
            ..Self::first_page()
        }
    }

    pub fn first_page() -> Self {
        Self {
            q: None,
            sort: PlantSortField::default(),
            order: SortOrder::default(),
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// A page of plants plus what the server reported about the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantPage {
    pub items: Vec<PlantListItem>,
    pub page: u32,
    pub limit: u32,
    pub total: Option<u32>,
}

/// Request body for `POST /api/plants`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CreatePlantCommand {
    pub species_name: String,
    pub nickname: Option<String>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub photo_path: Option<String>,
    /// Ask the server to generate a watering suggestion alongside the plant.
    pub generate_watering_suggestion: bool,
}

impl CreatePlantCommand {
    pub fn new(species_name: impl Into<String>) -> Self {
        Self {
            species_name: species_name.into(),
            nickname: None,
            description: None,
            purchase_date: None,
            photo_path: None,
            generate_watering_suggestion: true,
        }
    }
}

/// Response body for `POST /api/plants`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CreatePlantResult {
    pub plant: Plant,
    #[serde(default)]
    pub watering_suggestion: Option<CreationSuggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_variants() {
        assert_eq!(display_name("Monstera", 0, None), "Monstera");
        assert_eq!(display_name("Monstera", 1, None), "Monstera #2");
        assert_eq!(display_name("Monstera", 0, Some("Bob")), "Monstera (Bob)");
        assert_eq!(display_name("Monstera", 0, Some("   ")), "Monstera");
    }

    #[test]
    fn test_sort_field_strings() {
        assert_eq!(PlantSortField::CreatedAt.to_string(), "created_at");
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }
}
