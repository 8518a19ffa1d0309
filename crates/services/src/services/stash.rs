//! Short-lived context handed from one screen (or CLI invocation) to the next.
//!
//! Payloads are stored as JSON under fixed keys and expire five minutes after
//! they were written, whether or not anyone read them. Corrupted entries are
//! treated as absent and removed.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum_macros::Display;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;
use utils::session_store::{Clock, MemoryStore, SessionStore, SessionStoreError, SystemClock};

use super::view_models::AiSuggestionState;

pub const STASH_TTL: Duration = Duration::from_secs(5 * 60);

pub const CREATE_PLANT_RESULT_KEY: &str = "pp_create_plant_result";
pub const WATERING_PLAN_CONTEXT_PREFIX: &str = "pp:watering-plan-context:";
pub const PLANTS_FLASH_KEY: &str = "plantPlanner:plantsFlash";

#[derive(Debug, Error)]
pub enum StashError {
    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),
    #[error("failed to encode stash payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A payload that knows when it was written.
pub trait StashPayload: Serialize + DeserializeOwned {
    fn stamped_at(&self) -> DateTime<Utc>;
}

/// Timestamps are written as ISO-8601; epoch milliseconds are accepted on read.
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Iso(DateTime<Utc>),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Iso(value) => Ok(value),
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        }
    }
}

/// Written after a plant is created, read by the watering-plan screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantResultPayload {
    pub plant_id: Uuid,
    pub species_name: String,
    pub watering_suggestion: AiSuggestionState,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl StashPayload for CreatePlantResultPayload {
    fn stamped_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Per-plant context of the watering-plan screen, kept across a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WateringPlanContext {
    pub plant_id: Uuid,
    pub species_name: String,
    #[serde(default)]
    pub suggestion: Option<AiSuggestionState>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl StashPayload for WateringPlanContext {
    fn stamped_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

/// One-shot message shown on the next render of the plant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantsFlash {
    pub kind: FlashKind,
    pub message: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl StashPayload for PlantsFlash {
    fn stamped_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Typed view over a single key of the store.
pub struct StashSlot<T> {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
    _payload: PhantomData<fn() -> T>,
}

impl<T: StashPayload> StashSlot<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite whatever is stored under this key.
    pub fn save(&self, payload: &T) -> Result<(), StashError> {
        let raw = serde_json::to_string(payload)?;
        self.store.set(&self.key, &raw)?;
        debug!(key = %self.key, "stash saved");
        Ok(())
    }

    /// Read and delete. Returns `None` for absent, malformed or expired entries.
    pub fn consume(&self) -> Result<Option<T>, StashError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        self.store.remove(&self.key)?;
        Ok(self.decode(&raw))
    }

    /// Read without consuming. Entries that could never be returned (corrupt or
    /// expired) are removed; a valid entry is left untouched.
    pub fn peek(&self) -> Result<Option<T>, StashError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let payload = self.decode(&raw);
        if payload.is_none() {
            self.store.remove(&self.key)?;
        }
        Ok(payload)
    }

    pub fn clear(&self) -> Result<(), StashError> {
        self.store.remove(&self.key)?;
        Ok(())
    }

    fn decode(&self, raw: &str) -> Option<T> {
        let payload: T = match serde_json::from_str(raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding corrupted stash entry");
                return None;
            }
        };
        let age_ms = self.clock.now().timestamp_millis() - payload.stamped_at().timestamp_millis();
        if age_ms > self.ttl.as_millis() as i64 {
            debug!(key = %self.key, age_ms, "stash entry expired");
            return None;
        }
        Some(payload)
    }
}

/// Entry point for every stash key the client uses.
#[derive(Clone)]
pub struct SessionStash {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionStash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStash").finish_non_exhaustive()
    }
}

impl SessionStash {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn slot<T: StashPayload>(&self, key: String) -> StashSlot<T> {
        StashSlot {
            store: self.store.clone(),
            clock: self.clock.clone(),
            key,
            ttl: STASH_TTL,
            _payload: PhantomData,
        }
    }

    pub fn create_plant_result(&self) -> StashSlot<CreatePlantResultPayload> {
        self.slot(CREATE_PLANT_RESULT_KEY.to_string())
    }

    pub fn watering_plan_context(&self, plant_id: Uuid) -> StashSlot<WateringPlanContext> {
        self.slot(format!("{WATERING_PLAN_CONTEXT_PREFIX}{plant_id}"))
    }

    pub fn plants_flash(&self) -> StashSlot<PlantsFlash> {
        self.slot(PLANTS_FLASH_KEY.to_string())
    }

    pub fn save_create_plant_result(&self, payload: &CreatePlantResultPayload) -> Result<(), StashError> {
        self.create_plant_result().save(payload)
    }

    pub fn consume_create_plant_result(&self) -> Result<Option<CreatePlantResultPayload>, StashError> {
        self.create_plant_result().consume()
    }

    pub fn peek_create_plant_result(&self) -> Result<Option<CreatePlantResultPayload>, StashError> {
        self.create_plant_result().peek()
    }

    pub fn flash(&self, kind: FlashKind, message: impl Into<String>) -> Result<(), StashError> {
        self.plants_flash().save(&PlantsFlash {
            kind,
            message: message.into(),
            created_at: self.now(),
        })
    }
}
