//! State kept between invocations: the auth cookie and the stash, both in one
//! file-backed store.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use services::services::{api_client::ApiClient, config::ClientConfig, stash::SessionStash};
use tracing::debug;
use utils::session_store::{FileStore, SessionStore, SystemClock};

pub const SESSION_COOKIE_KEY: &str = "plantPlanner:session";

/// `$XDG_DATA_HOME/plant-planner/session` or the platform equivalent.
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("plant-planner").join("session"))
}

pub struct Session {
    store: Arc<FileStore>,
    api: ApiClient,
    stash: SessionStash,
}

impl Session {
    /// Open the store in `dir` and restore any saved sign-in into a fresh client.
    pub fn open(config: &ClientConfig, dir: PathBuf) -> Result<Self> {
        let store = Arc::new(
            FileStore::open(&dir)
                .with_context(|| format!("failed to open state directory {}", dir.display()))?,
        );
        let api = ApiClient::new(config).context("failed to build API client")?;
        if let Some(cookie) = store.get(SESSION_COOKIE_KEY)? {
            debug!("restoring saved session");
            api.import_session(&cookie);
        }
        let stash = SessionStash::new(store.clone(), Arc::new(SystemClock));
        Ok(Self { store, api, stash })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn stash(&self) -> &SessionStash {
        &self.stash
    }

    /// Persist whatever cookies the client currently holds.
    pub fn save(&self) -> Result<()> {
        match self.api.export_session() {
            Some(cookie) => self.store.set(SESSION_COOKIE_KEY, &cookie)?,
            None => self.store.remove(SESSION_COOKIE_KEY)?,
        }
        Ok(())
    }

    pub fn forget(&self) -> Result<()> {
        self.store.remove(SESSION_COOKIE_KEY)?;
        Ok(())
    }
}
