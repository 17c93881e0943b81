//! Shared application state for all routes.

use crate::config::Settings;
use crate::media::MediaStorage;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub media: MediaStorage,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        AppState {
            store,
            media: MediaStorage::new(settings.media_root.clone(), settings.media_url.clone()),
            settings: Arc::new(settings),
        }
    }
}
