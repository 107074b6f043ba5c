use std::sync::Arc;

use carelink_captions::CaptionPipeline;

use crate::ws::registry::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub pipeline: Arc<CaptionPipeline>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, pipeline: Arc<CaptionPipeline>) -> Self {
        Self { registry, pipeline }
    }
}
