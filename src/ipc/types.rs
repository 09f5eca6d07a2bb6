use crate::config::Settings;
use crate::report::{PdfReportRenderer, ReportRenderer};
use crate::session::AssessmentSession;
use crate::store::RecordStore;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub session_id: String,
    pub settings: Settings,
    pub store: RecordStore,
    pub session: AssessmentSession,
    pub renderer: Box<dyn ReportRenderer>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let store = RecordStore::new(settings.store_path.clone(), settings.columns.clone());
        let renderer = Box::new(PdfReportRenderer::new(settings.branding.clone()));
        Self {
            session_id: Uuid::new_v4().to_string(),
            session: AssessmentSession::new(settings.assessors.clone()),
            store,
            renderer,
            settings,
        }
    }
}
