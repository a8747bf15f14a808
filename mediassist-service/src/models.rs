use mediassist_core::{AlertList, ReportSession, VitalsReading};
use serde::Serialize;

use crate::workflow::is_summary_step;

/// What the page shows for one uploaded report.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub session_id: String,
    pub status: String,
    pub current_step: String,
    pub status_message: Option<String>,
    pub file_name: Option<String>,
    pub text: String,
    pub vitals: VitalsReading,
    pub alerts: AlertList,
    pub summary: Option<String>,
}

impl ReportResponse {
    pub fn from_session(session: &ReportSession) -> Self {
        let status = if session.summary.is_some() {
            "summarized"
        } else if is_summary_step(&session.current_step_id) {
            "analyzed"
        } else {
            "processing"
        };

        Self {
            session_id: session.id.clone(),
            status: status.to_string(),
            current_step: short_step_name(&session.current_step_id).to_string(),
            status_message: session.status_message.clone(),
            file_name: session.file_name.clone(),
            text: session.text.clone().unwrap_or_default(),
            vitals: session.vitals.clone().unwrap_or_default(),
            alerts: session.alerts.clone().unwrap_or_default(),
            summary: session.summary.clone(),
        }
    }
}

/// `mediassist_service::tasks::summary::SummaryTask` -> `SummaryTask`
fn short_step_name(step_id: &str) -> &str {
    step_id.rsplit("::").next().unwrap_or(step_id)
}
