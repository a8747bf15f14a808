use async_trait::async_trait;
use mediassist_core::{AssistError, NextAction, ReportSession, Result, Step, StepResult, classify};
use tracing::{info, warn};

pub struct SeverityCheckTask;

#[async_trait]
impl Step for SeverityCheckTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, session: &mut ReportSession) -> Result<StepResult> {
        let vitals = session
            .vitals
            .as_ref()
            .ok_or_else(|| AssistError::Context("Vitals not found in session".to_string()))?;

        let alerts = classify(vitals);

        for alert in &alerts {
            warn!(session_id = %session.id, vital = %alert.vital(), "{}", alert);
        }
        info!(
            session_id = %session.id,
            alerts = alerts.len(),
            "Severity analysis complete"
        );

        let status_message = if alerts.is_empty() {
            "All vitals appear within normal range".to_string()
        } else {
            format!("{} vitals outside the normal range", alerts.len())
        };
        session.alerts = Some(alerts);

        Ok(StepResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status_message),
        ))
    }
}
