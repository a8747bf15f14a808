use async_trait::async_trait;
use mediassist_core::{
    AssistError, NextAction, ReportSession, Result, Step, StepResult, extract_vitals,
};
use tracing::info;

pub struct VitalsScanTask;

#[async_trait]
impl Step for VitalsScanTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, session: &mut ReportSession) -> Result<StepResult> {
        let text = session
            .text
            .as_deref()
            .ok_or_else(|| AssistError::Context("Report text not found in session".to_string()))?;

        let vitals = extract_vitals(text);

        info!(
            session_id = %session.id,
            found = vitals.len(),
            "Vitals scan complete"
        );

        let status_message = if vitals.is_empty() {
            "No key vitals detected in this report".to_string()
        } else {
            format!("{} key vitals extracted", vitals.len())
        };
        session.vitals = Some(vitals);

        Ok(StepResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status_message),
        ))
    }
}
