//! worker_status tool implementation.

use offline_core::{Error, Registration};
use rmcp::{ErrorData as McpError, model::*};

/// Implementation of the worker_status tool.
pub async fn status_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let status = registration.status().await;
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize status: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{offline_registration, output_json};
    use offline_core::{RegistrationStatus, WorkerState};

    #[tokio::test]
    async fn test_status_reports_active_worker() {
        let (registration, _store) = offline_registration().await;

        let result = status_impl(&registration).await.unwrap();
        let status: RegistrationStatus = output_json(&result);

        let active = status.active.unwrap();
        assert_eq!(active.version, "v1");
        assert_eq!(active.cache, "poker-v1");
        assert_eq!(active.state, WorkerState::Activated);
        assert!(status.waiting.is_none());
        assert!(status.clients_claimed);
    }

    #[tokio::test]
    async fn test_status_empty_registration() {
        let registration = Registration::new();
        let result = status_impl(&registration).await.unwrap();
        let status: RegistrationStatus = output_json(&result);
        assert!(status.active.is_none());
    }
}
