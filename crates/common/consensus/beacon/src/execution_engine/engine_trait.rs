use async_trait::async_trait;

use crate::bellatrix::execution_payload::ExecutionPayload;

#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Return ``True`` if and only if ``execution_payload`` is valid with respect to the
    /// execution state of the engine, notifying the engine of the payload either way.
    async fn verify_and_notify_new_payload(
        &self,
        execution_payload: &ExecutionPayload,
    ) -> anyhow::Result<bool>;
}
