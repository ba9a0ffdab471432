use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;

use super::engine_trait::ExecutionApi;
use crate::bellatrix::execution_payload::ExecutionPayload;

/// Engine double answering every payload with a fixed verdict.
#[derive(Deserialize, Debug)]
pub struct MockExecutionEngine {
    execution_valid: bool,
    /// When set, every call fails with this message instead of returning a verdict.
    #[serde(default)]
    failure: Option<String>,
    #[serde(skip)]
    calls: AtomicUsize,
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutionEngine {
    pub fn new() -> Self {
        Self {
            execution_valid: true,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_file(execution_yaml_path: &Path) -> anyhow::Result<MockExecutionEngine> {
        let file = std::fs::File::open(execution_yaml_path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn set_payload_status(&mut self, payload_status: bool) {
        self.execution_valid = payload_status;
    }

    pub fn set_failure(&mut self, failure: impl Into<String>) {
        self.failure = Some(failure.into());
    }

    /// Number of payloads the engine has been asked to verify.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExecutionApi for MockExecutionEngine {
    async fn verify_and_notify_new_payload(
        &self,
        _execution_payload: &ExecutionPayload,
    ) -> anyhow::Result<bool> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(failure) => Err(anyhow!("{failure}")),
            None => Ok(self.execution_valid),
        }
    }
}
