pub mod rpc_types;
pub mod utils;

use std::path::PathBuf;

use alloy_primitives::hex;
use anyhow::anyhow;
use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use reqwest::{Client, Request, Url};
use rpc_types::{
    execution_payload::ExecutionPayloadV1,
    payload_status::{PayloadStatus, PayloadStatusV1},
};
use sable_consensus_beacon::{
    bellatrix::execution_payload::ExecutionPayload, execution_engine::engine_trait::ExecutionApi,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use utils::{Claims, JsonRpcRequest, JsonRpcResponse, strip_prefix};

#[derive(Clone)]
pub struct ExecutionEngine {
    http_client: Client,
    jwt_encoding_key: EncodingKey,
    engine_api_url: Url,
}

impl ExecutionEngine {
    pub fn new(engine_api_url: Url, jwt_path: PathBuf) -> anyhow::Result<ExecutionEngine> {
        let jwt_file = std::fs::read_to_string(&jwt_path)
            .map_err(|err| anyhow!("Could not read jwt secret {}: {err}", jwt_path.display()))?;
        let jwt_private_key = hex::decode(strip_prefix(jwt_file.trim_end()))?;
        Ok(ExecutionEngine {
            http_client: Client::new(),
            jwt_encoding_key: EncodingKey::from_secret(jwt_private_key.as_slice()),
            engine_api_url,
        })
    }

    pub fn create_jwt_token(&self) -> anyhow::Result<String> {
        let header = Header::default();
        let claims = Claims {
            iat: get_current_timestamp(),
            id: None,
            clv: None,
        };
        encode(&header, &claims, &self.jwt_encoding_key)
            .map_err(|err| anyhow!("Could not encode jwt key {err:?}"))
    }

    pub fn build_request(&self, rpc_request: JsonRpcRequest) -> anyhow::Result<Request> {
        Ok(self
            .http_client
            .post(self.engine_api_url.clone())
            .json(&rpc_request)
            .bearer_auth(self.create_jwt_token()?)
            .build()?)
    }

    async fn call<T: DeserializeOwned>(&self, rpc_request: JsonRpcRequest) -> anyhow::Result<T> {
        let http_post_request = self.build_request(rpc_request)?;

        self.http_client
            .execute(http_post_request)
            .await?
            .json::<JsonRpcResponse<T>>()
            .await?
            .to_result()
    }

    pub async fn engine_new_payload_v1(
        &self,
        execution_payload: ExecutionPayloadV1,
    ) -> anyhow::Result<PayloadStatusV1> {
        self.call(JsonRpcRequest::new(
            "engine_newPayloadV1",
            vec![json!(execution_payload)],
        ))
        .await
    }

    /// Return ``PayloadStatus`` of execution payload.
    pub async fn notify_new_payload(
        &self,
        execution_payload: &ExecutionPayload,
    ) -> anyhow::Result<PayloadStatusV1> {
        self.engine_new_payload_v1(execution_payload.into()).await
    }
}

/// Only a ``VALID`` status accepts the payload; syncing and accepted are not a verdict.
pub fn is_payload_valid(payload_status: &PayloadStatusV1) -> bool {
    payload_status.status == PayloadStatus::Valid
}

#[async_trait]
impl ExecutionApi for ExecutionEngine {
    async fn verify_and_notify_new_payload(
        &self,
        execution_payload: &ExecutionPayload,
    ) -> anyhow::Result<bool> {
        let payload_status = self.notify_new_payload(execution_payload).await?;
        debug!(
            block_hash = ?execution_payload.block_hash,
            status = ?payload_status.status,
            validation_error = ?payload_status.validation_error,
            "Engine answered newPayload"
        );
        Ok(is_payload_valid(&payload_status))
    }
}
