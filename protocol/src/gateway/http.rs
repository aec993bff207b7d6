//! JSON-over-HTTP implementation of [`BoosterGateway`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BoosterGateway, LightTxResponse, PendingRoot, RootHashResponse, Slice, SliceResponse};
use crate::crypto::hash::{parse_h256, to_hex, H256};
use crate::crypto::Address;
use crate::error::{ProtocolError, Result};
use crate::light_tx::SignedLightTransaction;
use crate::payment::SignedPaymentCommitment;

#[derive(Deserialize)]
struct AddressResponse {
    address: String,
}

#[derive(Deserialize)]
struct HeightResponse {
    height: u64,
}

/// Talks to a booster node over HTTP.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send, check the status, decode the body. `endpoint` labels errors.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, builder: RequestBuilder) -> Result<T> {
        debug!(endpoint, "booster request");
        let response = builder.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "booster unreachable");
            ProtocolError::gateway(endpoint, None, e.to_string())
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::gateway(endpoint, Some(status.as_u16()), e.to_string()))?;
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "booster returned error status");
            return Err(ProtocolError::gateway(
                endpoint,
                Some(status.as_u16()),
                body.trim().to_string(),
            ));
        }
        serde_json::from_str(&body).map_err(|e| {
            ProtocolError::gateway(
                endpoint,
                Some(status.as_u16()),
                format!("invalid response body: {e}"),
            )
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(path, self.client.get(self.endpoint(path))).await
    }

    async fn address(&self, path: &str) -> Result<Address> {
        let resp: AddressResponse = self.get(path).await?;
        resp.address
            .parse()
            .map_err(|e: crate::crypto::KeyError| ProtocolError::gateway(path, None, e.to_string()))
    }
}

#[async_trait]
impl BoosterGateway for HttpGateway {
    async fn pending_root(&self, stage_height: Option<u64>) -> Result<PendingRoot> {
        let mut builder = self.client.get(self.endpoint("/roothash"));
        if let Some(h) = stage_height {
            builder = builder.query(&[("stage_height", h)]);
        }
        let resp: RootHashResponse = self.fetch("/roothash", builder).await?;
        resp.into_pending()
    }

    async fn committed_root(&self, stage_height: u64) -> Result<Option<H256>> {
        let path = format!("/roothash/{stage_height}");
        let resp: RootHashResponse = self.get(&path).await?;
        match (resp.ok, resp.root_hash) {
            (true, Some(root)) => parse_h256(&root)
                .map(Some)
                .map_err(|e| ProtocolError::gateway(&path, None, e.to_string())),
            _ => Ok(None),
        }
    }

    async fn slice(&self, stage_height: u64, payment_hash: &H256) -> Result<Slice> {
        let builder = self.client.get(self.endpoint("/slice")).query(&[
            ("stage_height", stage_height.to_string()),
            ("payment_hash", to_hex(payment_hash)),
        ]);
        let resp: SliceResponse = self.fetch("/slice", builder).await?;
        resp.decode()
    }

    async fn send_payments(&self, payments: &[SignedPaymentCommitment]) -> Result<serde_json::Value> {
        let builder = self
            .client
            .post(self.endpoint("/send/payments"))
            .json(&serde_json::json!({ "payments": payments }));
        self.fetch("/send/payments", builder).await
    }

    async fn send_light_tx(&self, tx: &SignedLightTransaction) -> Result<serde_json::Value> {
        let builder = self
            .client
            .post(self.endpoint("/send/light_tx"))
            .json(&serde_json::json!({ "lightTxJson": tx }));
        let resp: LightTxResponse = self.fetch("/send/light_tx", builder).await?;
        if !resp.ok {
            let code = resp.code.map(|c| c.to_string()).unwrap_or_default();
            return Err(ProtocolError::gateway(
                "/send/light_tx",
                None,
                format!(
                    "{} {}",
                    resp.message.unwrap_or_else(|| "light transaction rejected".into()),
                    code
                )
                .trim()
                .to_string(),
            ));
        }
        Ok(resp.receipt.unwrap_or(serde_json::Value::Null))
    }

    async fn contract_address(&self) -> Result<Address> {
        self.address("/contract/address/ifc").await
    }

    async fn viable_stage_height(&self) -> Result<u64> {
        let resp: HeightResponse = self.get("/viable/stage/height").await?;
        Ok(resp.height)
    }

    async fn pending_root_hashes(&self) -> Result<serde_json::Value> {
        self.get("/pending/roothashes").await
    }

    async fn trees(&self, stage_height: u64) -> Result<serde_json::Value> {
        let builder = self
            .client
            .get(self.endpoint("/trees"))
            .query(&[("stage_height", stage_height)]);
        self.fetch("/trees", builder).await
    }

    async fn booster_address(&self) -> Result<Address> {
        self.address("/booster/address").await
    }

    async fn server_address(&self) -> Result<Address> {
        self.address("/server/address").await
    }

    async fn receipts(&self, stage_height: u64) -> Result<serde_json::Value> {
        self.get(&format!("/receipts/{stage_height}")).await
    }

    async fn accounts(&self, stage_height: u64) -> Result<serde_json::Value> {
        self.get(&format!("/accounts/{stage_height}")).await
    }

    async fn asset_list(&self) -> Result<serde_json::Value> {
        self.get("/assetlist").await
    }
}
