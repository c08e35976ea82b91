//! HTTP rail client.
//!
//! Talks JSON to a rail gateway that executes transfers on the sender's
//! behalf:
//!
//! - `POST /transfers` submits one transfer
//! - `POST /batches` submits an all-or-nothing bundle
//! - `GET /balances/{token}?account=...` reads the sender balance

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use paylane_types::{Amount, Identity};

use crate::config::RailConfig;
use crate::error::{RailError, RailResult};
use crate::traits::PaymentRail;
use crate::types::{BatchReceipt, TransferInstruction, TransferReceipt, TransferRef};

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    from: &'a Identity,
    #[serde(flatten)]
    instruction: &'a TransferInstruction,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    from: &'a Identity,
    fee_sponsored: bool,
    transfers: &'a [TransferInstruction],
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    transfer_ref: TransferRef,
    all_confirmed: bool,
    #[serde(default)]
    item_refs: Option<Vec<TransferRef>>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Amount,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    have: Option<Amount>,
    #[serde(default)]
    need: Option<Amount>,
}

/// Client for an HTTP rail gateway.
#[derive(Clone)]
pub struct HttpRail {
    client: Client,
    base_url: String,
    sender: Identity,
    api_key: Option<String>,
}

impl HttpRail {
    /// Build a client from a validated config.
    pub fn new(config: &RailConfig) -> RailResult<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| RailError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            sender: Identity::new(config.sender.clone()),
            api_key: config.api_key.clone(),
        })
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn a non-2xx response into a `RailError`.
    async fn error_from(response: Response) -> RailError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_else(|_| ErrorBody {
            message: text.clone(),
            ..Default::default()
        });
        classify(status, body)
    }
}

fn classify(status: StatusCode, body: ErrorBody) -> RailError {
    let message = if body.message.is_empty() {
        status.to_string()
    } else {
        body.message
    };

    if body.code == "insufficient_balance" || status == StatusCode::PAYMENT_REQUIRED {
        return RailError::insufficient_balance(body.have.unwrap_or(0), body.need.unwrap_or(0));
    }
    if status.is_server_error() {
        return RailError::network(format!("gateway returned {}: {}", status, message));
    }
    RailError::rejected(message)
}

#[async_trait]
impl PaymentRail for HttpRail {
    fn sender(&self) -> &Identity {
        &self.sender
    }

    async fn transfer(&self, instruction: &TransferInstruction) -> RailResult<TransferReceipt> {
        let url = format!("{}/transfers", self.base_url);
        debug!(
            url = %url,
            to = %instruction.to,
            amount = instruction.amount,
            lane = ?instruction.lane,
            "Submitting transfer"
        );

        let request = TransferRequest {
            from: &self.sender,
            instruction,
        };
        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            warn!(to = %instruction.to, amount = instruction.amount, error = %err, "Transfer refused");
            return Err(err);
        }

        let receipt: TransferReceipt = response.json().await?;
        info!(
            transfer_ref = %receipt.transfer_ref,
            confirmed = receipt.confirmed,
            "Transfer submitted"
        );
        Ok(receipt)
    }

    async fn submit_batch(
        &self,
        instructions: &[TransferInstruction],
        fee_sponsored: bool,
    ) -> RailResult<BatchReceipt> {
        if instructions.is_empty() {
            return Err(RailError::EmptyBatch);
        }

        let url = format!("{}/batches", self.base_url);
        debug!(url = %url, count = instructions.len(), "Submitting batch");

        let request = BatchRequest {
            from: &self.sender,
            fee_sponsored,
            transfers: instructions,
        };
        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            warn!(count = instructions.len(), error = %err, "Batch refused");
            return Err(err);
        }

        let body: BatchResponse = response.json().await?;
        info!(
            transfer_ref = %body.transfer_ref,
            all_confirmed = body.all_confirmed,
            count = instructions.len(),
            "Batch submitted"
        );
        Ok(BatchReceipt::new(
            body.transfer_ref,
            body.all_confirmed,
            body.item_refs,
            instructions.len(),
        ))
    }

    async fn balance(&self, token: &str) -> RailResult<Amount> {
        let url = format!("{}/balances/{}", self.base_url, token);
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("account", self.sender.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: BalanceResponse = response.json().await?;
        Ok(body.balance)
    }
}
