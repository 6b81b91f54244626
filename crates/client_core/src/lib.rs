use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CompanyId, TransferId},
    error::RequestError,
    protocol::{
        CompanySummary, ListOrPage, Page, ReceiveTransferRequest, Transfer, TransferQuery,
        WarehouseSummary,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;

pub use config::{load_settings, ClientSettings, SettingsError};

/// Server-side transfer lifecycle operations.
#[async_trait]
pub trait TransferApi: Send + Sync {
    async fn list_transfers(&self, query: &TransferQuery) -> Result<Page<Transfer>, RequestError>;
    async fn receive_transfer(
        &self,
        transfer_id: TransferId,
        request: &ReceiveTransferRequest,
    ) -> Result<Transfer, RequestError>;
    async fn revert_reception(&self, transfer_id: TransferId) -> Result<Transfer, RequestError>;
}

/// Read-only lookups used to populate filter selects.
#[async_trait]
pub trait ReferenceDataApi: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<CompanySummary>, RequestError>;
    async fn list_warehouses(
        &self,
        company: CompanyId,
    ) -> Result<Vec<WarehouseSummary>, RequestError>;
}

/// Everything a transfer screen needs from the server.
pub trait WarehouseBackend: TransferApi + ReferenceDataApi {}

impl<T> WarehouseBackend for T where T: TransferApi + ReferenceDataApi {}

pub struct TransferClient {
    http: Client,
    base_url: Url,
}

impl TransferClient {
    pub fn new(base_url: Url, auth_token: Option<&str>) -> Result<Self, RequestError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token.map(str::trim).filter(|token| !token.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| RequestError::Transport(format!("invalid auth token: {err}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RequestError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, RequestError> {
        Self::new(settings.api_base_url.clone(), settings.auth_token.as_deref())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path)
            .map_err(|err| RequestError::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    async fn post_transfer_action(
        &self,
        transfer_id: TransferId,
        action: &str,
        body: Option<&ReceiveTransferRequest>,
    ) -> Result<Transfer, RequestError> {
        let url = self.endpoint(&format!("transferencias/{}/{action}/", transfer_id.0))?;
        let request = self.http.post(url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        let response = request.send().await.map_err(transport_error)?;
        decode(response).await
    }
}

#[async_trait]
impl TransferApi for TransferClient {
    async fn list_transfers(&self, query: &TransferQuery) -> Result<Page<Transfer>, RequestError> {
        let url = self.endpoint("transferencias/")?;
        debug!(page = query.page, page_size = query.page_size, "listing transfers");

        let response = self
            .http
            .get(url)
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(transport_error)?;
        let page: Page<Transfer> = decode(response).await?;

        info!(
            page = query.page,
            rows = page.results.len(),
            total = page.count,
            "transfers listed"
        );
        Ok(page)
    }

    async fn receive_transfer(
        &self,
        transfer_id: TransferId,
        request: &ReceiveTransferRequest,
    ) -> Result<Transfer, RequestError> {
        match self
            .post_transfer_action(transfer_id, "recibir", Some(request))
            .await
        {
            Ok(transfer) => {
                info!(
                    transfer_id = transfer_id.0,
                    state = transfer.state.wire_name(),
                    received_quantity = request.received_quantity,
                    "transfer received"
                );
                Ok(transfer)
            }
            Err(err) => {
                warn!(transfer_id = transfer_id.0, "reception rejected: {err}");
                Err(err)
            }
        }
    }

    async fn revert_reception(&self, transfer_id: TransferId) -> Result<Transfer, RequestError> {
        match self
            .post_transfer_action(transfer_id, "revertir_recepcion", None)
            .await
        {
            Ok(transfer) => {
                info!(
                    transfer_id = transfer_id.0,
                    state = transfer.state.wire_name(),
                    "transfer reception reverted"
                );
                Ok(transfer)
            }
            Err(err) => {
                warn!(transfer_id = transfer_id.0, "reversal rejected: {err}");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl ReferenceDataApi for TransferClient {
    async fn list_companies(&self) -> Result<Vec<CompanySummary>, RequestError> {
        let url = self.endpoint("empresas/")?;
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let companies: ListOrPage<CompanySummary> = decode(response).await?;
        Ok(companies.into_vec())
    }

    async fn list_warehouses(
        &self,
        company: CompanyId,
    ) -> Result<Vec<WarehouseSummary>, RequestError> {
        let url = self.endpoint("almacenes/")?;
        let response = self
            .http
            .get(url)
            .query(&[("empresa", company.0)])
            .send()
            .await
            .map_err(transport_error)?;
        let warehouses: ListOrPage<WarehouseSummary> = decode(response).await?;
        Ok(warehouses.into_vec())
    }
}

fn transport_error(err: reqwest::Error) -> RequestError {
    RequestError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| RequestError::Decode(err.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "request failed");
    Err(RequestError::from_response(status.as_u16(), &body))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
