//! Remote expense gateway.
//!
//! Every call to the expense API goes through [`ExpenseGateway`]; failures of
//! any shape come back as a single [`GatewayError`] whose `Display` is the
//! message shown to the user.

use std::{future::Future, time::Duration};

use api_types::{
    envelope::ApiResponse,
    expense::{ExpenseNew, ExpenseRecord},
    summary::MonthlySummary,
};
use engine::{Amount, Expense, ExpenseId, Period};
use reqwest::{
    RequestBuilder, StatusCode, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

mod probe;

pub use probe::ProbeLoop;

const CONNECTION_MESSAGE: &str = "connection error, check your internet connection";
const TIMEOUT_MESSAGE: &str = "the server took too long to answer";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No response: connection refused, DNS failure, timeout.
    #[error("{0}")]
    Transport(String),
    /// A response arrived but reported a failure.
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
    /// The store rejected the payload; detail messages already flattened.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    Request(String),
    /// HTTP 401, passed through untouched with the raw body.
    #[error("unauthorized")]
    Unauthorized { body: String },
}

impl GatewayError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else if err.is_timeout() {
            Self::Transport(TIMEOUT_MESSAGE.to_string())
        } else {
            Self::Transport(CONNECTION_MESSAGE.to_string())
        }
    }

    fn from_failure(status: StatusCode, message: String, has_details: bool) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ if has_details => Self::Validation(message),
            _ => Self::Server {
                status: Some(status.as_u16()),
                message,
            },
        }
    }

    /// Returns `true` when no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Construction parameters of an [`HttpGateway`].
///
/// Owned by the gateway instance; two gateways never share defaults.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    base_url: Url,
    timeout: Duration,
    headers: HeaderMap,
}

impl GatewayConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// `base_url` points at the expense resource, e.g.
    /// `http://127.0.0.1:8000/api/gastos/`. A missing trailing slash is added.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| GatewayError::Request(format!("invalid base_url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Request(format!(
                "invalid base_url: {base_url} cannot be a base"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
            headers: HeaderMap::new(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, GatewayError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| GatewayError::Request(format!("invalid header name {name}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| GatewayError::Request(format!("invalid header value: {err}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Operations offered by the remote expense store.
pub trait ExpenseGateway: Clone + Send + Sync + 'static {
    fn list_by_period(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<Vec<Expense>, GatewayError>> + Send;

    fn create(
        &self,
        period: Period,
        description: &str,
        amount: Amount,
    ) -> impl Future<Output = Result<Expense, GatewayError>> + Send;

    fn delete(
        &self,
        period: Period,
        id: ExpenseId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Never fails: any failure means "unreachable".
    fn probe_reachability(&self) -> impl Future<Output = bool> + Send;

    fn monthly_summary(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<MonthlySummary, GatewayError>> + Send;

    fn periods_with_expenses(&self) -> impl Future<Output = Result<Vec<Period>, GatewayError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .default_headers(config.headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Request(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: config.base_url,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|err| GatewayError::Request(format!("invalid endpoint {path}: {err}")))
    }

    /// Sends `request` and unwraps the `{success, data}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Option<T>, GatewayError> {
        let res = request.send().await.map_err(GatewayError::from_reqwest)?;
        let status = res.status();
        let body = res.text().await.map_err(GatewayError::from_reqwest)?;
        tracing::debug!("gateway answered {status}");

        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized { body });
        }

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) if status.is_success() && envelope.success => Ok(envelope.data),
            Ok(envelope) => {
                let message = envelope
                    .failure_message()
                    .unwrap_or_else(|| fallback.to_string());
                Err(GatewayError::from_failure(
                    status,
                    message,
                    envelope.details.is_some(),
                ))
            }
            Err(err) => {
                tracing::warn!("unexpected response body ({status}): {err}");
                Err(GatewayError::from_failure(status, fallback.to_string(), false))
            }
        }
    }
}

fn to_expense(record: ExpenseRecord) -> Expense {
    Expense {
        id: record.id,
        description: record.descricao,
        amount: Amount::new(record.valor),
        occurred_on: record.data,
    }
}

impl ExpenseGateway for HttpGateway {
    async fn list_by_period(&self, period: Period) -> Result<Vec<Expense>, GatewayError> {
        let endpoint = self.endpoint("")?;
        let request = self.http.get(endpoint).query(&[("mes", period.key())]);
        let records: Option<Vec<ExpenseRecord>> =
            self.send(request, "failed to load expenses").await?;

        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(to_expense)
            .collect())
    }

    async fn create(
        &self,
        period: Period,
        description: &str,
        amount: Amount,
    ) -> Result<Expense, GatewayError> {
        let endpoint = self.endpoint("")?;
        let payload = ExpenseNew {
            descricao: description.to_string(),
            valor: amount.value(),
            mes: period.key(),
        };
        let request = self.http.post(endpoint).json(&payload);
        let record: Option<ExpenseRecord> = self.send(request, "failed to add expense").await?;

        record.map(to_expense).ok_or_else(|| GatewayError::Server {
            status: None,
            message: "the server did not return the new expense".to_string(),
        })
    }

    async fn delete(&self, period: Period, id: ExpenseId) -> Result<(), GatewayError> {
        let endpoint = self.endpoint(&format!("{id}/"))?;
        let request = self.http.delete(endpoint).query(&[("mes", period.key())]);
        let _: Option<serde_json::Value> = self.send(request, "failed to remove expense").await?;
        Ok(())
    }

    async fn probe_reachability(&self) -> bool {
        let Ok(endpoint) = self.endpoint("meses-com-gastos/") else {
            return false;
        };
        match self.http.get(endpoint).send().await {
            Ok(res) => res.status() == StatusCode::OK,
            Err(err) => {
                tracing::debug!("reachability probe failed: {err}");
                false
            }
        }
    }

    async fn monthly_summary(&self, period: Period) -> Result<MonthlySummary, GatewayError> {
        let endpoint = self.endpoint("resumo/")?;
        let request = self.http.get(endpoint).query(&[("mes", period.key())]);
        let summary: Option<MonthlySummary> =
            self.send(request, "failed to load the summary").await?;

        summary.ok_or_else(|| GatewayError::Server {
            status: None,
            message: "the server did not return a summary".to_string(),
        })
    }

    async fn periods_with_expenses(&self) -> Result<Vec<Period>, GatewayError> {
        let endpoint = self.endpoint("meses-com-gastos/")?;
        let request = self.http.get(endpoint);
        let keys: Option<Vec<String>> = self.send(request, "failed to load months").await?;

        Ok(keys
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| match key.parse() {
                Ok(period) => Some(period),
                Err(err) => {
                    tracing::warn!("ignoring month {key}: {err}");
                    None
                }
            })
            .collect())
    }
}
