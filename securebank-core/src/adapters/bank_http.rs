//! Secure Bank HTTP API client
//!
//! The bank exposes a small JSON API with Portuguese field names:
//! - `POST /auth/login` `{ apelido, senha }` -> `{ token, usuario? }`
//! - `POST /contas` `{ nome, cpf, apelido, senha }`
//! - `GET /contas/saldo` -> `{ saldo }`
//! - `GET /transferencias?pagina=N&tipo=recebida|enviada&busca=q` -> `[ ... ]`
//! - `POST /transferencias` `{ contaDestino, valor, descricao, categoria }`
//!
//! Error responses carry `{ "message": "..." }`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AuthGrant, Counterparty, FeedFilter, Identity, PageRequest, Profile, Registration,
    Transaction, TransactionKind, TransferRequest,
};
use crate::ports::BankApi;

/// Default production API URL
pub const DEFAULT_BASE_URL: &str = "https://mock-bank-mock-back.yexuz7.easypanel.host";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// API Models (wire format)
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    apelido: &'a str,
    senha: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
    #[serde(default)]
    usuario: Option<WireProfile>,
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    #[serde(default)]
    nome: String,
    #[serde(default)]
    apelido: String,
    #[serde(default)]
    cpf: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    telefone: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    nome: &'a str,
    cpf: &'a str,
    apelido: &'a str,
    senha: &'a str,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "deserialize_amount")]
    saldo: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    conta_destino: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    valor: Decimal,
    descricao: &'a str,
    categoria: &'a str,
}

/// Transaction as listed by `GET /transferencias`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireTransaction {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(default)]
    pub descricao: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub valor: Decimal,
    /// "recebida" (incoming) or "enviada" (outgoing)
    pub tipo: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub contraparte: WireCounterparty,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireCounterparty {
    #[serde(default)]
    pub apelido: String,
    #[serde(default)]
    pub nome: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom("id is not an integer")),
        JsonValue::String(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid id: {}", e))),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Deserialize amount that can be number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

impl WireTransaction {
    /// Map to the domain model
    pub fn into_domain(self) -> Result<Transaction> {
        let kind = match self.tipo.trim().to_lowercase().as_str() {
            "recebida" | "entrada" | "incoming" => TransactionKind::Incoming,
            "enviada" | "saida" | "saída" | "outgoing" => TransactionKind::Outgoing,
            other => {
                return Err(Error::network(format!(
                    "Malformed transaction {}: unknown type '{}'",
                    self.id, other
                )))
            }
        };

        Ok(Transaction {
            id: self.id,
            description: self.descricao,
            amount: self.valor.abs(),
            kind,
            category: self.categoria,
            timestamp: self.data,
            counterparty: Counterparty {
                alias: self.contraparte.apelido,
                name: self.contraparte.nome,
            },
        })
    }
}

impl WireProfile {
    fn into_domain(self) -> Profile {
        Profile {
            name: self.nome,
            alias: self.apelido,
            cpf: self.cpf,
            email: self.email.filter(|e| !e.trim().is_empty()),
            phone: self.telefone.filter(|p| !p.trim().is_empty()),
            created_at: self
                .created_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Wire value of the `tipo` query parameter
fn filter_param(filter: FeedFilter) -> Option<&'static str> {
    match filter {
        FeedFilter::All => None,
        FeedFilter::Incoming => Some("recebida"),
        FeedFilter::Outgoing => Some("enviada"),
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Which kind of call produced a response; decides how statuses map to errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Login,
    Authorized,
    Public,
}

/// Bank API client
#[derive(Debug, Clone)]
pub struct HttpBankApi {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpBankApi {
    /// Create a client against the default production API
    pub fn new() -> Result<Self> {
        Self::new_with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom base URL and timeout
    pub fn new_with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::Config(format!("Invalid request URL: {}", e)))
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, call: Call) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        check_response_status(response, call).await
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::network(format!(
                "Connection timed out after {} seconds",
                self.timeout_secs
            ))
        } else if error.is_connect() {
            Error::network("Unable to connect to the bank servers")
        } else {
            Error::network(format!("Bank request failed: {}", error))
        }
    }
}

/// Check response status and return appropriate errors
async fn check_response_status(response: Response, call: Call) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body.message.or(body.error).filter(|m| !m.trim().is_empty());

    Err(match (call, status) {
        (
            Call::Login,
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::UNPROCESSABLE_ENTITY,
        ) => Error::AuthRejected(message.unwrap_or_else(|| "Invalid alias or secret".to_string())),
        (_, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Error::AuthRejected(
            message.unwrap_or_else(|| "Session expired or invalid".to_string()),
        ),
        (_, StatusCode::TOO_MANY_REQUESTS) => {
            Error::network("Rate limit exceeded. Please wait a moment and try again.")
        }
        (_, s) if s.is_client_error() => {
            Error::Rejected(message.unwrap_or_else(|| format!("HTTP {}", s.as_u16())))
        }
        (_, s) => Error::network(format!("Bank API error: HTTP {}", s.as_u16())),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::network(format!("Failed to parse {} response: {}", what, e)))
}

#[async_trait]
impl BankApi for HttpBankApi {
    async fn authenticate(&self, identity: &Identity) -> Result<AuthGrant> {
        let body = LoginBody {
            apelido: &identity.alias,
            senha: &identity.secret,
        };
        let builder = self
            .request(Method::POST, self.url("/auth/login")?, None)
            .json(&body);
        let response = self.send(builder, Call::Login).await?;
        let login: LoginResponse = parse_json(response, "login").await?;

        if login.token.trim().is_empty() {
            return Err(Error::AuthRejected("Server returned an empty token".to_string()));
        }

        Ok(AuthGrant {
            token: login.token,
            profile: login.usuario.map(WireProfile::into_domain),
        })
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        let body = RegisterBody {
            nome: registration.name.trim(),
            cpf: registration.cpf.trim(),
            apelido: registration.alias.trim(),
            senha: &registration.secret,
        };
        let builder = self
            .request(Method::POST, self.url("/contas")?, None)
            .json(&body);
        self.send(builder, Call::Public).await?;
        Ok(())
    }

    async fn balance(&self, token: &str) -> Result<Decimal> {
        let builder = self.request(Method::GET, self.url("/contas/saldo")?, Some(token));
        let response = self.send(builder, Call::Authorized).await?;
        let balance: BalanceResponse = parse_json(response, "balance").await?;
        Ok(balance.saldo)
    }

    async fn list_transactions(
        &self,
        token: &str,
        request: &PageRequest,
    ) -> Result<Vec<Transaction>> {
        let mut url = self.url("/transferencias")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("pagina", &request.page.to_string());
            if let Some(tipo) = filter_param(request.filter) {
                pairs.append_pair("tipo", tipo);
            }
            let query = request.query.trim();
            if !query.is_empty() {
                pairs.append_pair("busca", query);
            }
        }

        let builder = self.request(Method::GET, url, Some(token));
        let response = self.send(builder, Call::Authorized).await?;
        let wire: Vec<WireTransaction> = parse_json(response, "transactions").await?;

        wire.into_iter().map(WireTransaction::into_domain).collect()
    }

    async fn send_transfer(&self, token: &str, transfer: &TransferRequest) -> Result<()> {
        let body = TransferBody {
            conta_destino: &transfer.destination_alias,
            valor: transfer.amount,
            descricao: &transfer.description,
            categoria: &transfer.category,
        };
        let builder = self
            .request(Method::POST, self.url("/transferencias")?, Some(token))
            .json(&body);
        self.send(builder, Call::Authorized).await?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
