//! Mock Secure Bank API server for testing
//!
//! Simulates the bank's HTTP API so the client can be exercised without the
//! hosted backend. State (accounts, issued tokens, transfers) lives for the
//! lifetime of the server.
//!
//! - POST /auth/login returns { token, usuario }
//! - POST /contas creates an account
//! - GET /contas/saldo returns { saldo }
//! - GET /transferencias?pagina=N&tipo=..&busca=.. returns a page of transfers
//! - POST /transferencias records a transfer

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use super::bank_http::{WireCounterparty, WireTransaction};

/// Mock bank server for testing
pub struct MockBankServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for mock data generation
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Accounts that exist when the server starts: (alias, secret, name)
    pub accounts: Vec<(String, String, String)>,
    /// Number of transfers generated for the first account
    pub num_transactions: usize,
    /// Transfers per listing page
    pub page_size: usize,
    /// Answer every request with HTTP 500
    pub server_error: bool,
    /// Whether to simulate rate limiting
    pub rate_limit: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            accounts: vec![(
                "kauazinho".to_string(),
                "123456".to_string(),
                "Kauã Souza".to_string(),
            )],
            num_transactions: 25,
            page_size: 10,
            server_error: false,
            rate_limit: false,
            delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct MockAccount {
    nome: String,
    cpf: String,
    apelido: String,
    #[serde(skip)]
    senha: String,
    #[serde(skip)]
    saldo: f64,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: Vec<MockAccount>,
    tokens: HashMap<String, String>,
    /// Transfers keyed by the alias that owns the listing
    transactions: HashMap<String, Vec<WireTransaction>>,
    next_id: i64,
}

/// Parsed HTTP request
struct Request {
    method: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: JsonValue,
}

impl Request {
    fn bearer(&self) -> Option<&str> {
        self.headers
            .get("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

impl MockBankServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let state = Arc::new(Mutex::new(MockState::seeded(&config)));
        let state_clone = state.clone();

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &state);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Current balance of an account, if it exists
    pub fn balance_of(&self, alias: &str) -> Option<f64> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .accounts
            .iter()
            .find(|a| a.apelido == alias)
            .map(|a| a.saldo)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MockState {
    fn seeded(config: &MockConfig) -> Self {
        let mut state = Self {
            next_id: 1,
            ..Default::default()
        };
        for (i, (alias, secret, name)) in config.accounts.iter().enumerate() {
            state.accounts.push(MockAccount {
                nome: name.clone(),
                cpf: format!("123.456.789-{:02}", i),
                apelido: alias.clone(),
                senha: secret.clone(),
                saldo: 5000.0,
                created_at: "2025-01-15T10:00:00.000Z".to_string(),
            });
        }
        if let Some((owner, _, _)) = config.accounts.first() {
            let generated = generate_mock_transactions(&mut state.next_id, config.num_transactions);
            state.transactions.insert(owner.clone(), generated);
        }
        state
    }

    fn alias_for(&self, token: Option<&str>) -> Option<String> {
        token.and_then(|t| self.tokens.get(t).cloned())
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut first_line = String::new();
    reader.read_line(&mut first_line).ok()?;
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target, String::new()),
    };

    Some(Request {
        method,
        path,
        query: url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect(),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(JsonValue::Null),
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &Mutex<MockState>) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, "Bad Request", &json!({ "message": "Invalid request" }));
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if config.server_error {
        send_response(&mut stream, 500, "Internal Server Error", &json!({ "message": "boom" }));
        return;
    }

    if config.rate_limit {
        send_response(
            &mut stream,
            429,
            "Too Many Requests",
            &json!({ "message": "Rate limit exceeded" }),
        );
        return;
    }

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    let (status, text, body) = route(&request, config, &mut state);
    drop(state);

    send_response(&mut stream, status, text, &body);
}

fn route(
    request: &Request,
    config: &MockConfig,
    state: &mut MockState,
) -> (u16, &'static str, JsonValue) {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/auth/login") => login(request, state),
        ("POST", "/contas") => register(request, state),
        ("GET", "/contas/saldo") => {
            let Some(alias) = state.alias_for(request.bearer()) else {
                return unauthorized();
            };
            let saldo = state
                .accounts
                .iter()
                .find(|a| a.apelido == alias)
                .map(|a| a.saldo)
                .unwrap_or_default();
            (200, "OK", json!({ "saldo": saldo }))
        }
        ("GET", "/transferencias") => {
            let Some(alias) = state.alias_for(request.bearer()) else {
                return unauthorized();
            };
            list_transactions(request, config, state, &alias)
        }
        ("POST", "/transferencias") => {
            let Some(alias) = state.alias_for(request.bearer()) else {
                return unauthorized();
            };
            transfer(request, state, &alias)
        }
        _ => (404, "Not Found", json!({ "message": "Endpoint not found" })),
    }
}

fn unauthorized() -> (u16, &'static str, JsonValue) {
    (401, "Unauthorized", json!({ "message": "Token inválido" }))
}

fn field<'a>(body: &'a JsonValue, name: &str) -> &'a str {
    body.get(name).and_then(JsonValue::as_str).unwrap_or("")
}

fn login(request: &Request, state: &mut MockState) -> (u16, &'static str, JsonValue) {
    let alias = field(&request.body, "apelido");
    let secret = field(&request.body, "senha");

    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.apelido == alias && a.senha == secret)
        .cloned()
    else {
        return (401, "Unauthorized", json!({ "message": "Apelido ou senha inválidos" }));
    };

    let token = format!("mock_{}", uuid::Uuid::new_v4());
    state.tokens.insert(token.clone(), account.apelido.clone());
    (200, "OK", json!({ "token": token, "usuario": account }))
}

fn register(request: &Request, state: &mut MockState) -> (u16, &'static str, JsonValue) {
    let alias = field(&request.body, "apelido");
    if state.accounts.iter().any(|a| a.apelido == alias) {
        return (409, "Conflict", json!({ "message": "Apelido já cadastrado" }));
    }

    state.accounts.push(MockAccount {
        nome: field(&request.body, "nome").to_string(),
        cpf: field(&request.body, "cpf").to_string(),
        apelido: alias.to_string(),
        senha: field(&request.body, "senha").to_string(),
        saldo: 1000.0,
        created_at: Utc::now().to_rfc3339(),
    });
    (201, "Created", json!({ "message": "Conta criada" }))
}

fn list_transactions(
    request: &Request,
    config: &MockConfig,
    state: &MockState,
    alias: &str,
) -> (u16, &'static str, JsonValue) {
    let page: usize = request
        .query
        .get("pagina")
        .and_then(|p| p.parse().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let tipo = request.query.get("tipo").map(String::as_str);
    let search = request
        .query
        .get("busca")
        .map(|q| q.to_lowercase())
        .unwrap_or_default();

    let matching: Vec<&WireTransaction> = state
        .transactions
        .get(alias)
        .into_iter()
        .flatten()
        .filter(|tx| tipo.map_or(true, |t| tx.tipo == t))
        .filter(|tx| {
            search.is_empty()
                || tx.descricao.to_lowercase().contains(&search)
                || tx.contraparte.apelido.to_lowercase().contains(&search)
                || tx.contraparte.nome.to_lowercase().contains(&search)
        })
        .collect();

    let items: Vec<&WireTransaction> = matching
        .into_iter()
        .skip((page - 1) * config.page_size)
        .take(config.page_size)
        .collect();

    (200, "OK", json!(items))
}

fn transfer(request: &Request, state: &mut MockState, alias: &str) -> (u16, &'static str, JsonValue) {
    let destination = field(&request.body, "contaDestino").to_string();
    let amount = request
        .body
        .get("valor")
        .and_then(JsonValue::as_f64)
        .unwrap_or(0.0);

    if amount <= 0.0 {
        return (422, "Unprocessable Entity", json!({ "message": "Valor inválido" }));
    }
    let Some(target) = state.accounts.iter().find(|a| a.apelido == destination).cloned() else {
        return (404, "Not Found", json!({ "message": "Conta de destino não encontrada" }));
    };
    let Some(sender) = state.accounts.iter().find(|a| a.apelido == alias).cloned() else {
        return unauthorized();
    };
    if sender.saldo < amount {
        return (400, "Bad Request", json!({ "message": "Saldo insuficiente" }));
    }

    for account in state.accounts.iter_mut() {
        if account.apelido == sender.apelido {
            account.saldo -= amount;
        } else if account.apelido == target.apelido {
            account.saldo += amount;
        }
    }

    let id = state.next_id;
    state.next_id += 1;
    let sent = WireTransaction {
        id,
        descricao: field(&request.body, "descricao").to_string(),
        valor: rust_decimal::Decimal::from_f64_retain(amount).unwrap_or_default(),
        tipo: "enviada".to_string(),
        categoria: field(&request.body, "categoria").to_string(),
        data: Utc::now().to_rfc3339(),
        contraparte: WireCounterparty {
            apelido: target.apelido.clone(),
            nome: target.nome.clone(),
        },
    };
    let received = WireTransaction {
        tipo: "recebida".to_string(),
        contraparte: WireCounterparty {
            apelido: sender.apelido.clone(),
            nome: sender.nome.clone(),
        },
        ..sent.clone()
    };

    state
        .transactions
        .entry(sender.apelido)
        .or_default()
        .insert(0, sent);
    state
        .transactions
        .entry(target.apelido)
        .or_default()
        .insert(0, received);

    (201, "Created", json!({ "message": "Transferência realizada" }))
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &JsonValue) {
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn generate_mock_transactions(next_id: &mut i64, count: usize) -> Vec<WireTransaction> {
    let counterparts = [
        ("maria", "Maria Silva", "Presente de aniversário", "Presentes", "recebida"),
        ("joao", "João Pereira", "Aluguel", "Moradia", "enviada"),
        ("ana", "Ana Costa", "Almoço", "Alimentação", "enviada"),
        ("empresa", "Empresa LTDA", "Salário", "Salário", "recebida"),
        ("pedro", "Pedro Lima", "Uber", "Transporte", "enviada"),
    ];

    let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap_or_else(Utc::now);

    (0..count)
        .map(|i| {
            let (apelido, nome, descricao, categoria, tipo) = counterparts[i % counterparts.len()];
            let id = *next_id;
            *next_id += 1;
            WireTransaction {
                id,
                descricao: descricao.to_string(),
                valor: rust_decimal::Decimal::new(1000 + (i as i64 * 250), 2),
                tipo: tipo.to_string(),
                categoria: categoria.to_string(),
                data: (start - Duration::hours(i as i64 * 6)).to_rfc3339(),
                contraparte: WireCounterparty {
                    apelido: apelido.to_string(),
                    nome: nome.to_string(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::HttpBankApi;
    use crate::domain::result::Error;
    use crate::domain::{FeedFilter, Identity, PageRequest, Registration, TransactionKind, TransferRequest};
    use crate::ports::BankApi;
    use rust_decimal::Decimal;

    fn client(server: &MockBankServer) -> HttpBankApi {
        HttpBankApi::new_with_base_url(&server.base_url(), 5).unwrap()
    }

    async fn token(api: &HttpBankApi) -> String {
        api.authenticate(&Identity::new("kauazinho", "123456"))
            .await
            .unwrap()
            .token
    }

    #[tokio::test]
    async fn test_login_returns_token_and_profile() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let grant = api
            .authenticate(&Identity::new("kauazinho", "123456"))
            .await
            .unwrap();

        assert!(grant.token.starts_with("mock_"));
        let profile = grant.profile.unwrap();
        assert_eq!(profile.alias, "kauazinho");
        assert_eq!(profile.name, "Kauã Souza");
        assert!(profile.created_at.is_some());
    }

    #[tokio::test]
    async fn test_login_wrong_secret_is_auth_rejected() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let err = api
            .authenticate(&Identity::new("kauazinho", "wrong-secret"))
            .await
            .unwrap_err();

        match err {
            Error::AuthRejected(message) => assert!(message.contains("inválidos")),
            other => panic!("expected AuthRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_network() {
        let server = MockBankServer::start(MockConfig {
            server_error: true,
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);

        let err = api
            .authenticate(&Identity::new("kauazinho", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_is_network() {
        let server = MockBankServer::start(MockConfig {
            rate_limit: true,
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);

        let err = api.balance("anything").await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let base_url = server.base_url();
        drop(server);

        let api = HttpBankApi::new_with_base_url(&base_url, 2).unwrap();
        let err = api.balance("tok").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_token_is_auth_rejected() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let err = api.balance("not-issued").await.unwrap_err();
        assert!(matches!(err, Error::AuthRejected(_)));
    }

    #[tokio::test]
    async fn test_balance() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);
        let token = token(&api).await;

        assert_eq!(api.balance(&token).await.unwrap(), Decimal::new(5000, 0));
    }

    #[tokio::test]
    async fn test_listing_pages_until_empty() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);
        let token = token(&api).await;

        let mut total = 0;
        let mut page = 1;
        loop {
            let items = api
                .list_transactions(&token, &PageRequest::new(page, FeedFilter::All, ""))
                .await
                .unwrap();
            if items.is_empty() {
                break;
            }
            total += items.len();
            page += 1;
        }

        assert_eq!(total, 25);
        assert_eq!(page, 4);
    }

    #[tokio::test]
    async fn test_listing_filter_and_search() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);
        let token = token(&api).await;

        let incoming = api
            .list_transactions(&token, &PageRequest::first(FeedFilter::Incoming, ""))
            .await
            .unwrap();
        assert!(!incoming.is_empty());
        assert!(incoming.iter().all(|tx| tx.kind == TransactionKind::Incoming));

        let searched = api
            .list_transactions(&token, &PageRequest::first(FeedFilter::All, "aluguel"))
            .await
            .unwrap();
        assert!(!searched.is_empty());
        assert!(searched.iter().all(|tx| tx.description == "Aluguel"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let registration = Registration {
            name: "Maria Silva".to_string(),
            cpf: "987.654.321-00".to_string(),
            alias: "maria".to_string(),
            secret: "segredo1".to_string(),
            secret_confirmation: "segredo1".to_string(),
        };
        api.register(&registration).await.unwrap();

        let err = api.register(&registration).await.unwrap_err();
        assert!(matches!(err, Error::Rejected(_)));

        api.authenticate(&Identity::new("maria", "segredo1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transfer_moves_money_and_lists() {
        let server = MockBankServer::start(MockConfig {
            accounts: vec![
                ("kauazinho".to_string(), "123456".to_string(), "Kauã".to_string()),
                ("maria".to_string(), "654321".to_string(), "Maria".to_string()),
            ],
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);
        let token = token(&api).await;

        let transfer = TransferRequest::new("maria", Decimal::new(12550, 2), "Jantar", "Alimentação");
        api.send_transfer(&token, &transfer).await.unwrap();

        assert_eq!(server.balance_of("kauazinho"), Some(5000.0 - 125.5));
        assert_eq!(server.balance_of("maria"), Some(5000.0 + 125.5));

        let first = api
            .list_transactions(&token, &PageRequest::first(FeedFilter::Outgoing, ""))
            .await
            .unwrap();
        assert_eq!(first[0].description, "Jantar");
        assert_eq!(first[0].counterparty.alias, "maria");
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_alias_is_rejected() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = client(&server);
        let token = token(&api).await;

        let transfer = TransferRequest::new("ghost", Decimal::new(10, 0), "Oi", "Outros");
        let err = api.send_transfer(&token, &transfer).await.unwrap_err();
        match err {
            Error::Rejected(message) => assert!(message.contains("não encontrada")),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }
}
