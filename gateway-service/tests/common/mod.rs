//! Shared setup for gateway integration tests: a test configuration, an
//! in-memory backend standing in for the four downstream services, and token
//! helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use gateway_service::{
    config::{
        DownstreamConfig, Environment, GatewayConfig, JwtConfig, PolicyConfig, SecurityConfig,
    },
    services::{
        Claims, CompanyDirectory, DebtLedger, Identity, PolicyEngine, PolicyError,
        ProductCatalog, RuleTable, TokenCodec, UserDirectory,
    },
    startup::build_router,
    AppState,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::Secret;
use service_core::grpc::proto::company::{Branch, BranchFilter, BranchList, Company};
use service_core::grpc::proto::debt::{
    Debt, DebtFilter, DebtIdRequest, DebtList, DebtRequest, PayDebtRequest, PayDebtResponse,
    Payment, PaymentFilter, PaymentList,
};
use service_core::grpc::proto::product::{Sale, SaleFilter, SaleIdRequest, SaleList, SaleRequest};
use service_core::grpc::proto::user::{
    Client, ClientFilter, ClientIdRequest, ClientList, ClientRequest, LogInRequest, UserIdentity,
};
use service_core::grpc::{CallContext, Code, Status};
use tower::util::ServiceExt;

pub const TEST_POLICY: &str = "
p, admin, /*, *
p, seller, /sales, *
p, seller, /sales/:id, GET
p, seller, /debts, GET
p, seller, /debts/:id, GET
p, seller, /debts/pay, POST
p, seller, /debts/payments, POST
p, seller, /clients, GET
p, seller, /companies, GET
";

pub const TENANT_A: &str = "company-a";
pub const TENANT_B: &str = "company-b";
pub const SELLER_ID: &str = "user-seller";

pub const LOGIN_PHONE: &str = "+998901112233";
pub const LOGIN_PASSWORD: &str = "correct-horse";
/// Logs in successfully but belongs to no company.
pub const UNBOUND_PHONE: &str = "+998900000000";

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "gateway-service-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        jwt: JwtConfig {
            access_secret: Secret::new("test-access-secret".to_string()),
            refresh_secret: Secret::new("test-refresh-secret".to_string()),
            access_token_expiry_hours: 1,
            refresh_token_expiry_hours: 24,
        },
        policy: PolicyConfig {
            file: "unused".to_string(),
        },
        downstream: DownstreamConfig {
            user_service_url: "http://user.invalid".to_string(),
            product_service_url: "http://product.invalid".to_string(),
            company_service_url: "http://company.invalid".to_string(),
            debt_service_url: "http://debt.invalid".to_string(),
            timeout_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

/// One downstream call as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    /// Tenant carried by the call context (sent as `company_id` metadata).
    pub context_tenant: String,
    /// `company_id` inside the request message, where the message has one.
    pub message_tenant: Option<String>,
}

/// In-memory stand-in for the user, product, company and debt services.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<&'static str, (Code, String)>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    debts: Mutex<HashMap<String, Debt>>,
    next_id: Mutex<u32>,
    blank_sale_client: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, method: &'static str, code: Code, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method, (code, message.to_string()));
    }

    pub fn delay(&self, method: &'static str, by: Duration) {
        self.delays.lock().unwrap().insert(method, by);
    }

    /// Product service stops echoing `client_id` on created sales.
    pub fn blank_sale_client_ids(&self) {
        *self.blank_sale_client.lock().unwrap() = true;
    }

    pub fn debts(&self) -> Vec<Debt> {
        self.debts.lock().unwrap().values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls().iter().any(|c| c.method == method)
    }

    async fn enter(
        &self,
        method: &'static str,
        ctx: &CallContext,
        message_tenant: Option<&str>,
    ) -> Result<(), Status> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            context_tenant: ctx.tenant_id.clone(),
            message_tenant: message_tenant.map(str::to_string),
        });

        let delay = self.delays.lock().unwrap().get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.failures.lock().unwrap().get(method) {
            Some((code, message)) => Err(Status::new(*code, message.clone())),
            None => Ok(()),
        }
    }

    fn id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", prefix, *next)
    }
}

#[async_trait]
impl UserDirectory for FakeBackend {
    async fn log_in(&self, ctx: &CallContext, req: LogInRequest) -> Result<UserIdentity, Status> {
        self.enter("log_in", ctx, None).await?;
        if req.password != LOGIN_PASSWORD {
            return Err(Status::not_found("user not found"));
        }
        let company_id = match req.phone_number.as_str() {
            LOGIN_PHONE => TENANT_A,
            UNBOUND_PHONE => "",
            _ => return Err(Status::not_found("user not found")),
        };
        Ok(UserIdentity {
            id: SELLER_ID.to_string(),
            first_name: "Aziz".to_string(),
            phone_number: req.phone_number,
            company_id: company_id.to_string(),
            role: "seller".to_string(),
        })
    }

    async fn create_client(
        &self,
        ctx: &CallContext,
        req: ClientRequest,
    ) -> Result<Client, Status> {
        self.enter("create_client", ctx, Some(&req.company_id)).await?;
        Ok(Client {
            id: self.id("client"),
            full_name: req.full_name,
            address: req.address,
            phone: req.phone,
            r#type: req.r#type,
            client_type: req.client_type,
            company_id: req.company_id,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        })
    }

    async fn get_client(&self, ctx: &CallContext, req: ClientIdRequest) -> Result<Client, Status> {
        self.enter("get_client", ctx, Some(&req.company_id)).await?;
        Ok(Client {
            id: req.id,
            company_id: req.company_id,
            ..Default::default()
        })
    }

    async fn list_clients(
        &self,
        ctx: &CallContext,
        req: ClientFilter,
    ) -> Result<ClientList, Status> {
        self.enter("list_clients", ctx, Some(&req.company_id)).await?;
        Ok(ClientList::default())
    }
}

#[async_trait]
impl ProductCatalog for FakeBackend {
    async fn create_sale(&self, ctx: &CallContext, req: SaleRequest) -> Result<Sale, Status> {
        self.enter("create_sale", ctx, Some(&req.company_id)).await?;
        let total = req
            .sold_products
            .iter()
            .map(|item| f64::from(item.quantity) * item.sale_price)
            .sum();
        let client_id = if *self.blank_sale_client.lock().unwrap() {
            String::new()
        } else {
            req.client_id
        };
        Ok(Sale {
            id: self.id("sale"),
            client_id,
            sold_by: req.sold_by,
            company_id: req.company_id,
            branch_id: req.branch_id,
            payment_method: req.payment_method,
            total_sale_price: total,
            sold_products: req.sold_products,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        })
    }

    async fn get_sale(&self, ctx: &CallContext, req: SaleIdRequest) -> Result<Sale, Status> {
        self.enter("get_sale", ctx, Some(&req.company_id)).await?;
        Ok(Sale {
            id: req.id,
            company_id: req.company_id,
            ..Default::default()
        })
    }

    async fn list_sales(&self, ctx: &CallContext, req: SaleFilter) -> Result<SaleList, Status> {
        self.enter("list_sales", ctx, Some(&req.company_id)).await?;
        Ok(SaleList::default())
    }
}

#[async_trait]
impl CompanyDirectory for FakeBackend {
    async fn get_company(&self, ctx: &CallContext) -> Result<Company, Status> {
        self.enter("get_company", ctx, None).await?;
        Ok(Company {
            id: ctx.tenant_id.clone(),
            name: "Test Company".to_string(),
            ..Default::default()
        })
    }

    async fn list_branches(
        &self,
        ctx: &CallContext,
        req: BranchFilter,
    ) -> Result<BranchList, Status> {
        self.enter("list_branches", ctx, Some(&req.company_id)).await?;
        Ok(BranchList {
            branches: vec![Branch {
                id: "branch-1".to_string(),
                company_id: req.company_id,
                ..Default::default()
            }],
            total_count: 1,
        })
    }
}

#[async_trait]
impl DebtLedger for FakeBackend {
    async fn create_debt(&self, ctx: &CallContext, req: DebtRequest) -> Result<Debt, Status> {
        self.enter("create_debt", ctx, Some(&req.company_id)).await?;
        let debt = Debt {
            id: self.id("debt"),
            client_id: req.client_id,
            total_amount: req.total_amount,
            amount_paid: 0.0,
            remaining_amount: req.total_amount,
            currency_code: req.currency_code,
            company_id: req.company_id,
            is_fully_paid: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        self.debts
            .lock()
            .unwrap()
            .insert(debt.id.clone(), debt.clone());
        Ok(debt)
    }

    async fn get_debt(&self, ctx: &CallContext, req: DebtIdRequest) -> Result<Debt, Status> {
        self.enter("get_debt", ctx, Some(&req.company_id)).await?;
        self.debts
            .lock()
            .unwrap()
            .get(&req.id)
            .cloned()
            .ok_or_else(|| Status::not_found("debt not found"))
    }

    async fn list_debts(&self, ctx: &CallContext, req: DebtFilter) -> Result<DebtList, Status> {
        self.enter("list_debts", ctx, Some(&req.company_id)).await?;
        let debts: Vec<Debt> = self.debts.lock().unwrap().values().cloned().collect();
        Ok(DebtList {
            total_count: debts.len() as i64,
            debts,
        })
    }

    async fn pay_debt(
        &self,
        ctx: &CallContext,
        req: PayDebtRequest,
    ) -> Result<PayDebtResponse, Status> {
        self.enter("pay_debt", ctx, Some(&req.company_id)).await?;
        let payment_id = self.id("payment");

        let mut debts = self.debts.lock().unwrap();
        let debt = debts
            .get_mut(&req.debt_id)
            .ok_or_else(|| Status::not_found("debt not found"))?;
        debt.amount_paid += req.paid_amount;
        debt.remaining_amount = debt.total_amount - debt.amount_paid;
        debt.is_fully_paid = debt.remaining_amount <= 0.0;

        Ok(PayDebtResponse {
            payment: Some(Payment {
                id: payment_id,
                debt_id: req.debt_id,
                paid_amount: req.paid_amount,
                pay_type: req.pay_type,
                payment_date: "2026-01-01T00:00:00Z".to_string(),
                company_id: req.company_id,
            }),
            debt: Some(debt.clone()),
        })
    }

    async fn list_payments(
        &self,
        ctx: &CallContext,
        req: PaymentFilter,
    ) -> Result<PaymentList, Status> {
        self.enter("list_payments", ctx, Some(&req.company_id)).await?;
        Ok(PaymentList::default())
    }
}

pub fn test_state(backend: Arc<FakeBackend>) -> AppState {
    let config = test_config();
    let tokens = TokenCodec::from_config(&config.jwt).unwrap();
    let policy = RuleTable::from_csv(TEST_POLICY).unwrap();

    AppState {
        config,
        tokens: Arc::new(tokens),
        policy: Arc::new(policy),
        users: backend.clone(),
        products: backend.clone(),
        companies: backend.clone(),
        debts: backend,
    }
}

pub fn test_app(backend: Arc<FakeBackend>) -> Router {
    build_router(test_state(backend))
}

/// Policy engine whose store cannot be reached.
pub struct FailingPolicy;

#[async_trait]
impl PolicyEngine for FailingPolicy {
    async fn authorize(&self, _role: &str, _path: &str, _method: &str) -> Result<bool, PolicyError> {
        Err(PolicyError::StoreUnavailable("connection refused".to_string()))
    }
}

pub fn identity(role: &str, tenant: &str) -> Identity {
    Identity {
        subject_id: SELLER_ID.to_string(),
        role: role.to_string(),
        tenant_id: tenant.to_string(),
        display_name: Some("Aziz".to_string()),
        contact: None,
    }
}

pub fn access_token(role: &str, tenant: &str) -> String {
    let config = test_config();
    TokenCodec::from_config(&config.jwt)
        .unwrap()
        .issue_access_token(&identity(role, tenant))
        .unwrap()
        .token
}

pub fn refresh_token(role: &str, tenant: &str) -> String {
    let config = test_config();
    TokenCodec::from_config(&config.jwt)
        .unwrap()
        .issue_refresh_token(&identity(role, tenant))
        .unwrap()
        .token
}

/// Access token signed with the real secret, bypassing the codec's checks on
/// the identity.
pub fn signed_access_token(subject_id: &str, role: &str, tenant: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        subject_id: subject_id.to_string(),
        role: role.to_string(),
        tenant_id: tenant.to_string(),
        display_name: None,
        contact: None,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test-access-secret"),
    )
    .unwrap()
}

/// Collects formatted log lines written while installed on this thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines_with(&self, message: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains(message))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
