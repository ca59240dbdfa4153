//! Debt service gRPC client: debts and the payments made against them.

use std::time::Duration;

use tonic::Status;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::{CallContext, scoped_request};
use super::proto::debt::debt_service_client::DebtServiceClient;
use super::proto::debt::{
    Debt, DebtFilter, DebtIdRequest, DebtList, DebtRequest, PayDebtRequest, PayDebtResponse,
    PaymentFilter, PaymentList,
};
use super::retry::{RetryConfig, retry_grpc_call};

#[derive(Clone, Debug)]
pub struct DebtClientConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry_config: RetryConfig,
}

impl Default for DebtClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50054".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// Debt service client with retry support for reads.
#[derive(Clone)]
pub struct DebtClient {
    client: DebtServiceClient<Channel>,
    retry_config: RetryConfig,
}

impl DebtClient {
    pub fn new(config: DebtClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();

        Ok(Self {
            client: DebtServiceClient::new(channel),
            retry_config: config.retry_config,
        })
    }

    pub fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(DebtClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    pub async fn create_debt(
        &self,
        ctx: &CallContext,
        mut request: DebtRequest,
    ) -> Result<Debt, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&RetryConfig::no_retry(), "create_debt", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.create_debt(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn get_debt(
        &self,
        ctx: &CallContext,
        mut request: DebtIdRequest,
    ) -> Result<Debt, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "get_debt", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.get_debt(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn list_debts(
        &self,
        ctx: &CallContext,
        mut request: DebtFilter,
    ) -> Result<DebtList, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "list_debts", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.list_debts(req).await?.into_inner()) }
        })
        .await
    }

    /// Pay against a debt. Returns the payment and the debt's updated balance.
    pub async fn pay_debt(
        &self,
        ctx: &CallContext,
        mut request: PayDebtRequest,
    ) -> Result<PayDebtResponse, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&RetryConfig::no_retry(), "pay_debt", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.pay_debt(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn list_payments(
        &self,
        ctx: &CallContext,
        mut request: PaymentFilter,
    ) -> Result<PaymentList, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "list_payments", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.list_payments(req).await?.into_inner()) }
        })
        .await
    }
}
