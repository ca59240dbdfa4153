//! Product service gRPC client: sales.

use std::time::Duration;

use tonic::Status;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::{CallContext, scoped_request};
use super::proto::product::product_service_client::ProductServiceClient;
use super::proto::product::{Sale, SaleFilter, SaleIdRequest, SaleList, SaleRequest};
use super::retry::{RetryConfig, retry_grpc_call};

/// Configuration for the product service client.
#[derive(Clone, Debug)]
pub struct ProductClientConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry_config: RetryConfig,
}

impl Default for ProductClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50052".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct ProductClient {
    client: ProductServiceClient<Channel>,
    retry_config: RetryConfig,
}

impl ProductClient {
    pub fn new(config: ProductClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();

        Ok(Self {
            client: ProductServiceClient::new(channel),
            retry_config: config.retry_config,
        })
    }

    pub fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(ProductClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Record a sale. The service computes `total_sale_price` from catalog prices.
    pub async fn create_sale(
        &self,
        ctx: &CallContext,
        mut request: SaleRequest,
    ) -> Result<Sale, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&RetryConfig::no_retry(), "create_sale", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.create_sale(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn get_sale(
        &self,
        ctx: &CallContext,
        mut request: SaleIdRequest,
    ) -> Result<Sale, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "get_sale", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.get_sale(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn list_sales(
        &self,
        ctx: &CallContext,
        mut request: SaleFilter,
    ) -> Result<SaleList, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "list_sales", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.list_sales(req).await?.into_inner()) }
        })
        .await
    }
}
