//! Company service gRPC client: the tenant's company profile and branches.

use std::time::Duration;

use tonic::Status;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::{CallContext, scoped_request};
use super::proto::company::company_service_client::CompanyServiceClient;
use super::proto::company::{BranchFilter, BranchList, Company, CompanyIdRequest};
use super::retry::{RetryConfig, retry_grpc_call};

#[derive(Clone, Debug)]
pub struct CompanyClientConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry_config: RetryConfig,
}

impl Default for CompanyClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50053".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct CompanyClient {
    client: CompanyServiceClient<Channel>,
    retry_config: RetryConfig,
}

impl CompanyClient {
    pub fn new(config: CompanyClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();

        Ok(Self {
            client: CompanyServiceClient::new(channel),
            retry_config: config.retry_config,
        })
    }

    pub fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(CompanyClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Fetch the caller's own company. There is no way to address another tenant.
    pub async fn get_company(&self, ctx: &CallContext) -> Result<Company, Status> {
        let client = self.client.clone();
        let request = CompanyIdRequest {
            company_id: ctx.tenant_id.clone(),
        };

        retry_grpc_call(&self.retry_config, "get_company", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.get_company(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn list_branches(
        &self,
        ctx: &CallContext,
        mut request: BranchFilter,
    ) -> Result<BranchList, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "list_branches", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.list_branches(req).await?.into_inner()) }
        })
        .await
    }
}
