//! User service gRPC client: login and the client directory.

use std::time::Duration;

use tonic::Status;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::{CallContext, scoped_request};
use super::proto::user::user_service_client::UserServiceClient;
use super::proto::user::{
    Client, ClientFilter, ClientIdRequest, ClientList, ClientRequest, LogInRequest, UserIdentity,
};
use super::retry::{RetryConfig, retry_grpc_call};

/// Configuration for the user service client.
#[derive(Clone, Debug)]
pub struct UserClientConfig {
    /// The gRPC endpoint of the user service.
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Upper bound per call when the caller sets no deadline.
    pub request_timeout: Duration,
    /// Retry configuration for reads.
    pub retry_config: RetryConfig,
}

impl Default for UserClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// User service client with retry support.
#[derive(Clone)]
pub struct UserClient {
    client: UserServiceClient<Channel>,
    retry_config: RetryConfig,
}

impl UserClient {
    /// Build a client. The channel connects lazily on first use.
    pub fn new(config: UserClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();

        Ok(Self {
            client: UserServiceClient::new(channel),
            retry_config: config.retry_config,
        })
    }

    pub fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(UserClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Exchange phone number and password for the caller's identity.
    pub async fn log_in(
        &self,
        ctx: &CallContext,
        request: LogInRequest,
    ) -> Result<UserIdentity, Status> {
        let client = self.client.clone();

        retry_grpc_call(&RetryConfig::no_retry(), "log_in", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.log_in(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn create_client(
        &self,
        ctx: &CallContext,
        mut request: ClientRequest,
    ) -> Result<Client, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&RetryConfig::no_retry(), "create_client", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.create_client(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn get_client(
        &self,
        ctx: &CallContext,
        mut request: ClientIdRequest,
    ) -> Result<Client, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "get_client", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.get_client(req).await?.into_inner()) }
        })
        .await
    }

    pub async fn list_clients(
        &self,
        ctx: &CallContext,
        mut request: ClientFilter,
    ) -> Result<ClientList, Status> {
        let client = self.client.clone();
        request.company_id = ctx.tenant_id.clone();

        retry_grpc_call(&self.retry_config, "list_clients", ctx.deadline, || {
            let mut c = client.clone();
            let req = scoped_request(ctx, request.clone());
            async move { Ok(c.list_clients(req).await?.into_inner()) }
        })
        .await
    }
}
