//! Seams between handlers and the downstream gRPC services.
//!
//! Handlers and the checkout saga depend on these traits rather than on the
//! tonic clients directly, so tests can swap in in-memory services.

use async_trait::async_trait;
use service_core::grpc::proto::company::{BranchFilter, BranchList, Company};
use service_core::grpc::proto::debt::{
    Debt, DebtFilter, DebtIdRequest, DebtList, DebtRequest, PayDebtRequest, PayDebtResponse,
    PaymentFilter, PaymentList,
};
use service_core::grpc::proto::product::{Sale, SaleFilter, SaleIdRequest, SaleList, SaleRequest};
use service_core::grpc::proto::user::{
    Client, ClientFilter, ClientIdRequest, ClientList, ClientRequest, LogInRequest, UserIdentity,
};
use service_core::grpc::{
    CallContext, CompanyClient, DebtClient, ProductClient, Status, UserClient,
};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn log_in(&self, ctx: &CallContext, req: LogInRequest) -> Result<UserIdentity, Status>;
    async fn create_client(&self, ctx: &CallContext, req: ClientRequest)
        -> Result<Client, Status>;
    async fn get_client(&self, ctx: &CallContext, req: ClientIdRequest) -> Result<Client, Status>;
    async fn list_clients(&self, ctx: &CallContext, req: ClientFilter)
        -> Result<ClientList, Status>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn create_sale(&self, ctx: &CallContext, req: SaleRequest) -> Result<Sale, Status>;
    async fn get_sale(&self, ctx: &CallContext, req: SaleIdRequest) -> Result<Sale, Status>;
    async fn list_sales(&self, ctx: &CallContext, req: SaleFilter) -> Result<SaleList, Status>;
}

#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn get_company(&self, ctx: &CallContext) -> Result<Company, Status>;
    async fn list_branches(&self, ctx: &CallContext, req: BranchFilter)
        -> Result<BranchList, Status>;
}

#[async_trait]
pub trait DebtLedger: Send + Sync {
    async fn create_debt(&self, ctx: &CallContext, req: DebtRequest) -> Result<Debt, Status>;
    async fn get_debt(&self, ctx: &CallContext, req: DebtIdRequest) -> Result<Debt, Status>;
    async fn list_debts(&self, ctx: &CallContext, req: DebtFilter) -> Result<DebtList, Status>;
    async fn pay_debt(
        &self,
        ctx: &CallContext,
        req: PayDebtRequest,
    ) -> Result<PayDebtResponse, Status>;
    async fn list_payments(
        &self,
        ctx: &CallContext,
        req: PaymentFilter,
    ) -> Result<PaymentList, Status>;
}

#[async_trait]
impl UserDirectory for UserClient {
    async fn log_in(&self, ctx: &CallContext, req: LogInRequest) -> Result<UserIdentity, Status> {
        UserClient::log_in(self, ctx, req).await
    }

    async fn create_client(
        &self,
        ctx: &CallContext,
        req: ClientRequest,
    ) -> Result<Client, Status> {
        UserClient::create_client(self, ctx, req).await
    }

    async fn get_client(&self, ctx: &CallContext, req: ClientIdRequest) -> Result<Client, Status> {
        UserClient::get_client(self, ctx, req).await
    }

    async fn list_clients(
        &self,
        ctx: &CallContext,
        req: ClientFilter,
    ) -> Result<ClientList, Status> {
        UserClient::list_clients(self, ctx, req).await
    }
}

#[async_trait]
impl ProductCatalog for ProductClient {
    async fn create_sale(&self, ctx: &CallContext, req: SaleRequest) -> Result<Sale, Status> {
        ProductClient::create_sale(self, ctx, req).await
    }

    async fn get_sale(&self, ctx: &CallContext, req: SaleIdRequest) -> Result<Sale, Status> {
        ProductClient::get_sale(self, ctx, req).await
    }

    async fn list_sales(&self, ctx: &CallContext, req: SaleFilter) -> Result<SaleList, Status> {
        ProductClient::list_sales(self, ctx, req).await
    }
}

#[async_trait]
impl CompanyDirectory for CompanyClient {
    async fn get_company(&self, ctx: &CallContext) -> Result<Company, Status> {
        CompanyClient::get_company(self, ctx).await
    }

    async fn list_branches(
        &self,
        ctx: &CallContext,
        req: BranchFilter,
    ) -> Result<BranchList, Status> {
        CompanyClient::list_branches(self, ctx, req).await
    }
}

#[async_trait]
impl DebtLedger for DebtClient {
    async fn create_debt(&self, ctx: &CallContext, req: DebtRequest) -> Result<Debt, Status> {
        DebtClient::create_debt(self, ctx, req).await
    }

    async fn get_debt(&self, ctx: &CallContext, req: DebtIdRequest) -> Result<Debt, Status> {
        DebtClient::get_debt(self, ctx, req).await
    }

    async fn list_debts(&self, ctx: &CallContext, req: DebtFilter) -> Result<DebtList, Status> {
        DebtClient::list_debts(self, ctx, req).await
    }

    async fn pay_debt(
        &self,
        ctx: &CallContext,
        req: PayDebtRequest,
    ) -> Result<PayDebtResponse, Status> {
        DebtClient::pay_debt(self, ctx, req).await
    }

    async fn list_payments(
        &self,
        ctx: &CallContext,
        req: PaymentFilter,
    ) -> Result<PaymentList, Status> {
        DebtClient::list_payments(self, ctx, req).await
    }
}
