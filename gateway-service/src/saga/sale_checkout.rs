//! Sale checkout: register a walk-in client, record the sale, open a debt for
//! the total and apply the first installment.

use std::sync::Arc;

use async_trait::async_trait;
use service_core::grpc::proto::debt::{Debt, DebtRequest, PayDebtRequest, Payment};
use service_core::grpc::proto::product::{Sale, SaleRequest, SalesItem};
use service_core::grpc::proto::user::{Client, ClientRequest};
use service_core::grpc::CallContext;

use super::{Saga, SagaReport, SagaStep, StepError, StepOutcome};
use crate::dtos::checkout::{CheckoutRequest, CheckoutResponse, PaymentMethod, SaleCreateRequest};
use crate::services::{DebtLedger, ProductCatalog, UserDirectory};

pub const REGISTER_CLIENT: &str = "register_client";
pub const CREATE_SALE: &str = "create_sale";
pub const OPEN_DEBT: &str = "open_debt";
pub const APPLY_PAYMENT: &str = "apply_payment";

const WALK_IN_CLIENT_TYPE: &str = "street";
const WALK_IN_ADDRESS: &str = "no address";
const INSTALLMENT_PAY_TYPE: &str = "cash";

/// Inputs and accumulated outputs of one checkout.
#[derive(Debug)]
pub struct CheckoutState {
    pub call: CallContext,
    pub seller_id: String,
    pub branch_id: String,
    pub request: CheckoutRequest,
    pub client: Option<Client>,
    pub sale: Option<Sale>,
    pub debt: Option<Debt>,
    pub payment: Option<Payment>,
}

impl CheckoutState {
    pub fn new(
        call: CallContext,
        seller_id: impl Into<String>,
        branch_id: impl Into<String>,
        request: CheckoutRequest,
    ) -> Self {
        Self {
            call,
            seller_id: seller_id.into(),
            branch_id: branch_id.into(),
            request,
            client: None,
            sale: None,
            debt: None,
            payment: None,
        }
    }

    /// Client the sale is recorded against: the given one, else the walk-in just created.
    /// Span carrying the caller, so every step log names who it ran for.
    pub fn span(&self, saga: &'static str) -> tracing::Span {
        tracing::info_span!(
            "saga",
            saga,
            subject_id = %self.seller_id,
            tenant_id = %self.call.tenant_id,
        )
    }

    pub fn client_id(&self) -> Option<&str> {
        non_blank(self.request.client_id.as_deref())
            .or_else(|| self.client.as_ref().map(|c| c.id.as_str()))
    }

    pub fn into_response(self, report: SagaReport) -> CheckoutResponse {
        CheckoutResponse {
            status: report.status(),
            steps: report.steps,
            client: self.client,
            sale: self.sale,
            debt: self.debt,
            payment: self.payment,
        }
    }
}

impl From<SaleCreateRequest> for CheckoutRequest {
    fn from(req: SaleCreateRequest) -> Self {
        Self {
            client_id: req.client_id,
            client_name: req.client_name,
            client_phone: req.client_phone,
            branch_id: req.branch_id,
            payment_method: req.payment_method,
            is_fully_debt: false,
            currency_code: String::new(),
            paid_amount: 0.0,
            sold_products: req.sold_products,
        }
    }
}

/// True when the request names a client or gives enough to create one.
pub fn identifies_client(client_id: Option<&str>, client_name: Option<&str>) -> bool {
    non_blank(client_id).is_some() || non_blank(client_name).is_some()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct RegisterClient {
    users: Arc<dyn UserDirectory>,
}

#[async_trait]
impl SagaStep<CheckoutState> for RegisterClient {
    fn name(&self) -> &'static str {
        REGISTER_CLIENT
    }

    async fn execute(&self, state: &mut CheckoutState) -> Result<StepOutcome, StepError> {
        if non_blank(state.request.client_id.as_deref()).is_some() {
            return Ok(StepOutcome::Skipped);
        }

        let Some(full_name) = non_blank(state.request.client_name.as_deref()) else {
            return Err(StepError::new(
                "invalid_argument",
                "client_id or client_name is required",
            ));
        };

        let request = ClientRequest {
            full_name: full_name.to_string(),
            address: WALK_IN_ADDRESS.to_string(),
            phone: state.request.client_phone.clone().unwrap_or_default(),
            r#type: "client".to_string(),
            client_type: WALK_IN_CLIENT_TYPE.to_string(),
            company_id: state.call.tenant_id.clone(),
        };

        let client = self.users.create_client(&state.call, request).await?;
        let id = client.id.clone();
        state.client = Some(client);
        Ok(StepOutcome::Done(id))
    }
}

pub struct CreateSale {
    products: Arc<dyn ProductCatalog>,
}

#[async_trait]
impl SagaStep<CheckoutState> for CreateSale {
    fn name(&self) -> &'static str {
        CREATE_SALE
    }

    async fn execute(&self, state: &mut CheckoutState) -> Result<StepOutcome, StepError> {
        let client_id = state.client_id().unwrap_or_default().to_string();

        let request = SaleRequest {
            client_id,
            sold_by: state.seller_id.clone(),
            company_id: state.call.tenant_id.clone(),
            branch_id: state.branch_id.clone(),
            payment_method: state.request.payment_method.as_str().to_string(),
            sold_products: state
                .request
                .sold_products
                .iter()
                .map(|item| SalesItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    sale_price: item.sale_price,
                    total_price: 0.0,
                })
                .collect(),
        };

        let sale = self.products.create_sale(&state.call, request).await?;
        let id = sale.id.clone();
        state.sale = Some(sale);
        Ok(StepOutcome::Done(id))
    }
}

pub struct OpenDebt {
    debts: Arc<dyn DebtLedger>,
}

#[async_trait]
impl SagaStep<CheckoutState> for OpenDebt {
    fn name(&self) -> &'static str {
        OPEN_DEBT
    }

    async fn execute(&self, state: &mut CheckoutState) -> Result<StepOutcome, StepError> {
        if state.request.payment_method != PaymentMethod::Debt {
            return Ok(StepOutcome::Skipped);
        }

        let Some(sale) = state.sale.as_ref() else {
            return Err(StepError::new("failed_precondition", "no sale to open a debt for"));
        };
        let Some(client_id) = state.client_id() else {
            return Err(StepError::new("failed_precondition", "no client to open a debt for"));
        };

        let request = DebtRequest {
            client_id: client_id.to_string(),
            total_amount: sale.total_sale_price,
            currency_code: state.request.currency_code.clone(),
            company_id: state.call.tenant_id.clone(),
        };

        let debt = self.debts.create_debt(&state.call, request).await?;
        let id = debt.id.clone();
        state.debt = Some(debt);
        Ok(StepOutcome::Done(id))
    }
}

pub struct ApplyPayment {
    debts: Arc<dyn DebtLedger>,
}

#[async_trait]
impl SagaStep<CheckoutState> for ApplyPayment {
    fn name(&self) -> &'static str {
        APPLY_PAYMENT
    }

    async fn execute(&self, state: &mut CheckoutState) -> Result<StepOutcome, StepError> {
        let Some(debt) = state.debt.as_ref() else {
            return Ok(StepOutcome::Skipped);
        };
        if state.request.is_fully_debt || state.request.paid_amount <= 0.0 {
            return Ok(StepOutcome::Skipped);
        }

        let request = PayDebtRequest {
            debt_id: debt.id.clone(),
            paid_amount: state.request.paid_amount,
            company_id: state.call.tenant_id.clone(),
            pay_type: INSTALLMENT_PAY_TYPE.to_string(),
        };

        let response = self.debts.pay_debt(&state.call, request).await?;
        let Some(payment) = response.payment else {
            return Err(StepError::new("internal", "debt service returned no payment"));
        };

        if let Some(updated) = response.debt {
            state.debt = Some(updated);
        }
        let id = payment.id.clone();
        state.payment = Some(payment);
        Ok(StepOutcome::Done(id))
    }
}

/// Full checkout: client, sale, debt, first installment.
pub fn checkout_saga(
    users: Arc<dyn UserDirectory>,
    products: Arc<dyn ProductCatalog>,
    debts: Arc<dyn DebtLedger>,
) -> Saga<CheckoutState> {
    Saga::new("sale_checkout")
        .step(RegisterClient { users })
        .step(CreateSale { products })
        .step(OpenDebt {
            debts: debts.clone(),
        })
        .step(ApplyPayment { debts })
}

/// Plain sale: client and sale only.
pub fn sale_saga(users: Arc<dyn UserDirectory>, products: Arc<dyn ProductCatalog>) -> Saga<CheckoutState> {
    Saga::new("create_sale")
        .step(RegisterClient { users })
        .step(CreateSale { products })
}
