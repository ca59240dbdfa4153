use serde::{Deserialize, Serialize};
use service_core::grpc::proto::debt::{Debt, Payment};
use service_core::grpc::proto::product::Sale;
use service_core::grpc::proto::user::Client;
use validator::{Validate, ValidationError};

use crate::saga::{SagaStatus, StepReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Debt,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Debt => "debt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SoldProduct {
    #[validate(length(min = 1, message = "Product id is required"))]
    pub product_id: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Sale price must not be negative"))]
    pub sale_price: f64,
}

/// A sale, optionally recorded as a debt with a first installment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_debt_terms"))]
pub struct CheckoutRequest {
    /// Existing client. When absent, a walk-in client is created from `client_name`.
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default)]
    pub client_phone: Option<String>,

    /// Falls back to the `branch_id` header.
    #[serde(default)]
    pub branch_id: Option<String>,

    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub is_fully_debt: bool,

    /// Required when `payment_method` is `debt`.
    #[serde(default)]
    pub currency_code: String,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Paid amount must not be negative"))]
    pub paid_amount: f64,

    #[validate(length(min = 1, message = "At least one product is required"), nested)]
    pub sold_products: Vec<SoldProduct>,
}

fn validate_debt_terms(req: &CheckoutRequest) -> Result<(), ValidationError> {
    if req.payment_method == PaymentMethod::Debt && req.currency_code.trim().is_empty() {
        let mut err = ValidationError::new("currency_code");
        err.message = Some("Currency code is required for debt sales".into());
        return Err(err);
    }
    Ok(())
}

/// A plain sale without the debt steps.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaleCreateRequest {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default)]
    pub client_phone: Option<String>,

    #[serde(default)]
    pub branch_id: Option<String>,

    pub payment_method: PaymentMethod,

    #[validate(length(min = 1, message = "At least one product is required"), nested)]
    pub sold_products: Vec<SoldProduct>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: SagaStatus,
    pub steps: Vec<StepReport>,
    pub client: Option<Client>,
    pub sale: Option<Sale>,
    pub debt: Option<Debt>,
    pub payment: Option<Payment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_requires_products() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "client_id": "c1",
            "payment_method": "debt",
            "currency_code": "UZS",
            "sold_products": []
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn nested_products_are_validated() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "client_id": "c1",
            "payment_method": "cash",
            "currency_code": "UZS",
            "sold_products": [{"product_id": "p1", "quantity": 0}]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn debt_sale_requires_currency() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "client_id": "c1",
            "payment_method": "debt",
            "sold_products": [{"product_id": "p1", "quantity": 1}]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn cash_sale_needs_no_currency() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "client_id": "c1",
            "payment_method": "cash",
            "sold_products": [{"product_id": "p1", "quantity": 1}]
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_payment_method_fails_to_parse() {
        let result = serde_json::from_value::<CheckoutRequest>(serde_json::json!({
            "payment_method": "barter",
            "currency_code": "UZS",
            "sold_products": [{"product_id": "p1", "quantity": 1}]
        }));
        assert!(result.is_err());
    }
}
