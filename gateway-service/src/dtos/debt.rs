use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDebtRequest {
    #[validate(length(min = 1, message = "Client id is required"))]
    pub client_id: String,

    #[validate(range(exclusive_min = 0.0, message = "Total amount must be positive"))]
    pub total_amount: f64,

    #[validate(length(min = 1, message = "Currency code is required"))]
    pub currency_code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PayDebtBody {
    #[validate(length(min = 1, message = "Debt id is required"))]
    pub debt_id: String,

    #[validate(range(exclusive_min = 0.0, message = "Paid amount must be positive"))]
    pub paid_amount: f64,

    #[serde(default = "default_pay_type")]
    pub pay_type: String,
}

fn default_pay_type() -> String {
    "cash".to_string()
}
