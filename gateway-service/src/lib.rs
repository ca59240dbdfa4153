pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod saga;
pub mod services;
pub mod startup;
pub mod utils;

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::services::{
    CompanyDirectory, DebtLedger, PolicyEngine, ProductCatalog, TokenCodec, UserDirectory,
};

/// Shared application state. Everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub tokens: Arc<TokenCodec>,
    pub policy: Arc<dyn PolicyEngine>,
    pub users: Arc<dyn UserDirectory>,
    pub products: Arc<dyn ProductCatalog>,
    pub companies: Arc<dyn CompanyDirectory>,
    pub debts: Arc<dyn DebtLedger>,
}
