pub mod downstream;
pub mod policy;
pub mod token;

pub use downstream::{CompanyDirectory, DebtLedger, ProductCatalog, UserDirectory};
pub use policy::{PolicyEngine, PolicyError, RuleTable};
pub use token::{Claims, Identity, IssuedToken, TokenCodec, TokenError, TokenKind};
