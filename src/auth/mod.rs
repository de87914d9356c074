//! Token issuance and request authorization.

pub mod policy;
pub mod token;

pub use policy::{Decision, RouteRule, authorize, classify};
pub use token::{Claims, Principal, TokenError, TokenProvider};
