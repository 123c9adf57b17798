//! # Arbitrage Scanner Common Crate
//!
//! Shared data model, error definitions, validators, and service traits
//! used across the scanner workspace.

/// Module for boundary error types.
pub mod errors;

/// Module for shared service traits.
pub mod traits;

/// Module for the quote/opportunity data model.
pub mod types;

/// Module for input validation helpers.
pub mod validators;

// Re-export key items for easier access.
pub use errors::MarketError;
pub use traits::IsOpportunitySink;
pub use types::{Grade, Opportunity, OpportunityKind, P2pQuote, Quote, Symbol, Validate};
