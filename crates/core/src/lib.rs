//! Eduscope domain core.
//!
//! Everything here is independent of the database and the HTTP layer: the
//! scope resolver, guard, role router, aggregation folds and the dashboard
//! composer all receive their inputs explicitly. Data arrives through the
//! [`source::AnalyticsSource`] strategy trait.

pub mod aggregation;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod partial;
pub mod refresh;
pub mod retry;
pub mod roles;
pub mod router;
pub mod scope;
pub mod source;
pub mod types;
pub mod view;
