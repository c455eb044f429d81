//! Calculations Domain
//!
//! This module provides the pricing-calculation workflow for car purchase and
//! leasing requests: staff open a calculation against a car request, attach
//! configuration items, record competing offers from leasing companies and
//! drive the calculation to completion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Workflow rules, status state machine
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_calculations::{
//!     repository::InMemoryCalculationRepository,
//!     service::CalculationService,
//! };
//!
//! // Create repository and service
//! let repository = InMemoryCalculationRepository::new();
//! let service = CalculationService::new(repository);
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{CalculationError, CalculationResult};
pub use models::{
    Calculation, CalculationItem, CalculationItemType, CalculationOffer, CalculationStatus,
    CreateCalculation, CreateCalculationItem, CreateOfferQuote, OfferStatus, StatusTransition,
    UpdateCalculation, UpdateOfferQuote,
};
pub use postgres::PgCalculationRepository;
pub use repository::{CalculationRepository, InMemoryCalculationRepository};
pub use service::CalculationService;
