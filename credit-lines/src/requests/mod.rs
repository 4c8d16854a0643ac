//! Disclosure request workflows
//!
//! Each service stores requests through its data agent, sends request and
//! decline messages, and answers the diff engine's pending-request lookups.

pub mod credit_line;
pub mod deposit_loan;

pub use credit_line::CreditLineRequestService;
pub use deposit_loan::DepositLoanRequestService;
