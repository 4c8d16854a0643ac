//! Selective disclosure
//!
//! [`engine`] holds the flavor-independent diff; [`credit_line`] and
//! [`deposit_loan`] supply the flavor values.

pub mod credit_line;
pub mod deposit_loan;
pub mod engine;
pub mod visibility;

pub use credit_line::{
    build_credit_line_disclosure, credit_line_flavor, CreditLineRequestKey, ShareCreditLineService,
};
pub use deposit_loan::{
    build_deposit_loan_disclosure, deposit_loan_flavor, DepositLoanRequestKey,
    ShareDepositLoanService,
};
pub use engine::{
    diff, Diff, EnvelopeHeader, PendingRequestCorrelator, ShareDataService, ShareDecision,
    ShareFlavor,
};
pub use visibility::{resolve_field, ShareFlag};
