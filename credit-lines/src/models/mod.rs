//! Domain model
//!
//! Owner records, per-counterparty sharing options, the disclosures built
//! from them, and disclosure requests. Field names follow the wire format
//! (camelCase JSON).

pub mod credit_line;
pub mod deposit_loan;
pub mod request;

pub use credit_line::{
    CreditLine, CreditLineDisclosure, CreditLineSharingOptions, DisclosedCreditLine,
    ProductContext, SharedCreditLine, SharedFee, SharedMargin, SharedMaximumTenor,
};
pub use deposit_loan::{
    DepositLoan, DepositLoanContext, DepositLoanDisclosure, DepositLoanPeriod, DepositLoanType,
    DisclosedDepositLoan, SharedDepositLoan, SharedPricing,
};
pub use request::{CreditLineRequest, DepositLoanRequest, RequestStatus, RequestType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature a message belongs to; credit lines and deposits/loans share
/// message types and are told apart by this field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// Bank line (credit line offered by a bank)
    BankLine,
    /// Risk cover (receivables discounting)
    RiskCover,
    /// Deposit
    Deposit,
    /// Loan
    Loan,
}

impl FeatureType {
    /// Credit-line features
    pub const CREDIT_LINE: [FeatureType; 2] = [FeatureType::BankLine, FeatureType::RiskCover];

    /// Deposit/loan features
    pub const DEPOSIT_LOAN: [FeatureType; 2] = [FeatureType::Deposit, FeatureType::Loan];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::BankLine => "BankLine",
            FeatureType::RiskCover => "RiskCover",
            FeatureType::Deposit => "Deposit",
            FeatureType::Loan => "Loan",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// Swiss Franc
    CHF,
    /// Japanese Yen
    JPY,
    /// Singapore Dollar
    SGD,
    /// UAE Dirham
    AED,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
            Currency::JPY => "JPY",
            Currency::SGD => "SGD",
            Currency::AED => "AED",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Plain sharing flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationShared {
    /// Field may be disclosed
    pub shared: bool,
}

impl InformationShared {
    /// Flag set to shared
    pub const SHARED: InformationShared = InformationShared { shared: true };

    /// Flag set to not shared
    pub const HIDDEN: InformationShared = InformationShared { shared: false };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_type_wire_names() {
        assert_eq!(serde_json::to_value(FeatureType::RiskCover).unwrap(), json!("RiskCover"));
        let parsed: FeatureType = serde_json::from_value(json!("Deposit")).unwrap();
        assert_eq!(parsed, FeatureType::Deposit);
        assert!(serde_json::from_value::<FeatureType>(json!("Unknown")).is_err());
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(Currency::EUR.to_string(), "EUR");
        assert_eq!(serde_json::to_value(Currency::USD).unwrap(), json!("USD"));
    }
}
