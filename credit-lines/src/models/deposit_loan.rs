//! Deposits and loans

use super::{Currency, FeatureType, InformationShared};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositLoanType {
    Deposit,
    Loan,
}

impl DepositLoanType {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            DepositLoanType::Deposit => FeatureType::Deposit,
            DepositLoanType::Loan => FeatureType::Loan,
        }
    }

    /// Inverse of [`DepositLoanType::feature_type`]
    pub fn from_feature_type(feature_type: FeatureType) -> Option<Self> {
        match feature_type {
            FeatureType::Deposit => Some(DepositLoanType::Deposit),
            FeatureType::Loan => Some(DepositLoanType::Loan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositLoanPeriod {
    Days,
    Weeks,
    Months,
    Years,
}

/// Identity of a deposit/loan offer: kind, currency and tenor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLoanContext {
    #[serde(rename = "type")]
    pub kind: DepositLoanType,
    pub currency: Currency,
    pub period: DepositLoanPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_duration: Option<u32>,
}

impl fmt::Display for DepositLoanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period_duration {
            Some(duration) => write!(f, "{:?} {} {} {:?}", self.kind, self.currency, duration, self.period),
            None => write!(f, "{:?} {} {:?}", self.kind, self.currency, self.period),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLoan {
    pub static_id: String,
    #[serde(rename = "type")]
    pub kind: DepositLoanType,
    pub currency: Currency,
    pub period: DepositLoanPeriod,
    #[serde(default)]
    pub period_duration: Option<u32>,
    #[serde(default)]
    pub appetite: Option<bool>,
    #[serde(default)]
    pub pricing: Option<Decimal>,
}

impl DepositLoan {
    pub fn context(&self) -> DepositLoanContext {
        DepositLoanContext {
            kind: self.kind,
            currency: self.currency,
            period: self.period,
            period_duration: self.period_duration,
        }
    }
}

/// Pricing flag with optional override value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedPricing {
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Decimal>,
}

/// Sharing configuration of a deposit/loan towards one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDepositLoan {
    pub static_id: String,
    pub deposit_loan_static_id: String,
    pub shared_with_static_id: String,
    /// Master gate
    #[serde(default)]
    pub appetite: InformationShared,
    #[serde(default)]
    pub pricing: SharedPricing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositLoanDisclosure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appetite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Decimal>,
}

/// Deposit/loan as disclosed to this company by its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedDepositLoan {
    pub static_id: String,
    pub owner_static_id: String,
    pub context: DepositLoanContext,
    pub feature_type: FeatureType,
    pub data: DepositLoanDisclosure,
    pub updated_at: DateTime<Utc>,
}
