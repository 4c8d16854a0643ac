//! Credit lines

use super::{Currency, FeatureType, InformationShared};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product the credit line is offered for
pub const TRADE_FINANCE_PRODUCT: &str = "tradeFinance";

/// Receivables discounting sub-product (risk cover)
pub const RISK_COVER_SUB_PRODUCT: &str = "rd";

/// Bank line sub-product
pub const BANK_LINE_SUB_PRODUCT: &str = "mbl";

/// Product classification of a credit line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    pub product_id: String,
    pub sub_product_id: String,
}

impl ProductContext {
    pub fn new(product_id: impl Into<String>, sub_product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            sub_product_id: sub_product_id.into(),
        }
    }

    /// Trade finance bank line
    pub fn bank_line() -> Self {
        Self::new(TRADE_FINANCE_PRODUCT, BANK_LINE_SUB_PRODUCT)
    }

    /// Trade finance risk cover
    pub fn risk_cover() -> Self {
        Self::new(TRADE_FINANCE_PRODUCT, RISK_COVER_SUB_PRODUCT)
    }

    /// Receivables discounting is risk cover, everything else a bank line
    pub fn feature_type(&self) -> FeatureType {
        if self.sub_product_id == RISK_COVER_SUB_PRODUCT {
            FeatureType::RiskCover
        } else {
            FeatureType::BankLine
        }
    }
}

/// Credit line held by the owning company against one counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLine {
    pub static_id: String,
    pub counterparty_static_id: String,
    pub context: ProductContext,
    #[serde(default)]
    pub appetite: Option<bool>,
    pub currency: Currency,
    #[serde(default)]
    pub availability: Option<bool>,
    #[serde(default)]
    pub availability_amount: Option<Decimal>,
    #[serde(default)]
    pub credit_limit: Option<Decimal>,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub maximum_tenor: Option<u32>,
    #[serde(default)]
    pub margin: Option<Decimal>,
}

/// Fee flag with optional override value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFee {
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
}

/// Maximum tenor flag with optional override value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedMaximumTenor {
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_tenor: Option<u32>,
}

/// Margin flag with optional override value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedMargin {
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Decimal>,
}

/// Per-field sharing flags of a credit line towards one company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditLineSharingOptions {
    /// Master gate
    pub appetite: InformationShared,
    pub availability: InformationShared,
    pub availability_amount: InformationShared,
    pub credit_limit: InformationShared,
    pub fee: SharedFee,
    pub maximum_tenor: SharedMaximumTenor,
    pub margin: SharedMargin,
}

/// Sharing configuration of a credit line towards one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCreditLine {
    pub static_id: String,
    pub credit_line_static_id: String,
    pub counterparty_static_id: String,
    pub shared_with_static_id: String,
    pub data: CreditLineSharingOptions,
}

/// Disclosed subset of a credit line; absent means not disclosed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLineDisclosure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appetite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_tenor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Decimal>,
}

/// Credit line as disclosed to this company by its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedCreditLine {
    pub static_id: String,
    pub owner_static_id: String,
    pub counterparty_static_id: String,
    pub context: ProductContext,
    pub feature_type: FeatureType,
    pub data: CreditLineDisclosure,
    pub updated_at: DateTime<Utc>,
}
