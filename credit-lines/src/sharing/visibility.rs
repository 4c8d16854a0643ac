//! Per-field visibility

use crate::models::{
    InformationShared, SharedFee, SharedMargin, SharedMaximumTenor, SharedPricing,
};

/// A `{shared, ...}` entry of a sharing configuration
pub trait ShareFlag {
    fn is_shared(&self) -> bool;
}

impl ShareFlag for InformationShared {
    fn is_shared(&self) -> bool {
        self.shared
    }
}

impl ShareFlag for SharedFee {
    fn is_shared(&self) -> bool {
        self.shared
    }
}

impl ShareFlag for SharedMaximumTenor {
    fn is_shared(&self) -> bool {
        self.shared
    }
}

impl ShareFlag for SharedMargin {
    fn is_shared(&self) -> bool {
        self.shared
    }
}

impl ShareFlag for SharedPricing {
    fn is_shared(&self) -> bool {
        self.shared
    }
}

/// `source` when the flag is present and shared, otherwise `None`.
///
/// `None` means "omit from the payload", never "send null".
pub fn resolve_field<F, T>(flag: Option<&F>, source: Option<T>) -> Option<T>
where
    F: ShareFlag + ?Sized,
{
    match flag {
        Some(flag) if flag.is_shared() => source,
        _ => None,
    }
}
