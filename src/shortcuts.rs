//! Derived checks for the control panel's common management areas.
//!
//! Each shortcut is a plain query over the cached permissions, computed on
//! every call.

use crate::evaluator::Evaluator;

const MANAGE_CATALOG: [&str; 3] = ["create", "update", "delete"];
const MANAGE_ORDERS: [&str; 3] = ["update", "cancel", "refund"];

impl<S> Evaluator<S> {
    /// Any of create, update or delete on `product`.
    pub fn can_manage_products(&self) -> bool {
        self.check_any("product", &MANAGE_CATALOG)
    }

    /// Any of update, cancel or refund on `order`.
    pub fn can_manage_orders(&self) -> bool {
        self.check_any("order", &MANAGE_ORDERS)
    }

    /// Any of create, update or delete on `customer`.
    pub fn can_manage_customers(&self) -> bool {
        self.check_any("customer", &MANAGE_CATALOG)
    }

    /// `update` on `settings`.
    pub fn can_manage_settings(&self) -> bool {
        self.check("settings", "update")
    }

    /// Any of create, update or delete on `staff`.
    pub fn can_manage_staff(&self) -> bool {
        self.check_any("staff", &MANAGE_CATALOG)
    }

    /// `manage` on `access_control`.
    pub fn can_manage_access_control(&self) -> bool {
        self.check("access_control", "manage")
    }
}
