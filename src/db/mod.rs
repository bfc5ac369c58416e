//! Database layer (Firestore, with an in-memory fallback).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const INCOMES: &str = "incomes";
    pub const EXPENSES: &str = "expenses";
    pub const LOANS: &str = "loans";
    pub const LOAN_PAYMENTS: &str = "loan_payments";
    pub const INVESTMENTS: &str = "investments";
    pub const BUDGETS: &str = "budgets";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const EXPENSE_CATEGORIES: &str = "expense_categories";
    pub const INCOME_CATEGORIES: &str = "income_categories";
    /// Site content documents (keyed by content type)
    pub const SITE_CONTENT: &str = "site_content";
}
