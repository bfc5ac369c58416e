// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod budget;
pub mod category;
pub mod investment;
pub mod loan;
pub mod notification;
pub mod site_content;
pub mod transaction;
pub mod user;

pub use budget::{Budget, BudgetView};
pub use category::{category_collection, Category};
pub use investment::{Investment, InvestmentTransaction, InvestmentTransactionType, InvestmentType};
pub use loan::{InterestRateType, Loan, LoanPayment, LoanStatus, LoanView};
pub use notification::{Notification, NotificationType};
pub use site_content::{ContentStatus, SiteContent, SiteContentType};
pub use transaction::{CategoryTotal, Location, Transaction, TransactionKind};
pub use user::{Language, NotificationSettings, Role, User, UserProfile};
