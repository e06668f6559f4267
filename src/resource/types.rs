//! Resource, operation and sort tags
//!
//! Closed sets of tags understood by the engine. Parsing an unrecognized
//! tag fails at construction time instead of silently doing nothing.

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accounting entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Contact,
    Article,
    Voucher,
    Invoice,
    DownPaymentInvoice,
    Quotation,
    CreditNote,
    OrderConfirmation,
    DeliveryNote,
    Dunning,
    File,
    Profile,
    Country,
    PaymentCondition,
    Payment,
    PostingCategory,
    PrintLayout,
    EventSubscription,
    RecurringTemplate,
    Voucherlist,
    Trigger,
}

impl ResourceType {
    pub const ALL: [ResourceType; 21] = [
        ResourceType::Contact,
        ResourceType::Article,
        ResourceType::Voucher,
        ResourceType::Invoice,
        ResourceType::DownPaymentInvoice,
        ResourceType::Quotation,
        ResourceType::CreditNote,
        ResourceType::OrderConfirmation,
        ResourceType::DeliveryNote,
        ResourceType::Dunning,
        ResourceType::File,
        ResourceType::Profile,
        ResourceType::Country,
        ResourceType::PaymentCondition,
        ResourceType::Payment,
        ResourceType::PostingCategory,
        ResourceType::PrintLayout,
        ResourceType::EventSubscription,
        ResourceType::RecurringTemplate,
        ResourceType::Voucherlist,
        ResourceType::Trigger,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Contact => "contact",
            ResourceType::Article => "article",
            ResourceType::Voucher => "voucher",
            ResourceType::Invoice => "invoice",
            ResourceType::DownPaymentInvoice => "down-payment-invoice",
            ResourceType::Quotation => "quotation",
            ResourceType::CreditNote => "credit-note",
            ResourceType::OrderConfirmation => "order-confirmation",
            ResourceType::DeliveryNote => "delivery-note",
            ResourceType::Dunning => "dunning",
            ResourceType::File => "file",
            ResourceType::Profile => "profile",
            ResourceType::Country => "country",
            ResourceType::PaymentCondition => "payment-condition",
            ResourceType::Payment => "payment",
            ResourceType::PostingCategory => "posting-category",
            ResourceType::PrintLayout => "print-layout",
            ResourceType::EventSubscription => "event-subscription",
            ResourceType::RecurringTemplate => "recurring-template",
            ResourceType::Voucherlist => "voucherlist",
            ResourceType::Trigger => "trigger",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownTag {
                kind: "resource",
                value: s.to_string(),
            })
    }
}

/// Action requested against a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Create,
    Get,
    GetAll,
    Update,
    Finalize,
    Document,
    DownloadFile,
    Trigger,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Create,
        Operation::Get,
        Operation::GetAll,
        Operation::Update,
        Operation::Finalize,
        Operation::Document,
        Operation::DownloadFile,
        Operation::Trigger,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::GetAll => "get-all",
            Operation::Update => "update",
            Operation::Finalize => "finalize",
            Operation::Document => "document",
            Operation::DownloadFile => "download-file",
            Operation::Trigger => "trigger",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownTag {
                kind: "operation",
                value: s.to_string(),
            })
    }
}

/// Sort order for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
    UpdatedAtAsc,
    UpdatedAtDesc,
    VoucherDateAsc,
    VoucherDateDesc,
    VoucherNumberAsc,
    VoucherNumberDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 8] = [
        SortOption::CreatedAtAsc,
        SortOption::CreatedAtDesc,
        SortOption::UpdatedAtAsc,
        SortOption::UpdatedAtDesc,
        SortOption::VoucherDateAsc,
        SortOption::VoucherDateDesc,
        SortOption::VoucherNumberAsc,
        SortOption::VoucherNumberDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::CreatedAtAsc => "createdAtAsc",
            SortOption::CreatedAtDesc => "createdAtDesc",
            SortOption::UpdatedAtAsc => "updatedAtAsc",
            SortOption::UpdatedAtDesc => "updatedAtDesc",
            SortOption::VoucherDateAsc => "voucherDateAsc",
            SortOption::VoucherDateDesc => "voucherDateDesc",
            SortOption::VoucherNumberAsc => "voucherNumberAsc",
            SortOption::VoucherNumberDesc => "voucherNumberDesc",
        }
    }

    /// Sort expression understood by the remote API (`property,DIRECTION`)
    pub fn api_value(self) -> &'static str {
        match self {
            SortOption::CreatedAtAsc => "createdDate,ASC",
            SortOption::CreatedAtDesc => "createdDate,DESC",
            SortOption::UpdatedAtAsc => "updatedDate,ASC",
            SortOption::UpdatedAtDesc => "updatedDate,DESC",
            SortOption::VoucherDateAsc => "voucherDate,ASC",
            SortOption::VoucherDateDesc => "voucherDate,DESC",
            SortOption::VoucherNumberAsc => "voucherNumber,ASC",
            SortOption::VoucherNumberDesc => "voucherNumber,DESC",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownTag {
                kind: "sort",
                value: s.to_string(),
            })
    }
}
