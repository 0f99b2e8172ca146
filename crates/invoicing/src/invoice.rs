use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use invoicedesk_core::{Cents, DomainError, InvoiceId};

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    /// Exact match only: `"Paid"` or `" paid"` are not statuses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(DomainError::validation(format!("unknown invoice status: {other:?}"))),
        }
    }
}

/// A persisted invoice.
///
/// `id` and `date` are fixed at creation; updates only ever touch
/// `customer_id`, `amount` and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: String,
    /// Amount in minor currency units.
    pub amount: Cents,
    pub status: InvoiceStatus,
    /// Creation date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}
