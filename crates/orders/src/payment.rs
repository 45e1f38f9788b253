//! Payment record, created when an admin marks payment done.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildmart_core::{DomainError, DomainResult, InvoiceNumber, LeadId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Upi,
    Cheque,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Cash => "cash",
        }
    }
}

/// Financial record keyed by invoice number; one per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayment {
    pub invoice_number: InvoiceNumber,
    pub lead_id: LeadId,
    pub amount_paid: u64,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub recorded_at: DateTime<Utc>,
}

impl OrderPayment {
    pub fn new(
        invoice_number: InvoiceNumber,
        lead_id: LeadId,
        amount_paid: u64,
        method: PaymentMethod,
        transaction_id: impl Into<String>,
    ) -> DomainResult<Self> {
        let transaction_id = transaction_id.into();
        if transaction_id.trim().is_empty() {
            return Err(DomainError::validation("transaction id must not be empty"));
        }
        if amount_paid == 0 {
            return Err(DomainError::validation("paid amount must be positive"));
        }
        Ok(Self {
            invoice_number,
            lead_id,
            amount_paid,
            method,
            transaction_id,
            recorded_at: Utc::now(),
        })
    }
}
