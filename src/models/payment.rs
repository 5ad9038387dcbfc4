use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{AppError, Result};

/// Rate applied to the filtered total on the payments overview.
pub const TAX_RATE: f64 = 0.06;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Payment status, mirrored by the CHECK constraint on the payments table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            other => Err(AppError::ConstraintViolation(format!(
                "status must be 'paid' or 'unpaid', got '{}'",
                other
            ))),
        }
    }
}

/// Database payment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub company: String,
    pub amount: f64,
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
}

/// A validated payment ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub company: String,
    pub amount: f64,
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
}

/// The columns an update is allowed to overwrite
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub amount: f64,
    pub payment_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
}

/// Body of `POST /api/records`
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaymentRequest {
    pub company: Option<String>,
    pub amount: Option<Value>,
    pub payment_date: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

impl CreatePaymentRequest {
    pub fn validate(self) -> Result<NewPayment> {
        let company = self.company.ok_or(AppError::MissingField("company"))?;
        let amount = self.amount.ok_or(AppError::MissingField("amount"))?;
        let status = self.status.ok_or(AppError::MissingField("status"))?;
        let due_date = self.due_date.ok_or(AppError::MissingField("due_date"))?;

        let company = company.trim();
        if company.is_empty() {
            return Err(AppError::invalid("company", "must not be empty"));
        }

        Ok(NewPayment {
            company: company.to_string(),
            amount: parse_amount(&amount)?,
            payment_date: parse_optional_date("payment_date", self.payment_date.as_deref())?,
            status: status.parse()?,
            due_date: parse_date("due_date", &due_date)?,
        })
    }
}

/// Body of `PUT /api/records/{id}`
///
/// `payment_date` has to be present but may be `null` or empty to clear it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub payment_date: Option<Option<String>>,
    pub due_date: Option<String>,
}

impl UpdatePaymentRequest {
    pub fn validate(self) -> Result<PaymentUpdate> {
        let amount = self.amount.ok_or(AppError::MissingField("amount"))?;
        let payment_date = self
            .payment_date
            .ok_or(AppError::MissingField("payment_date"))?;
        let due_date = self.due_date.ok_or(AppError::MissingField("due_date"))?;

        Ok(PaymentUpdate {
            amount: parse_amount(&amount)?,
            payment_date: parse_optional_date("payment_date", payment_date.as_deref())?,
            due_date: parse_date("due_date", &due_date)?,
        })
    }
}

fn deserialize_present<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Accepts a JSON number or a numeric string; forms post the latter.
pub fn parse_amount(value: &Value) -> Result<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    amount
        .filter(|a| a.is_finite())
        .ok_or_else(|| AppError::invalid("amount", format!("expected a number, got {}", value)))
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AppError::invalid(field, format!("expected YYYY-MM-DD, got '{}'", value)))
}

/// Blank and missing dates both mean "no date"
pub fn parse_optional_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(date) => parse_date(field, date).map(Some),
    }
}

/// Totals shown under a (possibly filtered) list of payments
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub count: usize,
    pub total_amount: f64,
    pub tax_due: f64,
}

impl PaymentSummary {
    pub fn from_payments(payments: &[Payment]) -> Self {
        let total_amount: f64 = payments.iter().map(|p| p.amount).sum();
        Self {
            count: payments.len(),
            total_amount,
            tax_due: total_amount * TAX_RATE,
        }
    }
}

/// Acknowledgement returned by mutating endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(message: impl Into<String>, id: i64) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}
