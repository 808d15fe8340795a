//! Newline-delimited JSON request/response codec.
//!
//! A request line looks like `{"action": "DEPOSIT_POCKET", "data": {"name": "P", "amount": "150"}}`
//! and every request gets exactly one response line, `{"status": "ok"|"error", "data": {...}}`.

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::str::FromStr;

/// Reasons a line could not be read as a request at all.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("Empty request")]
    Empty,
    #[error("Invalid request")]
    Malformed,
}

/// A syntactically valid request whose fields have not been interpreted yet.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(default)]
    pub data: Option<HashMap<String, Value>>,
}

impl Request {
    pub fn parse(line: &str) -> std::result::Result<Self, FramingError> {
        if line.trim().is_empty() {
            return Err(FramingError::Empty);
        }
        serde_json::from_str(line).map_err(|_| FramingError::Malformed)
    }
}

/// Every operation a client can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddPocket { name: String, initial_amount: Decimal },
    DepositPocket { name: String, amount: Decimal },
    WithdrawPocket { name: String, amount: Decimal },
    DepositAccount { amount: Decimal },
    GetAccount,
    GetPocket { name: String },
    Unknown(String),
}

impl TryFrom<Request> for Command {
    type Error = LedgerError;

    fn try_from(request: Request) -> Result<Self> {
        let data = request.data.unwrap_or_default();
        let fields = Fields(&data);

        let command = match request.action.as_str() {
            "ADD_POCKET" => Command::AddPocket {
                name: fields.name()?,
                initial_amount: fields.amount("initialAmount")?,
            },
            "DEPOSIT_POCKET" => Command::DepositPocket {
                name: fields.name()?,
                amount: fields.amount("amount")?,
            },
            "WITHDRAW_POCKET" => Command::WithdrawPocket {
                name: fields.name()?,
                amount: fields.amount("amount")?,
            },
            "DEPOSIT_ACCOUNT" => Command::DepositAccount {
                amount: fields.amount("amount")?,
            },
            "GET_ACCOUNT" => Command::GetAccount,
            "GET_POCKET" => Command::GetPocket {
                name: fields.name()?,
            },
            _ => Command::Unknown(request.action),
        };
        Ok(command)
    }
}

struct Fields<'a>(&'a HashMap<String, Value>);

impl Fields<'_> {
    // Values are strings on the wire; numbers are accepted as their decimal text.
    fn text(&self, field: &str) -> Result<Option<String>> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(LedgerError::invalid(format!("Invalid field: {}", field))),
        }
    }

    /// A missing name is treated as blank and rejected by the ledger.
    fn name(&self) -> Result<String> {
        Ok(self.text("name")?.unwrap_or_default())
    }

    fn amount(&self, field: &str) -> Result<Decimal> {
        let text = self
            .text(field)?
            .ok_or_else(|| LedgerError::invalid(format!("Missing field: {}", field)))?;
        parse_amount(&text)
    }
}

/// Parses plain (`"150.25"`) or scientific (`"1.5e2"`) decimal text.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LedgerError::invalid(format!("Invalid amount: {}", text)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub data: Value,
}

const FALLBACK_LINE: &str = r#"{"status":"error","data":{"message":"Internal error"}}"#;

impl Response {
    pub fn ok<T: Serialize>(data: &T) -> Result<Self> {
        let data = serde_json::to_value(data).map_err(|e| LedgerError::InternalError(Box::new(e)))?;
        Ok(Self {
            status: Status::Ok,
            data,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: json!({ "message": message.into() }),
        }
    }

    /// Encodes the response as a single line, newline included.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode response");
            FALLBACK_LINE.to_string()
        });
        line.push('\n');
        line
    }
}
