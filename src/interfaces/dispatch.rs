use super::protocol::{Command, FramingError, Request, Response};
use crate::application::engine::LedgerEngine;
use crate::error::{LedgerError, Result};

/// The answer to one request line.
#[derive(Debug)]
pub struct Reply {
    pub response: Response,
    /// False once the stream can no longer be trusted to carry well-formed requests.
    pub keep_open: bool,
}

/// Turns one request line into exactly one response.
pub async fn handle_line(engine: &LedgerEngine, line: &str) -> Reply {
    match Request::parse(line) {
        Ok(request) => Reply {
            response: handle_request(engine, request).await,
            keep_open: true,
        },
        Err(e) => {
            tracing::debug!(error = %e, "rejected request line");
            reject(e)
        }
    }
}

pub fn reject(error: FramingError) -> Reply {
    Reply {
        response: Response::error(error.to_string()),
        keep_open: false,
    }
}

async fn handle_request(engine: &LedgerEngine, request: Request) -> Response {
    let result = match Command::try_from(request) {
        Ok(command) => execute(engine, command).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(error_response)
}

async fn execute(engine: &LedgerEngine, command: Command) -> Result<Response> {
    match command {
        Command::AddPocket {
            name,
            initial_amount,
        } => Response::ok(&engine.add_pocket(&name, initial_amount).await?),
        Command::DepositPocket { name, amount } => {
            Response::ok(&engine.deposit_to_pocket(&name, amount).await?)
        }
        Command::WithdrawPocket { name, amount } => {
            Response::ok(&engine.withdraw_from_pocket(&name, amount).await?)
        }
        Command::DepositAccount { amount } => {
            Response::ok(&engine.deposit_to_account(amount).await?)
        }
        Command::GetAccount => Response::ok(&engine.account().await),
        Command::GetPocket { name } => Response::ok(&engine.pocket(&name).await?),
        Command::Unknown(action) => {
            tracing::debug!(%action, "unknown action");
            Ok(Response::error("Unknown action"))
        }
    }
}

/// Client errors carry their own message; anything else is logged and masked.
pub fn error_response(error: LedgerError) -> Response {
    if error.is_client_error() {
        Response::error(error.to_string())
    } else {
        tracing::error!(error = %error, "internal error while handling request");
        Response::error("Internal error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::protocol::Status;
    use rust_decimal_macros::dec;

    async fn send(engine: &LedgerEngine, line: &str) -> Reply {
        handle_line(engine, line).await
    }

    #[tokio::test]
    async fn test_add_pocket_returns_pocket_with_account() {
        let engine = LedgerEngine::new(dec!(5000)).unwrap();
        let reply = send(
            &engine,
            r#"{"action":"ADD_POCKET","data":{"name":"Test Pocket","initialAmount":"1000.0"}}"#,
        )
        .await;

        assert!(reply.keep_open);
        assert_eq!(reply.response.status, Status::Ok);
        let data = &reply.response.data;
        assert_eq!(data["name"], "Test Pocket");
        assert_eq!(data["balance"].as_f64(), Some(1000.0));
        assert_eq!(data["mainAccount"]["availableBalance"].as_f64(), Some(4000.0));
        assert_eq!(data["mainAccount"]["totalBalance"].as_f64(), Some(5000.0));
    }

    #[tokio::test]
    async fn test_domain_errors_surface_their_message() {
        let engine = LedgerEngine::new(dec!(10)).unwrap();
        send(&engine, r#"{"action":"ADD_POCKET","data":{"name":"p","initialAmount":"5"}}"#).await;

        let reply = send(&engine, r#"{"action":"DEPOSIT_POCKET","data":{"name":"p","amount":"6"}}"#).await;
        assert_eq!(reply.response.status, Status::Error);
        assert_eq!(reply.response.data["message"], "Insufficient funds in main account");
        assert!(reply.keep_open);

        let reply = send(&engine, r#"{"action":"WITHDRAW_POCKET","data":{"name":"p","amount":"6"}}"#).await;
        assert_eq!(reply.response.data["message"], "Insufficient funds in pocket");

        let reply = send(&engine, r#"{"action":"DEPOSIT_POCKET","data":{"name":"Unknown","amount":"10"}}"#).await;
        assert_eq!(reply.response.data["message"], "Pocket not found: Unknown");

        let reply = send(&engine, r#"{"action":"DEPOSIT_ACCOUNT","data":{"amount":"0"}}"#).await;
        assert_eq!(reply.response.data["message"], "Amount must be > 0");
    }

    #[tokio::test]
    async fn test_unknown_action_keeps_connection() {
        let engine = LedgerEngine::new(dec!(0)).unwrap();
        let reply = send(&engine, r#"{"action":"CLOSE_ACCOUNT","data":{}}"#).await;
        assert_eq!(reply.response.data["message"], "Unknown action");
        assert!(reply.keep_open);
    }

    #[tokio::test]
    async fn test_framing_failures_close_connection() {
        let engine = LedgerEngine::new(dec!(0)).unwrap();

        let reply = send(&engine, "").await;
        assert_eq!(reply.response.data["message"], "Empty request");
        assert!(!reply.keep_open);

        let reply = send(&engine, "{oops").await;
        assert_eq!(reply.response.data["message"], "Invalid request");
        assert!(!reply.keep_open);
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let response = error_response(LedgerError::StorageError("secret path".into()));
        assert_eq!(response.status, Status::Error);
        assert_eq!(response.data["message"], "Internal error");
    }
}
