#![allow(dead_code)]

use pocket_ledger::application::engine::LedgerEngine;
use pocket_ledger::interfaces::server::Server;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Boots a server on an ephemeral localhost port.
pub async fn start_server(initial_amount: Decimal) -> (SocketAddr, Arc<LedgerEngine>) {
    start_server_with(LedgerEngine::new(initial_amount).unwrap()).await
}

pub async fn start_server_with(engine: LedgerEngine) -> (SocketAddr, Arc<LedgerEngine>) {
    let engine = Arc::new(engine);
    let server = Server::bind("127.0.0.1:0", Arc::clone(&engine))
        .await
        .expect("Failed to bind server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, engine)
}

/// A line-oriented test client speaking the ledger protocol.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("Failed to connect");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends `line` plus a newline and waits for one response line.
    /// Returns `None` if the server closed the connection instead.
    pub async fn send_raw(&mut self, line: &str) -> Option<Value> {
        self.writer.write_all(line.as_bytes()).await.ok()?;
        self.writer.write_all(b"\n").await.ok()?;
        self.writer.flush().await.ok()?;
        self.read_response().await
    }

    pub async fn read_response(&mut self) -> Option<Value> {
        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(serde_json::from_str(&line).expect("response is not JSON")),
        }
    }

    pub async fn request(&mut self, action: &str, data: Value) -> Value {
        let line = json!({ "action": action, "data": data }).to_string();
        self.send_raw(&line).await.expect("connection closed")
    }

    pub async fn add_pocket(&mut self, name: &str, initial_amount: &str) -> Value {
        self.request(
            "ADD_POCKET",
            json!({ "name": name, "initialAmount": initial_amount }),
        )
        .await
    }

    pub async fn deposit_pocket(&mut self, name: &str, amount: &str) -> Value {
        self.request("DEPOSIT_POCKET", json!({ "name": name, "amount": amount }))
            .await
    }

    pub async fn withdraw_pocket(&mut self, name: &str, amount: &str) -> Value {
        self.request("WITHDRAW_POCKET", json!({ "name": name, "amount": amount }))
            .await
    }

    pub async fn deposit_account(&mut self, amount: &str) -> Value {
        self.request("DEPOSIT_ACCOUNT", json!({ "amount": amount }))
            .await
    }

    pub async fn get_account(&mut self) -> Value {
        self.request("GET_ACCOUNT", json!({})).await
    }
}

pub fn is_ok(response: &Value) -> bool {
    response["status"] == "ok"
}

pub fn message(response: &Value) -> &str {
    response["data"]["message"].as_str().unwrap_or_default()
}

pub fn number(value: &Value) -> f64 {
    value.as_f64().expect("expected a JSON number")
}
