use rust_decimal_macros::dec;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;
use common::{Client, is_ok, message, number};

#[tokio::test]
async fn test_malformed_json_is_answered_then_closed() {
    let (addr, _engine) = common::start_server(dec!(10)).await;
    let mut client = Client::connect(addr).await;

    let response = client.send_raw("{this is not json").await.unwrap();
    assert_eq!(response["status"], "error");
    assert_eq!(message(&response), "Invalid request");

    // The server hangs up after a framing failure.
    assert!(client.read_response().await.is_none());
}

#[tokio::test]
async fn test_missing_action_is_invalid() {
    let (addr, _engine) = common::start_server(dec!(10)).await;
    let mut client = Client::connect(addr).await;

    let response = client.send_raw(r#"{"data": {"amount": "1"}}"#).await.unwrap();
    assert_eq!(message(&response), "Invalid request");
}

#[tokio::test]
async fn test_empty_line_is_answered() {
    let (addr, _engine) = common::start_server(dec!(10)).await;
    let mut client = Client::connect(addr).await;

    let response = client.send_raw("").await.unwrap();
    assert_eq!(message(&response), "Empty request");
}

#[tokio::test]
async fn test_unknown_action_keeps_connection_open() {
    let (addr, _engine) = common::start_server(dec!(10)).await;
    let mut client = Client::connect(addr).await;

    let response = client.request("CLOSE_ACCOUNT", serde_json::json!({})).await;
    assert_eq!(message(&response), "Unknown action");

    let account = client.get_account().await;
    assert!(is_ok(&account));
}

#[tokio::test]
async fn test_bad_clients_do_not_affect_others() {
    let (addr, _engine) = common::start_server(dec!(100)).await;

    let mut good = Client::connect(addr).await;
    good.add_pocket("safe", "40").await;

    // A client that sends garbage.
    let mut garbage = Client::connect(addr).await;
    garbage.send_raw("\u{1}\u{2}garbage").await;

    // A client that disconnects halfway through a line.
    let mut half = TcpStream::connect(addr).await.unwrap();
    half.write_all(br#"{"action":"DEPOSIT_ACC"#).await.unwrap();
    drop(half);

    // A client that connects and never sends anything.
    let _idle = TcpStream::connect(addr).await.unwrap();

    let response = good.deposit_pocket("safe", "10").await;
    assert!(is_ok(&response));
    assert_eq!(number(&response["data"]["balance"]), 50.0);

    let mut late = Client::connect(addr).await;
    let account = late.get_account().await;
    assert_eq!(number(&account["data"]["availableBalance"]), 50.0);
    assert_eq!(number(&account["data"]["totalBalance"]), 100.0);
}

#[tokio::test]
async fn test_truncated_request_is_still_answered_before_close() {
    let (addr, engine) = common::start_server(dec!(10)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(br#"{"action":"DEPOSIT_ACCOUNT","data":{"amount":"5"}}"#)
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut output = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut output)
        .await
        .unwrap();
    let response: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert!(is_ok(&response));
    assert_eq!(engine.account().await.total_balance.value(), dec!(15));
}
