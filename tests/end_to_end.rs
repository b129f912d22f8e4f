//! Integration tests driving a real [`muresp::Client`] over a
//! `tokio::io::duplex` mock transport, against a tiny hand-rolled fake
//! server that decodes command frames and writes back canned replies.
//!
//! Covers the named scenarios from `spec.md` §8's testable-properties
//! list: PING, GET miss, SET OK, a server error, XADD+XLEN, and
//! XREAD empty vs filled, plus the FIFO-ordering, drain-on-error (both the
//! EOF and malformed-framing variants), and Pub/Sub dispatch properties
//! that only show up with a real transport in the loop.

use std::time::Duration;

use bytes::BytesMut;
use muresp::resp::decoder::RespDecoder;
use muresp::resp::encoder::encode_value;
use muresp::resp::RespValue;
use muresp::{Client, CommandError, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::Decoder;

/// Reads command frames off `server` and answers each with whatever
/// `handler` returns for its decoded argv, until the client side closes.
async fn run_fake_server(mut server: DuplexStream, mut handler: impl FnMut(Vec<String>) -> RespValue + Send + 'static) {
    let mut decoder = RespDecoder::new();
    let mut buf = BytesMut::new();
    let mut read_buf = [0u8; 4096];
    loop {
        let n = match server.read(&mut read_buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&read_buf[..n]);
        while let Some(value) = decoder.decode(&mut buf).expect("well-formed command frame") {
            let argv = match value {
                RespValue::Array(Some(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        RespValue::BulkString(Some(b)) => String::from_utf8(b.to_vec()).unwrap(),
                        other => panic!("expected bulk string argv element, got {other:?}"),
                    })
                    .collect::<Vec<_>>(),
                other => panic!("expected array command frame, got {other:?}"),
            };
            let reply = handler(argv);
            let mut out = BytesMut::new();
            encode_value(&reply, &mut out);
            if server.write_all(&out).await.is_err() {
                return;
            }
        }
    }
}

fn client_and_server() -> (Client, DuplexStream) {
    let (client_half, server_half) = tokio::io::duplex(8192);
    (Client::new(client_half), server_half)
}

#[tokio::test]
async fn ping_round_trip() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| {
        assert_eq!(argv, vec!["PING"]);
        RespValue::SimpleString("PONG".to_string())
    }));

    let reply = muresp::commands::ping(&client).await.unwrap();
    assert_eq!(reply, "PONG");
}

#[tokio::test]
async fn get_miss_returns_none() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| {
        assert_eq!(argv, vec!["GET", "missing"]);
        RespValue::null_bulk()
    }));

    let reply = muresp::commands::get(&client, "missing").await.unwrap();
    assert_eq!(reply, None);
}

#[tokio::test]
async fn set_ok_returns_true() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| {
        assert_eq!(argv, vec!["SET", "k", "v"]);
        RespValue::SimpleString("OK".to_string())
    }));

    let ok = muresp::commands::set(&client, "k", "v").await.unwrap();
    assert!(ok);
}

#[tokio::test]
async fn server_error_fails_only_that_command() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| {
        if argv[0] == "INCR" {
            RespValue::Error("ERR value is not an integer or out of range".to_string())
        } else {
            RespValue::SimpleString("PONG".to_string())
        }
    }));

    let err = muresp::commands::incr(&client, "not-a-number").await.unwrap_err();
    match err {
        CommandError::Server(text) => assert!(text.contains("not an integer")),
        other => panic!("expected Server error, got {other:?}"),
    }

    // the connection is still usable after a server-side command error
    let reply = muresp::commands::ping(&client).await.unwrap();
    assert_eq!(reply, "PONG");
}

#[tokio::test]
async fn xadd_then_xlen() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| match argv[0].as_str() {
        "XADD" => RespValue::bulk("0-1"),
        "XLEN" => RespValue::Integer(1),
        other => panic!("unexpected command {other}"),
    }));

    let id = muresp::commands::xadd(&client, "events", "*", &[("field".to_string(), "value".to_string())])
        .await
        .unwrap();
    assert_eq!(id, "0-1");

    let len = muresp::commands::xlen(&client, "events").await.unwrap();
    assert_eq!(len, 1);
}

#[tokio::test]
async fn xread_empty_then_filled() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| {
        assert_eq!(argv[0], "XREAD");
        if argv.contains(&"0".to_string()) {
            RespValue::Array(Some(vec![RespValue::Array(Some(vec![
                RespValue::bulk("events"),
                RespValue::Array(Some(vec![RespValue::Array(Some(vec![
                    RespValue::bulk("0-1"),
                    RespValue::Array(Some(vec![RespValue::bulk("field"), RespValue::bulk("value")])),
                ]))])),
            ]))]))
        } else {
            RespValue::null_array()
        }
    }));

    let empty = muresp::commands::xread(&client, None, &[("events".to_string(), "$".to_string())])
        .await
        .unwrap();
    assert!(empty.is_empty());

    let filled = muresp::commands::xread(&client, None, &[("events".to_string(), "0".to_string())])
        .await
        .unwrap();
    let entries = filled.get("events").unwrap();
    assert_eq!(entries[0].id, "0-1");
    assert_eq!(entries[0].fields.get("field"), Some(&"value".to_string()));
}

#[tokio::test]
async fn pipelined_submissions_preserve_fifo_order() {
    let (client, server) = client_and_server();
    tokio::spawn(run_fake_server(server, |argv| RespValue::bulk(argv[1].clone())));

    let c1 = client.clone();
    let c2 = client.clone();
    let c3 = client.clone();
    let (r1, r2, r3) = tokio::join!(
        muresp::commands::get(&c1, "a"),
        muresp::commands::get(&c2, "b"),
        muresp::commands::get(&c3, "c"),
    );
    assert_eq!(r1.unwrap(), Some("a".to_string()));
    assert_eq!(r2.unwrap(), Some("b".to_string()));
    assert_eq!(r3.unwrap(), Some("c".to_string()));
}

#[tokio::test]
async fn dropping_the_server_drains_pending_commands_with_an_error() {
    let (client_half, server_half) = tokio::io::duplex(8192);
    let client = Client::new(client_half);
    drop(server_half);

    let err = muresp::commands::ping(&client).await.unwrap_err();
    assert!(matches!(err, CommandError::Protocol(_)));
}

#[tokio::test]
async fn malformed_frame_drains_all_pending_commands_with_the_same_protocol_error() {
    let (client_half, mut server) = tokio::io::duplex(8192);
    let client = Client::new(client_half);

    let server_task = tokio::spawn(async move {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::new();
        let mut read_buf = [0u8; 4096];
        let mut received = 0;
        while received < 3 {
            let n = server.read(&mut read_buf).await.unwrap();
            buf.extend_from_slice(&read_buf[..n]);
            while decoder.decode(&mut buf).unwrap().is_some() {
                received += 1;
            }
        }
        // Never reply to any of the three PINGs — just break framing.
        server.write_all(b"@bogus\r\n").await.unwrap();
        // Keep the server half open long enough for the client to read it.
        tokio::time::sleep(Duration::from_millis(50)).await;
    });

    let c1 = client.clone();
    let c2 = client.clone();
    let c3 = client.clone();
    let (r1, r2, r3) = tokio::join!(
        muresp::commands::ping(&c1),
        muresp::commands::ping(&c2),
        muresp::commands::ping(&c3),
    );

    for result in [r1, r2, r3] {
        match result {
            Err(CommandError::Protocol(ProtocolError::UnknownTypeByte(byte))) => assert_eq!(byte, b'@'),
            other => panic!("expected UnknownTypeByte protocol error, got {other:?}"),
        }
    }

    // the connection is closed — a submission made afterward fails immediately
    let err = muresp::commands::ping(&client).await.unwrap_err();
    assert!(matches!(err, CommandError::Protocol(_)));

    server_task.await.unwrap();
}

#[tokio::test]
async fn pubsub_message_dispatches_through_a_real_connection() {
    let (client_half, mut server) = tokio::io::duplex(8192);
    let client = Client::new(client_half);

    tokio::spawn(async move {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::new();
        let mut read_buf = [0u8; 4096];
        loop {
            let n = server.read(&mut read_buf).await.unwrap();
            buf.extend_from_slice(&read_buf[..n]);
            match decoder.decode(&mut buf).unwrap() {
                Some(RespValue::Array(Some(items))) => {
                    assert_eq!(items[0], RespValue::bulk("SUBSCRIBE"));
                    break;
                }
                Some(other) => panic!("expected SUBSCRIBE array, got {other:?}"),
                None => continue,
            }
        }

        let mut out = BytesMut::new();
        encode_value(
            &RespValue::Array(Some(vec![RespValue::bulk("subscribe"), RespValue::bulk("news"), RespValue::Integer(1)])),
            &mut out,
        );
        encode_value(
            &RespValue::Array(Some(vec![RespValue::bulk("message"), RespValue::bulk("news"), RespValue::bulk("hello")])),
            &mut out,
        );
        server.write_all(&out).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(String, Vec<u8>)>();
    client
        .subscribe(vec!["news".to_string()], move |channel, payload| {
            let _ = tx.send((channel.to_string(), payload.to_vec()));
        })
        .await
        .unwrap();

    let (channel, payload) = rx.recv().await.unwrap();
    assert_eq!(channel, "news");
    assert_eq!(payload, b"hello");
}
