//! Integration tests for the remote client against a loopback relay.
//!
//! # Purpose
//!
//! A minimal relay stand-in answers exactly as `hmtl-server` does: `ack` for
//! forwarded messages and `exit`, one queued module message (or an empty
//! item) per `data` request.  The tests check the full client path from a
//! [`ModuleCommand`] to a decoded [`Response`].

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use hmtl_client::application::build_message::{decode_response, ModuleCommand, Response};
use hmtl_client::infrastructure::remote::{ClientConfig, RemoteClient};
use hmtl_core::config::{BaudRate, CONFIG_MAGIC};
use hmtl_core::protocol::tokens::relay::{ACK, DATA_REQUEST, EXIT};
use hmtl_core::protocol::{encode_message, MessageBody, MessageFlags, PollResponse};
use hmtl_core::relay::{encode_relay_item, RelayItemDecoder};
use hmtl_core::HmtlMessage;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

// ── Loopback relay ────────────────────────────────────────────────────────────

/// Serves one connection.  Returns every forwarded (non-token) item.
async fn loopback_relay(mut pending: VecDeque<Vec<u8>>) -> (SocketAddr, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut decoder = RelayItemDecoder::new();
        let mut forwarded = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let item = match decoder.next_item().unwrap() {
                Some(item) => item.into_option().unwrap_or_default(),
                None => {
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        return forwarded;
                    }
                    decoder.push(&buf[..n]);
                    continue;
                }
            };

            let reply = if item.as_slice() == DATA_REQUEST {
                encode_relay_item(pending.pop_front().as_deref()).unwrap()
            } else {
                let exit = item.as_slice() == EXIT;
                if !exit {
                    forwarded.push(item);
                }
                let ack = encode_relay_item(Some(ACK)).unwrap();
                stream.write_all(&ack).await.unwrap();
                if exit {
                    return forwarded;
                }
                continue;
            };
            stream.write_all(&reply).await.unwrap();
        }
    });
    (addr, handle)
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        server_addr: addr,
        ack_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    }
}

fn poll_reply(address: u16, more: bool) -> Vec<u8> {
    let identity = PollResponse {
        magic: CONFIG_MAGIC,
        protocol_version: 2,
        hardware_version: 3,
        baud: BaudRate::from_raw(48),
        num_outputs: 3,
        flags: 0,
        device_id: address + 1000,
        address,
        object_type: 1,
        buffer_size: 128,
        msg_version: 2,
    };
    let mut msg = HmtlMessage::new(address, MessageBody::PollResponse(identity))
        .with_flags(MessageFlags::RESPONSE);
    if more {
        msg = msg.with_flags(MessageFlags::MORE_DATA);
    }
    encode_message(&msg).unwrap()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_broadcast_poll_collects_every_module() {
    // Arrange
    let pending = VecDeque::from(vec![poll_reply(120, true), poll_reply(121, false)]);
    let (addr, relay) = loopback_relay(pending).await;
    let mut client = RemoteClient::connect(config(addr)).await.unwrap();
    let command = ModuleCommand::Poll;

    // Act
    let fragments = client
        .send_and_ack(&command.to_message(0xFFFF), command.expects_response())
        .await
        .unwrap();
    assert_ok!(client.send_exit().await);

    // Assert
    match decode_response(&fragments).unwrap() {
        Response::Modules(modules) => {
            let addresses: Vec<u16> = modules.iter().map(|m| m.address).collect();
            assert_eq!(addresses, vec![120, 121]);
        }
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(relay.await.unwrap(), vec![encode_message(&HmtlMessage::poll(0xFFFF)).unwrap()]);
}

#[tokio::test]
async fn test_poll_with_no_modules_yields_no_fragments() {
    let (addr, _relay) = loopback_relay(VecDeque::new()).await;
    let mut client = RemoteClient::connect(config(addr)).await.unwrap();

    let fragments = client.send_and_ack(&HmtlMessage::poll(130), true).await.unwrap();

    assert!(fragments.is_empty());
}

#[tokio::test]
async fn test_output_commands_are_forwarded_in_order() {
    // Arrange
    let (addr, relay) = loopback_relay(VecDeque::new()).await;
    let mut client = RemoteClient::connect(config(addr)).await.unwrap();
    let commands = [
        ModuleCommand::Value { output: 0, value: 128 },
        ModuleCommand::NoProgram { output: 1 },
    ];

    // Act
    for command in &commands {
        let fragments = client
            .send_and_ack(&command.to_message(130), command.expects_response())
            .await
            .unwrap();
        assert!(fragments.is_empty());
    }
    assert_ok!(client.send_exit().await);

    // Assert
    let expected: Vec<Vec<u8>> = commands
        .iter()
        .map(|c| encode_message(&c.to_message(130)).unwrap())
        .collect();
    assert_eq!(relay.await.unwrap(), expected);
}

#[tokio::test]
async fn test_connect_without_relay_fails() {
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

    assert_err!(RemoteClient::connect(config(addr)).await);
}
