//! Integration tests for the hmtl-core protocol codec.
//!
//! These tests verify complete round-trip encoding and decoding of every
//! message type through the public API, exercising the codec, configuration
//! records, validation and the frame assembler together.

use hmtl_core::{
    config::{BaudRate, ConfigRecord, ModuleConfig, ModuleConfigInput},
    decode_message, encode_message,
    framing::FrameAssembler,
    protocol::{
        decode_header,
        messages::{
            MessageBody, MessageFlags, PollResponse, Rgb, ALL_OUTPUTS, BROADCAST_ADDRESS,
            HEADER_SIZE, POLL_RESPONSE_SIZE,
        },
        ProgramPayload,
    },
    HmtlMessage,
};

/// Encodes a message and then decodes it, asserting that the decoded message
/// matches the original and that the length field matches what was consumed.
fn roundtrip(msg: HmtlMessage) -> HmtlMessage {
    let bytes = encode_message(&msg).expect("encode must succeed");
    let (decoded, consumed) = decode_message(&bytes).expect("decode must succeed");
    assert_eq!(consumed, bytes.len(), "all bytes must be consumed");
    let (header, _) = decode_header(&bytes).expect("header must decode");
    assert_eq!(header.length as usize, consumed, "length field must equal consumed bytes");
    decoded
}

fn poll_response() -> PollResponse {
    PollResponse {
        magic: 0x5C,
        protocol_version: 2,
        hardware_version: 3,
        baud: BaudRate::from_raw(48),
        num_outputs: 4,
        flags: 0,
        device_id: 0x0102,
        address: 128,
        object_type: 1,
        buffer_size: 64,
        msg_version: 2,
    }
}

fn module_description() -> &'static str {
    r#"{
        "header": {
            "protocol_version": 2, "hardware_version": 3,
            "address": 128, "device_id": 42, "baud": 57600
        },
        "outputs": [
            { "type": "value", "pin": 9, "value": 0 },
            { "type": "rgb", "pins": [3, 5, 6], "values": [0, 0, 0] },
            { "type": "mpr121", "irqpin": 2, "useinterrupt": true,
              "trigger": [3,3,3,3,3,3,3,3,3,3,3,3],
              "release": [10,10,10,10,10,10,10,10,10,10,10,10] }
        ]
    }"#
}

// ── Output messages ───────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_value_message() {
    let original = HmtlMessage::value(128, 0, 1000);
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_value_message_at_boundaries() {
    let original = HmtlMessage::value(BROADCAST_ADDRESS, ALL_OUTPUTS, i16::MAX);
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_rgb_message() {
    let original = HmtlMessage::rgb(0, 3, Rgb::new(255, 0, 127));
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_every_program_builder() {
    let programs = [
        ProgramPayload::none(),
        ProgramPayload::blink(100, Rgb::new(255, 255, 255), 900, Rgb::default()),
        ProgramPayload::timed_change(5000, Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)),
        ProgramPayload::level_value(),
        ProgramPayload::sound_value(),
        ProgramPayload::fade(250, Rgb::new(1, 2, 3), Rgb::new(4, 5, 6), 0x01),
        ProgramPayload::new(0x06, &[0xFF; 32]).expect("full block fits"),
    ];

    for program in programs {
        let original = HmtlMessage::program(BROADCAST_ADDRESS, ALL_OUTPUTS, program);
        assert_eq!(original, roundtrip(original.clone()));
    }
}

// ── Poll / address / config dump ──────────────────────────────────────────────

#[test]
fn test_roundtrip_poll_request() {
    let original = HmtlMessage::poll(BROADCAST_ADDRESS);
    let decoded = roundtrip(original.clone());
    assert_eq!(decoded.body, MessageBody::PollRequest);
    assert!(decoded.flags.contains(MessageFlags::RESPONSE));
}

#[test]
fn test_poll_response_decodes_from_module_bytes() {
    // Arrange: bytes exactly as a module would send them.
    let mut bytes = vec![0xFC, 0x00, 0x02, (HEADER_SIZE + POLL_RESPONSE_SIZE) as u8, 0x02, 0x00];
    bytes.extend_from_slice(&0xFFFFu16.to_le_bytes());
    bytes.extend_from_slice(&[0x5C, 2, 3, 48, 4, 0]);
    bytes.extend_from_slice(&0x0102u16.to_le_bytes());
    bytes.extend_from_slice(&128u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&64u16.to_le_bytes());
    bytes.push(2);

    // Act
    let (decoded, consumed) = decode_message(&bytes).expect("decode must succeed");

    // Assert
    assert_eq!(consumed, 23);
    assert_eq!(decoded.body, MessageBody::PollResponse(poll_response()));
    assert_eq!(poll_response().baud.bps(), 57_600);
}

#[test]
fn test_roundtrip_poll_response() {
    let original = HmtlMessage::new(BROADCAST_ADDRESS, MessageBody::PollResponse(poll_response()));
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_set_address() {
    let original = HmtlMessage::set_address(BROADCAST_ADDRESS, 42, 130);
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_dump_config_request() {
    let decoded = roundtrip(HmtlMessage::dump_config(128));
    assert_eq!(decoded.body, MessageBody::DumpConfig(Vec::new()));
}

#[test]
fn test_validated_configuration_survives_config_dump() {
    // Arrange
    let input: ModuleConfigInput =
        serde_json::from_str(module_description()).expect("description must parse");
    let config = input.validate().expect("description must validate");
    let reply = HmtlMessage::new(128, MessageBody::DumpConfig(config.to_records()))
        .with_flags(MessageFlags::RESPONSE);

    // Act
    let decoded = roundtrip(reply);

    // Assert
    let records = match decoded.body {
        MessageBody::DumpConfig(records) => records,
        other => panic!("expected config dump, got {other:?}"),
    };
    assert_eq!(ModuleConfig::from_records(&records).expect("records must reassemble"), config);
}

#[test]
fn test_config_dump_fragment_carries_more_data_flag() {
    let fragment = HmtlMessage::new(128, MessageBody::DumpConfig(vec![ConfigRecord::Address(128)]))
        .with_flags(MessageFlags::RESPONSE | MessageFlags::MORE_DATA);
    let decoded = roundtrip(fragment);
    assert!(decoded.flags.contains(MessageFlags::MORE_DATA));
}

// ── Codec + framing together ──────────────────────────────────────────────────

#[test]
fn test_frame_assembler_splits_encoded_stream() {
    // Arrange: several messages interleaved with acknowledgement lines.
    let messages = vec![
        HmtlMessage::value(1, 0, 5),
        HmtlMessage::rgb(2, 1, Rgb::new(1, 2, 3)),
        HmtlMessage::program(3, 2, ProgramPayload::none()),
    ];
    let mut stream = Vec::new();
    for msg in &messages {
        stream.extend(encode_message(msg).unwrap());
        stream.extend_from_slice(b"ok\r\n");
    }

    // Act
    let mut assembler = FrameAssembler::new();
    let items: Vec<_> = stream.iter().filter_map(|&b| assembler.push_byte(b)).collect();

    // Assert
    assert_eq!(items.len(), 6);
    for (i, msg) in messages.iter().enumerate() {
        let (data, is_hmtl) = &items[2 * i];
        assert!(is_hmtl);
        assert_eq!(&decode_message(data).unwrap().0, msg);
        assert_eq!(items[2 * i + 1], (b"ok".to_vec(), false));
    }
}
