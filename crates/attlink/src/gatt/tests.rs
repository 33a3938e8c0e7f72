//! Unit tests for GATT discovery, subscription and reassembly

use super::*;
use crate::att::{AttErrorCode, DiscoveryMode, DiscoveryRecord, HandleRange};
use crate::error::{Error, Violation};
use crate::transport::mock::MockStream;
use crate::transport::{ChannelConfig, NotificationFilter};
use crate::uuid::Uuid;
use std::ops::ControlFlow;

fn gatt<I, P>(inbound: I) -> GattClient<MockStream>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    GattClient::new(MockStream::with_inbound(inbound), ChannelConfig::default())
}

fn range(start: u16, end: u16) -> HandleRange {
    HandleRange::new(start, end).unwrap()
}

fn violation<T: std::fmt::Debug>(result: crate::Result<T>) -> Violation {
    match result {
        Err(Error::ProtocolViolation(v)) => v,
        other => panic!("expected a protocol violation, got {:?}", other),
    }
}

/// Characteristic declaration record with a 16-bit UUID
fn char_record(handle: u16, properties: u8, value_handle: u16, uuid: u16) -> Vec<u8> {
    let mut record = handle.to_le_bytes().to_vec();
    record.push(properties);
    record.extend_from_slice(&value_handle.to_le_bytes());
    record.extend_from_slice(&uuid.to_le_bytes());
    record
}

fn char_response(records: &[Vec<u8>]) -> Vec<u8> {
    let mut pdu = vec![0x09, records[0].len() as u8];
    for record in records {
        pdu.extend_from_slice(record);
    }
    pdu
}

fn notification(handle: u16, payload: &[u8]) -> Vec<u8> {
    let mut pdu = vec![0x1B];
    pdu.extend_from_slice(&handle.to_le_bytes());
    pdu.extend_from_slice(payload);
    pdu
}

#[test]
fn test_primary_service_listing() {
    let mut client = gatt([
        vec![
            0x11, 0x06, 0x01, 0x00, 0x07, 0x00, 0x00, 0x18, 0x08, 0x00, 0x0B, 0x00, 0x0F, 0x18,
        ],
        vec![0x01, 0x10, 0x09, 0x00, 0x0A],
    ]);

    let discovery = client
        .discover(HandleRange::full(), DiscoveryMode::PrimaryService)
        .unwrap();
    assert_eq!(discovery.outcome, Enumeration::Exhausted);
    assert_eq!(discovery.len(), 2);
    assert_eq!(
        discovery.records[1],
        DiscoveryRecord::PrimaryService {
            handle: 0x0008,
            end_group_handle: 0x000B,
            uuid: Uuid::Short(0x180F),
        }
    );
    assert_eq!(
        discovery.records[0].to_string(),
        "0x0001: end = 0x0007, uuid = 00001800-0000-1000-8000-00805f9b34fb"
    );

    let sent = &client.channel().get_ref().sent;
    assert_eq!(sent[0], vec![0x10, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28]);
    assert_eq!(sent[1], vec![0x10, 0x09, 0x00, 0xFF, 0xFF, 0x00, 0x28]);
}

#[test]
fn test_handle_out_of_range_is_rejected() {
    let mut client = gatt([char_response(&[char_record(0x0020, 0x02, 0x0021, 0x2A00)])]);
    let v = violation(client.enumerate(range(0x0010, 0x001F), DiscoveryMode::Characteristic, |_| {
        ControlFlow::Continue(())
    }));
    assert_eq!(
        v,
        Violation::HandleOutOfRange {
            handle: 0x0020,
            start: 0x0010,
            end: 0x001F
        }
    );

    // A record that goes backwards is just as bad
    let mut client = gatt([
        char_response(&[char_record(0x0012, 0x02, 0x0013, 0x2A00)]),
        char_response(&[char_record(0x0011, 0x02, 0x0012, 0x2A01)]),
    ]);
    let mut visited = Vec::new();
    let v = violation(client.enumerate(range(0x0010, 0x001F), DiscoveryMode::Characteristic, |r| {
        visited.push(r.handle());
        ControlFlow::Continue(())
    }));
    assert!(matches!(v, Violation::HandleOutOfRange { handle: 0x0011, start: 0x0013, .. }));
    assert_eq!(visited, vec![0x0012]);
}

#[test]
fn test_duplicate_uuid_resolves_to_first_match() {
    let mut client = gatt([
        char_response(&[
            char_record(0x000B, 0x12, 0x000C, 0xFFE1),
            char_record(0x000F, 0x12, 0x0010, 0xFFE1),
        ]),
        char_response(&[
            char_record(0x0012, 0x08, 0x0013, 0xFFE2),
            char_record(0x0014, 0x08, 0x0015, 0xFFE2),
        ]),
        vec![0x01, 0x08, 0x16, 0x00, 0x0A],
    ]);

    let found = client
        .find_characteristics(range(0x0001, 0x0030), &[0xFFE1, 0xFFE2])
        .unwrap();
    assert_eq!(found, vec![Some(0x000C), Some(0x0013)]);

    // Stopped once both were resolved, not at the end of the range
    let stream = client.channel().get_ref();
    assert_eq!(stream.sent.len(), 2);
    assert_eq!(stream.sent[1], vec![0x08, 0x10, 0x00, 0x30, 0x00, 0x03, 0x28]);
    assert_eq!(stream.pending(), 1);
}

#[test]
fn test_unresolved_characteristics() {
    let mut client = gatt([
        char_response(&[char_record(0x000B, 0x12, 0x000C, 0xFFE1)]),
        vec![0x01, 0x08, 0x0C, 0x00, 0x0A],
    ]);
    match client.resolve_characteristics(range(0x0001, 0x0030), &[0xFFE1, 0xFFE2]) {
        Err(Error::Incomplete {
            resolved: 1,
            requested: 2,
        }) => {}
        other => panic!("unexpected result: {:?}", other),
    }

    let mut client = gatt(Vec::<Vec<u8>>::new());
    assert!(client.find_characteristics(range(1, 2), &[]).unwrap().is_empty());
    assert!(client.channel().get_ref().sent.is_empty());
}

#[test]
fn test_long_and_short_records() {
    let mut long = vec![0x09, 0x15, 0x0B, 0x00, 0x1A, 0x0C, 0x00];
    long.extend_from_slice(&[0x5A; 16]);
    let mut client = gatt([
        long,
        char_response(&[char_record(0x000D, 0x02, 0x000E, 0x2A19)]),
        vec![0x01, 0x08, 0x0E, 0x00, 0x0A],
    ]);

    let discovery = client
        .discover(HandleRange::full(), DiscoveryMode::Characteristic)
        .unwrap();
    assert_eq!(discovery.outcome, Enumeration::Exhausted);
    assert_eq!(*discovery.records[0].uuid(), Uuid::Long([0x5A; 16]));
    assert_eq!(*discovery.records[1].uuid(), Uuid::Short(0x2A19));

    // Long-form Find Information records are accepted too
    let mut info = vec![0x05, 0x02, 0x20, 0x00];
    info.extend_from_slice(&[0x11; 16]);
    let mut client = gatt([info]);
    let discovery = client
        .discover(range(0x0020, 0x0020), DiscoveryMode::Descriptor)
        .unwrap();
    assert_eq!(
        discovery.records,
        vec![DiscoveryRecord::Descriptor {
            handle: 0x0020,
            uuid: Uuid::Long([0x11; 16])
        }]
    );
    assert_eq!(discovery.outcome, Enumeration::Exhausted);
}

#[test]
fn test_malformed_records() {
    let mut client = gatt([vec![0x09, 0x08, 0x0B, 0x00, 0x12, 0x0C, 0x00, 0xE1, 0xFF, 0x00]]);
    assert_eq!(
        violation(client.discover(HandleRange::full(), DiscoveryMode::Characteristic)),
        Violation::BadRecordLength(8)
    );

    let mut client = gatt([vec![0x05, 0x03, 0x0B, 0x00, 0x02, 0x29]]);
    assert_eq!(
        violation(client.discover(HandleRange::full(), DiscoveryMode::Descriptor)),
        Violation::BadRecordLength(3)
    );

    let mut ragged = char_response(&[char_record(0x000B, 0x12, 0x000C, 0xFFE1)]);
    ragged.push(0x00);
    let mut client = gatt([ragged]);
    assert_eq!(
        violation(client.discover(HandleRange::full(), DiscoveryMode::Characteristic)),
        Violation::RaggedRecords {
            stride: 7,
            remainder: 1
        }
    );

    let mut client = gatt([vec![0x0B, 0x06, 0x00]]);
    assert_eq!(
        violation(client.discover(HandleRange::full(), DiscoveryMode::PrimaryService)),
        Violation::UnexpectedOpcode {
            expected: 0x11,
            actual: 0x0B
        }
    );
}

#[test]
fn test_error_responses() {
    // Attribute Not Found at the start handle ends the walk with no records
    let mut client = gatt([vec![0x01, 0x04, 0x05, 0x00, 0x0A]]);
    let discovery = client
        .discover(range(0x0005, 0x0009), DiscoveryMode::Descriptor)
        .unwrap();
    assert!(discovery.is_empty());
    assert_eq!(discovery.outcome, Enumeration::Exhausted);

    let mut client = gatt([vec![0x01, 0x04, 0x05, 0x00, 0x0C]]);
    assert_eq!(
        violation(client.discover(range(0x0005, 0x0009), DiscoveryMode::Descriptor)),
        Violation::UnexpectedErrorResponse {
            request: 0x04,
            handle: 0x0005,
            code: AttErrorCode::InsufficientEncryptionKeySize,
        }
    );

    // Right code, wrong handle
    let mut client = gatt([vec![0x01, 0x04, 0x06, 0x00, 0x0A]]);
    assert!(matches!(
        violation(client.discover(range(0x0005, 0x0009), DiscoveryMode::Descriptor)),
        Violation::UnexpectedErrorResponse { handle: 0x0006, .. }
    ));

    // Right code, wrong request opcode
    let mut client = gatt([vec![0x01, 0x08, 0x05, 0x00, 0x0A]]);
    assert!(client
        .discover(range(0x0005, 0x0009), DiscoveryMode::Descriptor)
        .is_err());
}

#[test]
fn test_short_or_missing_response_is_incomplete() {
    let mut client = gatt([vec![0x11, 0x06]]);
    let discovery = client
        .discover(HandleRange::full(), DiscoveryMode::PrimaryService)
        .unwrap();
    assert_eq!(discovery.outcome, Enumeration::Incomplete);
    assert!(!discovery.outcome.is_complete());

    let mut client = gatt(Vec::<Vec<u8>>::new());
    let outcome = client
        .enumerate(HandleRange::full(), DiscoveryMode::Descriptor, |_| {
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(outcome, Enumeration::Incomplete);
}

#[test]
fn test_record_at_last_handle_ends_walk() {
    let mut client = gatt([vec![0x05, 0x01, 0xFF, 0xFF, 0x02, 0x29]]);
    let discovery = client
        .discover(range(0xFFF0, 0xFFFF), DiscoveryMode::Descriptor)
        .unwrap();
    assert_eq!(discovery.outcome, Enumeration::Exhausted);
    assert_eq!(discovery.len(), 1);
    assert_eq!(client.channel().get_ref().sent.len(), 1);
}

#[test]
fn test_spurious_mtu_request_is_absorbed() {
    let mut client = gatt([
        vec![0x02, 0x00, 0x02],
        vec![0x05, 0x01, 0x0D, 0x00, 0x02, 0x29],
    ]);
    let found = client
        .find_descriptor(range(0x000D, 0x0010), 0x2902)
        .unwrap();
    assert_eq!(found, Some(0x000D));

    let sent = &client.channel().get_ref().sent;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], vec![0x04, 0x0D, 0x00, 0x10, 0x00]);
    assert_eq!(sent[1], vec![0x01, 0x02, 0x00, 0x00, 0x06]);
}

#[test]
fn test_subscribe_notifications() {
    let mut client = gatt([
        vec![0x05, 0x01, 0x0D, 0x00, 0x01, 0x29, 0x0E, 0x00, 0x02, 0x29],
        vec![0x13],
    ]);
    assert_eq!(client.subscribe_notifications(0x000C, 0x0010).unwrap(), 0x000E);

    let sent = &client.channel().get_ref().sent;
    assert_eq!(sent[0], vec![0x04, 0x0D, 0x00, 0x10, 0x00]);
    assert_eq!(sent[1], vec![0x12, 0x0E, 0x00, 0x01, 0x00]);
}

#[test]
fn test_subscribe_accepts_silence() {
    let mut client = gatt([vec![0x05, 0x01, 0x0D, 0x00, 0x02, 0x29]]);
    assert_eq!(client.subscribe_notifications(0x000C, 0x000D).unwrap(), 0x000D);
    assert_eq!(client.channel().get_ref().sent.len(), 2);
}

#[test]
fn test_subscribe_without_cccd() {
    let mut client = gatt([vec![0x01, 0x04, 0x0D, 0x00, 0x0A]]);
    assert!(matches!(
        client.subscribe_notifications(0x000C, 0x0010),
        Err(Error::DescriptorNotFound)
    ));

    // No room for a descriptor after the value handle
    let mut client = gatt(Vec::<Vec<u8>>::new());
    assert!(matches!(
        client.subscribe_notifications(0x0010, 0x0010),
        Err(Error::DescriptorNotFound)
    ));
    assert!(matches!(
        client.subscribe_notifications(0x0012, 0x0010),
        Err(Error::DescriptorNotFound)
    ));
    assert!(client.channel().get_ref().sent.is_empty());

    // Only the 16-bit form counts
    let mut long = vec![0x05, 0x02, 0x0D, 0x00];
    long.extend_from_slice(&Uuid::Short(0x2902).to_bytes_le());
    let mut client = gatt([long]);
    assert!(matches!(
        client.subscribe_notifications(0x000C, 0x000D),
        Err(Error::DescriptorNotFound)
    ));
}

#[test]
fn test_service_range() {
    let mut client = gatt([vec![0x07, 0x19, 0x00, 0x20, 0x00]]);
    assert_eq!(client.get_service_range(0x18D0).unwrap(), range(0x0019, 0x0020));
    assert_eq!(
        client.channel().get_ref().sent[0],
        vec![0x06, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28, 0xD0, 0x18]
    );

    let mut client = gatt([vec![0x07, 0x19, 0x00, 0x20, 0x00, 0x30, 0x00, 0x40, 0x00]]);
    assert_eq!(
        violation(client.get_service_range(0x18D0)),
        Violation::MalformedServiceRange
    );

    let mut client = gatt([vec![0x01, 0x06, 0x01, 0x00, 0x0A]]);
    assert_eq!(
        violation(client.get_service_range(0x18D0)),
        Violation::MalformedServiceRange
    );

    let mut client = gatt([vec![0x07, 0x20, 0x00, 0x19, 0x00]]);
    assert_eq!(
        violation(client.get_service_range(0x18D0)),
        Violation::InvalidRange {
            start: 0x0020,
            end: 0x0019
        }
    );

    let mut client = gatt([vec![0x07, 0x19, 0x00]]);
    assert_eq!(
        violation(client.get_service_range(0x18D0)),
        Violation::BadLength(3)
    );

    let mut client = gatt(Vec::<Vec<u8>>::new());
    assert!(matches!(client.get_service_range(0x18D0), Err(Error::Timeout)));
}

#[test]
fn test_subscribe_characteristic() {
    let mut client = gatt([
        vec![0x07, 0x30, 0x00, 0x3A, 0x00],
        // Stray notification while searching is dropped
        notification(0x0042, &[0x01, 0x02]),
        char_response(&[
            char_record(0x0031, 0x08, 0x0032, 0xFEE2),
            char_record(0x0033, 0x10, 0x0034, 0xFEE3),
        ]),
        vec![0x05, 0x01, 0x35, 0x00, 0x02, 0x29],
        vec![0x13],
    ]);

    let subscription = client.subscribe_characteristic(0xFEEA, 0xFEE3).unwrap();
    assert_eq!(
        subscription,
        Subscription {
            service: range(0x0030, 0x003A),
            value_handle: 0x0034,
            cccd_handle: 0x0035,
        }
    );
    assert_eq!(client.channel().filter(), NotificationFilter::Only(0x0034));
}

#[test]
fn test_reassemble_in_three_fragments() {
    let payload: Vec<u8> = (0..36).collect();
    let first = notification(0x000C, &payload[..20]);
    let mut client = gatt([
        notification(0x000C, &payload[20..30]),
        notification(0x000C, &payload[30..]),
    ]);

    assert_eq!(client.reassemble_notification(&first, 36).unwrap(), payload);
}

#[test]
fn test_reassemble_rejects_foreign_handle() {
    let first = notification(0x000C, &[0; 20]);
    let mut client = gatt([notification(0x000C, &[0; 10]), notification(0x000D, &[0; 6])]);
    assert_eq!(
        violation(client.reassemble_notification(&first, 36)),
        Violation::HandleMismatch {
            expected: 0x000C,
            actual: 0x000D
        }
    );
}

#[test]
fn test_reassemble_rejects_overshoot() {
    let first = notification(0x000C, &[0; 20]);
    let mut client = gatt([notification(0x000C, &[0; 10]), notification(0x000C, &[0; 8])]);
    assert_eq!(
        violation(client.reassemble_notification(&first, 36)),
        Violation::FragmentOvershoot {
            len: 8,
            remaining: 6
        }
    );
}

#[test]
fn test_reassemble_truncated() {
    let first = notification(0x000C, &[0; 20]);

    let mut client = gatt([notification(0x000C, &[0; 10])]);
    assert!(matches!(
        client.reassemble_notification(&first, 36),
        Err(Error::Truncated)
    ));

    let mut client = gatt([vec![0x1B, 0x0C]]);
    assert!(matches!(
        client.reassemble_notification(&first, 36),
        Err(Error::Truncated)
    ));

    // Beyond what one buffer can hold
    let mut client = gatt(Vec::<Vec<u8>>::new());
    assert!(matches!(
        client.reassemble_notification(&first, 254),
        Err(Error::Truncated)
    ));

    // Nothing more to collect
    assert_eq!(client.reassemble_notification(&first, 20).unwrap(), vec![0; 20]);
}

#[test]
fn test_read_and_write() {
    let mut client = gatt([
        vec![0x0B, 0x41, 0x42],
        vec![0x01, 0x0A, 0x03, 0x00, 0x02],
        vec![0x13],
    ]);

    assert_eq!(client.read(0x0003).unwrap(), b"AB".to_vec());
    match client.read(0x0003) {
        Err(Error::Att {
            request: 0x0A,
            handle: 0x0003,
            code: AttErrorCode::ReadNotPermitted,
        }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    client.write_request(0x000E, &[0x01, 0x00]).unwrap();
    client.write_command(0x0032, &[0xFE, 0xEA]).unwrap();

    let sent = &client.channel().get_ref().sent;
    assert_eq!(sent[2], vec![0x12, 0x0E, 0x00, 0x01, 0x00]);
    assert_eq!(sent[3], vec![0x52, 0x32, 0x00, 0xFE, 0xEA]);
}

#[test]
fn test_read_by_type_and_battery_level() {
    let mut client = gatt([
        vec![0x09, 0x04, 0x03, 0x00, 0x41, 0x42],
        vec![0x09, 0x03, 0x2A, 0x00, 0x57],
        vec![0x01, 0x08, 0x01, 0x00, 0x0A],
    ]);

    assert_eq!(
        client.read_by_type(HandleRange::full(), 0x2A00).unwrap(),
        (0x0003, vec![0x41, 0x42])
    );
    assert_eq!(client.battery_level().unwrap(), Some((0x002A, 0x57)));
    assert_eq!(client.battery_level().unwrap(), None);
    assert_eq!(
        client.channel().get_ref().sent[1],
        vec![0x08, 0x01, 0x00, 0xFF, 0xFF, 0x19, 0x2A]
    );
}
