//! End-to-end scenarios against the public `Engine` API: heartbeat
//! auto-insertion under sustained data traffic, and CTSI timeliness
//! rejection. Complements the unit tests inside `connection::engine`
//! (client open, retransmission renumbering, ConnReq field zeroing).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rasta_core::adapter::{BufferUtilisation, DiagnosticCounters, NotificationSink, RedundancyChannel, SystemAdapter};
use rasta_core::config::{Config, ConnectionConfig, Md4InitialValue, SafetyCodeType};
use rasta_core::error::Fatal;
use rasta_core::md4::DefaultMd4;
use rasta_core::message::{create_data_message, get_message_type, update_message_header, DisconnectReason, HeaderFields, MessageType};
use rasta_core::{Engine, Event};

#[derive(Default)]
struct ChannelState {
    outbound: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
}

/// `RedundancyChannel` whose buffers live behind a shared handle, so the
/// test can inject inbound bytes and inspect outbound bytes after the
/// channel itself has been moved into the engine.
#[derive(Clone, Default)]
struct FakeChannel(Rc<RefCell<ChannelState>>);

impl RedundancyChannel for FakeChannel {
    fn open(&mut self, _channel_id: u32) -> Result<(), Fatal> {
        Ok(())
    }
    fn close(&mut self, _channel_id: u32) -> Result<(), Fatal> {
        Ok(())
    }
    fn send(&mut self, _channel_id: u32, bytes: &[u8]) -> Result<(), Fatal> {
        self.0.borrow_mut().outbound.push(bytes.to_vec());
        Ok(())
    }
    fn read(&mut self, _channel_id: u32) -> Result<Option<Vec<u8>>, Fatal> {
        Ok(self.0.borrow_mut().inbound.pop_front())
    }
}

struct FakeSystem {
    now: u32,
    granularity: u32,
}

impl SystemAdapter for FakeSystem {
    fn now_ms(&self) -> u32 {
        self.now
    }
    fn timer_granularity_ms(&self) -> u32 {
        self.granularity
    }
    fn random_u32(&mut self) -> u32 {
        0
    }
    fn fatal_error(&self, _err: &Fatal) {}
}

#[derive(Default)]
struct FakeSink;

impl NotificationSink for FakeSink {
    fn connection_state_notification(
        &mut self,
        _connection_id: u32,
        _utilisation: BufferUtilisation,
        _opposite_buffer_size: u32,
        _disc_reason: DisconnectReason,
        _detailed_disc_reason: u16,
    ) {
    }
    fn diagnostic_notification(&mut self, _connection_id: u32, _counters: DiagnosticCounters, _histogram: [u32; 4]) {}
}

fn config() -> Config {
    Config {
        rasta_network_id: 1,
        t_max: 750,
        t_h: 300,
        safety_code_type: SafetyCodeType::LowerMd4,
        m_w_a: 10,
        n_send_max: 20,
        n_max_packet: 1,
        n_diag_window: 100,
        connection_configurations: vec![ConnectionConfig { connection_id: 0, sender_id: 0x61, receiver_id: 0x62 }],
        md4_initial_value: Md4InitialValue { a: 0x67452301, b: 0xEFCDAB89, c: 0x98BADCFE, d: 0x10325476 },
        diag_timing_distr_intervals: [100, 200, 400, 750],
    }
}

/// Builds a Data PDU as the peer (`0x62 -> 0x61`) would send it, with the
/// confirmed_sequence_number/time_stamp stamped to the given values and the
/// trailer resealed, the way a real sender's transmission pipeline would.
fn peer_data_message(sequence_number: u32, confirmed_sequence_number: u32, confirmed_time_stamp: u32) -> Vec<u8> {
    let h = HeaderFields { sender_id: 0x62, receiver_id: 0x61, sequence_number, confirmed_time_stamp };
    let mut msg = create_data_message(h, &[0xAB], SafetyCodeType::LowerMd4, config().md4_initial_value, &DefaultMd4).unwrap();
    update_message_header(&mut msg, 0, confirmed_sequence_number, SafetyCodeType::LowerMd4, config().md4_initial_value, &DefaultMd4);
    msg
}

#[test]
fn sustained_data_traffic_triggers_an_auto_heartbeat() {
    let channel = FakeChannel::default();
    let mut engine = Engine::new(channel.clone(), FakeSystem { now: 0, granularity: 0 }, FakeSink, DefaultMd4);
    engine.init(config()).unwrap();
    engine.init_connection_data(0).unwrap();

    // m_w_a == 10: the tenth accepted Data message should push CS_T ten
    // slots past CS_T_last_sent (both start at 0) and enqueue a heartbeat.
    for sn in 0..10u32 {
        channel.0.borrow_mut().inbound.push_back(peer_data_message(sn, 0, 0));
        let (event, sn_in_seq, cts_in_seq) = engine.receive_message(0).unwrap();
        assert_eq!(event, Event::DataReceived);
        assert!(sn_in_seq);
        assert!(cts_in_seq);
        assert!(engine.process_received_message(0).unwrap());
    }

    let heartbeat_sent = channel.0.borrow().outbound.iter().any(|bytes| get_message_type(bytes) == Some(MessageType::Heartbeat));
    assert!(heartbeat_sent, "ten accepted data messages should have enqueued and drained a heartbeat");
}

#[test]
fn confirmed_time_stamp_outside_t_max_fails_ctsi() {
    let channel = FakeChannel::default();
    let mut engine = Engine::new(channel.clone(), FakeSystem { now: 0, granularity: 0 }, FakeSink, DefaultMd4);
    engine.init(config()).unwrap();
    engine.init_connection_data(0).unwrap();

    // CTS_R starts at 0 (client role, per init_connection_data); a
    // confirmed_time_stamp exactly t_max away is out of the sliding window.
    channel.0.borrow_mut().inbound.push_back(peer_data_message(0, 0, 750));
    let (event, _, cts_in_seq) = engine.receive_message(0).unwrap();
    assert_eq!(event, Event::DataReceived);
    assert!(!cts_in_seq);
}

#[test]
fn confirmed_time_stamp_within_t_max_passes_ctsi() {
    let channel = FakeChannel::default();
    let mut engine = Engine::new(channel.clone(), FakeSystem { now: 0, granularity: 0 }, FakeSink, DefaultMd4);
    engine.init(config()).unwrap();
    engine.init_connection_data(0).unwrap();

    channel.0.borrow_mut().inbound.push_back(peer_data_message(0, 0, 0));
    let (event, _, cts_in_seq) = engine.receive_message(0).unwrap();
    assert_eq!(event, Event::DataReceived);
    assert!(cts_in_seq);
}
