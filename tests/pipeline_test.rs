//! End-to-end pipeline scenarios with fabricated time.

use chrono::Utc;
use mocap_stream_agent::{
    hub::SampleIngestHub,
    sender::{PeriodicSender, SendChannel},
    sensors::{MotionEvent, OrientationEvent, RawAxes, RawRotationRate, SensorState, SourceEvent, Vec3},
};
use serde_json::Value;

/// Send channel that records every frame and can be toggled open/closed.
struct MockChannel {
    open: bool,
    frames: Vec<Vec<u8>>,
}

impl MockChannel {
    fn new() -> Self {
        Self {
            open: true,
            frames: Vec::new(),
        }
    }

    fn messages(&self) -> Vec<Value> {
        self.frames
            .iter()
            .map(|f| serde_json::from_slice(f).unwrap())
            .collect()
    }
}

impl SendChannel for MockChannel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, bytes: &[u8]) {
        self.frames.push(bytes.to_vec());
    }
}

fn accel_event(x: f64, y: f64, z: f64) -> SourceEvent {
    SourceEvent::Motion(MotionEvent {
        acceleration: Some(RawAxes {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }),
        acceleration_including_gravity: None,
        rotation_rate: None,
    })
}

#[test]
fn idle_ingest_changes_nothing_but_the_snapshot() {
    let mut hub = SampleIngestHub::new("phone-1");

    for i in 0..50 {
        hub.ingest(&accel_event(i as f64, 0.0, 0.0), i as f64 * 10.0);
    }

    assert!(!hub.is_capturing());
    assert!(!hub.poll(100_000.0, Utc::now()));
    assert_eq!(hub.dataset().row_count(), 0);
    assert_eq!(hub.snapshot().accelerometer, Some(Vec3::new(49.0, 0.0, 0.0)));
}

#[test]
fn second_start_before_expiry_yields_one_row_with_first_params() {
    let mut hub = SampleIngestHub::new("phone-1");

    assert!(hub.start_window("move_1", 1000.0, 0.0));
    assert!(!hub.start_window("move_2", 200.0, 100.0));

    // The second window's shorter duration must not apply.
    assert!(!hub.poll(300.0, Utc::now()));
    assert!(hub.poll(1000.0, Utc::now()));
    assert!(!hub.poll(2000.0, Utc::now()));

    assert_eq!(hub.dataset().row_count(), 1);
    let text = hub.dataset().to_export_text();
    let data_line = text.lines().nth(1).unwrap();
    assert!(data_line.starts_with("move_1,"));
    assert!(!text.contains("move_2"));
}

#[test]
fn trigger_after_expiry_finishes_first_window_then_arms_next() {
    let mut hub = SampleIngestHub::new("phone-1");

    assert!(hub.start_window("first", 100.0, 0.0));
    hub.ingest(&accel_event(1.0, 0.0, 0.0), 50.0);

    // A trigger arriving well past the deadline: the run loop drives the
    // due finish first, then arms the new window.
    assert!(!hub.start_window("second", 100.0, 500.0));
    assert!(hub.poll(500.0, Utc::now()));
    assert!(hub.start_window("second", 100.0, 500.0));

    hub.ingest(&accel_event(2.0, 0.0, 0.0), 550.0);
    assert!(hub.poll(600.0, Utc::now()));

    assert_eq!(hub.dataset().row_count(), 2);
    let text = hub.dataset().to_export_text();
    assert!(text.lines().nth(1).unwrap().starts_with("first,"));
    assert!(text.lines().nth(2).unwrap().starts_with("second,"));
}

#[test]
fn recorded_window_matches_expected_row_shape() {
    let mut hub = SampleIngestHub::new("phone-1");

    hub.start_window("move_1", 1000.0, 0.0);
    hub.ingest(&accel_event(1.0, 2.0, 3.0), 200.0);
    assert!(hub.poll(1000.0, Utc::now()));

    let text = hub.dataset().to_export_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "label,device_id,start_time_iso,duration_ms,accel,gyro,orientation,mag,gravity"
    );

    // Unescape the accel field through a standard CSV parse of the data line.
    let fields = parse_csv_line(lines[1]);
    assert_eq!(fields[0], "move_1");
    assert_eq!(fields[1], "phone-1");
    assert_eq!(fields[3], "1000");

    let accel: Value = serde_json::from_str(&fields[4]).unwrap();
    assert_eq!(accel.as_array().unwrap().len(), 1);
    assert_eq!(accel[0]["t"], 200.0);
    assert_eq!(accel[0]["ax"], 1.0);
    assert_eq!(accel[0]["ay"], 2.0);
    assert_eq!(accel[0]["az"], 3.0);

    // A motion event with no rotation rate still writes a zeroed gyro sample.
    let gyro: Value = serde_json::from_str(&fields[5]).unwrap();
    assert_eq!(gyro[0]["gx"], 0.0);

    // Channels that never fired stay as empty arrays.
    for idx in [6, 7, 8] {
        let parsed: Value = serde_json::from_str(&fields[idx]).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }
}

#[test]
fn window_timestamps_are_bounded_and_ordered() {
    let mut hub = SampleIngestHub::new("phone-1");
    let duration = 500.0;

    hub.start_window("bounds", duration, 1000.0);
    for i in 0..10 {
        hub.ingest(&accel_event(0.0, 0.0, 1.0), 1000.0 + i as f64 * 50.0);
    }
    assert!(hub.poll(1000.0 + duration, Utc::now()));

    let text = hub.dataset().to_export_text();
    let fields = parse_csv_line(text.lines().nth(1).unwrap());
    let accel: Value = serde_json::from_str(&fields[4]).unwrap();
    let ts: Vec<f64> = accel
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["t"].as_f64().unwrap())
        .collect();

    assert!(ts.iter().all(|t| *t >= 0.0 && *t <= duration));
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn fixed_interval_ticks_send_contiguous_seq() {
    let mut sender = PeriodicSender::new("phone-1");
    let mut channel = MockChannel::new();
    let state = SensorState::new();

    // 350ms at 100ms interval with no sensor activity: exactly 3 messages.
    sender.start(100, 0.0);
    let sent = sender.poll(350.0, Utc::now(), &state, &mut channel);
    assert_eq!(sent, 3);

    let messages = channel.messages();
    for (i, msg) in messages.iter().enumerate() {
        assert_eq!(msg["seq"], i as u64);
        assert_eq!(msg["deviceId"], "phone-1");
        for key in [
            "accelerometer",
            "gyroscope",
            "orientation",
            "rotation",
            "magnetometer",
            "gravity",
        ] {
            assert_eq!(msg["sensors"][key], Value::Null, "channel {key}");
        }
        assert!(msg["timestamp"].as_i64().unwrap() > 0);
    }
}

#[test]
fn closed_channel_ticks_do_not_consume_seq() {
    let mut sender = PeriodicSender::new("phone-1");
    let mut channel = MockChannel::new();
    let state = SensorState::new();

    sender.start(100, 0.0);
    sender.poll(100.0, Utc::now(), &state, &mut channel);

    channel.open = false;
    sender.poll(300.0, Utc::now(), &state, &mut channel);

    channel.open = true;
    sender.poll(400.0, Utc::now(), &state, &mut channel);

    let seqs: Vec<u64> = channel
        .messages()
        .iter()
        .map(|m| m["seq"].as_u64().unwrap())
        .collect();
    assert_eq!(seqs, vec![0, 1]);
    assert_eq!(sender.skipped_ticks(), 2);
}

#[test]
fn sender_transmits_latest_snapshot_not_per_event() {
    let mut hub = SampleIngestHub::new("phone-1");
    let mut sender = PeriodicSender::new("phone-1");
    let mut channel = MockChannel::new();

    sender.start(100, 0.0);

    // Many ingests between ticks; only the latest survives on the wire.
    for i in 1..=20 {
        hub.ingest(&accel_event(i as f64, 0.0, 0.0), i as f64);
    }
    sender.poll(100.0, Utc::now(), hub.snapshot(), &mut channel);

    let messages = channel.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sensors"]["accelerometer"]["x"], 20.0);
}

#[test]
fn corrected_gyro_axis_mapping_reaches_the_wire() {
    let mut hub = SampleIngestHub::new("phone-1");
    let mut sender = PeriodicSender::new("phone-1");
    let mut channel = MockChannel::new();

    hub.ingest(
        &SourceEvent::Motion(MotionEvent {
            acceleration: None,
            acceleration_including_gravity: Some(RawAxes {
                x: Some(0.0),
                y: Some(0.0),
                z: Some(9.8),
            }),
            rotation_rate: Some(RawRotationRate {
                alpha: Some(11.0),
                beta: Some(22.0),
                gamma: Some(33.0),
            }),
        }),
        0.0,
    );

    sender.start(100, 0.0);
    sender.poll(100.0, Utc::now(), hub.snapshot(), &mut channel);

    let msg = &channel.messages()[0];
    assert_eq!(msg["sensors"]["gyroscope"]["x"], 11.0);
    assert_eq!(msg["sensors"]["gyroscope"]["y"], 22.0);
    assert_eq!(msg["sensors"]["gyroscope"]["z"], 33.0);
    // Gravity-including acceleration used only because the excluded one was absent.
    assert_eq!(msg["sensors"]["accelerometer"]["z"], 9.8);
}

#[test]
fn csv_escape_round_trips_awkward_values() {
    use mocap_stream_agent::dataset::{csv_escape, Dataset, DatasetRow};

    let nasty = "a,\"b\"\nc";
    let escaped = csv_escape(nasty);
    assert_eq!(unescape_csv_field(&escaped), nasty);

    let mut dataset = Dataset::new();
    dataset.append_row(&DatasetRow {
        label: nasty.to_string(),
        device_id: "dev".to_string(),
        start_time_iso: "2026-01-01T00:00:00.000Z".to_string(),
        duration_ms: 1000,
        accel: "[]".to_string(),
        gyro: "[]".to_string(),
        orientation: "[]".to_string(),
        mag: "[]".to_string(),
        gravity: "[]".to_string(),
    });

    let text = dataset.to_export_text();
    // The label spans a line break, so reassemble the logical record.
    let record = text.splitn(2, '\n').nth(1).unwrap();
    let fields = parse_csv_line(record);
    assert_eq!(fields[0], nasty);
}

#[test]
fn orientation_events_record_into_their_own_buffer() {
    let mut hub = SampleIngestHub::new("phone-1");

    hub.start_window("turn", 1000.0, 0.0);
    hub.ingest(
        &SourceEvent::Orientation(OrientationEvent {
            alpha: Some(90.0),
            beta: Some(0.0),
            gamma: None,
        }),
        250.0,
    );
    hub.ingest(&SourceEvent::Magnetometer(Vec3::new(1.0, 2.0, 3.0)), 300.0);
    hub.ingest(&SourceEvent::Gravity(Vec3::new(0.0, 0.0, 9.8)), 350.0);
    assert!(hub.poll(1000.0, Utc::now()));

    let text = hub.dataset().to_export_text();
    let fields = parse_csv_line(text.lines().nth(1).unwrap());

    let orientation: Value = serde_json::from_str(&fields[6]).unwrap();
    assert_eq!(orientation[0]["alpha"], 90.0);
    assert_eq!(orientation[0]["gamma"], 0.0);

    let mag: Value = serde_json::from_str(&fields[7]).unwrap();
    assert_eq!(mag[0]["mx"], 1.0);

    let gravity: Value = serde_json::from_str(&fields[8]).unwrap();
    assert_eq!(gravity[0]["gz"], 9.8);
}

/// Parse one logical CSV record into unescaped fields (standard quoting rules).
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Undo `csv_escape` on a single field.
fn unescape_csv_field(field: &str) -> String {
    if field.starts_with('"') && field.ends_with('"') && field.len() >= 2 {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}
