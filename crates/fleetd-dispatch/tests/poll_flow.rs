//! End-to-end poll flow over a real (in-memory) database: user →
//! device with a 09:00 regime slot → poll at 09:00 claims the freshly
//! scheduled command → poll at 09:01 comes back empty.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fleetd_dispatch::{DispatchError, Dispatcher, WireCommand};
use fleetd_queue::{CommandFilter, CommandQueue, CommandState, QueueError};
use fleetd_registry::{DeviceDirectory, NewDevice, NewUser, Regime, UserStore};
use fleetd_scheduler::RegimeScheduler;
use rusqlite::Connection;

struct World {
    directory: Arc<DeviceDirectory>,
    queue: Arc<CommandQueue>,
    dispatcher: Dispatcher,
    device_id: i64,
}

/// Wire the full stack the way fleetd-gateway does at startup: shared
/// database, one connection per manager, explicit injection throughout.
fn world(regime: Regime) -> World {
    let name = format!(
        "file:poll_flow_{:?}?mode=memory&cache=shared",
        std::thread::current().id()
    );
    let setup = Connection::open(&name).unwrap();
    setup.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    fleetd_registry::db::init_db(&setup).unwrap();
    fleetd_queue::db::init_db(&setup).unwrap();

    let users = UserStore::new(Connection::open(&name).unwrap());
    let directory = Arc::new(DeviceDirectory::new(Connection::open(&name).unwrap()));
    let queue = Arc::new(CommandQueue::new(setup));
    let scheduler = RegimeScheduler::new(Arc::clone(&directory), Arc::clone(&queue), "turn_on");
    let dispatcher = Dispatcher::new(Arc::clone(&directory), scheduler, Arc::clone(&queue));

    let user = users
        .create(&NewUser {
            name: "u1".into(),
            email: "u1@example.com".into(),
            password: "pw".into(),
        })
        .unwrap();
    let device = directory
        .create(&NewDevice {
            name: "d1".into(),
            user_id: user.id,
            status: "online".into(),
            regime,
        })
        .unwrap();

    World {
        directory,
        queue,
        dispatcher,
        device_id: device.id,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 10).unwrap()
}

#[test]
fn scheduled_command_is_claimed_by_the_same_poll() {
    let w = world(Regime::from([("09:00".to_string(), serde_json::json!({}))]));

    // 09:00 — the regime fires and the new command is claimed in one call.
    let claimed = w.dispatcher.poll_at(w.device_id, at(9, 0)).unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].command, "turn_on");
    assert_eq!(claimed[0].state, CommandState::Dispatched);
    assert_eq!(WireCommand::from(&claimed[0]).status, 1);

    // 09:01 — no regime match, nothing pending.
    let empty = w.dispatcher.poll_at(w.device_id, at(9, 1)).unwrap();
    assert!(empty.is_empty());

    // Nothing left Pending for this device.
    let pending = w
        .queue
        .query(&CommandFilter {
            device_id: Some(w.device_id),
            status: Some(0),
            ..Default::default()
        })
        .unwrap();
    assert!(pending.is_empty());
}

#[test]
fn two_polls_in_one_minute_duplicate_the_trigger() {
    // Documented duplication, not a defect: the scheduler has no timer
    // of its own and no last-fired record.
    let w = world(Regime::from([("09:00".to_string(), serde_json::json!({}))]));

    let first = w.dispatcher.poll_at(w.device_id, at(9, 0)).unwrap();
    let second = w.dispatcher.poll_at(w.device_id, at(9, 0)).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0].id, second[0].id);
}

#[test]
fn completion_report_flows_through_to_the_queue() {
    let w = world(Regime::from([("09:00".to_string(), serde_json::json!({}))]));
    let claimed = w.dispatcher.poll_at(w.device_id, at(9, 0)).unwrap();

    w.dispatcher.report_completion(claimed[0].id, 2).unwrap();
    let done = w
        .queue
        .query(&CommandFilter {
            id: Some(claimed[0].id),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(done[0].state, CommandState::Completed);
    assert_eq!(done[0].result_code, Some(2));
}

#[test]
fn completion_for_unknown_command_is_not_found() {
    let w = world(Regime::new());
    let err = w.dispatcher.report_completion(31337, 2).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Queue(QueueError::CommandNotFound { id: 31337 })
    ));
}

#[test]
fn poll_refreshes_last_seen() {
    let w = world(Regime::new());
    let before = w.directory.get(w.device_id).unwrap().unwrap().last_seen;
    std::thread::sleep(std::time::Duration::from_millis(5));

    w.dispatcher.poll_at(w.device_id, at(12, 0)).unwrap();
    let after = w.directory.get(w.device_id).unwrap().unwrap().last_seen;
    assert!(after > before, "last_seen should advance on poll");
}

#[test]
fn submit_event_touches_but_does_not_enqueue() {
    let w = world(Regime::new());
    w.dispatcher
        .submit_event(w.device_id, &serde_json::json!({"temp": 21.5}))
        .unwrap();
    assert!(w.queue.query(&CommandFilter::default()).unwrap().is_empty());
}
