use binding::{BindingError, DeliveryMode, HostBinding, SharedStore};
use serde_json::json;

#[test]
fn connect_mirrors_existing_values() {
    let store = SharedStore::new();
    store.set("sync_time", json!(1.5)).unwrap();
    let handle = store.connect().unwrap();
    assert_eq!(handle.read_f64("sync_time"), Some(1.5));
    assert!(handle.read("missing").is_none());
}

#[test]
fn write_is_local_until_commit() {
    let store = SharedStore::new();
    let mut a = store.connect().unwrap();
    a.write("is_running", json!(true));
    assert_eq!(a.read_bool("is_running"), Some(true));
    assert!(store.get("is_running").is_none());

    assert_eq!(a.commit().unwrap(), 1);
    assert_eq!(store.get("is_running"), Some(json!(true)));
    assert!(!a.has_pending_writes());
}

#[test]
fn commit_notifies_other_subscribers_but_not_the_writer() {
    let store = SharedStore::new();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    a.subscribe("is_running").unwrap();
    b.subscribe("is_running").unwrap();

    a.write("is_running", json!(true));
    a.commit().unwrap();

    assert!(a.poll_changes().unwrap().is_empty());
    let changes = b.poll_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, "is_running");
    assert_eq!(changes[0].value, json!(true));
    assert_eq!(b.read_bool("is_running"), Some(true));
}

#[test]
fn unchanged_value_is_not_a_change() {
    let store = SharedStore::new();
    store.set("sync_time", json!(2.0)).unwrap();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    b.subscribe("sync_time").unwrap();

    a.write("sync_time", json!(2.0));
    assert_eq!(a.commit().unwrap(), 0);
    assert!(b.poll_changes().unwrap().is_empty());
}

#[test]
fn clear_then_set_forces_a_notification_for_equal_content() {
    let store = SharedStore::new();
    store.set("annotations", json!([{"start": 1.0, "end": 1.5}])).unwrap();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    b.subscribe("annotations").unwrap();

    a.write("annotations", json!([]));
    a.write("annotations", json!([{"start": 1.0, "end": 1.5}]));
    a.commit().unwrap();

    let changes = b.poll_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, json!([{"start": 1.0, "end": 1.5}]));
}

#[test]
fn handling_a_change_does_not_commit_again() {
    let store = SharedStore::new();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    b.subscribe("is_running").unwrap();

    a.write("is_running", json!(true));
    a.commit().unwrap();
    let before = store.commit_count();

    let changes = b.poll_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(b.commit().unwrap(), 0);
    assert_eq!(store.commit_count(), before);
}

#[test]
fn unsubscribe_stops_notifications() {
    let store = SharedStore::new();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    let id = b.subscribe("sync_time").unwrap();
    b.unsubscribe(id).unwrap();
    assert_eq!(
        b.unsubscribe(id),
        Err(BindingError::UnknownSubscription(id.raw()))
    );

    a.write("sync_time", json!(3.0));
    a.commit().unwrap();
    assert!(b.poll_changes().unwrap().is_empty());
}

#[test]
fn dropping_a_handle_deregisters_its_subscriptions() {
    let store = SharedStore::new();
    {
        let mut b = store.connect().unwrap();
        b.subscribe("sync_time").unwrap();
        b.subscribe("is_running").unwrap();
        assert_eq!(store.subscriber_count(), 2);
    }
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn deferred_commits_apply_on_flush() {
    let store = SharedStore::with_mode(DeliveryMode::Deferred);
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    b.subscribe("sync_time").unwrap();

    a.write("sync_time", json!(4.0));
    assert_eq!(a.commit().unwrap(), 0);
    assert_eq!(store.pending_commits(), 1);
    assert!(store.get("sync_time").is_none());
    assert_eq!(a.read_f64("sync_time"), Some(4.0));

    assert_eq!(store.flush().unwrap(), 1);
    assert_eq!(store.get("sync_time"), Some(json!(4.0)));
    assert_eq!(b.poll_changes().unwrap().len(), 1);
}

#[test]
fn in_flight_write_wins_over_older_remote_change() {
    let store = SharedStore::with_mode(DeliveryMode::Deferred);
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    a.subscribe("is_running").unwrap();

    b.write("is_running", json!(false));
    b.commit().unwrap();
    a.write("is_running", json!(true));
    a.commit().unwrap();

    store.flush().unwrap();
    assert!(a.poll_changes().unwrap().is_empty());
    assert_eq!(a.read_bool("is_running"), Some(true));
    assert_eq!(store.get("is_running"), Some(json!(true)));
}

#[test]
fn remote_changes_after_acknowledgement_are_delivered() {
    let store = SharedStore::with_mode(DeliveryMode::Deferred);
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    a.subscribe("sync_time").unwrap();

    a.write("sync_time", json!(1.0));
    a.commit().unwrap();
    b.write("sync_time", json!(2.0));
    b.commit().unwrap();
    store.flush().unwrap();

    let changes = a.poll_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, json!(2.0));
    assert_eq!(a.read_f64("sync_time"), Some(2.0));
}

#[test]
fn host_side_set_reaches_every_subscriber() {
    let store = SharedStore::new();
    let mut a = store.connect().unwrap();
    let mut b = store.connect().unwrap();
    a.subscribe("tags").unwrap();
    b.subscribe("tags").unwrap();

    assert!(store.set("tags", json!(["blink"])).unwrap());
    assert_eq!(a.poll_changes().unwrap().len(), 1);
    assert_eq!(b.poll_changes().unwrap().len(), 1);
}
