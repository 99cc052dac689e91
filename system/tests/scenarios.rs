use estimation_system::serde_json::{self, json};
use estimation_system::{SessionError, SessionPolicy, SessionRecord, ServerMessage};

fn state(record: &SessionRecord) -> serde_json::Value {
    let message = ServerMessage::UpdateState(record.snapshot("T1"));
    serde_json::to_value(&message).expect("")["data"].clone()
}

#[test]
fn it_should_walk_through_a_full_round() {
    let policy = SessionPolicy::default();

    let mut record = SessionRecord::new("Alice");
    assert_eq!(
        state(&record),
        json!({"room": "T1", "facilitator": "Alice", "votes": {"Alice": null}, "revealed": false})
    );

    record.join("Bob");
    assert_eq!(state(&record)["votes"], json!({"Alice": null, "Bob": null}));

    record.vote("Bob", "5".into(), &policy).expect("");
    assert_eq!(state(&record)["votes"]["Bob"], json!("5"));
    assert_eq!(state(&record)["revealed"], json!(false));

    assert_eq!(record.reveal("Bob"), Err(SessionError::NotFacilitator));
    assert_eq!(state(&record)["revealed"], json!(false));

    record.reveal("Alice").expect("");
    assert_eq!(state(&record)["revealed"], json!(true));

    record.reset("Alice").expect("");
    assert_eq!(
        state(&record),
        json!({"room": "T1", "facilitator": "Alice", "votes": {"Alice": null, "Bob": null}, "revealed": false})
    );
}

#[test]
fn it_should_keep_facilitator_through_any_sequence() {
    let policy = SessionPolicy::default();
    let mut record = SessionRecord::new("Alice");

    for name in ["Bob", "Carol", "Alice", "Bob"] {
        record.join(name);
        let _ = record.vote(name, "8".into(), &policy);
        let _ = record.reveal(name);
        let _ = record.reset(name);
        record.remove_participant("Alice");
        assert_eq!(record.facilitator(), "Alice");
    }
}
