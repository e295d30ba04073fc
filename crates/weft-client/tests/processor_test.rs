//! Table diff processor tests

mod support;

use std::sync::Arc;

use weft_client::{ExecContext, MessageConverter, TableProcessor};
use weft_core::{ChatInfoFetch, LoginId, Membership, RemoteEvent, RoomKind};
use weft_proto::{
    AddParticipantToThread, DeleteReaction, DeleteThenInsertContact, DeleteThenInsertThread,
    InsertMessage, PlatformFlavor, RemoveParticipantFromThread, Table, ThreadKind,
    UpdateThreadMuteSetting, UpdateThreadName, UpsertReaction, VerifyContactRowExists,
    VerifyThreadExists,
};

use support::{MockTransport, RecordingBridge};

fn processor(
    bridge: &Arc<support::RecordingBridge>,
    transport: &Arc<support::MockTransport>,
) -> TableProcessor {
    TableProcessor::new(
        LoginId::from("42"),
        bridge.clone(),
        transport.clone(),
        Arc::new(MessageConverter::new(PlatformFlavor::Messenger)),
    )
}

#[tokio::test]
async fn one_to_one_thread_resync_has_two_joined_members() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        delete_then_insert_thread: vec![DeleteThenInsertThread {
            thread_key: 1234,
            thread_kind: ThreadKind::OneToOne,
            thread_name: String::new(),
            thread_description: String::new(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    assert_eq!(events.len(), 1);
    let RemoteEvent::ChatResync { meta, info, info_fetch } = &events[0] else {
        panic!("expected a chat resync");
    };
    assert!(meta.create_portal);
    assert_eq!(meta.portal_key.id.as_str(), "1234");
    assert!(info_fetch.is_none());

    let info = info.as_ref().unwrap();
    assert_eq!(info.kind, Some(RoomKind::DirectMessage));
    let members = &info.members.as_ref().unwrap().members;
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.membership == Membership::Join));
    assert!(members[0].sender.is_from_me);
    assert_eq!(members[1].sender.sender.as_str(), "1234");
}

#[tokio::test]
async fn group_thread_resync_contains_only_the_login() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        delete_then_insert_thread: vec![DeleteThenInsertThread {
            thread_key: 5678,
            thread_kind: ThreadKind::Group,
            thread_name: "weavers".to_string(),
            thread_description: String::new(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    let RemoteEvent::ChatResync { info, .. } = &events[0] else {
        panic!("expected a chat resync");
    };
    let info = info.as_ref().unwrap();
    assert_eq!(info.kind, Some(RoomKind::Group));
    assert_eq!(info.name.as_deref(), Some("weavers"));
    let members = &info.members.as_ref().unwrap().members;
    assert_eq!(members.len(), 1);
    assert!(members[0].sender.is_from_me);
}

#[tokio::test]
async fn thread_verify_row_attaches_lazy_fetch_without_eager_info() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        verify_thread_exists: vec![VerifyThreadExists {
            thread_key: 1234,
            thread_kind: ThreadKind::OneToOne,
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    let RemoteEvent::ChatResync { info, info_fetch, .. } = &events[0] else {
        panic!("expected a chat resync");
    };
    assert!(info.is_none());
    let fetch = info_fetch.as_ref().unwrap();

    // Materialized portal: fetching twice never hits the network.
    fetch.fetch_chat_info(true).await.unwrap();
    fetch.fetch_chat_info(true).await.unwrap();
    assert!(transport.batches().is_empty());

    // Unmaterialized portal: one create/sync request per fetch.
    fetch.fetch_chat_info(false).await.unwrap();
    assert_eq!(transport.batches().len(), 1);
}

#[tokio::test]
async fn reaction_upsert_then_delete_emits_add_then_remove() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        upsert_reaction: vec![UpsertReaction {
            message_id: "mid.1".to_string(),
            thread_key: 1234,
            actor_id: 99,
            reaction: "❤".to_string(),
        }],
        delete_reaction: vec![DeleteReaction {
            message_id: "mid.1".to_string(),
            thread_key: 1234,
            actor_id: 99,
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    assert_eq!(events.len(), 2);
    let RemoteEvent::ReactionAdd { target, sender, emoji_id: add_id, emoji, .. } = &events[0]
    else {
        panic!("expected reaction add first");
    };
    let RemoteEvent::ReactionRemove { emoji_id: remove_id, .. } = &events[1] else {
        panic!("expected reaction remove second");
    };
    assert_eq!(target.as_str(), "mid.1");
    assert_eq!(sender.sender.as_str(), "99");
    assert_eq!(emoji, "❤");
    assert_eq!(add_id, remove_id);
}

#[tokio::test]
async fn contact_rows_update_ghost_profiles() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        delete_then_insert_contact: vec![DeleteThenInsertContact {
            id: 99,
            name: "Ada".to_string(),
        }],
        verify_contact_row_exists: vec![VerifyContactRowExists {
            contact_id: 100,
            name: String::new(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let updates = bridge.ghost_updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].0.as_str(), "99");
    assert_eq!(updates[0].1.name.as_deref(), Some("Ada"));
    assert_eq!(updates[1].0.as_str(), "100");
    assert_eq!(updates[1].1.name, None);
}

#[tokio::test]
async fn membership_rows_emit_deltas_in_row_order() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        add_participant_to_thread: vec![AddParticipantToThread {
            thread_key: 5678,
            contact_id: 99,
            nickname: "chief".to_string(),
        }],
        remove_participant_from_thread: vec![RemoveParticipantFromThread {
            thread_key: 5678,
            participant_id: 100,
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    assert_eq!(events.len(), 2);
    let RemoteEvent::ChatInfoChange { change, .. } = &events[0] else {
        panic!("expected a member join delta");
    };
    let joined = &change.member_changes.as_ref().unwrap().members[0];
    assert_eq!(joined.membership, Membership::Join);
    assert_eq!(joined.nickname.as_deref(), Some("chief"));

    let RemoteEvent::ChatInfoChange { change, .. } = &events[1] else {
        panic!("expected a member leave delta");
    };
    let left = &change.member_changes.as_ref().unwrap().members[0];
    assert_eq!(left.membership, Membership::Leave);
    assert_eq!(left.sender.sender.as_str(), "100");
}

#[tokio::test]
async fn messages_are_emitted_after_thread_rows() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        // Deliberately "out of order" relative to processing: the message
        // row list comes later regardless of construction order.
        insert_message: vec![InsertMessage {
            message_id: "mid.1".to_string(),
            otid: None,
            thread_key: 1234,
            sender_id: 42,
            timestamp_ms: 1_700_000_000_000,
            text: "hello".to_string(),
        }],
        delete_then_insert_thread: vec![DeleteThenInsertThread {
            thread_key: 1234,
            thread_kind: ThreadKind::OneToOne,
            thread_name: String::new(),
            thread_description: String::new(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RemoteEvent::ChatResync { .. }));
    let RemoteEvent::Message { id, sender, raw, .. } = &events[1] else {
        panic!("expected the message second");
    };
    assert_eq!(id.as_str(), "mid.1");
    assert!(sender.is_from_me);
    assert_eq!(raw.text, "hello");
}

#[tokio::test]
async fn mute_and_range_rows_emit_nothing() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        update_thread_mute_setting: vec![UpdateThreadMuteSetting {
            thread_key: 1234,
            mute_expire_ms: -1,
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;
    assert!(bridge.events().is_empty());
}

#[tokio::test]
async fn thread_rename_emits_an_info_delta() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let table = Table {
        update_thread_name: vec![UpdateThreadName {
            thread_key: 5678,
            thread_name: "new name".to_string(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ExecContext::new(), &table).await;

    let events = bridge.events();
    let RemoteEvent::ChatInfoChange { change, meta } = &events[0] else {
        panic!("expected an info delta");
    };
    assert!(!meta.create_portal);
    assert!(change.member_changes.is_none());
    assert_eq!(change.info.as_ref().unwrap().name.as_deref(), Some("new name"));
}

#[tokio::test]
async fn cancelled_context_stops_the_batch() {
    let bridge = RecordingBridge::new();
    let transport = MockTransport::new();
    let ctx = ExecContext::new();
    ctx.cancel();

    let table = Table {
        delete_then_insert_thread: vec![DeleteThenInsertThread {
            thread_key: 1234,
            thread_kind: ThreadKind::OneToOne,
            thread_name: String::new(),
            thread_description: String::new(),
        }],
        ..Table::default()
    };

    processor(&bridge, &transport).process_table(&ctx, &table).await;
    assert!(bridge.events().is_empty());
}
