//! End-to-end sync between devices sharing a remote store and tabs sharing a cache.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use oscar_party_back::{
    config::AppConfig,
    dao::{
        local_cache::{Collection, LocalCache},
        models::{CategoryEntity, Rsvp},
        remote_store::{RemoteStore, memory::InMemoryRemoteStore},
    },
    services::{
        guest_service::{self, MemberInput, PartySubmission},
        scoring, setup_service,
    },
    state::{AppState, SharedState, SyncKind, events::TabChannel},
};

async fn eventually<F: Fn() -> bool>(check: F) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

fn device(remote: &InMemoryRemoteStore) -> SharedState {
    let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
    state.start();
    state
        .sync()
        .attach(Arc::new(remote.clone()) as Arc<dyn RemoteStore>);
    state
}

fn ballot(host: &str, pick: &str) -> PartySubmission {
    let mut member = MemberInput::named(host);
    member
        .predictions
        .insert("Best Picture".to_string(), pick.to_string());
    PartySubmission {
        rsvp: Rsvp::Yes,
        host: member,
        ..PartySubmission::default()
    }
}

#[tokio::test]
async fn guests_and_winners_reach_the_other_device() {
    let remote = InMemoryRemoteStore::new();
    let host_device = device(&remote);
    let guest_device = device(&remote);

    setup_service::save_categories(
        &host_device,
        vec![CategoryEntity::new(
            "Best Picture",
            vec!["Sinners".to_string(), "Hamnet".to_string()],
        )],
    )
    .unwrap();
    eventually(|| setup_service::categories_configured(&guest_device)).await;

    guest_service::submit_party(&guest_device, ballot("Ann", "Sinners")).unwrap();
    guest_service::submit_party(&guest_device, ballot("Bob", "Hamnet")).unwrap();
    eventually(|| guest_service::get_guests(&host_device).len() == 2).await;

    setup_service::set_winner(&host_device, "Best Picture", "Sinners").unwrap();
    eventually(|| !setup_service::get_winners(&guest_device).is_empty()).await;
    eventually(|| guest_service::get_guests(&guest_device).len() == 2).await;

    let board = scoring::leaderboard(&guest_device);
    assert_eq!(board[0].guest.name, "Ann");
    assert_eq!(board[0].score, 1);
    assert_eq!(board[1].score, 0);
    assert!(scoring::progress(&guest_device).complete);

    host_device.shutdown();
    guest_device.shutdown();
}

#[tokio::test]
async fn device_keeps_working_while_the_remote_is_offline() {
    let remote = InMemoryRemoteStore::new();
    let state = device(&remote);
    remote.set_offline(true);

    let created = guest_service::submit_party(&state, ballot("Cleo", "Sinners")).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(guest_service::get_guests(&state).len(), 1);

    eventually(|| !state.sync().recent_failures().is_empty()).await;
    state.shutdown();
}

#[tokio::test]
async fn tabs_of_one_device_see_each_others_changes() {
    let bus = TabChannel::new(16);
    let cache = LocalCache::in_memory();
    let first = AppState::new(AppConfig::default(), cache.clone(), Some(bus.clone()));
    let second = AppState::new(AppConfig::default(), cache.open_tab(), Some(bus));
    first.start();
    second.start();

    let winner_events = Arc::new(AtomicUsize::new(0));
    let storage_events = Arc::new(AtomicUsize::new(0));
    let winners_seen = Arc::clone(&winner_events);
    let storage_seen = Arc::clone(&storage_events);
    let subscription = second.events().on_sync(move |message| match message.kind {
        SyncKind::WinnersUpdated => {
            winners_seen.fetch_add(1, Ordering::SeqCst);
        }
        SyncKind::StorageChange if message.collection() == Some(Collection::Winners) => {
            storage_seen.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    setup_service::save_categories(
        &first,
        vec![CategoryEntity::new("Best Picture", vec!["Sinners".to_string()])],
    )
    .unwrap();
    setup_service::set_winner(&first, "Best Picture", "Sinners").unwrap();

    eventually(|| winner_events.load(Ordering::SeqCst) == 1).await;
    eventually(|| storage_events.load(Ordering::SeqCst) >= 1).await;
    assert_eq!(
        setup_service::get_winners(&second)
            .get("Best Picture")
            .map(String::as_str),
        Some("Sinners")
    );

    assert!(subscription.unsubscribe());
    first.shutdown();
    second.shutdown();
}
