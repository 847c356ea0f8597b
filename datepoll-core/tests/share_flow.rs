use chrono::Utc;
use datepoll_core::aggregate::{counts_by_date, max_participants_on_any_date, top_preferred_dates};
use datepoll_core::persistence::{FilePersistence, PersistencePort};
use datepoll_core::session::{BootPath, EntryContext, bootstrap_in};
use datepoll_core::share;
use datepoll_core::{DateKey, DatePollError, DecodeError};
use url::Url;

fn key(s: &str) -> DateKey {
    DateKey::parse_in(s, &Utc).unwrap()
}

#[test]
fn test_link_shared_between_two_machines() {
    let alice_dir = tempfile::tempdir().unwrap();
    let bob_dir = tempfile::tempdir().unwrap();
    let base = Url::parse("https://datepoll.app/").unwrap();

    // Alice picks two dates and shares
    let mut alice = bootstrap_in(
        EntryContext::empty(),
        FilePersistence::new(alice_dir.path()),
        &Utc,
    );
    assert_eq!(alice.path(), BootPath::FreshUser);
    alice.identify("Alice").unwrap();
    alice.toggle(key("2024-03-01")).unwrap();
    alice.toggle(key("2024-03-02")).unwrap();
    let link = alice.share_url(&base);

    // Bob opens the link, identifies, adds his date
    let mut bob = bootstrap_in(
        EntryContext::from_link(link.as_str()),
        FilePersistence::new(bob_dir.path()),
        &Utc,
    );
    assert_eq!(bob.path(), BootPath::SharedLink);
    assert!(!bob.is_identified());
    bob.identify("Bob").unwrap();
    bob.toggle(key("2024-03-01")).unwrap();

    let counts = counts_by_date(bob.state());
    assert_eq!(counts[&key("2024-03-01")], 2);
    assert_eq!(counts[&key("2024-03-02")], 1);
    assert_eq!(
        top_preferred_dates(bob.state(), 3),
        vec![(key("2024-03-01"), 2), (key("2024-03-02"), 1)]
    );
    assert_eq!(max_participants_on_any_date(bob.state()), 2);

    // Bob's next session is a returning one with the merged data
    let reopened = bootstrap_in(
        EntryContext::empty(),
        FilePersistence::new(bob_dir.path()),
        &Utc,
    );
    assert_eq!(reopened.path(), BootPath::ReturningUser);
    assert_eq!(reopened.identity().unwrap().as_str(), "Bob");
    assert_eq!(reopened.state(), bob.state());

    // Alice's own data never changed
    let alice_local = FilePersistence::new(alice_dir.path())
        .load_snapshot()
        .unwrap()
        .unwrap();
    assert!(alice_local.get("Bob").is_none());
}

#[test]
fn test_garbage_token_leaves_existing_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = bootstrap_in(EntryContext::empty(), FilePersistence::new(dir.path()), &Utc);
    session.identify("Alice").unwrap();
    session.toggle(key("2024-03-01")).unwrap();
    let before = session.state().clone();

    assert!(matches!(
        share::decode_in("!!!garbage!!!", &Utc),
        Err(DecodeError::Base64(_))
    ));
    assert_eq!(session.state(), &before);

    // A broken link at startup does not touch stored selections either
    let broken = bootstrap_in(
        EntryContext::with_token("!!!garbage!!!"),
        FilePersistence::new(dir.path()),
        &Utc,
    );
    assert!(broken.state().is_empty());
    assert!(broken.decode_error().is_some());

    let stored = FilePersistence::new(dir.path()).load_snapshot().unwrap().unwrap();
    assert_eq!(stored["Alice"], vec!["2024-03-01".to_string()]);
}

#[test]
fn test_unreadable_selections_file_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let port = FilePersistence::new(dir.path());
    // One trailing comma makes the whole file unreadable
    let corrupt = concat!(
        r#"{"Alice":["2024-03-01"],"Bob":["2024-03-01","2024-03-02"],"#,
        r#""Carol":["2024-03-05"],}"#
    );
    std::fs::write(dir.path().join("identity"), "Alice").unwrap();
    std::fs::write(port.selections_path(), corrupt).unwrap();

    let mut session = bootstrap_in(EntryContext::empty(), port.clone(), &Utc);
    assert_eq!(session.path(), BootPath::ReturningUser);
    assert!(session.state().is_empty());
    assert!(session.load_error().is_some());

    assert!(matches!(
        session.toggle(key("2024-03-09")),
        Err(DatePollError::UnreadableSelections(_))
    ));
    assert!(matches!(
        session.identify("Alice"),
        Err(DatePollError::UnreadableSelections(_))
    ));
    assert_eq!(
        std::fs::read_to_string(port.selections_path()).unwrap(),
        corrupt
    );

    // Importing a readable copy replaces the file and unblocks editing
    let fixed = corrupt.replace("],}", "]}");
    let raw = share::parse_snapshot_json(&fixed).unwrap();
    session.import_snapshot_in(raw, &Utc).unwrap();
    session.toggle(key("2024-03-09")).unwrap();

    let stored = port.load_snapshot().unwrap().unwrap();
    assert_eq!(stored["Bob"].len(), 2);
    assert_eq!(stored["Carol"], vec!["2024-03-05".to_string()]);
    assert_eq!(stored["Alice"].len(), 2);
}
