use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{TimeZone, Utc};
use docstore_mem::{Lock, MemRepository, RepositoryConfig, RepositoryError};
use docstore_state::keys::{KEY_ID, KEY_LOCK_OWNER};
use docstore_state::State;

fn repo_with(id: &str) -> MemRepository {
    let repo = MemRepository::open(RepositoryConfig::default()).unwrap();
    repo.connection()
        .unwrap()
        .create_state(&State::new().with(KEY_ID, id))
        .unwrap();
    repo
}

#[test]
fn test_lock_lifecycle() {
    let repo = repo_with("doc");
    let locks = repo.lock_manager().unwrap();
    let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let bob = Lock::new("bob", created);

    assert_eq!(locks.get_lock("doc"), Ok(None));
    assert_eq!(locks.set_lock("doc", &bob), Ok(None));
    assert_eq!(locks.get_lock("doc"), Ok(Some(bob.clone())));

    let alice = Lock::new("alice", Utc::now());
    assert_eq!(locks.set_lock("doc", &alice), Ok(Some(bob.clone())));

    let refused = locks.remove_lock("doc", Some("alice")).unwrap().unwrap();
    assert!(refused.failed);
    assert_eq!(refused.owner, "bob");
    assert_eq!(locks.get_lock("doc"), Ok(Some(bob.clone())));

    assert_eq!(locks.remove_lock("doc", Some("bob")), Ok(Some(bob)));
    assert_eq!(locks.get_lock("doc"), Ok(None));
    assert_eq!(locks.remove_lock("doc", Some("bob")), Ok(None));
}

#[test]
fn test_lock_is_stored_on_document() {
    let repo = repo_with("doc");
    let conn = repo.connection().unwrap();
    conn.set_lock("doc", &Lock::new("bob", Utc::now())).unwrap();
    assert_eq!(conn.read_state("doc").unwrap().get_str(KEY_LOCK_OWNER), Some("bob"));
    conn.remove_lock("doc", None).unwrap();
    assert!(conn.read_state("doc").unwrap().get(KEY_LOCK_OWNER).is_none());
}

#[test]
fn test_lock_on_missing_document() {
    let repo = repo_with("doc");
    let locks = repo.lock_manager().unwrap();
    assert_eq!(locks.get_lock("ghost"), Err(RepositoryError::NotFound("ghost".into())));
}

#[test]
fn test_concurrent_set_lock_has_one_winner() {
    let repo = repo_with("doc");
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let locks = repo.lock_manager().unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                locks.set_lock("doc", &Lock::new(format!("owner-{i}"), Utc::now())).unwrap()
            })
        })
        .collect();
    let results: Vec<Option<Lock>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_none()).count();
    assert_eq!(winners, 1);
    let holder = repo.lock_manager().unwrap().get_lock("doc").unwrap().unwrap();
    for existing in results.iter().flatten() {
        assert_eq!(existing.owner, holder.owner);
    }
}
