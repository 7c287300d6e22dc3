use capsearch::login::{
    Authenticator, Role, UserStore, create_session, end_session, expire_session, validate_session,
};

fn test_provisioning(store: &UserStore) {
    println!("\n====== Testing user provisioning ======");

    assert!(store.is_empty().unwrap());

    store
        .register_user("alice", "alice@example.org", "hunter2hunter2", Role::Admin)
        .unwrap();
    store
        .register_user("bob", "bob@example.org", "correct horse", Role::Viewer)
        .unwrap();
    assert!(!store.is_empty().unwrap());
    println!("✓ Users provisioned into the credential file");

    let users = store.get_users().unwrap();
    assert_eq!(users.len(), 2);
    let alice = users.get("alice").unwrap();
    assert_eq!(alice.role, Role::Admin);
    assert_ne!(alice.password_hash, "hunter2hunter2");
    assert!(alice.password_hash.starts_with("$argon2"));
    println!("✓ Only password hashes are stored");

    let err = store
        .register_user("alice", "other@example.org", "password", Role::Viewer)
        .unwrap_err();
    assert_eq!(err, "Username already exists");

    let err = store
        .register_user("", "x@example.org", "password", Role::Viewer)
        .unwrap_err();
    assert!(err.contains("cannot be empty"));
    let err = store
        .register_user("carol", "carol@example.org", "", Role::Viewer)
        .unwrap_err();
    assert!(err.contains("cannot be empty"));
    println!("✓ Duplicate and empty credentials rejected");
}

fn test_verification(store: &UserStore) {
    println!("\n====== Testing credential verification ======");

    let role = store.verify_login("alice", "hunter2hunter2").unwrap();
    assert_eq!(role, Some(Role::Admin));
    let role = store.verify_login("bob", "correct horse").unwrap();
    assert_eq!(role, Some(Role::Viewer));
    println!("✓ Correct credentials yield the granted role");

    let role = store.verify_login("alice", "wrong password").unwrap();
    assert_eq!(role, None);
    println!("✓ A wrong password is a negative outcome, not an error");

    let role = store.verify_login("nobody", "anything").unwrap();
    assert_eq!(role, None);
    println!("✓ An unknown username is a negative outcome");

    // Repeated failed attempts stay permitted
    for _ in 0..3 {
        assert_eq!(store.verify_login("alice", "still wrong").unwrap(), None);
    }
    assert_eq!(
        store.verify_login("alice", "hunter2hunter2").unwrap(),
        Some(Role::Admin)
    );
    println!("✓ No lockout after repeated failures");
}

fn test_roles() {
    println!("\n====== Testing role capabilities ======");

    assert!(Role::Admin.can_edit());
    assert!(!Role::Viewer.can_edit());
    println!("✓ Only admins may edit records");
}

fn test_sessions() {
    println!("\n====== Testing sessions ======");

    let session_id = create_session("alice", Role::Admin);
    let other_id = create_session("bob", Role::Viewer);
    assert_ne!(session_id, other_id);

    let (username, role) = validate_session(&session_id).unwrap();
    assert_eq!(username, "alice");
    assert_eq!(role, Role::Admin);
    println!("✓ A fresh session validates to its user and role");

    assert!(validate_session("not-a-session").is_none());
    println!("✓ An unknown session id does not validate");

    expire_session(&session_id);
    assert!(validate_session(&session_id).is_none());
    println!("✓ An expired session no longer validates");

    end_session(&other_id);
    assert!(validate_session(&other_id).is_none());
    println!("✓ Logout removes the session");
}

fn main() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = UserStore::open(dir.path()).expect("User store should open");

    test_provisioning(&store);
    test_verification(&store);
    test_roles();
    test_sessions();

    println!("\nAll auth tests passed!");
}
