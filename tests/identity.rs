use taskdesk::identity::{AuthState, IdentityProvider};
use taskdesk::model::{Choice, Role, User};
use taskdesk::outcome::Outcome;
use taskdesk::seed::seed_defaults;
use taskdesk::storage::{
    Collection, KeyValueStore, MemoryStore, Persistence, UpdateFn, SESSION_KEY,
};
use taskdesk::{Error, Result};

fn seeded() -> Persistence {
    let persistence = Persistence::in_memory();
    seed_defaults(&persistence).expect("seed");
    persistence
}

/// Memory store whose session token writes always fail.
#[derive(Debug, Default)]
struct ReadOnlySession(MemoryStore);

impl KeyValueStore for ReadOnlySession {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.0.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if key == SESSION_KEY {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "auth_token is read-only",
            )));
        }
        self.0.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.0.remove(key)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        self.0.update(key, f)
    }
}

#[test]
fn signup_password_mismatch_creates_nothing() {
    let persistence = seeded();
    let mut identity = IdentityProvider::new(persistence.clone());

    let outcome = identity.signup("Zed", "zed@example.com", "a", "b");
    assert_eq!(
        outcome,
        Outcome {
            success: false,
            message: "Passwords do not match.".to_string(),
            task_id: None,
        }
    );

    let users: Vec<User> = persistence.get(&Collection::Users).expect("users");
    assert!(users.iter().all(|u| u.email != "zed@example.com"));
    assert!(persistence.session_token().expect("token").is_none());
    assert!(!identity.is_authenticated());
}

#[test]
fn signup_creates_logged_in_employee() {
    let persistence = seeded();
    let mut identity = IdentityProvider::new(persistence.clone());

    let outcome = identity.signup("Zed", "zed@example.com", "pw", "pw");
    assert_eq!(outcome, Outcome::ok("Account created successfully!"));

    let user = identity.current_user().expect("logged in").clone();
    assert_eq!(user.role, Role::Employee);
    assert_eq!(
        persistence.session_token().expect("token").as_deref(),
        Some(user.id.as_str())
    );

    let again = identity.signup("Zed Two", "zed@example.com", "pw", "pw");
    assert_eq!(again.message, "Email is already in use.");
}

#[test]
fn signup_rolls_back_user_when_session_write_fails() {
    let persistence = Persistence::new(ReadOnlySession::default());
    seed_defaults(&persistence).expect("seed");
    let before: Vec<User> = persistence.get(&Collection::Users).expect("users");
    let mut identity = IdentityProvider::new(persistence.clone());

    let outcome = identity.signup("Zed", "zed@example.com", "pw", "pw");
    assert_eq!(outcome, Outcome::fail("Failed to create account."));
    assert!(!identity.is_authenticated());

    let after: Vec<User> = persistence.get(&Collection::Users).expect("users");
    assert_eq!(after.len(), before.len());
    assert!(after.iter().all(|u| u.email != "zed@example.com"));

    // Retrying is not blocked by a leftover record.
    let retry = identity.signup("Zed", "zed@example.com", "pw", "pw");
    assert_eq!(retry.message, "Failed to create account.");
}

#[test]
fn emails_match_ignoring_case() {
    let persistence = seeded();
    let mut identity = IdentityProvider::new(persistence);

    assert!(identity.login("JANE@Example.com", "").success);
    assert_eq!(
        identity.current_user().map(|u| u.email.as_str()),
        Some("jane@example.com")
    );

    let dup = identity.signup("Jane Again", "Jane@EXAMPLE.com", "pw", "pw");
    assert_eq!(dup, Outcome::fail("Email is already in use."));
}

#[test]
fn check_auth_restores_session() {
    let persistence = seeded();
    let mut first = IdentityProvider::new(persistence.clone());
    assert_eq!(first.login("jane@example.com", "anything"), Outcome::ok("Login successful!"));

    let mut second = IdentityProvider::new(persistence);
    second.check_auth().expect("check auth");
    assert_eq!(
        second.current_user().map(|u| u.name.as_str()),
        Some("Jane Employee")
    );
    assert!(!second.is_admin());

    // Idempotent.
    second.check_auth().expect("check auth again");
    assert!(second.is_authenticated());
}

#[test]
fn check_auth_clears_stale_token() {
    let persistence = seeded();
    persistence
        .set_session_token("deleted-user")
        .expect("set token");

    let mut identity = IdentityProvider::new(persistence.clone());
    identity.check_auth().expect("check auth");

    assert_eq!(identity.state(), &AuthState::Unauthenticated);
    assert!(persistence
        .store()
        .read(SESSION_KEY)
        .expect("read")
        .is_none());
}

#[test]
fn check_auth_failure_leaves_unauthenticated() {
    let persistence = Persistence::in_memory();
    persistence.set_session_token("u1").expect("set token");
    persistence
        .store()
        .write(&Collection::Users.key(), "{corrupt")
        .expect("write");

    let mut identity = IdentityProvider::new(persistence);
    let err = identity.check_auth().expect_err("corrupt users");
    assert!(matches!(err, Error::Json(_)));
    assert_eq!(identity.state(), &AuthState::Unauthenticated);
}

#[test]
fn logout_clears_token() {
    let persistence = seeded();
    let mut identity = IdentityProvider::new(persistence.clone());
    identity.login("admin@example.com", "");
    assert!(identity.is_admin());

    assert!(identity.logout().success);
    assert!(persistence.session_token().expect("token").is_none());
    assert_eq!(identity.current_user(), None);
}

#[test]
fn directory_filters_by_role_and_search() {
    let identity = IdentityProvider::new(seeded());

    let employees = identity
        .directory(&Choice::Only(Role::Employee), None)
        .expect("employees");
    assert_eq!(employees.len(), 2);

    let janes = identity
        .directory(&Choice::All, Some("JANE"))
        .expect("search");
    assert_eq!(janes.len(), 1);
    assert_eq!(janes[0].email, "jane@example.com");

    let admins_named_jane = identity
        .directory(&Choice::Only(Role::Admin), Some("jane"))
        .expect("search");
    assert!(admins_named_jane.is_empty());
}
