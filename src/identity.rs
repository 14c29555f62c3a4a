//! Identity provider.
//!
//! Resolves the current user from the persisted session token and handles
//! login, signup and logout. The session token is the user's id.
//!
//! `login` does not check the password: the stored users carry no
//! credential at all. This mirrors the demo client and is tracked as a known
//! defect rather than silently "fixed" here.
//!
//! Emails compare ASCII case-insensitively everywhere: login, the signup
//! duplicate check and `--assignee` lookups in the CLI.

use crate::error::Result;
use crate::model::{new_id, Choice, Role, User};
use crate::outcome::Outcome;
use crate::storage::{Collection, Persistence};
use crate::views;

/// Authentication state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(User),
}

#[derive(Debug, Clone)]
pub struct IdentityProvider {
    persistence: Persistence,
    state: AuthState,
}

impl IdentityProvider {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            persistence,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(User::is_admin)
    }

    /// Restore the session from the stored token. Safe to call repeatedly.
    ///
    /// A token that points at a deleted user is cleared. A storage error is
    /// returned with the state left at `Unauthenticated`.
    pub fn check_auth(&mut self) -> Result<()> {
        self.state = AuthState::Authenticating;
        match self.restore_session() {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "session check failed");
                self.state = AuthState::Unauthenticated;
                Err(err)
            }
        }
    }

    fn restore_session(&self) -> Result<AuthState> {
        let Some(token) = self.persistence.session_token()? else {
            return Ok(AuthState::Unauthenticated);
        };

        match self.persistence.find::<User>(&Collection::Users, &token)? {
            Some(user) => {
                tracing::debug!(user_id = %user.id, "session restored");
                Ok(AuthState::Authenticated(user))
            }
            None => {
                tracing::warn!(token = %token, "stale session token cleared");
                self.persistence.clear_session_token()?;
                Ok(AuthState::Unauthenticated)
            }
        }
    }

    /// Log in by email. The password is accepted as-is (see module docs).
    pub fn login(&mut self, email: &str, _password: &str) -> Outcome {
        let found = match self.find_by_email(email) {
            Ok(found) => found,
            Err(err) => {
                tracing::error!(error = %err, "login lookup failed");
                return Outcome::fail("Failed to log in.");
            }
        };

        let Some(user) = found else {
            return Outcome::fail("Invalid email or password.");
        };

        if let Err(err) = self.persistence.set_session_token(&user.id) {
            tracing::error!(error = %err, "failed to persist session");
            return Outcome::fail("Failed to log in.");
        }

        tracing::debug!(user_id = %user.id, "logged in");
        self.state = AuthState::Authenticated(user);
        Outcome::ok("Login successful!")
    }

    /// Register a new employee and log them in.
    pub fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Outcome {
        match self.find_by_email(email) {
            Ok(Some(_)) => return Outcome::fail("Email is already in use."),
            Ok(None) => {}
            Err(err) => {
                tracing::error!(error = %err, "signup lookup failed");
                return Outcome::fail("Failed to create account.");
            }
        }

        if password != confirm_password {
            return Outcome::fail("Passwords do not match.");
        }

        let user = User {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Employee,
            avatar: None,
        };

        if let Err(err) = self.persistence.put(&Collection::Users, &user) {
            tracing::error!(error = %err, "failed to store new user");
            return Outcome::fail("Failed to create account.");
        }
        if let Err(err) = self.persistence.set_session_token(&user.id) {
            tracing::error!(error = %err, "failed to persist session for new user");
            // A failed signup leaves no user behind.
            if let Err(err) = self.persistence.delete(&Collection::Users, &user.id) {
                tracing::warn!(error = %err, user_id = %user.id, "failed to roll back new user");
            }
            return Outcome::fail("Failed to create account.");
        }

        tracing::debug!(user_id = %user.id, "account created");
        self.state = AuthState::Authenticated(user);
        Outcome::ok("Account created successfully!")
    }

    /// Forget the session. Always succeeds from the caller's point of view.
    pub fn logout(&mut self) -> Outcome {
        if let Err(err) = self.persistence.clear_session_token() {
            tracing::warn!(error = %err, "failed to clear session token");
        }
        self.state = AuthState::Unauthenticated;
        Outcome::ok("Logged out.")
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.persistence.get(&Collection::Users)
    }

    pub fn user(&self, id: &str) -> Result<Option<User>> {
        self.persistence.find(&Collection::Users, id)
    }

    /// `Choice::All` returns everyone.
    pub fn users_with_role(&self, role: &Choice<Role>) -> Result<Vec<User>> {
        self.directory(role, None)
    }

    /// Case-insensitive match on name or email.
    pub fn search_users(&self, text: &str) -> Result<Vec<User>> {
        self.directory(&Choice::All, Some(text))
    }

    /// Users with `role` whose name or email contains `search`.
    pub fn directory(&self, role: &Choice<Role>, search: Option<&str>) -> Result<Vec<User>> {
        let users = self.users()?;
        let by_role = views::filter_users_by_role(&users, role);
        let matched = match search {
            Some(text) if !text.is_empty() => views::search_users(&by_role, text),
            _ => by_role,
        };
        Ok(matched.into_iter().cloned().collect())
    }

    /// First user whose email matches, ignoring ASCII case.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users()?
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_admin() -> (IdentityProvider, User) {
        let persistence = Persistence::in_memory();
        let admin = User {
            id: "admin-1".into(),
            name: "Admin User".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            avatar: None,
        };
        persistence.put(&Collection::Users, &admin).expect("seed");
        (IdentityProvider::new(persistence), admin)
    }

    #[test]
    fn login_ignores_password() {
        let (mut identity, admin) = provider_with_admin();
        let outcome = identity.login("admin@example.com", "definitely-wrong");
        assert!(outcome.success);
        assert_eq!(identity.current_user(), Some(&admin));
        assert!(identity.is_admin());
    }

    #[test]
    fn login_unknown_email_stays_unauthenticated() {
        let (mut identity, _) = provider_with_admin();
        let outcome = identity.login("nobody@example.com", "x");
        assert_eq!(outcome, Outcome::fail("Invalid email or password."));
        assert_eq!(identity.state(), &AuthState::Unauthenticated);
    }

    #[test]
    fn duplicate_email_checked_before_password_match() {
        let (mut identity, _) = provider_with_admin();
        let outcome = identity.signup("Other", "admin@example.com", "a", "b");
        assert_eq!(outcome.message, "Email is already in use.");
    }

    #[test]
    fn role_and_search_helpers() {
        let (identity, admin) = provider_with_admin();
        assert_eq!(identity.users_with_role(&Choice::All).expect("all"), vec![admin.clone()]);
        assert!(identity
            .users_with_role(&Choice::Only(Role::Employee))
            .expect("employees")
            .is_empty());
        assert_eq!(identity.search_users("ADMIN@").expect("search"), vec![admin]);
    }

    #[test]
    fn logout_is_always_successful() {
        let (mut identity, _) = provider_with_admin();
        assert!(identity.logout().success);
        identity.login("admin@example.com", "");
        assert!(identity.logout().success);
        assert!(!identity.is_authenticated());
        assert!(!identity.is_admin());
    }
}
