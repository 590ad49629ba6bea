//! Behaviour tests for authentication configuration.
//!
//! These scenarios validate that release builds enforce explicit secrets and
//! toggles while debug builds fall back to development defaults.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

use mockable::MockEnv;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::NamedTempFile;

use storefront::inbound::http::auth_config::{
    AuthConfigError, AuthSettings, BOT_TOKEN_ENV, BuildMode, SECRET_FILE_ENV,
    auth_settings_from_env,
};

struct AuthConfigWorld {
    vars: RefCell<HashMap<String, String>>,
    mode: RefCell<BuildMode>,
    outcome: RefCell<Option<Result<AuthSettings, AuthConfigError>>>,
    secret_files: RefCell<Vec<NamedTempFile>>,
}

impl AuthConfigWorld {
    fn new() -> Self {
        Self {
            vars: RefCell::new(HashMap::new()),
            mode: RefCell::new(BuildMode::Release),
            outcome: RefCell::new(None),
            secret_files: RefCell::new(Vec::new()),
        }
    }

    fn set_env_var(&self, name: &str, value: &str) {
        self.vars
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn add_secret_file(&self, len: usize) {
        let mut file = NamedTempFile::new().expect("temporary secret file");
        file.write_all(&vec![b's'; len]).expect("write secret");
        let path = file
            .path()
            .to_str()
            .expect("temporary path should be valid UTF-8")
            .to_owned();
        self.set_env_var(SECRET_FILE_ENV, &path);
        self.secret_files.borrow_mut().push(file);
    }

    fn evaluate(&self) {
        let env = mock_env(self.vars.borrow().clone());
        let mode = *self.mode.borrow();
        *self.outcome.borrow_mut() = Some(auth_settings_from_env(&env, mode));
    }

    fn with_settings<F>(&self, f: F)
    where
        F: FnOnce(&AuthSettings),
    {
        let outcome = self.outcome.borrow();
        match outcome.as_ref().expect("evaluation result") {
            Ok(settings) => f(settings),
            Err(error) => panic!("expected settings to load, got {error}"),
        }
    }

    fn with_error<F>(&self, f: F)
    where
        F: FnOnce(&AuthConfigError),
    {
        let outcome = self.outcome.borrow();
        match outcome.as_ref().expect("evaluation result") {
            Ok(_) => panic!("expected settings to fail"),
            Err(error) => f(error),
        }
    }
}

fn mock_env(vars: HashMap<String, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn world() -> AuthConfigWorld {
    AuthConfigWorld::new()
}

#[given("a release build configuration")]
fn a_release_build_configuration(world: &AuthConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Release;
}

#[given("a debug build configuration")]
fn a_debug_build_configuration(world: &AuthConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Debug;
}

#[given("{name} is set to {value}")]
fn variable_is_set(world: &AuthConfigWorld, name: String, value: String) {
    world.set_env_var(&name, &value);
}

#[given("a session secret file with {len} bytes")]
fn a_session_secret_file(world: &AuthConfigWorld, len: usize) {
    world.add_secret_file(len);
}

#[when("the authentication configuration is loaded")]
fn the_configuration_is_loaded(world: &AuthConfigWorld) {
    world.evaluate();
}

#[then("the configuration load succeeds")]
fn the_configuration_load_succeeds(world: &AuthConfigWorld) {
    world.with_settings(|settings| {
        assert!(!settings.session_key.is_empty());
    });
}

#[then("the cookie secure flag is true")]
fn the_cookie_secure_flag_is_true(world: &AuthConfigWorld) {
    world.with_settings(|settings| assert!(settings.cookie_secure));
}

#[then("{count} administrators are configured")]
fn administrators_are_configured(world: &AuthConfigWorld, count: usize) {
    world.with_settings(|settings| assert_eq!(settings.admins.len(), count));
}

#[then("the configuration load fails due to missing TELEGRAM_BOT_TOKEN")]
fn fails_missing_bot_token(world: &AuthConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            AuthConfigError::MissingEnv {
                name: BOT_TOKEN_ENV
            }
        ));
    });
}

#[then("the configuration load fails because ephemeral secrets are not allowed")]
fn fails_ephemeral_not_allowed(world: &AuthConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(error, AuthConfigError::EphemeralNotAllowed));
    });
}

#[then("the configuration load fails because the secret is too short")]
fn fails_secret_too_short(world: &AuthConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            AuthConfigError::SecretTooShort { length: 16, .. }
        ));
    });
}

#[scenario(
    path = "tests/features/auth_config.feature",
    name = "Release build with complete configuration"
)]
fn release_build_with_complete_configuration(world: AuthConfigWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_config.feature",
    name = "Release build without the bot token"
)]
fn release_build_without_the_bot_token(world: AuthConfigWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_config.feature",
    name = "Release build refuses ephemeral secrets"
)]
fn release_build_refuses_ephemeral_secrets(world: AuthConfigWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_config.feature",
    name = "Release build rejects a short session secret"
)]
fn release_build_rejects_a_short_secret(world: AuthConfigWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_config.feature",
    name = "Debug build tolerates missing toggles"
)]
fn debug_build_tolerates_missing_toggles(world: AuthConfigWorld) {
    drop(world);
}
