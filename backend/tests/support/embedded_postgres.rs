//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! One cluster is shared per test binary. Every test gets a fresh database
//! cloned from a template that already carries the migrations, so tests never
//! see each other's rows and migrations run once per schema revision.
//!
//! Set `SKIP_TEST_CLUSTER=1` where the cluster cannot start (no network for
//! the binary download, no writable data directory).

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::sql_types::{BigInt, Text, Uuid as SqlUuid};
use diesel::{Connection, RunQueryDsl};
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

use storefront::domain::{ItemId, UserId};
use storefront::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "storefront_template";
const RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const POOL_SIZE: u32 = 4;

/// A migrated database with a pool and a runtime to drive it.
///
/// Tests stay synchronous and block on the runtime, so one runtime serves
/// every repository call in a test.
pub struct DatabaseContext {
    pub runtime: Runtime,
    pub pool: DbPool,
    pub database_url: String,
    _database: TemporaryDatabase,
}

impl DatabaseContext {
    /// Run `future` to completion on the context's runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Insert a user row through a blocking connection.
    pub fn seed_user(&self, external_id: &str) -> UserId {
        let id = Uuid::new_v4();
        let mut conn = PgConnection::establish(&self.database_url).expect("seed connection");
        diesel::sql_query(
            "INSERT INTO users (id, external_id, display_name) VALUES ($1, $2, $3)",
        )
        .bind::<SqlUuid, _>(id)
        .bind::<Text, _>(external_id)
        .bind::<Text, _>("Seeded User")
        .execute(&mut conn)
        .expect("seed user");
        UserId::from_uuid(id)
    }

    /// Insert an item row owned by `seller`. Items are managed outside the
    /// service, so no repository writes them.
    pub fn seed_item(&self, seller: &UserId, price: i64) -> ItemId {
        let id = Uuid::new_v4();
        let mut conn = PgConnection::establish(&self.database_url).expect("seed connection");
        diesel::sql_query(
            "INSERT INTO items (id, seller_id, title, price, booking_code) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind::<SqlUuid, _>(id)
        .bind::<SqlUuid, _>(*seller.as_uuid())
        .bind::<Text, _>("Saturday accumulator")
        .bind::<BigInt, _>(price)
        .bind::<Text, _>("SPORTY-8K2L")
        .execute(&mut conn)
        .expect("seed item");
        ItemId::from_uuid(id)
    }
}

/// Fixture body shared by the Diesel suites.
///
/// Returns `None` only when `SKIP_TEST_CLUSTER` allows skipping.
pub fn database_context() -> Option<DatabaseContext> {
    match setup_database_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn setup_database_context() -> Result<DatabaseContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(&database_url)
        .with_max_size(POOL_SIZE)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(DatabaseContext {
        runtime,
        pool,
        database_url,
        _database: database,
    })
}

fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when allowed, otherwise fail loudly so CI breakage is
/// not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// The process-wide cluster, retried while another binary releases its data
/// directory.
fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{RETRIES} failed: {error:?}");
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("shared cluster: {error:?}")),
        }
    }
}

/// Pin `PG_PASSWORD` so a reused data directory keeps accepting logins.
///
/// The embedded settings otherwise generate a new random password per
/// process while `initdb` only runs for the first one.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library spawns threads; the shared
        // handle is initialised at most once per process.
        unsafe {
            std::env::set_var("PG_PASSWORD", "storefront_embedded_test");
        }
    }
}

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Create the migrated template once per schema revision.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        run_pending_migrations(&url).map_err(|err| format!("migrate template: {err}"))?;
    }
    Ok(template_name)
}

fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("create database from template: exhausted retries");
    for attempt in 1..=RETRIES {
        let provisioned = ensure_template_database(cluster).and_then(|template_name| {
            let db_name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(db_name.as_str(), template_name.as_str())
                .map_err(|err| format!("create database from template: {err:?}"))
        });
        match provisioned {
            Ok(database) => return Ok(database),
            Err(error) => last_error = format!("attempt {attempt}/{RETRIES}: {error}"),
        }
        if attempt < RETRIES {
            std::thread::sleep(RETRY_DELAY);
        }
    }
    Err(last_error)
}
