use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::signer::SessionSigner;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub signer: Arc<SessionSigner>,
}

impl AppState {
    /// Build the shared state. `secret` keys the session cookie signature.
    pub fn new(db: DbPool, config: Config, secret: &str) -> Self {
        Self {
            db,
            config,
            signer: Arc::new(SessionSigner::new(secret)),
        }
    }
}
