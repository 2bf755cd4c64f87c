//! A mock server on a background thread, for blocking end-to-end tests.
//!
//! The store helpers take the lock with `blocking_write`, so they must be
//! called from plain threads, never from inside an async runtime.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::{oneshot, RwLock};
use tracing::{debug, error};

use crate::model::{ROLE_SYSTEM_ADMIN, ROLE_SYSTEM_USER};
use crate::store::{Db, PurgeReport, Store};
use crate::{app_with, API_PREFIX};

/// Name prefixes that mark test-created entities for `purge_prefixed`.
pub const USER_PREFIX: &str = "fakeuser";
pub const TEAM_PREFIX: &str = "faketeam";
pub const CHANNEL_PREFIX: &str = "fakechannel";

pub struct TestServer {
    addr: SocketAddr,
    db: Db,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind a random local port and serve an empty store on it.
    pub fn start() -> io::Result<Self> {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = std_listener.local_addr()?;
        std_listener.set_nonblocking(true)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let db: Db = Arc::new(RwLock::new(Store::default()));
        let router = app_with(db.clone());
        let (shutdown, stopped) = oneshot::channel::<()>();

        let handle = std::thread::spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(std_listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!(error = %e, "failed to adopt listener");
                        return;
                    }
                };
                let served = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = stopped.await;
                    })
                    .await;
                if let Err(e) = served {
                    error!(error = %e, "mock server stopped with error");
                }
            });
        });

        debug!(%addr, "mock server started");
        Ok(Self {
            addr,
            db,
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    /// Site URL, without the API prefix.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_url(&self) -> String {
        format!("{}{API_PREFIX}", self.url())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down and wait for the serving thread.
    pub fn stop(mut self) {
        self.shutdown_now();
    }

    fn shutdown_now(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn promote_to_admin(&self, user_id: &str) -> bool {
        let mut store = self.db.blocking_write();
        let now = store.tick();
        match store.users.get_mut(user_id) {
            Some(user) => {
                user.roles = format!("{ROLE_SYSTEM_USER} {ROLE_SYSTEM_ADMIN}");
                user.update_at = now;
                true
            }
            None => false,
        }
    }

    pub fn add_user_to_team(&self, user_id: &str, team_id: &str) -> bool {
        self.db.blocking_write().link_user_to_team(user_id, team_id)
    }

    pub fn add_user_to_channel(&self, user_id: &str, channel_id: &str) -> bool {
        self.db.blocking_write().link_user_to_channel(user_id, channel_id)
    }

    /// The pending password reset code for `email`, if one was sent.
    pub fn password_reset_code(&self, email: &str) -> Option<String> {
        let store = self.db.blocking_read();
        let user_id = store.find_user_by_email(email)?.id.clone();
        store
            .reset_codes
            .iter()
            .find(|(_, owner)| **owner == user_id)
            .map(|(code, _)| code.clone())
    }

    /// Remove everything created under the test name prefixes.
    pub fn purge_prefixed(&self) -> PurgeReport {
        let report = self
            .db
            .blocking_write()
            .purge_prefixed(USER_PREFIX, TEAM_PREFIX, CHANNEL_PREFIX);
        debug!(?report, "purged test entities");
        report
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}
