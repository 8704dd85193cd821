/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Shared test fixtures: throwaway SQLite databases and a callback server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use notary_notify::{AttestationSigner, Database, GeneratedKeypair, DAL};
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;

/// A migrated SQLite database in a temporary directory.
///
/// The directory (and the database) is removed when the fixture is dropped.
pub struct TestDatabase {
    _dir: TempDir,
    pub database: Database,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("notary.db");
        let database = Database::new(path.to_str().expect("Temp path is not UTF-8"))
            .expect("Failed to open database");
        database
            .run_migrations()
            .await
            .expect("Failed to run migrations");

        Self {
            _dir: dir,
            database,
        }
    }

    pub fn dal(&self) -> DAL {
        DAL::new(self.database.clone())
    }
}

pub fn test_signer() -> (AttestationSigner, GeneratedKeypair) {
    let keypair = notary_notify::generate_signing_keypair();
    let signer = AttestationSigner::from_keypair(&keypair).expect("Failed to load keypair");
    (signer, keypair)
}

/// One PUT received by the callback server.
#[derive(Debug, Clone)]
pub struct ReceivedCallback {
    pub path: String,
    pub body: Value,
}

#[derive(Clone)]
struct CallbackState {
    received: Arc<Mutex<Vec<ReceivedCallback>>>,
    statuses: Arc<Mutex<Vec<u16>>>,
}

/// An HTTP server on an ephemeral port that records every PUT.
///
/// Responses follow a script of status codes; once the script runs out every
/// request gets `200 OK`.
pub struct CallbackServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedCallback>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl CallbackServer {
    pub async fn start(script: Vec<u16>) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = CallbackState {
            received: received.clone(),
            statuses: Arc::new(Mutex::new(script.into_iter().rev().collect())),
        };

        let app = Router::new()
            .route("/callbacks/{name}", put(record_callback))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind callback server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Callback server failed");
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("http://{}/callbacks/{}", self.addr, name)
    }

    pub fn received(&self) -> Vec<ReceivedCallback> {
        self.received.lock().clone()
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record_callback(
    State(state): State<CallbackState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.received.lock().push(ReceivedCallback {
        path: name,
        body,
    });
    let status = state.statuses.lock().pop().unwrap_or(200);
    StatusCode::from_u16(status).unwrap_or(StatusCode::OK)
}
