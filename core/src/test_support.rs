//! In-memory transport and tracked bodies for unit tests.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::http::{HttpRequest, HttpResponse, ResponseBody, Transport, TransportError};

/// Set once the body it was created with has been dropped.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFlag(Arc<AtomicBool>);

impl ReleaseFlag {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct TrackedBody {
    inner: io::Cursor<Vec<u8>>,
    released: ReleaseFlag,
}

impl TrackedBody {
    pub fn new(text: &str) -> (ResponseBody, ReleaseFlag) {
        let released = ReleaseFlag::default();
        let body = TrackedBody {
            inner: io::Cursor::new(text.as_bytes().to_vec()),
            released: released.clone(),
        };
        (ResponseBody::new(body), released)
    }
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.0.store(true, Ordering::SeqCst);
    }
}

/// A scripted server answer.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    released: ReleaseFlag,
}

impl Canned {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            released: ReleaseFlag::default(),
        }
    }

    /// Canned answer plus a flag reporting when its body was released.
    pub fn tracked(status: u16, body: &str) -> (Self, ReleaseFlag) {
        let canned = Self::new(status, body);
        let flag = canned.released.clone();
        (canned, flag)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn into_response(self) -> HttpResponse {
        let body = TrackedBody {
            inner: io::Cursor::new(self.body.into_bytes()),
            released: self.released,
        };
        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: ResponseBody::new(body),
        }
    }
}

enum Step {
    Respond(Canned),
    Fail(String),
}

/// Replays canned answers in order and records every request it receives.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new(answers: Vec<Canned>) -> Self {
        Self {
            script: Mutex::new(answers.into_iter().map(Step::Respond).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, canned: Canned) {
        self.script.lock().unwrap().push_back(Step::Respond(canned));
    }

    /// Make the next send fail as if the server were unreachable.
    pub fn fail_next(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_front(Step::Fail(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Step::Respond(canned)) => Ok(canned.into_response()),
            Some(Step::Fail(reason)) => Err(reason.into()),
            None => Err("fake transport has no scripted answer".into()),
        }
    }
}

pub fn fake_client(answers: Vec<Canned>) -> (Client, Arc<FakeTransport>) {
    let transport = Arc::new(FakeTransport::new(answers));
    let client = Client::with_transport(
        &ClientConfig::new("http://localhost:8065"),
        transport.clone(),
    );
    (client, transport)
}
