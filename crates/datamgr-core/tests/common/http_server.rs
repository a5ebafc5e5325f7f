//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Serves a fixed set of paths with GET; everything else is 404. Counts the
//! GET requests each path received so tests can assert on re-downloads.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Route {
    pub body: Vec<u8>,
    /// Sent as `Content-Disposition` when set.
    pub disposition: Option<String>,
}

impl Route {
    pub fn body(body: &[u8]) -> Self {
        Route {
            body: body.to_vec(),
            disposition: None,
        }
    }
}

/// Handle to a running server. The server thread lives until the process exits.
pub struct TestServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    /// Full URL for `path` (which must start with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET requests received for `path` so far.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

pub fn start(routes: HashMap<String, Route>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/").to_string();
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    match routes.get(&path) {
        Some(route) => {
            let disposition = route
                .disposition
                .as_deref()
                .map(|d| format!("Content-Disposition: {}\r\n", d))
                .unwrap_or_default();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
                route.body.len(),
                disposition
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&route.body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
            );
        }
    }
    let _ = stream.flush();
}
