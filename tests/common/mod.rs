//! Shared test infrastructure for integration tests.
//!
//! `MockTurbonomic` is a plain-HTTP stand-in for the API: it records each
//! request and answers from a handler closure, one request per connection.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub cookie: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub set_cookie: Option<String>,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            set_cookie: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self::json(status, serde_json::json!({}))
    }

    pub fn login() -> Self {
        Self {
            status: 200,
            body: String::new(),
            set_cookie: Some("JSESSIONID=test-session; Path=/; HttpOnly".to_string()),
        }
    }
}

pub struct MockTurbonomic {
    pub url: String,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl MockTurbonomic {
    /// Serve `handler` on an ephemeral localhost port. Login is answered for
    /// the handler unless it matches `/api/v3/login` itself.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> Option<Reply> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let log = Arc::new(Mutex::new(Vec::new()));
        let thread_log = Arc::clone(&log);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                let _ = serve_one(stream, &handler, &thread_log);
            }
        });

        Self {
            url: format!("http://{addr}/"),
            log,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().expect("request log").clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|req| req.method == method && req.path == path)
            .count()
    }

    /// Run the binary against this server with `argv`.
    pub fn run(&self, argv: &[&str]) -> Output {
        provision_command()
            .env("TURBONOMIC_ENDPOINT", &self.url)
            .env("TURBONOMIC_USER", "administrator")
            .env("TURBONOMIC_PASSWORD", "secret")
            .args(argv)
            .output()
            .expect("run turbonomic-provision")
    }
}

/// The binary with a scrubbed environment: no credentials, no proxies.
pub fn provision_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_turbonomic-provision"));
    for var in [
        "TURBONOMIC_ENDPOINT",
        "TURBONOMIC_USER",
        "TURBONOMIC_PASSWORD",
        "HTTP_PROXY",
        "http_proxy",
        "HTTPS_PROXY",
        "https_proxy",
        "ALL_PROXY",
        "all_proxy",
    ] {
        command.env_remove(var);
    }
    command.env("RUST_LOG", "debug");
    command
}

fn serve_one<F>(stream: TcpStream, handler: &F, log: &Mutex<Vec<Recorded>>) -> std::io::Result<()>
where
    F: Fn(&Recorded) -> Option<Reply>,
{
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    };

    let mut content_length = 0usize;
    let mut chunked = false;
    let mut cookie = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                "cookie" => cookie = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let body = if chunked {
        read_chunked(&mut reader)?
    } else {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf)?;
        buf
    };

    let recorded = Recorded {
        method,
        path,
        query,
        cookie,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    log.lock().expect("request log").push(recorded.clone());

    let reply = match handler(&recorded) {
        Some(reply) => reply,
        None if recorded.path == "/api/v3/login" => Reply::login(),
        None => Reply::json(404, serde_json::json!({"message": "no route"})),
    };
    write_reply(stream, &reply)
}

fn read_chunked(reader: &mut impl BufRead) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line)?;
        let size_hex = size_line.trim().split(';').next().unwrap_or("0");
        let size = usize::from_str_radix(size_hex, 16).unwrap_or(0);
        if size == 0 {
            let mut trailer = String::new();
            while reader.read_line(&mut trailer)? > 0 && !trailer.trim_end().is_empty() {
                trailer.clear();
            }
            return Ok(body);
        }
        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk)?;
        body.extend_from_slice(&chunk);
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
    }
}

fn write_reply(mut stream: TcpStream, reply: &Reply) -> std::io::Result<()> {
    let reason = match reply.status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let mut head = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    if let Some(cookie) = &reply.set_cookie {
        head.push_str(&format!("Set-Cookie: {cookie}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes())?;
    stream.write_all(reply.body.as_bytes())?;
    stream.flush()
}
