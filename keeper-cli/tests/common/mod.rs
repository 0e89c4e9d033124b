//! Stub GitHub server and install-root helpers for binary tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use tempfile::TempDir;

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;

/// Canned responses keyed by request path; unknown paths get 404.
pub struct StubRemote {
    pub base: String,
    routes: Routes,
}

impl StubRemote {
    pub fn start() -> Self {
        let routes: Routes = Arc::default();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("addr");
        let served = Arc::clone(&routes);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                handle(stream, &served);
            }
        });
        Self {
            base: format!("http://{addr}"),
            routes,
        }
    }

    /// Make `sha` the head of `main` and serve `files` at it.
    pub fn publish(&self, sha: &str, files: &[(&str, &str)]) {
        let mut routes = self.routes.lock().expect("routes");
        routes.clear();
        routes.insert(
            "/repos/owner/repo/commits/main".into(),
            (
                200,
                format!(
                    r#"{{"sha":"{sha}","commit":{{"message":"Release {sha}\n\nbody","committer":{{"date":"2024-05-01T10:00:00Z"}},"author":{{"name":"umbra"}}}}}}"#
                ),
            ),
        );
        for (name, content) in files {
            routes.insert(
                format!("/raw/owner/repo/{sha}/Suite/{name}"),
                (200, content.to_string()),
            );
        }
    }

    pub fn fail_commits(&self, status: u16) {
        self.routes.lock().expect("routes").insert(
            "/repos/owner/repo/commits/main".into(),
            (status, "{\"message\":\"Server Error\"}".into()),
        );
    }
}

fn handle(mut stream: TcpStream, routes: &Routes) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
        }
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let (status, body) = routes
        .lock()
        .expect("routes")
        .get(&path)
        .cloned()
        .unwrap_or((404, "Not Found".to_string()));
    let response = format!(
        "HTTP/1.1 {status} STUB\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Install root whose `keeper.yaml` points at `remote` and tracks
/// `a.txt` and `tools/b.py`.
pub fn install_root(remote: &StubRemote) -> TempDir {
    let root = TempDir::new().expect("install root");
    fs::write(
        root.path().join("keeper.yaml"),
        format!(
            "repository:\n  owner: owner\n  name: repo\n  branch: main\n  subtree: Suite\n\
             api_base: {base}\nraw_base: {base}/raw\ntimeout_secs: 2\n\
             tracked_files:\n  - a.txt\n  - tools/b.py\n",
            base = remote.base
        ),
    )
    .expect("write keeper.yaml");
    root
}

pub fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

pub fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).expect("read")
}

pub fn keeper_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("keeper"));
    cmd.arg("--root")
        .arg(root)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}
