// HTTP front for the analyzer.
//
// Architecture: `tiny_http` owns the socket and the HTTP framing. A listener
// thread polls `Server::recv_timeout` so it can notice `ServerHandle::stop`, and
// hands each request to its own thread. Requests are converted into the plain
// `Request`/`Response` pair so that `route` stays a pure function. The analyzer
// is shared read-only behind an `Arc`, so handler threads never coordinate.
//
// Routes:
//   POST /analyze         one poem   -> PoemAnalysis
//   POST /batch-analyze   many poems -> per-poem result or error
//   GET  /health          liveness plus a syllable-counter smoke test
//   GET  /*               files from the front-end `dist` directory, falling
//                         back to `index.html` for client-side routes

use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use serde_json::json;
use tiny_http::{Header, Server};
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::config::ServerConfig;

fn default_title() -> String {
  "Untitled".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoemRequest {
  pub poem_text: String,
  #[serde(default = "default_title")]
  pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPoemRequest {
  pub poems: Vec<PoemRequest>,
}

/// One entry of a batch response. `analysis` is `{}` when `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoemAnalysisResult {
  pub title: String,
  pub analysis: serde_json::Value,
  pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub method: String,
  pub path: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Request {
  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub content_type: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn json(status: u16, value: &serde_json::Value) -> Response {
    Response {
      status,
      content_type: "application/json".to_owned(),
      headers: vec![],
      body: value.to_string().into_bytes(),
    }
  }

  fn detail(status: u16, detail: impl Into<String>) -> Response {
    Response::json(status, &json!({ "detail": detail.into() }))
  }

  fn empty(status: u16) -> Response {
    Response { status, content_type: "text/plain".to_owned(), headers: vec![], body: vec![] }
  }
}

fn content_type_for(path: &Path) -> &'static str {
  match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
    "html" => "text/html; charset=utf-8",
    "js" | "mjs" => "text/javascript",
    "css" => "text/css",
    "json" => "application/json",
    "svg" => "image/svg+xml",
    "png" => "image/png",
    "ico" => "image/x-icon",
    "txt" => "text/plain; charset=utf-8",
    _ => "application/octet-stream"
  }
}

/// Everything a handler thread needs.
pub struct AppState {
  pub analyzer: Analyzer,
  pub config: ServerConfig,
}

fn analyze_endpoint(state: &AppState, body: &[u8]) -> Response {
  let request: PoemRequest = match serde_json::from_slice(body) {
    Ok(request) => request,
    Err(e) => return Response::detail(422, e.to_string())
  };

  match state.analyzer.analyze_text(request.poem_text, title_identifier(&request.title)) {
    Ok(analysis) => match serde_json::to_value(&analysis) {
      Ok(value) => Response::json(200, &value),
      Err(e) => Response::detail(500, format!("Analysis failed: {}", e))
    },
    Err(e) if e.is_precondition() => Response::detail(400, e.to_string()),
    Err(e) => Response::detail(500, format!("Analysis failed: {}", e))
  }
}

fn batch_analyze_endpoint(state: &AppState, body: &[u8]) -> Response {
  let request: BatchPoemRequest = match serde_json::from_slice(body) {
    Ok(request) => request,
    Err(e) => return Response::detail(422, e.to_string())
  };

  let results: Vec<PoemAnalysisResult> = request.poems.into_iter().map(|poem| {
    let outcome = state.analyzer.analyze_text(poem.poem_text, title_identifier(&poem.title))
      .and_then(|analysis| Ok(serde_json::to_value(&analysis)?));
    match outcome {
      Ok(analysis) => PoemAnalysisResult { title: poem.title, analysis, error: None },
      Err(e) => PoemAnalysisResult { title: poem.title, analysis: json!({}), error: Some(e.to_string()) }
    }
  }).collect();

  let total = results.len();
  Response::json(200, &json!({ "results": results, "total": total }))
}

fn health_endpoint(state: &AppState) -> Response {
  let counts = state.analyzer.estimator().estimate("test");
  if counts.is_empty() {
    return Response::json(200, &json!({ "status": "unhealthy", "error": "syllable counter returned nothing" }));
  }
  Response::json(200, &json!({
    "status": "healthy",
    "syllable_counter": "operational",
    "cmu_dict": "loaded"
  }))
}

/// Resolves `request_path` inside `dist_dir`, refusing anything that escapes it.
fn resolve_static(dist_dir: &Path, request_path: &str) -> Option<PathBuf> {
  let root = dist_dir.canonicalize().ok()?;
  let candidate = root.join(request_path.trim_start_matches('/')).canonicalize().ok()?;
  (candidate.starts_with(&root) && candidate.is_file()).then_some(candidate)
}

fn serve_frontend(dist_dir: &Path, request_path: &str) -> Response {
  let file = resolve_static(dist_dir, request_path)
    .or_else(|| resolve_static(dist_dir, "index.html"));

  match file.map(|path| fs::read(&path).map(|body| (path, body))) {
    Some(Ok((path, body))) => Response {
      status: 200,
      content_type: content_type_for(&path).to_owned(),
      headers: vec![],
      body,
    },
    Some(Err(e)) => Response::detail(500, e.to_string()),
    None => Response::json(404, &json!({ "error": "Frontend not found" }))
  }
}

fn add_cors_headers(request: &Request, response: &mut Response, allowed_origins: &[String]) {
  let Some(origin) = request.header("origin") else {
    return;
  };
  if !allowed_origins.iter().any(|o| o == origin) {
    return;
  }
  response.headers.push(("Access-Control-Allow-Origin".to_owned(), origin.to_owned()));
  response.headers.push(("Access-Control-Allow-Credentials".to_owned(), "true".to_owned()));
  response.headers.push(("Vary".to_owned(), "Origin".to_owned()));
  if request.method == "OPTIONS" {
    response.headers.push(("Access-Control-Allow-Methods".to_owned(), "GET, POST, OPTIONS".to_owned()));
    let requested = request.header("access-control-request-headers").unwrap_or("Content-Type");
    response.headers.push(("Access-Control-Allow-Headers".to_owned(), requested.to_owned()));
  }
}

pub fn route(state: &AppState, request: &Request) -> Response {
  let mut response = match (request.method.as_str(), request.path.as_str()) {
    ("OPTIONS", _) => Response::empty(204),
    ("POST", "/analyze") => analyze_endpoint(state, &request.body),
    ("POST", "/batch-analyze") => batch_analyze_endpoint(state, &request.body),
    ("GET", "/health") => health_endpoint(state),
    (_, "/analyze") | (_, "/batch-analyze") | (_, "/health") => Response::detail(405, "Method Not Allowed"),
    ("GET", path) => serve_frontend(&state.config.dist_dir, path),
    _ => Response::detail(404, "Not Found")
  };
  add_cors_headers(request, &mut response, &state.config.allowed_origins);
  response
}

/// The poem identifier for an HTTP title: the stem of `<title>.txt`, as if the
/// poem had been uploaded as a file of that name.
fn title_identifier(title: &str) -> String {
  Path::new(&format!("{}.txt", title)).file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| title.to_owned())
}

/// Reads at most `max_body_bytes` of the (possibly chunked) request body.
fn read_body(request: &mut tiny_http::Request, max_body_bytes: usize) -> Result<Vec<u8>, Response> {
  if request.body_length().map_or(false, |n| n > max_body_bytes) {
    return Err(Response::detail(413, "Request body too large"));
  }
  let mut body = vec![];
  request.as_reader()
    .take(max_body_bytes as u64 + 1)
    .read_to_end(&mut body)
    .map_err(|e| Response::detail(400, format!("Malformed request body: {}", e)))?;
  if body.len() > max_body_bytes {
    return Err(Response::detail(413, "Request body too large"));
  }
  Ok(body)
}

fn to_request(request: &mut tiny_http::Request, max_body_bytes: usize) -> Result<Request, Response> {
  let method = request.method().to_string();
  let path = request.url().split('?').next().unwrap_or("/").to_owned();
  let headers = request.headers().iter()
    .map(|h| (h.field.to_string(), h.value.to_string()))
    .collect();
  let body = read_body(request, max_body_bytes)?;
  Ok(Request { method, path, headers, body })
}

fn to_tiny_response(response: Response) -> tiny_http::Response<io::Cursor<Vec<u8>>> {
  let headers = std::iter::once(("Content-Type".to_owned(), response.content_type))
    .chain(response.headers);
  let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);
  for (name, value) in headers {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
      Ok(header) => out.add_header(header),
      Err(()) => warn!("Dropping unrepresentable header {}", name)
    }
  }
  out
}

fn handle_request(mut request: tiny_http::Request, state: &AppState) -> io::Result<()> {
  let response = match to_request(&mut request, state.config.max_body_bytes) {
    Ok(parsed) => {
      let response = route(state, &parsed);
      debug!("{} {} -> {}", parsed.method, parsed.path, response.status);
      response
    },
    Err(response) => response
  };
  request.respond(to_tiny_response(response))
}

/// Handle returned by `start_server` to stop the running server.
pub struct ServerHandle {
  keep_running: Arc<AtomicBool>,
  thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
  /// Stop accepting connections and wait for the listener thread to exit.
  /// Requests already being handled run to completion on their own threads.
  pub fn stop(mut self) {
    self.keep_running.store(false, Ordering::SeqCst);
    if let Some(handle) = self.thread.take() {
      let _ = handle.join();
    }
  }

  /// Block until the listener thread exits.
  pub fn join(mut self) {
    if let Some(handle) = self.thread.take() {
      let _ = handle.join();
    }
  }
}

/// Bind and start serving on a background thread. Returns the bound address,
/// which is useful when port 0 lets the OS pick one.
pub fn start_server(config: ServerConfig, analyzer: Analyzer) -> io::Result<(ServerHandle, SocketAddr)> {
  let server = Server::http((config.host.as_str(), config.port))
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
  let addr = server.server_addr().to_ip()
    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "server is not bound to an IP address"))?;

  let keep_running = Arc::new(AtomicBool::new(true));
  let keep_running_listener = keep_running.clone();
  let state = Arc::new(AppState { analyzer, config });

  let thread = thread::spawn(move || {
    while keep_running_listener.load(Ordering::SeqCst) {
      match server.recv_timeout(Duration::from_millis(100)) {
        Ok(Some(request)) => {
          let peer = request.remote_addr().copied();
          let state = state.clone();
          thread::spawn(move || {
            if let Err(e) = handle_request(request, &state) {
              warn!("Responding to {:?} failed: {}", peer, e);
            }
          });
        },
        Ok(None) => {},
        Err(e) => {
          warn!("Listener stopped: {}", e);
          break;
        }
      }
    }
  });

  info!("Serving poem analysis on http://{}", addr);
  Ok((ServerHandle { keep_running, thread: Some(thread) }, addr))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StripSets;
  use crate::pronunciation::tests::fixture;
  use crate::syllables::SyllableEstimator;

  fn state_with_dist(dist_dir: PathBuf) -> AppState {
    let analyzer = Analyzer::new(SyllableEstimator::new(Arc::new(fixture()), StripSets::default()), false);
    AppState { analyzer, config: ServerConfig { dist_dir, ..ServerConfig::default() } }
  }

  fn state() -> AppState {
    state_with_dist(PathBuf::from("/nonexistent/dist"))
  }

  fn post(path: &str, body: &str) -> Request {
    Request { method: "POST".to_owned(), path: path.to_owned(), headers: vec![], body: body.as_bytes().to_vec() }
  }

  fn body_json(response: &Response) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
  }

  fn get(path: &str) -> Request {
    Request { method: "GET".to_owned(), path: path.to_owned(), headers: vec![], body: vec![] }
  }

  #[test]
  fn test_analyze() {
    let body = json!({
      "poem_text": "Born out of the void\nAmidst the stars of flesh\n\nSecond stanza line one\nSecond stanza line two",
      "title": "Test Poem"
    }).to_string();
    let response = route(&state(), &post("/analyze", &body));
    assert_eq!(response.status, 200);
    let data = body_json(&response);
    assert_eq!(data["stanza_texts"].as_array().unwrap().len(), 2);
    assert_eq!(data["line_counts"], json!([2, 2]));
    assert_eq!(data["syllables_per_line"][0], json!([5, 6]));
  }

  #[test]
  fn test_analyze_default_title() {
    let response = route(&state(), &post("/analyze", r#"{"poem_text": "Roses are red\nViolets are blue"}"#));
    assert_eq!(response.status, 200);
  }

  #[test]
  fn test_analyze_empty_text_is_400() {
    let response = route(&state(), &post("/analyze", r#"{"poem_text": "", "title": "Empty"}"#));
    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response)["detail"], "Poem text cannot be empty");
  }

  #[test]
  fn test_analyze_missing_field_is_422() {
    let response = route(&state(), &post("/analyze", r#"{"title": "No Text"}"#));
    assert_eq!(response.status, 422);
    assert!(body_json(&response)["detail"].is_string());
  }

  #[test]
  fn test_batch_isolates_failures() {
    let body = json!({
      "poems": [
        { "poem_text": "Born out of the void", "title": "Good" },
        { "poem_text": "   ", "title": "Blank" },
        { "poem_text": "fear not the night\nfear not the light" }
      ]
    }).to_string();
    let response = route(&state(), &post("/batch-analyze", &body));
    assert_eq!(response.status, 200);
    let data = body_json(&response);
    assert_eq!(data["total"], 3);
    let results = data["results"].as_array().unwrap();
    assert!(results[0]["error"].is_null());
    assert_eq!(results[0]["analysis"]["syllables_per_line"], json!([[5]]));
    assert_eq!(results[1]["title"], "Blank");
    assert_eq!(results[1]["analysis"], json!({}));
    assert_eq!(results[1]["error"], "Poem text cannot be empty");
    assert_eq!(results[2]["title"], "Untitled");
    assert_eq!(results[2]["analysis"]["anaphora"][0], json!(["fear not the", "fear not the"]));
  }

  #[test]
  fn test_batch_empty_list() {
    let response = route(&state(), &post("/batch-analyze", r#"{"poems": []}"#));
    assert_eq!(body_json(&response), json!({ "results": [], "total": 0 }));
  }

  #[test]
  fn test_health() {
    let response = route(&state(), &get("/health"));
    assert_eq!(response.status, 200);
    assert_eq!(body_json(&response)["status"], "healthy");
  }

  #[test]
  fn test_wrong_method() {
    assert_eq!(route(&state(), &get("/analyze")).status, 405);
    assert_eq!(route(&state(), &post("/elsewhere", "")).status, 404);
  }

  #[test]
  fn test_cors() {
    let mut request = get("/health");
    request.headers.push(("Origin".to_owned(), "http://localhost:5173".to_owned()));
    let response = route(&state(), &request);
    assert!(response.headers.contains(&("Access-Control-Allow-Origin".to_owned(), "http://localhost:5173".to_owned())));

    let mut request = get("/health");
    request.headers.push(("Origin".to_owned(), "http://evil.example".to_owned()));
    assert!(route(&state(), &request).headers.is_empty());

    let mut preflight = get("/analyze");
    preflight.method = "OPTIONS".to_owned();
    preflight.headers.push(("Origin".to_owned(), "http://localhost:5173".to_owned()));
    let response = route(&state(), &preflight);
    assert_eq!(response.status, 204);
    assert!(response.headers.iter().any(|(n, _)| n == "Access-Control-Allow-Methods"));
  }

  #[test]
  fn test_frontend() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html>oracle</html>").unwrap();
    fs::create_dir(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
    let state = state_with_dist(dir.path().to_owned());

    let response = route(&state, &get("/assets/app.js"));
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/javascript");
    assert_eq!(response.body, b"console.log(1)");

    let response = route(&state, &get("/some/client/route"));
    assert_eq!(response.body, b"<html>oracle</html>");

    let response = route(&state, &get("/../../etc/passwd"));
    assert_eq!(response.body, b"<html>oracle</html>");
  }

  #[test]
  fn test_frontend_missing() {
    let response = route(&state(), &get("/"));
    assert_eq!(response.status, 404);
    assert_eq!(body_json(&response), json!({ "error": "Frontend not found" }));
  }

  #[test]
  fn test_title_becomes_file_stem() {
    assert_eq!(title_identifier("Voidborn"), "Voidborn");
    assert_eq!(title_identifier("Love/Hate"), "Hate");
    assert_eq!(title_identifier(""), ".txt");
    assert_eq!(title_identifier("Untitled"), "Untitled");
  }

  #[test]
  fn test_awkward_titles_still_analyse() {
    for title in ["Love/Hate", "", "back\\slash"] {
      let body = json!({ "poem_text": "Born out of the void", "title": title }).to_string();
      let response = route(&state(), &post("/analyze", &body));
      assert_eq!(response.status, 200, "{:?}", title);
    }

    let body = json!({ "poems": [{ "poem_text": "Born out of the void", "title": "Either/Or" }] }).to_string();
    let data = body_json(&route(&state(), &post("/batch-analyze", &body)));
    assert_eq!(data["results"][0]["title"], "Either/Or");
    assert!(data["results"][0]["error"].is_null());
    assert_eq!(data["results"][0]["analysis"]["syllables_per_line"], json!([[5]]));
  }

  #[test]
  fn test_title_stem_is_stripped_from_poem() {
    let body = json!({ "poem_text": "Hate\nBorn out of the void", "title": "Love/Hate" }).to_string();
    let data = body_json(&route(&state(), &post("/analyze", &body)));
    assert_eq!(data["stanza_texts"], json!(["Born out of the void"]));
  }

  fn exchange(addr: SocketAddr, raw: &[u8]) -> String {
    use std::io::Write;
    use std::net::TcpStream;

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    reply
  }

  fn serve(max_body_bytes: usize) -> (ServerHandle, SocketAddr) {
    let analyzer = state().analyzer;
    let config = ServerConfig { port: 0, max_body_bytes, ..ServerConfig::default() };
    start_server(config, analyzer).unwrap()
  }

  #[test]
  fn test_server_round_trip() {
    let (handle, addr) = serve(1 << 20);

    let reply = exchange(addr, b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 200"), "{}", reply);
    assert!(reply.contains("application/json"));
    assert!(reply.contains("\"healthy\""));

    handle.stop();
  }

  #[test]
  fn test_server_reads_chunked_body() {
    let (handle, addr) = serve(1 << 20);

    let body = r#"{"poem_text": "Born out of the void"}"#;
    let raw = format!(
      "POST /analyze HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n{}\r\n0\r\n\r\n",
      body.len(), body
    );
    let reply = exchange(addr, raw.as_bytes());
    assert!(reply.starts_with("HTTP/1.1 200"), "{}", reply);
    assert!(reply.contains("\"syllables_per_line\":[[5]]"), "{}", reply);

    handle.stop();
  }

  #[test]
  fn test_server_rejects_large_body() {
    let (handle, addr) = serve(16);

    let body = json!({ "poem_text": "Born out of the void, amidst the stars of flesh" }).to_string();
    let raw = format!(
      "POST /analyze HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      body.len(), body
    );
    let reply = exchange(addr, raw.as_bytes());
    assert!(reply.starts_with("HTTP/1.1 413"), "{}", reply);

    handle.stop();
  }
}
