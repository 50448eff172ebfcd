//! Looking up game profiles from the session servers.
//!
//! Lookups block for as long as the remote service rate limits us, so they are meant to run off
//! the network thread. [`ProfileQuery::spawn_by_uuid`] does exactly that.
use crate::prelude::*;
use crate::config::ProfileConfig;
use crossbeam_channel::{bounded, Receiver};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Names per request the bulk name endpoint accepts.
const NAMES_PER_REQUEST: usize = 100;

/// The HTTP client. Bodies are returned as text, an empty body meaning "no content".
pub trait ProfileTransport: Send + Sync {
    fn get(&self, url: &str) -> io::Result<String>;
    fn post_json(&self, url: &str, body: &str) -> io::Result<String>;
}

/// Talks to the real services over HTTP.
///
/// Error statuses still hand their body back, since the rate limiter answers 429 with a JSON
/// `error` that [`ProfileQuery`] knows to retry.
#[derive(Debug)]
pub struct HttpTransport {
    agent: ureq::Agent,
}
impl HttpTransport {
    pub fn new(timeout: time::Duration) -> Self {
        Self { agent: ureq::AgentBuilder::new().timeout(timeout).build() }
    }
    fn body(result: Result<ureq::Response, ureq::Error>) -> io::Result<String> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                log::debug!("{} answered {status}", response.get_url());
                response
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
        };
        if response.status() == 204 {
            return Ok(String::new());
        }
        response.into_string()
    }
}
impl ProfileTransport for HttpTransport {
    fn get(&self, url: &str) -> io::Result<String> {
        Self::body(self.agent.get(url).call())
    }
    fn post_json(&self, url: &str, body: &str) -> io::Result<String> {
        Self::body(self.agent.post(url).set("Content-Type", "application/json").send_string(body))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub name: String,
    pub properties: Vec<ProfileProperty>,
}

#[derive(Deserialize)]
struct ProfileResponse {
    name: String,
    #[serde(default)]
    properties: Vec<ProfileProperty>,
}
#[derive(Deserialize)]
struct NameResponse {
    id: String,
    name: String,
}

pub struct ProfileQuery<T> {
    transport: T,
    config: ProfileConfig,
}
impl<T: ProfileTransport> ProfileQuery<T> {
    pub fn new(transport: T, config: ProfileConfig) -> Self {
        Self { transport, config }
    }

    pub fn by_uuid(&self, uuid: Uuid, signed: bool) -> Result<GameProfile, ProfileError> {
        let url = format!(
            "{}/session/minecraft/profile/{}{}",
            self.config.session_server,
            uuid.simple(),
            if signed { "?unsigned=false" } else { "" },
        );
        let backoff = time::Duration::from_secs(self.config.backoff_secs);
        for attempt in 1..=self.config.max_attempts {
            let body = self.transport.get(&url)?;
            if body.trim().is_empty() {
                return Err(ProfileError::NotFound(uuid.to_string()));
            }
            let json: serde_json::Value = serde_json::from_str(&body)?;
            if json.get("error").is_some() {
                log::warn!("profile lookup for {uuid} rate limited (attempt {attempt})");
                if attempt < self.config.max_attempts {
                    std::thread::sleep(backoff);
                }
                continue;
            }
            let profile: ProfileResponse = serde_json::from_value(json)?;
            return Ok(GameProfile { uuid, name: profile.name, properties: profile.properties });
        }
        Err(ProfileError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("no profile for {uuid} after {} attempts", self.config.max_attempts),
        )))
    }

    /// Resolves names to uuids. Names the service doesn't know are left out.
    pub fn uuids_by_name<S: AsRef<str>>(&self, names: &[S]) -> Result<HashMap<String, Uuid>, ProfileError> {
        let url = format!("{}/profiles/minecraft", self.config.api_server);
        let mut found = HashMap::new();
        for batch in names.chunks(NAMES_PER_REQUEST) {
            let batch: Vec<&str> = batch.iter().map(AsRef::as_ref).collect();
            let body = self.transport.post_json(&url, &serde_json::to_string(&batch)?)?;
            let entries: Vec<NameResponse> = serde_json::from_str(&body)?;
            for entry in entries {
                found.insert(entry.name, Uuid::parse_str(&entry.id)?);
            }
        }
        Ok(found)
    }
}
impl ProfileQuery<HttpTransport> {
    /// A query against the servers named in `config`.
    pub fn http(config: ProfileConfig) -> Self {
        let transport = HttpTransport::new(time::Duration::from_secs(config.timeout_secs));
        Self::new(transport, config)
    }
}
impl<T: ProfileTransport + 'static> ProfileQuery<T> {
    /// Runs [`ProfileQuery::by_uuid`] on its own thread.
    pub fn spawn_by_uuid(self: &Arc<Self>, uuid: Uuid, signed: bool) -> Receiver<Result<GameProfile, ProfileError>> {
        let (tx, rx) = bounded(1);
        let query = Arc::clone(self);
        let result_tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("profile-{uuid}"))
            .spawn(move || {
                let _ = result_tx.send(query.by_uuid(uuid, signed));
            });
        if let Err(e) = spawned {
            let _ = tx.send(Err(e.into()));
        }
        rx
    }
}
impl<T> std::fmt::Debug for ProfileQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileQuery").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<(String, Option<String>)>>,
    }
    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self { replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()), ..Self::default() }
        }
        fn next(&self, url: &str, body: Option<&str>) -> io::Result<String> {
            self.requests.lock().unwrap().push((url.into(), body.map(Into::into)));
            self.replies.lock().unwrap().pop_front().ok_or_else(|| io::ErrorKind::NotConnected.into())
        }
    }
    impl ProfileTransport for Scripted {
        fn get(&self, url: &str) -> io::Result<String> {
            self.next(url, None)
        }
        fn post_json(&self, url: &str, body: &str) -> io::Result<String> {
            self.next(url, Some(body))
        }
    }

    fn config() -> ProfileConfig {
        ProfileConfig { backoff_secs: 0, ..ProfileConfig::default() }
    }
    const RATE_LIMITED: &str = r#"{"error":"TooManyRequestsException"}"#;

    #[test]
    fn profile_with_properties() {
        let uuid = Uuid::from_u128(0x069a79f444e94726a5befca90e38aaf5);
        let transport = Scripted::new(&[
            r#"{"id":"069a79f444e94726a5befca90e38aaf5","name":"Notch","properties":[{"name":"textures","value":"abc","signature":"sig"}]}"#,
        ]);
        let query = ProfileQuery::new(transport, config());
        let profile = query.by_uuid(uuid, true).unwrap();
        assert_eq!(profile.name, "Notch");
        assert_eq!(profile.properties[0].signature.as_deref(), Some("sig"));
        let requests = query.transport.requests.lock().unwrap();
        assert_eq!(
            requests[0].0,
            "https://sessionserver.mojang.com/session/minecraft/profile/069a79f444e94726a5befca90e38aaf5?unsigned=false"
        );
    }

    #[test]
    fn empty_body_is_not_found() {
        let query = ProfileQuery::new(Scripted::new(&[""]), config());
        assert!(matches!(query.by_uuid(Uuid::nil(), false), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn rate_limits_are_retried() {
        let query = ProfileQuery::new(Scripted::new(&[RATE_LIMITED, RATE_LIMITED, r#"{"name":"jeb_"}"#]), config());
        assert_eq!(query.by_uuid(Uuid::nil(), false).unwrap().name, "jeb_");
        assert_eq!(query.transport.requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn retries_are_bounded() {
        let query = ProfileQuery::new(Scripted::new(&[RATE_LIMITED; 8]), config());
        assert!(matches!(query.by_uuid(Uuid::nil(), false), Err(ProfileError::Io(_))));
        assert_eq!(query.transport.requests.lock().unwrap().len(), 6);
    }

    #[test]
    fn names_are_posted_in_batches() {
        let names: Vec<String> = (0..150).map(|i| format!("player{i}")).collect();
        let transport = Scripted::new(&[r#"[{"id":"069a79f444e94726a5befca90e38aaf5","name":"player0"}]"#, "[]"]);
        let query = ProfileQuery::new(transport, config());
        let found = query.uuids_by_name(&names).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["player0"], Uuid::from_u128(0x069a79f444e94726a5befca90e38aaf5));

        let requests = query.transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "https://api.mojang.com/profiles/minecraft");
        let second: Vec<String> = serde_json::from_str(requests[1].1.as_deref().unwrap()).unwrap();
        assert_eq!(second.len(), 50);
    }

    /// Answers one request per canned response, then hangs up. Returns the base url.
    fn serve(responses: &[&'static str]) -> (String, std::sync::mpsc::Receiver<String>) {
        use std::io::{Read, Write};
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = std::sync::mpsc::channel();
        let responses = responses.to_vec();
        std::thread::spawn(move || {
            for response in responses {
                let (mut conn, _) = listener.accept().unwrap();
                let mut request = vec![];
                let mut buf = [0; 1024];
                let header_end = loop {
                    let n = conn.read(&mut buf).unwrap();
                    request.extend_from_slice(&buf[..n]);
                    if let Some(i) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                        break i + 4;
                    }
                };
                let head = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                while request.len() < header_end + length {
                    let n = conn.read(&mut buf).unwrap();
                    request.extend_from_slice(&buf[..n]);
                }
                tx.send(String::from_utf8_lossy(&request).into_owned()).unwrap();
                conn.write_all(response.as_bytes()).unwrap();
            }
        });
        (url, rx)
    }

    fn http_config(url: &str) -> ProfileConfig {
        ProfileConfig { session_server: url.into(), api_server: url.into(), timeout_secs: 5, ..config() }
    }

    #[test]
    fn http_lookup_retries_after_429() {
        let (url, requests) = serve(&[
            "HTTP/1.1 429 Too Many Requests\r\nContent-Length: 36\r\nConnection: close\r\n\r\n{\"error\":\"TooManyRequestsException\"}",
            "HTTP/1.1 200 OK\r\nContent-Length: 15\r\nConnection: close\r\n\r\n{\"name\":\"jeb_\"}",
        ]);
        let query = ProfileQuery::http(http_config(&url));
        let uuid = Uuid::from_u128(0x853c80ef3c3749fdaa49938b674adae6);
        assert_eq!(query.by_uuid(uuid, false).unwrap().name, "jeb_");
        let first = requests.recv().unwrap();
        assert!(first.starts_with("GET /session/minecraft/profile/853c80ef3c3749fdaa49938b674adae6 HTTP/1.1"), "{first}");
    }

    #[test]
    fn http_no_content_is_not_found() {
        let (url, _requests) = serve(&["HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n"]);
        let query = ProfileQuery::http(http_config(&url));
        assert!(matches!(query.by_uuid(Uuid::nil(), false), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn http_posts_names_as_json() {
        let (url, requests) = serve(&["HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]"]);
        let query = ProfileQuery::http(http_config(&url));
        assert!(query.uuids_by_name(&["Notch"]).unwrap().is_empty());
        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /profiles/minecraft HTTP/1.1"), "{request}");
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"["Notch"]"#), "{request}");
    }

    #[test]
    fn unreachable_servers_are_io_errors() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let query = ProfileQuery::http(http_config(&url));
        assert!(matches!(query.by_uuid(Uuid::nil(), false), Err(ProfileError::Io(_))));
    }

    #[test]
    fn spawned_lookups_report_back() {
        let query = Arc::new(ProfileQuery::new(Scripted::new(&[r#"{"name":"Dinnerbone"}"#]), config()));
        let rx = query.spawn_by_uuid(Uuid::nil(), false);
        let profile = rx.recv_timeout(time::Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(profile.name, "Dinnerbone");
    }
}
