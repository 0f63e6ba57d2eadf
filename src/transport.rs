use crate::error::*;
use serde_json::Value;
use std::{fmt, time::Duration};
use url::Url;

/// Default registry endpoint
pub const DEFAULT_ENDPOINT: &str = "quay.io";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Probed once at construction to detect an invalid API token.
const AUTH_PROBE_PATH: &str = "/api/v1/superuser/users/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    /// Parsed JSON body. A body that fails to parse is `None`, never an error.
    pub json: Option<Value>,
}

/// A single authenticated request/response exchange against the registry API.
///
/// This is the seam between the resource clients and the network. The
/// production implementation is [`Transport`]; tests substitute a scripted
/// implementation.
pub trait Rest {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response>;

    fn get(&self, path: &str) -> Result<Response> {
        self.send(Method::Get, path, None)
    }

    fn post(&self, path: &str, body: Option<&Value>) -> Result<Response> {
        self.send(Method::Post, path, body)
    }

    fn put(&self, path: &str, body: Option<&Value>) -> Result<Response> {
        self.send(Method::Put, path, body)
    }

    fn delete(&self, path: &str) -> Result<Response> {
        self.send(Method::Delete, path, None)
    }
}

/// A client for the Quay API of a single registry
#[derive(Debug)]
pub struct Transport {
    agent: ureq::Agent,
    /// URL to registry server
    base: Url,
    /// OAuth bearer token, sent with every request and never logged
    token: String,
}

impl Transport {
    /// Connect to `endpoint` with the default timeout.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        Self::with_timeout(endpoint, token, DEFAULT_TIMEOUT)
    }

    /// Connect to `endpoint` and probe the API once; an invalid token
    /// fails here with [`Error::AuthenticationFailed`] before any other
    /// operation is attempted.
    pub fn with_timeout(endpoint: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base = endpoint_url(endpoint)?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let transport = Transport {
            agent,
            base,
            token: token.to_string(),
        };
        let res = transport.get(AUTH_PROBE_PATH)?;
        if res.status_code == 401 {
            return Err(Error::AuthenticationFailed);
        }
        Ok(transport)
    }
}

impl Rest for Transport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = self.base.join(path)?;
        log::info!("{} {}", method, url);
        let req = match method {
            Method::Get => self.agent.get(url.as_str()),
            Method::Post => self.agent.post(url.as_str()),
            Method::Put => self.agent.put(url.as_str()),
            Method::Delete => self.agent.delete(url.as_str()),
        }
        .set("Authorization", &format!("Bearer {}", self.token))
        .set("Content-Type", "application/json");

        let result = match body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };
        // Error statuses carry meaning (exists() reads 404) and are
        // returned as a plain Response. Only transport-level failures are
        // errors; nothing is retried.
        let res = match result {
            Ok(res) => res,
            Err(ureq::Error::Status(_, res)) => res,
            Err(ureq::Error::Transport(e)) => return Err(e.into()),
        };
        let status_code = res.status();
        let json = res.into_json::<Value>().ok();
        Ok(Response { status_code, json })
    }
}

/// Interpret a response that has exactly one success status.
pub(crate) fn expect(
    method: Method,
    path: &str,
    res: Response,
    success: u16,
) -> Result<Option<Value>> {
    if res.status_code == success {
        Ok(res.json)
    } else {
        Err(unexpected(method, path, res))
    }
}

pub(crate) fn unexpected(method: Method, path: &str, res: Response) -> Error {
    Error::UnexpectedResponse {
        method,
        path: path.to_string(),
        status: res.status_code,
        body: res.json,
    }
}

fn endpoint_url(endpoint: &str) -> Result<Url> {
    // Local registries run without TLS
    let scheme = if endpoint.starts_with("localhost") {
        "http"
    } else {
        "https"
    };
    Ok(Url::parse(&format!("{}://{}", scheme, endpoint))?)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Scripted transport: pops canned responses in order and records
    /// every request it receives.
    pub struct FakeRest {
        responses: RefCell<Vec<Response>>,
        calls: RefCell<Vec<(Method, String, Option<Value>)>>,
    }

    impl FakeRest {
        pub fn new(responses: Vec<(u16, Option<Value>)>) -> Self {
            FakeRest {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(status_code, json)| Response { status_code, json })
                        .collect(),
                ),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(Method, String, Option<Value>)> {
            self.calls.borrow().clone()
        }
    }

    impl Rest for FakeRest {
        fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
            self.calls
                .borrow_mut()
                .push((method, path.to_string(), body.cloned()));
            let mut responses = self.responses.borrow_mut();
            assert!(!responses.is_empty(), "unexpected request: {} {}", method, path);
            Ok(responses.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_scheme() -> Result<()> {
        assert_eq!(endpoint_url("quay.io")?.as_str(), "https://quay.io/");
        assert_eq!(
            endpoint_url("quay.example.com:8443")?.as_str(),
            "https://quay.example.com:8443/"
        );
        assert_eq!(
            endpoint_url("localhost:8080")?.as_str(),
            "http://localhost:8080/"
        );
        Ok(())
    }

    #[test]
    fn expect_success_passes_body_through() {
        let res = Response {
            status_code: 200,
            json: Some(serde_json::json!({"name": "widget"})),
        };
        let body = expect(Method::Get, "/api/v1/repository/widget", res, 200).unwrap();
        assert_eq!(body.unwrap()["name"], "widget");
    }

    #[test]
    fn expect_other_status_is_an_error() {
        let res = Response {
            status_code: 400,
            json: None,
        };
        let err = expect(Method::Post, "/api/v1/repository", res, 201).unwrap_err();
        match err {
            Error::UnexpectedResponse {
                method,
                path,
                status,
                body,
            } => {
                assert_eq!(method, Method::Post);
                assert_eq!(path, "/api/v1/repository");
                assert_eq!(status, 400);
                assert!(body.is_none());
            }
            other => panic!("wrong error: {:?}", other),
        }
    }

    //
    // Needs a local registry, see the repository tests for the scripted
    // transport used everywhere else.
    //

    #[test]
    #[ignore]
    fn live_probe_rejects_bad_token() {
        let err = Transport::new("localhost:8080", "not-a-token").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
    }
}
