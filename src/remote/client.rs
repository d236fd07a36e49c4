//! Blocking Datadog API client.

use reqwest::blocking::Client;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{classify, run_with_retries, ApiError, Disposition, RemoteApi, RemoteResource, RetryPolicy};
use crate::config::Settings;
use crate::documents::BoardKind;

/// Response of `GET /v1/validate`.
#[derive(Debug, Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(rename = "valid")]
    is_valid: bool,
}

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    body: String,
}

/// Issues CRUD calls against the Datadog API.
///
/// Read calls are wrapped in the bounded-backoff [`RetryPolicy`]; write
/// calls execute exactly once. Credentials are passed in at construction;
/// the client never reads process environment.
pub struct DatadogClient {
    http: Client,
    host: String,
    api_key: String,
    app_key: String,
    retry: RetryPolicy,
}

impl DatadogClient {
    /// Build a client from application settings.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            http,
            host: settings.host.clone(),
            api_key: settings.api_key.clone(),
            app_key: settings.app_key.clone(),
            retry: RetryPolicy {
                max_elapsed: settings.retry_timeout,
                ..RetryPolicy::default()
            },
        })
    }

    /// Full URL for an API path, with both auth keys appended as query
    /// parameters (joined onto an existing query string if one is present).
    fn uri_for(&self, api: &str) -> String {
        let sep = if api.contains('?') { '&' } else { '?' };
        format!(
            "{}/api{}{}api_key={}&application_key={}",
            self.host, api, sep, self.api_key, self.app_key
        )
    }

    /// Perform one request attempt, no retries.
    fn send_once(
        &self,
        method: &Method,
        api: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, ApiError> {
        let mut request = self.http.request(method.clone(), self.uri_for(api));
        if let Some(json) = body {
            request = request.json(json);
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(RawResponse { status, body })
    }

    /// Perform a request under the retry policy, returning the terminal
    /// response (2xx or 4xx) or the last error once the budget runs out.
    fn send_with_retries(
        &self,
        method: &Method,
        api: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, ApiError> {
        run_with_retries(&self.retry, || {
            let response = self
                .send_once(method, api, body)
                .map_err(backoff::Error::transient)?;
            match classify(response.status) {
                Disposition::Success | Disposition::Terminal => Ok(response),
                Disposition::Retry => {
                    log::debug!(
                        "Retryable response {} from {} {}",
                        response.status,
                        method,
                        api
                    );
                    Err(backoff::Error::transient(ApiError::Status {
                        status: response.status,
                        body: response.body,
                    }))
                }
            }
        })
    }

    /// Method + path + optional JSON body, JSON result.
    ///
    /// Non-idempotent verbs (POST, PUT, DELETE) execute exactly once;
    /// everything else goes through the retry policy. A terminal non-2xx
    /// response becomes [`ApiError::Status`]; an empty 2xx body is treated
    /// as an empty JSON object.
    fn do_json_request(
        &self,
        method: Method,
        api: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let single_shot =
            method == Method::POST || method == Method::PUT || method == Method::DELETE;
        let response = if single_shot {
            self.send_once(&method, api, body)?
        } else {
            self.send_with_retries(&method, api, body)?
        };

        if classify(response.status) != Disposition::Success {
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

impl RemoteApi for DatadogClient {
    fn validate_credentials(&self) -> Result<bool, ApiError> {
        let response = self.send_with_retries(&Method::GET, "/v1/validate", None)?;
        interpret_validation(response.status, &response.body)
    }

    fn list(&self, kind: BoardKind) -> Result<Vec<RemoteResource>, ApiError> {
        let response = self.do_json_request(Method::GET, kind.api_root(), None)?;
        Ok(parse_list(kind, &response))
    }

    fn create(&self, kind: BoardKind, body: &Map<String, Value>) -> Result<String, ApiError> {
        let response = self.do_json_request(
            Method::POST,
            kind.api_root(),
            Some(&Value::Object(body.clone())),
        )?;
        extract_created_id(&response).ok_or_else(|| {
            ApiError::MalformedResponse(format!(
                "create response for {} carried no resource id: {}",
                kind, response
            ))
        })
    }

    fn delete(&self, kind: BoardKind, id: &str) -> Result<(), ApiError> {
        let api = format!("{}/{}", kind.api_root(), id);
        self.do_json_request(Method::DELETE, &api, None)?;
        Ok(())
    }
}

/// Turn a validation response into a credential verdict.
///
/// Both 200 and 403 carry a meaningful `{errors, valid}` body; any other
/// status is an unrecoverable transport-level failure and its body is not
/// parsed.
fn interpret_validation(status: u16, body: &str) -> Result<bool, ApiError> {
    match status {
        200 | 403 => {
            let parsed: ValidationResponse = serde_json::from_str(body)
                .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
            for error in &parsed.errors {
                log::warn!("Credential validation: {}", error);
            }
            Ok(parsed.is_valid)
        }
        status => Err(ApiError::Status {
            status,
            body: body.to_string(),
        }),
    }
}

/// Normalize a JSON id (string or number) to a string.
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract `{id, title}` summaries from a list response.
///
/// Entries without a usable id or title are skipped; the remote service
/// does produce null titles.
fn parse_list(kind: BoardKind, response: &Value) -> Vec<RemoteResource> {
    let Some(items) = response.get(kind.list_key()).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(id_to_string)?;
            let title = item.get("title").and_then(Value::as_str)?;
            Some(RemoteResource {
                id,
                title: title.to_string(),
            })
        })
        .collect()
}

/// Pull the created resource's id out of a create response: either nested
/// under the `dash` wrapper or at the top level.
fn extract_created_id(response: &Value) -> Option<String> {
    if let Some(id) = response
        .get("dash")
        .and_then(|d| d.get("id"))
        .and_then(id_to_string)
    {
        return Some(id);
    }
    response.get("id").and_then(id_to_string)
}
