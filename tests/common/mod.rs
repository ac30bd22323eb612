// In-process mock of the content API for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use cookpress::config::Config;
use cookpress::ContentClient;

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: Value,
    pub headers: Vec<(&'static str, String)>,
    /// Answer with the request body plus this id.
    pub echo_id: Option<u64>,
}

impl MockResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            headers: Vec::new(),
            echo_id: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body: json!({ "code": "mock_error", "message": "mock failure" }),
            headers: Vec::new(),
            echo_id: None,
        }
    }

    pub fn echo(id: u64) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: Value::Null,
            headers: Vec::new(),
            echo_id: Some(id),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

#[derive(Clone, Default)]
pub struct MockApi {
    routes: Arc<Mutex<HashMap<(Method, String), MockResponse>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub fn on(&self, method: Method, path: &str, response: MockResponse) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), response);
        self
    }

    pub fn get(&self, path: &str, response: MockResponse) -> &Self {
        self.on(Method::GET, path, response)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// The only request recorded so far.
    pub fn single_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {:?}", requests);
        requests.into_iter().next().unwrap()
    }

    /// Bind to an ephemeral port and serve until the test ends.
    pub async fn start(&self) -> SocketAddr {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

async fn handle(State(mock): State<MockApi>, method: Method, uri: Uri, body: Bytes) -> Response {
    let query: HashMap<String, String> = uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let body: Option<Value> = serde_json::from_slice(&body).ok();

    mock.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query,
        body: body.clone(),
    });

    let route = mock
        .routes
        .lock()
        .unwrap()
        .get(&(method, uri.path().to_string()))
        .cloned();

    let Some(route) = route else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "rest_no_route", "message": "No route" })),
        )
            .into_response();
    };

    let payload = match (route.echo_id, body) {
        (Some(id), Some(Value::Object(mut fields))) => {
            fields.insert("id".to_string(), json!(id));
            Value::Object(fields)
        }
        _ => route.body,
    };

    let mut response = (route.status, Json(payload)).into_response();
    for (name, value) in route.headers {
        response.headers_mut().insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(&value).unwrap(),
        );
    }
    response
}

pub fn config_for(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("http://{}/wp-json", addr);
    config
}

pub async fn client_with(mock: &MockApi) -> ContentClient {
    let addr = mock.start().await;
    ContentClient::new(&config_for(addr)).unwrap()
}

pub fn sample_post(id: u64, slug: &str, date: &str) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "date": date,
        "title": { "rendered": slug.replace('-', " ") },
        "excerpt": { "rendered": "<p>Tasty</p>", "protected": false },
        "categories": [3, 7],
        "tags": [11],
        "author": 2,
        "_embedded": {
            "author": [{ "id": 2, "name": "Tiffy", "slug": "tiffy" }]
        }
    })
}
