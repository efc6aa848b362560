//! Property tests for header merging, querystring composition, and codecs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use harness_client::{
    codec, Client, ClientConfig, ClientDefinition, Headers, HttpRequest, HttpResponse, Transport,
    TransportError,
};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Echoes the request body back, recording every request.
#[derive(Default)]
struct Loopback {
    sent: Mutex<Vec<HttpRequest>>,
}

impl Loopback {
    fn last(&self) -> HttpRequest {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for Loopback {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let body = request.body.as_ref().map(|b| b.to_text()).unwrap_or_default();
        self.sent.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: 200,
            headers: Headers::new(),
            body,
        })
    }
}

fn client(definition: ClientDefinition) -> (Client<Arc<Loopback>>, Arc<Loopback>) {
    let config = ClientConfig::new("http://localhost:3000").unwrap();
    let loopback = Arc::new(Loopback::default());
    let client = Client::new(Arc::new(definition), &config, Arc::clone(&loopback));
    (client, loopback)
}

fn header_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z][a-z-]{0,8}", "[ -~]{0,12}", 0..6)
}

fn request_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9]{1,8}", 1..4).prop_map(|segments| format!("/{}", segments.join("/")))
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[ -~]{0,10}".prop_map(Value::String),
    ]
}

fn mapping() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,6}", scalar(), 1..5)
        .prop_map(|entries| entries.into_iter().collect())
}

fn document() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn merged_headers_prefer_call_site(definition_headers in header_map(), call_headers in header_map()) {
        let mut definition = ClientDefinition::new();
        for (name, value) in &definition_headers {
            definition.set_header(name.as_str(), value.as_str());
        }
        let (client, loopback) = client(definition);
        let call: Headers = call_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        client.get("/items", None, Some(&call)).unwrap();
        let sent = loopback.last().headers;

        for name in definition_headers.keys().chain(call_headers.keys()) {
            let expected = call_headers.get(name).or_else(|| definition_headers.get(name));
            prop_assert_eq!(sent.get(name), expected.map(String::as_str));
        }
        let distinct = definition_headers.keys().chain(call_headers.keys()).collect::<BTreeSet<_>>();
        prop_assert_eq!(sent.len(), distinct.len());
    }

    #[test]
    fn nil_and_empty_data_resolve_identically(path in request_path()) {
        let (client, loopback) = client(ClientDefinition::new());

        client.get(&path, None, None).unwrap();
        let absent = loopback.last().url;
        client.get(&path, Some(&Value::Object(Map::new())), None).unwrap();
        let empty = loopback.last().url;

        prop_assert!(!absent.contains('?'));
        prop_assert_eq!(absent, empty);
    }

    #[test]
    fn non_empty_data_becomes_form_encoded_query(path in request_path(), data in mapping()) {
        let (client, loopback) = client(ClientDefinition::new());
        let data = Value::Object(data);

        client.get(&path, Some(&data), None).unwrap();

        let expected = format!(
            "http://localhost:3000{}?{}",
            path,
            codec::form_encode(&codec::form_pairs(&data))
        );
        prop_assert_eq!(loopback.last().url, expected);
        prop_assert!(loopback.last().body.is_none());
    }

    #[test]
    fn json_codecs_round_trip_through_echo(data in document()) {
        let (client, _) = client(ClientDefinition::json());
        let returned = client.post("/echo", Some(&data), None).unwrap();
        prop_assert_eq!(returned, data);
    }

    #[test]
    fn encoder_never_sees_absent_data(path in request_path()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut definition = ClientDefinition::new();
        definition.register_encoder(move |data| {
            counter.fetch_add(1, Ordering::SeqCst);
            codec::json_encode(data)
        });
        let (client, loopback) = client(definition);

        client.post(&path, None, None).unwrap();
        client.put(&path, None, None).unwrap();

        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        prop_assert!(loopback.last().body.is_none());
    }
}
