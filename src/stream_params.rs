use serde_json::Value;

use crate::document::{
    Object, get_bool, get_non_empty_array, get_non_empty_str, get_object, get_str,
};

/// Share-link query parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value in place so the key keeps its
    /// original position.
    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn merge(&mut self, other: QueryParams) {
        for (key, value) in other.pairs {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Maps an Xray `streamSettings` object to share-link query parameters.
///
/// Only `tls` security and `ws` transport are understood; other kinds add
/// nothing. Anything that is not an object yields an empty set.
pub fn extract_stream_params(stream: Option<&Value>) -> QueryParams {
    let mut params = QueryParams::new();
    let Some(stream) = stream.and_then(Value::as_object) else {
        return params;
    };

    if get_str(stream, "security") == Some("tls") {
        params.set("security", "tls");
        if let Some(tls) = get_object(stream, "tlsSettings") {
            extract_tls(tls, &mut params);
        }
    }

    if get_str(stream, "network") == Some("ws") {
        params.set("type", "ws");
        if let Some(ws) = get_object(stream, "wsSettings") {
            extract_ws(ws, &mut params);
        }
    }

    params
}

fn extract_tls(tls: &Object, params: &mut QueryParams) {
    if let Some(sni) = get_non_empty_str(tls, "serverName") {
        params.set("sni", sni);
    }
    if let Some(fp) = get_non_empty_str(tls, "fingerprint") {
        params.set("fp", fp);
    }
    if let Some(alpn) = get_non_empty_array(tls, "alpn") {
        let protos: Vec<&str> = alpn.iter().filter_map(Value::as_str).collect();
        if !protos.is_empty() {
            params.set("alpn", protos.join(","));
        }
    }
    if let Some(insecure) = get_bool(tls, "allowInsecure") {
        params.set("allowInsecure", if insecure { "1" } else { "0" });
    }
}

fn extract_ws(ws: &Object, params: &mut QueryParams) {
    if let Some(host) = get_non_empty_str(ws, "host") {
        params.set("host", host);
    }
    if let Some(path) = get_non_empty_str(ws, "path") {
        params.set("path", path);
    }
}
