use serde_json::Value;

use crate::document::{Object, first_object, get_non_empty_str, get_object, get_port, get_str};
use crate::stream_params::{QueryParams, extract_stream_params};

pub const DEFAULT_NAME: &str = "bpb";

/// Protocols that never describe a remote server.
pub const SKIP_PROTOCOLS: &[&str] = &["dns", "freedom", "blackhole"];

/// Protocols with a share-link builder.
pub const ALLOW_PROTOCOLS: &[&str] = &["vless", "trojan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Vless,
    Trojan,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vless => "vless",
            Self::Trojan => "trojan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Supported(Protocol),
    Skipped(&'a str),
    Unsupported(&'a str),
}

pub fn classify_protocol(protocol: &str) -> Classification<'_> {
    if SKIP_PROTOCOLS.contains(&protocol) {
        return Classification::Skipped(protocol);
    }
    if !ALLOW_PROTOCOLS.contains(&protocol) {
        return Classification::Unsupported(protocol);
    }
    match protocol {
        "vless" => Classification::Supported(Protocol::Vless),
        "trojan" => Classification::Supported(Protocol::Trojan),
        other => Classification::Unsupported(other),
    }
}

/// Why an outbound could not be turned into a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingServer,
    MissingAddress,
    MissingPort,
    MissingUser,
    MissingUuid,
    MissingPassword,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingServer => "missing server entry",
            Self::MissingAddress => "missing address",
            Self::MissingPort => "missing port",
            Self::MissingUser => "missing user entry",
            Self::MissingUuid => "missing user id",
            Self::MissingPassword => "missing password",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Built(String),
    NotRepresentable(SkipReason),
}

pub fn build_link(protocol: Protocol, outbound: &Object, fallback_name: &str) -> LinkOutcome {
    match protocol {
        Protocol::Vless => build_vless_link(outbound, fallback_name),
        Protocol::Trojan => build_trojan_link(outbound, fallback_name),
    }
}

/// `vless://<uuid>@<host>:<port>?<query>#<name>` from the first `vnext` server
/// and its first user.
pub fn build_vless_link(outbound: &Object, fallback_name: &str) -> LinkOutcome {
    let Some(server) = server_entry(outbound, "vnext") else {
        return LinkOutcome::NotRepresentable(SkipReason::MissingServer);
    };
    let Some(user) = first_object(server, "users") else {
        return LinkOutcome::NotRepresentable(SkipReason::MissingUser);
    };
    let (host, port) = match endpoint(server) {
        Ok(v) => v,
        Err(reason) => return LinkOutcome::NotRepresentable(reason),
    };
    let Some(uuid) = get_non_empty_str(user, "id") else {
        return LinkOutcome::NotRepresentable(SkipReason::MissingUuid);
    };

    let mut params = QueryParams::new();
    params.set(
        "encryption",
        get_non_empty_str(user, "encryption").unwrap_or("none"),
    );
    if let Some(flow) = get_non_empty_str(user, "flow") {
        params.set("flow", flow);
    }
    params.merge(extract_stream_params(outbound.get("streamSettings")));

    LinkOutcome::Built(format!(
        "vless://{}@{}:{}?{}#{}",
        uuid,
        host,
        port,
        encode_query(&params),
        percent_encode_rfc3986(display_name(outbound, fallback_name)),
    ))
}

/// `trojan://<password>@<host>:<port>?<query>#<name>` from the first `servers`
/// entry.
pub fn build_trojan_link(outbound: &Object, fallback_name: &str) -> LinkOutcome {
    let Some(server) = server_entry(outbound, "servers") else {
        return LinkOutcome::NotRepresentable(SkipReason::MissingServer);
    };
    let (host, port) = match endpoint(server) {
        Ok(v) => v,
        Err(reason) => return LinkOutcome::NotRepresentable(reason),
    };
    let Some(password) = get_non_empty_str(server, "password") else {
        return LinkOutcome::NotRepresentable(SkipReason::MissingPassword);
    };

    let params = extract_stream_params(outbound.get("streamSettings"));

    LinkOutcome::Built(format!(
        "trojan://{}@{}:{}?{}#{}",
        percent_encode_rfc3986(password),
        host,
        port,
        encode_query(&params),
        percent_encode_rfc3986(display_name(outbound, fallback_name)),
    ))
}

fn server_entry<'a>(outbound: &'a Object, list_key: &str) -> Option<&'a Object> {
    let settings = get_object(outbound, "settings")?;
    first_object(settings, list_key)
}

fn endpoint(server: &Object) -> Result<(String, u16), SkipReason> {
    let host = normalize_host(get_str(server, "address").unwrap_or_default());
    if host.is_empty() {
        return Err(SkipReason::MissingAddress);
    }
    let port = get_port(server, "port").ok_or(SkipReason::MissingPort)?;
    Ok((host, port))
}

fn display_name<'a>(outbound: &'a Object, fallback_name: &'a str) -> &'a str {
    get_non_empty_str(outbound, "tag")
        .or(Some(fallback_name).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_NAME)
}

/// Brackets bare IPv6 literals for use in a URI authority.
///
/// Heuristic: any unbracketed host containing `:` is taken to be an IPv6
/// literal. The address itself is not validated.
pub fn normalize_host(host: &str) -> String {
    let h = host.trim();
    if h.is_empty() || (h.starts_with('[') && h.ends_with(']')) {
        return h.to_string();
    }
    if h.contains(':') && !h.starts_with('[') {
        return format!("[{h}]");
    }
    h.to_string()
}

pub fn encode_query(params: &QueryParams) -> String {
    let mut out = String::new();
    for (idx, (key, value)) in params.iter().enumerate() {
        if idx > 0 {
            out.push('&');
        }
        out.push_str(&form_encode(key));
        out.push('=');
        out.push_str(&form_encode(value));
    }
    out
}

/// Query component encoding: RFC 3986 unreserved bytes pass through, space
/// becomes `+`, everything else is `%XX`.
fn form_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        if *b == b' ' {
            out.push('+');
        } else {
            push_encoded(&mut out, *b);
        }
    }
    out
}

pub fn percent_encode_rfc3986(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        push_encoded(&mut out, *b);
    }
    out
}

fn push_encoded(out: &mut String, c: u8) {
    let is_unreserved =
        matches!(c, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~');
    if is_unreserved {
        out.push(c as char);
    } else {
        out.push('%');
        out.push(hex_upper_nibble((c >> 4) & 0x0f));
        out.push(hex_upper_nibble(c & 0x0f));
    }
}

fn hex_upper_nibble(n: u8) -> char {
    match n {
        0..=9 => (b'0' + n) as char,
        10..=15 => (b'A' + (n - 10)) as char,
        _ => unreachable!("nibble must be <= 15"),
    }
}

/// Protocol identifier of an outbound, if it is a string.
pub fn outbound_protocol(outbound: &Value) -> Option<&str> {
    outbound.as_object().and_then(|o| get_str(o, "protocol"))
}
