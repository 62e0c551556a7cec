use std::borrow::Cow;

use common::DashboardError;
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Socket.IO v5 packet as carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        payload: Option<Value>,
    },
    Ack {
        namespace: String,
        ack_id: Option<u64>,
        data: Option<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn connect() -> Self {
        Self::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn event(name: &str, payload: Option<Value>) -> Self {
        Self::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            name: name.to_string(),
            payload,
        }
    }

    /// Parses `<type>[<namespace>,][<ack id>][<json>]`. Bare `NaN` and
    /// `Infinity` tokens in the JSON are read as `null`.
    pub fn decode(packet: &str) -> Result<Self, DashboardError> {
        let mut chars = packet.chars();
        let kind = chars
            .next()
            .ok_or_else(|| DashboardError::Protocol("empty socket.io packet".to_string()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(DashboardError::Protocol(
                "binary socket.io packets are not supported".to_string(),
            ));
        }

        let namespace = if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            let namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
            namespace
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let ack_id = if digits > 0 {
            Some(rest[..digits].parse::<u64>().map_err(|e| {
                DashboardError::Protocol(format!("invalid ack id '{}': {}", &rest[..digits], e))
            })?)
        } else {
            None
        };
        rest = &rest[digits..];

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(&sanitize_non_finite(rest))?)
        };

        let packet = match kind {
            '0' => Self::Connect { namespace, data },
            '1' => Self::Disconnect { namespace },
            '2' => {
                let (name, payload) = split_event(data)?;
                Self::Event {
                    namespace,
                    ack_id,
                    name,
                    payload,
                }
            }
            '3' => Self::Ack {
                namespace,
                ack_id,
                data,
            },
            '4' => Self::ConnectError { namespace, data },
            other => {
                return Err(DashboardError::Protocol(format!(
                    "unknown socket.io packet type '{}'",
                    other
                )));
            }
        };
        Ok(packet)
    }

    pub fn encode(&self) -> Result<String, DashboardError> {
        let (kind, namespace, ack_id, data) = match self {
            Self::Connect { namespace, data } => ('0', namespace, None, data.clone()),
            Self::Disconnect { namespace } => ('1', namespace, None, None),
            Self::Event {
                namespace,
                ack_id,
                name,
                payload,
            } => {
                let mut args = vec![Value::String(name.clone())];
                args.extend(payload.clone());
                ('2', namespace, *ack_id, Some(Value::Array(args)))
            }
            Self::Ack {
                namespace,
                ack_id,
                data,
            } => ('3', namespace, *ack_id, data.clone()),
            Self::ConnectError { namespace, data } => ('4', namespace, None, data.clone()),
        };

        let mut out = String::from(kind);
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&serde_json::to_string(&data)?);
        }
        Ok(out)
    }
}

/// `["name", payload?, ...]`; only the first argument is kept.
fn split_event(data: Option<Value>) -> Result<(String, Option<Value>), DashboardError> {
    let Some(Value::Array(args)) = data else {
        return Err(DashboardError::Protocol(
            "event packet without an argument array".to_string(),
        ));
    };

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        other => {
            return Err(DashboardError::Protocol(format!(
                "event name must be a string, got {:?}",
                other
            )));
        }
    };
    Ok((name, args.next()))
}

/// Replaces bare `NaN`, `Infinity` and `-Infinity` outside string literals
/// with `null` so Python-produced payloads parse as JSON.
pub fn sanitize_non_finite(json: &str) -> Cow<'_, str> {
    if !json.contains("NaN") && !json.contains("Infinity") {
        return Cow::Borrowed(json);
    }

    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = json;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else {
            let token = ["-Infinity", "Infinity", "NaN"]
                .into_iter()
                .find(|token| rest.starts_with(token));
            if let Some(token) = token {
                out.push_str("null");
                rest = &rest[token.len()..];
                continue;
            }
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}
