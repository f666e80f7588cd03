//! Minimal XML-RPC codec used to talk to the Koji hub.
//!
//! Values are mapped to and from `serde_json::Value`, so that typed records
//! can be deserialized from responses with plain `serde`.

use std::fmt::Write;

use quick_xml::{Reader, escape::escape, events::Event};
use serde_json::{Map, Number, Value};

// Errors.

/// Errors that can occur while decoding an XML-RPC response.
#[derive(Debug, thiserror::Error)]
pub enum XmlRpcError {
    /// The server answered with a `<fault>`.
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },
    /// The response is not a well-formed XML-RPC document.
    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),
}

fn malformed(message: impl std::fmt::Display) -> XmlRpcError {
    XmlRpcError::Malformed(message.to_string())
}

// Encoding.

/// Encodes a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from(r#"<?xml version="1.0"?><methodCall><methodName>"#);
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");

    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }

    out.push_str("</params></methodCall>");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");

    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => {
                let _ = write!(out, "<int>{i}</int>");
            }
            Some(i) => {
                let _ = write!(out, "<i8>{i}</i8>");
            }
            None => {
                let _ = write!(out, "<double>{}</double>", n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }

    out.push_str("</value>");
}

// Decoding.

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            children: Vec::new(),
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Result<&Element, XmlRpcError> {
        self.elements()
            .find(|e| e.name == name)
            .ok_or_else(|| malformed(format!("expected <{name}> inside <{}>", self.name)))
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

/// Parses a document into a small element tree, keeping local names only.
fn parse_document(xml: &str) -> Result<Element, XmlRpcError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => stack.push(Element::named(e.local_name().as_ref())),
            Event::Empty(e) => {
                let element = Element::named(e.local_name().as_ref());
                push_child(&mut stack, Node::Element(element))?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(malformed("unbalanced closing tag"));
                }
                let element = stack.pop().ok_or_else(|| malformed("unbalanced closing tag"))?;
                push_child(&mut stack, Node::Element(element))?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?.into_owned();
                push_child(&mut stack, Node::Text(text))?;
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                push_child(&mut stack, Node::Text(text))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unexpected end of document"));
    }

    let root = stack.pop().unwrap_or_default();

    root.children
        .into_iter()
        .find_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
        .ok_or_else(|| malformed("empty document"))
}

fn push_child(stack: &mut [Element], node: Node) -> Result<(), XmlRpcError> {
    let parent = stack.last_mut().ok_or_else(|| malformed("content outside of the document"))?;
    parent.children.push(node);
    Ok(())
}

/// Decodes a `methodResponse` document into its single return value.
///
/// A `<fault>` response is returned as `XmlRpcError::Fault`.
pub fn decode_response(xml: &str) -> Result<Value, XmlRpcError> {
    let document = parse_document(xml)?;

    if document.name != "methodResponse" {
        return Err(malformed(format!("expected <methodResponse>, found <{}>", document.name)));
    }

    if let Ok(fault) = document.child("fault") {
        let value = decode_value(fault.child("value")?)?;
        let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or_default();
        let message = value.get("faultString").and_then(Value::as_str).unwrap_or_default().to_string();

        return Err(XmlRpcError::Fault { code, message });
    }

    let value = document.child("params")?.child("param")?.child("value")?;

    decode_value(value)
}

fn decode_value(value: &Element) -> Result<Value, XmlRpcError> {
    let Some(typed) = value.elements().next() else {
        // An untyped value is a string.
        return Ok(Value::String(value.text()));
    };

    let text = typed.text();

    match typed.name.as_str() {
        "string" => Ok(Value::String(text)),
        "int" | "i4" | "i8" => {
            let i = text.trim().parse::<i64>().map_err(|e| malformed(format!("bad integer `{text}`: {e}")))?;
            Ok(Value::Number(i.into()))
        }
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(malformed(format!("bad boolean `{other}`"))),
        },
        "double" => {
            let f = text.trim().parse::<f64>().map_err(|e| malformed(format!("bad double `{text}`: {e}")))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        "nil" => Ok(Value::Null),
        "dateTime.iso8601" | "base64" => Ok(Value::String(text.trim().to_string())),
        "array" => typed
            .child("data")?
            .elements()
            .filter(|e| e.name == "value")
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "struct" => {
            let mut members = Map::new();

            for member in typed.elements().filter(|e| e.name == "member") {
                let name = member.child("name")?.text();
                let value = decode_value(member.child("value")?)?;
                members.insert(name, value);
            }

            Ok(Value::Object(members))
        }
        other => Err(malformed(format!("unsupported value type <{other}>"))),
    }
}

// Tests.
