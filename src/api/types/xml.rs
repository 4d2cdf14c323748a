//! Minimal XML responses for callers that ask for `application/xml`

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::ResponseFormat;

/// Types that can render themselves as an XML element
pub trait ToXml {
    fn write_xml(&self, out: &mut String);
}

impl<T: ToXml> ToXml for [T] {
    fn write_xml(&self, out: &mut String) {
        for item in self {
            item.write_xml(out);
        }
    }
}

/// XML response body with an `application/xml` content type
pub struct Xml<T>(pub T);

impl<T: ToXml> IntoResponse for Xml<T> {
    fn into_response(self) -> Response {
        let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        self.0.write_xml(&mut body);

        (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/xml; charset=utf-8"),
            )],
            body,
        )
            .into_response()
    }
}

/// Write `<name>text</name>` with the text escaped
pub fn element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    escape_into(out, text);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}

/// Representation requested by the caller's Accept header; JSON unless XML is asked for
pub fn requested_format(headers: &HeaderMap) -> ResponseFormat {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(ResponseFormat::from_accept)
        .filter(|f| *f == ResponseFormat::Xml)
        .unwrap_or(ResponseFormat::Json)
}

/// Serve `value` as XML or JSON
pub fn negotiated<T>(format: ResponseFormat, value: T) -> Response
where
    T: Serialize + ToXml,
{
    match format {
        ResponseFormat::Xml => Xml(value).into_response(),
        _ => Json(value).into_response(),
    }
}
