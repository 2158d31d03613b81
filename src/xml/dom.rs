use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::ExtractError;

/// One element of a parsed document: resolved namespace URI, local name,
/// attributes (local names only), and child elements in document order.
///
/// CFDI is attribute-carried — character data is never significant — so
/// text nodes are not retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Resolved namespace URI, `None` for elements bound to no namespace.
    pub ns: Option<String>,
    /// Local name without prefix (e.g. `Comprobante`, not `cfdi:Comprobante`).
    pub name: String,
    /// Attribute local names and unescaped values, in document order.
    pub attrs: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Attribute value by local name; empty string when absent.
    pub fn attr(&self, name: &str) -> &str {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Attribute value by local name, or `default` when absent or empty.
    pub fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        let v = self.attr(name);
        if v.is_empty() { default } else { v }
    }

    /// True if this element has the given local name and its namespace
    /// matches. `ns == None` matches any namespace, including none.
    pub fn matches(&self, ns: Option<&str>, name: &str) -> bool {
        self.name == name && ns.is_none_or(|uri| self.ns.as_deref() == Some(uri))
    }
}

/// Parse raw document bytes into an element tree.
///
/// Bytes are decoded as UTF-8 with replacement, never a decode failure.
/// The only error is [`ExtractError::MalformedXml`]: reader errors,
/// mismatched or unclosed tags, or input with no root element.
pub fn parse_document(bytes: &[u8]) -> Result<Element, ExtractError> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = NsReader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(ref e))) => {
                stack.push(element_from(ns, e));
            }
            Ok((ns, Event::Empty(ref e))) => {
                let el = element_from(ns, e);
                attach(&mut stack, &mut root, el)?;
            }
            Ok((_, Event::End(ref e))) => {
                let el = stack.pop().ok_or_else(|| {
                    ExtractError::MalformedXml("closing tag without opening tag".into())
                })?;
                let ended = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if el.name != ended {
                    return Err(ExtractError::MalformedXml(format!(
                        "mismatched closing tag: expected </{}>, found </{}>",
                        el.name, ended
                    )));
                }
                attach(&mut stack, &mut root, el)?;
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::MalformedXml(e.to_string())),
        }
    }

    if let Some(el) = stack.pop() {
        return Err(ExtractError::MalformedXml(format!(
            "unclosed element <{}>",
            el.name
        )));
    }
    root.ok_or_else(|| ExtractError::MalformedXml("no root element".into()))
}

fn element_from(ns: ResolveResult<'_>, e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let ns = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    };

    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        // xmlns declarations are consumed by the reader's resolver
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_default();
        attrs.push((key, value));
    }

    Element {
        ns,
        name,
        attrs,
        children: Vec::new(),
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), ExtractError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
    } else if root.is_none() {
        *root = Some(el);
    } else {
        return Err(ExtractError::MalformedXml(format!(
            "unexpected second root element <{}>",
            el.name
        )));
    }
    Ok(())
}
