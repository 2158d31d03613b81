use rust_decimal::Decimal;

use super::dom::Element;

/// CFDI 4.0 namespace.
pub const CFDI_40: &str = "http://www.sat.gob.mx/cfd/4";
/// CFDI 3.3 namespace.
pub const CFDI_33: &str = "http://www.sat.gob.mx/cfd/3";
/// Timbre Fiscal Digital (the authority's stamp carrying the UUID).
pub const TFD: &str = "http://www.sat.gob.mx/TimbreFiscalDigital";
/// Pagos 2.0 complement namespace (CFDI 4.0 payments).
pub const PAGOS_20: &str = "http://www.sat.gob.mx/Pagos20";
/// Pagos 1.0 complement namespace (CFDI 3.3 payments).
pub const PAGOS_10: &str = "http://www.sat.gob.mx/Pagos";

/// One candidate in a resolution list.
///
/// Candidate lists are ordered newest-convention-first, ending in a
/// convention-free fallback, and are identical across calls — the same
/// list handles both format versions without a version branch.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    /// Child path below the node, every segment bound to one namespace.
    /// `None` matches any namespace, including none.
    Path(Option<&'a str>, &'a [&'a str]),
    /// First descendant (any depth) with this local name.
    Descendant(Option<&'a str>, &'a str),
}

/// Try each candidate in order; return the first structural match.
///
/// Absence at every candidate is a normal outcome, never an error.
pub fn resolve<'a>(node: &'a Element, candidates: &[Lookup<'_>]) -> Option<&'a Element> {
    for candidate in candidates {
        let found = match candidate {
            Lookup::Path(ns, path) => resolve_path(node, *ns, path),
            Lookup::Descendant(ns, name) => find_descendant(node, *ns, name),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Like [`resolve`], but collects every match of the first candidate
/// that yields at least one element.
pub fn resolve_all<'a>(node: &'a Element, candidates: &[Lookup<'_>]) -> Vec<&'a Element> {
    for candidate in candidates {
        let found = match candidate {
            Lookup::Path(ns, path) => collect_path(node, *ns, path),
            Lookup::Descendant(ns, name) => {
                let mut out = Vec::new();
                collect_descendants(node, *ns, name, &mut out);
                out
            }
        };
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Numeric attribute with a tolerant default: absent, empty, or
/// unparseable values all yield `default`.
pub fn decimal_attr(el: &Element, name: &str, default: Decimal) -> Decimal {
    let raw = el.attr(name).trim();
    if raw.is_empty() {
        return default;
    }
    raw.parse().unwrap_or(default)
}

/// First attribute in `names` carrying a non-empty value.
///
/// An empty attribute and an absent attribute are treated identically:
/// some producers emit `Attr=""` instead of omitting the attribute.
pub fn attr_chain<'a>(el: &'a Element, names: &[&str]) -> &'a str {
    for name in names {
        let v = el.attr(name);
        if !v.is_empty() {
            return v;
        }
    }
    ""
}

fn resolve_path<'a>(node: &'a Element, ns: Option<&str>, path: &[&str]) -> Option<&'a Element> {
    if path.is_empty() {
        return None;
    }
    let mut current = node;
    for segment in path {
        current = current.children.iter().find(|c| c.matches(ns, segment))?;
    }
    Some(current)
}

fn collect_path<'a>(node: &'a Element, ns: Option<&str>, path: &[&str]) -> Vec<&'a Element> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut current = vec![node];
    for segment in path {
        let mut next = Vec::new();
        for el in current {
            next.extend(el.children.iter().filter(|c| c.matches(ns, segment)));
        }
        current = next;
    }
    current
}

fn find_descendant<'a>(node: &'a Element, ns: Option<&str>, name: &str) -> Option<&'a Element> {
    for child in &node.children {
        if child.matches(ns, name) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, ns, name) {
            return Some(found);
        }
    }
    None
}

fn collect_descendants<'a>(
    node: &'a Element,
    ns: Option<&str>,
    name: &str,
    out: &mut Vec<&'a Element>,
) {
    for child in &node.children {
        if child.matches(ns, name) {
            out.push(child);
        }
        collect_descendants(child, ns, name, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use rust_decimal_macros::dec;

    fn tree() -> Element {
        parse_document(
            br#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
                                  xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital">
                  <cfdi:Conceptos>
                    <cfdi:Concepto Importe="100"/>
                    <cfdi:Concepto Importe="200"/>
                  </cfdi:Conceptos>
                  <cfdi:Complemento>
                    <tfd:TimbreFiscalDigital UUID="AAAA-1111"/>
                  </cfdi:Complemento>
                </cfdi:Comprobante>"#,
        )
        .unwrap()
    }

    #[test]
    fn first_matching_candidate_wins() {
        let root = tree();
        let found = resolve(
            &root,
            &[
                Lookup::Path(Some(CFDI_33), &["Conceptos"]),
                Lookup::Path(Some(CFDI_40), &["Conceptos"]),
            ],
        );
        assert!(found.is_some());
    }

    #[test]
    fn absence_everywhere_is_none() {
        let root = tree();
        let found = resolve(
            &root,
            &[
                Lookup::Path(Some(CFDI_40), &["Receptor"]),
                Lookup::Descendant(None, "Receptor"),
            ],
        );
        assert!(found.is_none());
    }

    #[test]
    fn resolve_all_stops_at_first_non_empty_candidate() {
        let root = tree();
        let found = resolve_all(
            &root,
            &[
                Lookup::Path(Some(CFDI_40), &["Conceptos", "Concepto"]),
                Lookup::Descendant(None, "Concepto"),
            ],
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].attr("Importe"), "100");
    }

    #[test]
    fn descendant_search_reaches_nested_stamp() {
        let root = tree();
        let stamp = resolve(&root, &[Lookup::Descendant(Some(TFD), "TimbreFiscalDigital")]);
        assert_eq!(stamp.unwrap().attr("UUID"), "AAAA-1111");
    }

    #[test]
    fn decimal_attr_defaults() {
        let root = tree();
        assert_eq!(decimal_attr(&root, "Total", Decimal::ZERO), Decimal::ZERO);
        let concepto = resolve(&root, &[Lookup::Descendant(None, "Concepto")]).unwrap();
        assert_eq!(decimal_attr(concepto, "Importe", Decimal::ZERO), dec!(100));
    }

    #[test]
    fn attr_chain_skips_empty_values() {
        let el = parse_document(br#"<Concepto ValorUnitario="" PrecioUnitario="35.00"/>"#).unwrap();
        assert_eq!(attr_chain(&el, &["ValorUnitario", "PrecioUnitario"]), "35.00");
        assert_eq!(attr_chain(&el, &["NoSuchAttr"]), "");
    }
}
