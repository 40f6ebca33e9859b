//! Markup serialization for the arena document.
use crate::{Document, NodeId, NodeKind};

/// Escapes text content: `&`, `<`, `>`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes attribute values: text escapes plus both quote characters.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

impl Document {
    /// Serializes the whole document (children of the root) to markup text.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes a single subtree.
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Root => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element { .. } => {
                let name = self.qualified_name(id).unwrap_or_default();
                out.push('<');
                out.push_str(&name);
                for &attr in self.attributes(id) {
                    if let NodeKind::Attribute { value, .. } = self.kind(attr) {
                        let attr_name = self.qualified_name(attr).unwrap_or_default();
                        out.push(' ');
                        out.push_str(&attr_name);
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    }
                }
                if self.children(id).is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for &child in self.children(id) {
                        self.write_node(child, out);
                    }
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
            }
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(target);
                if !data.is_empty() {
                    out.push(' ');
                    out.push_str(data);
                }
                out.push_str("?>");
            }
            NodeKind::Attribute { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.create_element("list");
        doc.append_child(root, list);
        doc.set_attribute(list, "kind", "plain").unwrap();
        let item = doc.create_element("item");
        doc.append_child(list, item);
        let text = doc.create_text("a < b");
        doc.append_child(item, text);
        let empty = doc.create_element("hr");
        doc.append_child(list, empty);

        assert_eq!(
            doc.to_xml(),
            "<list kind=\"plain\"><item>a &lt; b</item><hr/></list>"
        );
    }

    #[test]
    fn escapes_attribute_quotes() {
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_text("1 & 2"), "1 &amp; 2");
    }

    #[test]
    fn round_trips_through_parse() {
        let source = "<doc><a href=\"x\">link</a><!--note--></doc>";
        let doc = crate::parse(source).unwrap();
        assert_eq!(doc.to_xml(), source);
    }
}
