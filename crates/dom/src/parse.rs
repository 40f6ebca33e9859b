//! XML input parsing: `roxmltree` does the heavy lifting, the result is
//! copied into the owned arena so the document outlives the source text.
use crate::{Document, DomError, NodeId};

pub fn parse(text: &str) -> Result<Document, DomError> {
    let parsed = roxmltree::Document::parse(text)?;
    let mut doc = Document::new();
    let root = doc.root();
    for child in parsed.root().children() {
        copy_node(&mut doc, root, child)?;
    }
    Ok(doc)
}

fn copy_node(
    doc: &mut Document,
    parent: NodeId,
    node: roxmltree::Node<'_, '_>,
) -> Result<(), DomError> {
    match node.node_type() {
        roxmltree::NodeType::Element => {
            let tag = node.tag_name();
            let qualified = match tag.namespace().and_then(|uri| node.lookup_prefix(uri)) {
                Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, tag.name()),
                _ => tag.name().to_string(),
            };
            let element = doc.create_element(&qualified);
            if let Some(uri) = tag.namespace() {
                doc.set_namespace(element, uri)?;
            }
            for attr in node.attributes() {
                doc.set_attribute(element, attr.name(), attr.value())?;
            }
            doc.append_child(parent, element);
            for child in node.children() {
                copy_node(doc, element, child)?;
            }
        }
        roxmltree::NodeType::Text => {
            if let Some(text) = node.text() {
                let t = doc.create_text(text);
                doc.append_child(parent, t);
            }
        }
        roxmltree::NodeType::Comment => {
            if let Some(text) = node.text() {
                let c = doc.create_comment(text);
                doc.append_child(parent, c);
            }
        }
        roxmltree::NodeType::PI => {
            if let Some(pi) = node.pi() {
                let p = doc.create_processing_instruction(pi.target, pi.value.unwrap_or(""));
                doc.append_child(parent, p);
            }
        }
        roxmltree::NodeType::Root => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeform_treepath::TreeNode;

    #[test]
    fn parses_simple_document() {
        let doc = parse("<doc><item id=\"1\">one</item><item id=\"2\">two</item></doc>").unwrap();
        let root = doc.root_ref();
        let doc_el = root.children().next().unwrap();
        assert_eq!(doc_el.name().unwrap().local, "doc");
        assert_eq!(doc_el.children().count(), 2);
        assert_eq!(doc.string_value(doc.root()), "onetwo");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("<doc><unclosed></doc>").is_err());
    }
}
