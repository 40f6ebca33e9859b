//! The navigation contract for a read-only, hierarchical document tree.
use std::hash::Hash;

/// A qualified name: an optional prefix plus a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> QName<'a> {
    pub fn local(name: &'a str) -> Self {
        QName {
            prefix: None,
            local: name,
        }
    }
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// The kind of a node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The universal contract for a node in a read-only tree.
///
/// The path evaluator, the match-pattern engine, and the transformation
/// contexts are written exclusively against this trait, so any backing
/// document implementation that can answer these questions plugs in.
///
/// `'a` is the lifetime of the underlying document.
pub trait TreeNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The kind of this node.
    fn node_type(&self) -> NodeType;

    /// The qualified name, or `None` for unnamed node kinds (root, text,
    /// comment). For a processing instruction this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The string value: text content for text nodes, the concatenated
    /// descendant text for elements and the root, the value for attributes,
    /// the content for comments and processing instructions.
    fn string_value(&self) -> String;

    /// Attribute nodes of this node; empty for non-elements.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// Child nodes; empty for leaf kinds.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node, `None` for the root.
    fn parent(&self) -> Option<Self>;
}

/// A minimal in-memory tree used by this crate's own tests and available to
/// downstream crates that need a ready-made `TreeNode` fixture.
pub mod mock {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    #[derive(Debug)]
    struct MockData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        value: String,
        children: Vec<usize>,
        attributes: Vec<usize>,
        parent: Option<usize>,
    }

    #[derive(Debug)]
    pub struct MockTree<'a> {
        nodes: Vec<MockData<'a>>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for MockNode<'_> {}
    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }
    impl Hash for MockNode<'_> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> TreeNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[self.id].name
        }

        fn string_value(&self) -> String {
            self.tree.nodes[self.id].value.clone()
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let ids = tree.nodes[self.id].attributes.clone();
            Box::new(ids.into_iter().map(move |id| MockNode { id, tree }))
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let ids = tree.nodes[self.id].children.clone();
            Box::new(ids.into_iter().map(move |id| MockNode { id, tree }))
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|id| MockNode {
                id,
                tree: self.tree,
            })
        }
    }

    impl<'a> MockTree<'a> {
        pub fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }
    }

    /// A small fixture tree:
    /// ```text
    /// <root>                       id 0
    ///   <chapter id="c1">          id 1, attr 2
    ///     <title>Intro</title>     id 3, text 4
    ///     <para>First</para>       id 5, text 6
    ///     <para>Second</para>      id 7, text 8
    ///   </chapter>
    ///   <appendix/>                id 9
    /// </root>
    /// ```
    pub fn sample_tree<'a>() -> MockTree<'a> {
        let mut nodes = Vec::new();
        let el = |name: &'a str, children: Vec<usize>, attributes: Vec<usize>, parent| MockData {
            node_type: NodeType::Element,
            name: Some(QName::local(name)),
            value: String::new(),
            children,
            attributes,
            parent,
        };
        let text = |value: &str, parent| MockData {
            node_type: NodeType::Text,
            name: None,
            value: value.to_string(),
            children: vec![],
            attributes: vec![],
            parent,
        };

        nodes.push(MockData {
            node_type: NodeType::Root,
            name: None,
            value: "IntroFirstSecond".to_string(),
            children: vec![1, 9],
            attributes: vec![],
            parent: None,
        });
        nodes.push(el("chapter", vec![3, 5, 7], vec![2], Some(0)));
        nodes.push(MockData {
            node_type: NodeType::Attribute,
            name: Some(QName::local("id")),
            value: "c1".to_string(),
            children: vec![],
            attributes: vec![],
            parent: Some(1),
        });
        nodes.push(el("title", vec![4], vec![], Some(1)));
        nodes.push(text("Intro", Some(3)));
        nodes.push(el("para", vec![6], vec![], Some(1)));
        nodes.push(text("First", Some(5)));
        nodes.push(el("para", vec![8], vec![], Some(1)));
        nodes.push(text("Second", Some(7)));
        nodes.push(el("appendix", vec![], vec![], Some(0)));

        let mut tree = MockTree { nodes };
        // string values for elements are derived lazily in real documents;
        // the mock stores them directly where a test needs them.
        tree.nodes[1].value = "IntroFirstSecond".to_string();
        tree.nodes[3].value = "Intro".to_string();
        tree.nodes[5].value = "First".to_string();
        tree.nodes[7].value = "Second".to_string();
        tree
    }
}
