//! Language-neutral view of a parsed source file.
//!
//! Parsing is not done here. A frontend turns source text into a
//! [`SyntaxTree`] (an arena of nodes addressed by [`NodeId`]) and wraps it in a
//! [`SourceFile`] together with the file's package, imports and, when type
//! resolution ran, a [`BindingContext`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: Self = Self(0);

    /// The arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The whole file.
    File,
    /// A class, interface or similar type declaration.
    Class,
    /// A singleton or companion object declaration.
    Object,
    /// A function or method declaration.
    Function,
    /// A property or field declaration.
    Property,
    /// A function or constructor parameter.
    Parameter,
    /// A braced body.
    Block,
    /// A call expression.
    Call,
    /// Any other expression or statement.
    Expression,
    /// Frontend-specific kind.
    Other(String),
}

impl NodeKind {
    fn label(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Object => "object",
            Self::Function => "function",
            Self::Property => "property",
            Self::Parameter => "parameter",
            Self::Block => "block",
            Self::Call => "call",
            Self::Expression => "expression",
            Self::Other(kind) => kind,
        }
    }
}

/// Where a node sits in its file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextPosition {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl TextPosition {
    /// Creates a position without byte offsets.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            start: 0,
            end: 0,
        }
    }

    /// Sets the byte range.
    #[must_use]
    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// An annotation as written on a declaration.
///
/// `name` is the text after `@`, either a short name (`Suppress`) or a
/// qualified one (`kotlin.Suppress`). Arguments keep their quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    /// Annotation name as written.
    pub name: String,
    /// Raw argument texts.
    pub arguments: Vec<String>,
}

impl Annotation {
    /// Creates an annotation.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// The last dot-separated segment of the name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Returns true if the name was written with a package qualifier.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.name.contains('.')
    }
}

pub(crate) fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: Option<String>,
    signature: Option<String>,
    position: TextPosition,
    annotations: Vec<Annotation>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable arena of syntax nodes rooted at a [`NodeKind::File`] node.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.0).map(|_| NodeRef { tree: self, id })
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: every tree has a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        SyntaxTreeBuilder::new().build()
    }
}

/// A borrowed handle to one node of a [`SyntaxTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// The node's id.
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The node's kind.
    #[must_use]
    pub fn kind(self) -> &'a NodeKind {
        &self.tree.data(self.id).kind
    }

    /// The declared name, if the node has one.
    #[must_use]
    pub fn name(self) -> Option<&'a str> {
        self.tree.data(self.id).name.as_deref()
    }

    /// The signature; falls back to the name, then the kind.
    #[must_use]
    pub fn signature(self) -> &'a str {
        let node = self.tree.data(self.id);
        node.signature
            .as_deref()
            .or(node.name.as_deref())
            .unwrap_or_else(|| node.kind.label())
    }

    /// The node's position.
    #[must_use]
    pub fn position(self) -> TextPosition {
        self.tree.data(self.id).position
    }

    /// Annotations written directly on this node.
    #[must_use]
    pub fn annotations(self) -> &'a [Annotation] {
        &self.tree.data(self.id).annotations
    }

    /// The enclosing node, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.tree.data(self.id).parent.map(|id| Self {
            tree: self.tree,
            id,
        })
    }

    /// Direct children in source order.
    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Enclosing nodes from the parent up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node followed by its ancestors.
    pub fn self_and_ancestors(self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(Some(self), |node| node.parent())
    }

    /// Pre-order (outside-in) walk over this node and its descendants.
    #[must_use]
    pub fn walk(self) -> Walk<'a> {
        Walk { stack: vec![self] }
    }

    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        self.tree.data(self.id).children.is_empty()
    }

    /// The first direct child of `kind`.
    #[must_use]
    pub fn child_of_kind(self, kind: &NodeKind) -> Option<Self> {
        self.children().find(|child| child.kind() == kind)
    }
}

/// Iterator returned by [`NodeRef::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}

/// Description of a node to add with [`SyntaxTreeBuilder::add`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    kind: NodeKind,
    name: Option<String>,
    signature: Option<String>,
    position: TextPosition,
    annotations: Vec<Annotation>,
}

impl NodeSpec {
    /// Starts a node of `kind`.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            signature: None,
            position: TextPosition::default(),
            annotations: Vec::new(),
        }
    }

    /// Sets the declared name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the signature.
    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn at(mut self, position: TextPosition) -> Self {
        self.position = position;
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Assembles a [`SyntaxTree`] top-down.
///
/// ```
/// use rulegate_core::syntax::{NodeId, NodeKind, NodeSpec, SyntaxTreeBuilder};
///
/// let mut builder = SyntaxTreeBuilder::new();
/// let class = builder.add(NodeId::ROOT, NodeSpec::new(NodeKind::Class).named("Foo"));
/// builder.add(class, NodeSpec::new(NodeKind::Function).named("bar"));
/// let tree = builder.build();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug)]
pub struct SyntaxTreeBuilder {
    nodes: Vec<Node>,
}

impl SyntaxTreeBuilder {
    /// Creates a builder holding only the file root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::File,
                name: None,
                signature: None,
                position: TextPosition::new(1, 1),
                annotations: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Adds a node under `parent` and returns its id.
    ///
    /// A `parent` that does not belong to this builder leaves the node
    /// detached; it is never reached by a walk from the root.
    pub fn add(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        let attached = match self.nodes.get_mut(parent.0) {
            Some(node) => {
                node.children.push(id);
                Some(parent)
            }
            None => None,
        };
        self.nodes.push(Node {
            kind: spec.kind,
            name: spec.name,
            signature: spec.signature,
            position: spec.position,
            annotations: spec.annotations,
            parent: attached,
            children: Vec::new(),
        });
        id
    }

    /// Adds an annotation to an existing node, such as a file-level
    /// annotation on the root.
    pub fn annotate(&mut self, id: NodeId, annotation: Annotation) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.annotations.push(annotation);
        }
    }

    /// Finishes the tree.
    #[must_use]
    pub fn build(self) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes }
    }
}

impl Default for SyntaxTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An import directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    /// Imported path, e.g. `androidx.compose.Preview` or `java.util.*`.
    pub path: String,
    /// Alias introduced with `as`, if any.
    pub alias: Option<String>,
    /// 1-based line of the directive, if known.
    pub line: Option<usize>,
}

impl Import {
    /// Creates an import without alias.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            line: None,
        }
    }

    /// Records the line of the directive.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns true for star imports.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.path.ends_with(".*") || self.path == "*"
    }

    /// The name the import binds in the file: the alias, or the last segment.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| short_name(&self.path))
    }
}

/// Resolved names produced by type resolution.
///
/// Maps an annotation name as written in the file to its fully qualified
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingContext {
    resolved: HashMap<String, String>,
}

impl BindingContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `written` resolves to `qualified`.
    #[must_use]
    pub fn with_resolution(mut self, written: impl Into<String>, qualified: impl Into<String>) -> Self {
        self.resolved.insert(written.into(), qualified.into());
        self
    }

    /// The qualified name `written` resolves to.
    #[must_use]
    pub fn resolve(&self, written: &str) -> Option<&str> {
        self.resolved.get(written).map(String::as_str)
    }
}

/// A parsed source file ready for analysis.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used for include/exclude filtering and in locations.
    pub path: PathBuf,
    /// Declared package, if any.
    pub package: Option<String>,
    /// Import directives in source order.
    pub imports: Vec<Import>,
    /// The syntax tree.
    pub tree: SyntaxTree,
    /// Type resolution results; `None` when the file was not resolved.
    pub bindings: Option<BindingContext>,
}

impl SourceFile {
    /// Creates a file without package, imports or bindings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxTree) -> Self {
        Self {
            path: path.into(),
            package: None,
            imports: Vec::new(),
            tree,
            bindings: None,
        }
    }

    /// Sets the package.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Adds an import.
    #[must_use]
    pub fn with_import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    /// Attaches type resolution results.
    #[must_use]
    pub fn with_bindings(mut self, bindings: BindingContext) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SyntaxTree, NodeId, NodeId, NodeId) {
        let mut builder = SyntaxTreeBuilder::new();
        let class = builder.add(
            NodeId::ROOT,
            NodeSpec::new(NodeKind::Class)
                .named("Foo")
                .annotated(Annotation::new("Suppress", ["\"MagicNumber\""])),
        );
        let function = builder.add(
            class,
            NodeSpec::new(NodeKind::Function)
                .named("bar")
                .signature("fun bar(): Int")
                .at(TextPosition::new(3, 5).with_range(20, 48)),
        );
        builder.add(function, NodeSpec::new(NodeKind::Block));
        let other = builder.add(NodeId::ROOT, NodeSpec::new(NodeKind::Function).named("baz"));
        (builder.build(), class, function, other)
    }

    #[test]
    fn walk_is_pre_order() {
        let (tree, ..) = sample();
        let visited: Vec<&str> = tree.root().walk().map(NodeRef::signature).collect();
        assert_eq!(visited, vec!["file", "Foo", "fun bar(): Int", "block", "baz"]);
    }

    #[test]
    fn ancestors_run_inside_out() {
        let (tree, _, function, _) = sample();
        let body = tree.node(function).unwrap().children().next().unwrap();
        let kinds: Vec<&NodeKind> = body.ancestors().map(NodeRef::kind).collect();
        assert_eq!(
            kinds,
            vec![&NodeKind::Function, &NodeKind::Class, &NodeKind::File]
        );
        assert_eq!(body.self_and_ancestors().count(), 4);
    }

    #[test]
    fn node_exposes_metadata() {
        let (tree, class, function, _) = sample();
        let function = tree.node(function).unwrap();
        assert_eq!(function.name(), Some("bar"));
        assert_eq!(function.position().line, 3);
        assert_eq!(function.position().end, 48);
        assert_eq!(function.parent().unwrap().id(), class);
        assert!(function.child_of_kind(&NodeKind::Block).unwrap().is_leaf());
        assert_eq!(tree.node(class).unwrap().annotations()[0].name, "Suppress");
    }

    #[test]
    fn unknown_parent_leaves_node_detached() {
        let mut builder = SyntaxTreeBuilder::new();
        let detached = builder.add(NodeId(42), NodeSpec::new(NodeKind::Block));
        let tree = builder.build();
        assert!(tree.node(detached).unwrap().parent().is_none());
        assert_eq!(tree.root().walk().count(), 1);
        assert!(tree.node(NodeId(99)).is_none());
    }

    #[test]
    fn import_short_names() {
        assert_eq!(Import::new("androidx.compose.Preview").short_name(), "Preview");
        assert_eq!(
            Import::new("androidx.compose.Preview")
                .with_alias("P")
                .short_name(),
            "P"
        );
        assert!(Import::new("java.util.*").is_wildcard());
        assert!(!Import::new("java.util.List").is_wildcard());
    }

    #[test]
    fn annotation_short_name() {
        let annotation = Annotation::new("kotlin.Suppress", Vec::<String>::new());
        assert_eq!(annotation.short_name(), "Suppress");
        assert!(annotation.is_qualified());
    }
}
