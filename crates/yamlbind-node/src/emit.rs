//! Printer that renders a tree back to text.

use crate::scalar::{double_quote, format_float, literal_header, needs_quotes, single_quote};
use crate::{CommentGroup, Mapping, Node, NodeKind, ScalarStyle, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Indent block sequences under their key instead of aligning the
    /// `-` with the key.
    pub indent_sequence: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            indent_sequence: false,
        }
    }
}

/// Render one document.
pub fn emit(node: &Node, options: &EmitOptions) -> String {
    let mut emitter = Emitter::new(*options);
    emitter.document(node);
    emitter.out
}

/// Render a stream, separating documents with `---`.
pub fn emit_documents(nodes: &[Node], options: &EmitOptions) -> String {
    let mut emitter = Emitter::new(*options);
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            emitter.out.push_str("---\n");
        }
        emitter.document(node);
    }
    emitter.out
}

struct Emitter {
    out: String,
    options: EmitOptions,
}

/// Anchor and tag prefixes of a node, plus the node they wrap.
fn split_props(node: &Node) -> (Vec<String>, &Node) {
    let mut props = Vec::new();
    let mut current = node;
    loop {
        match &current.kind {
            NodeKind::Anchor { name, value } => {
                props.push(format!("&{}", name));
                current = value;
            }
            NodeKind::Tag { tag, value } => {
                props.push(tag.to_string());
                current = value;
            }
            _ => return (props, current),
        }
    }
}

/// The line comment of a node or of any wrapper around it.
fn line_comment(node: &Node) -> Option<&CommentGroup> {
    if let Some(comment) = &node.comment {
        return Some(comment);
    }
    match &node.kind {
        NodeKind::Anchor { value, .. } | NodeKind::Tag { value, .. } => line_comment(value),
        _ => None,
    }
}

impl Emitter {
    fn new(options: EmitOptions) -> Self {
        Self {
            out: String::new(),
            options,
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn pad(&mut self, col: usize) {
        if self.at_line_start() {
            self.out.extend(std::iter::repeat_n(' ', col));
        }
    }

    fn comment_lines(&mut self, group: Option<&CommentGroup>, col: usize) {
        let Some(group) = group else {
            return;
        };
        for line in &group.lines {
            self.pad(col);
            self.out.push('#');
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    fn end_line(&mut self, comment: Option<&CommentGroup>) {
        if let Some(group) = comment {
            self.out.push_str(" #");
            self.out.push_str(&group.lines.join(" "));
        }
        self.out.push('\n');
    }

    fn document(&mut self, node: &Node) {
        let (props, inner) = split_props(node);
        if node.is_block_collection() {
            if !props.is_empty() {
                self.out.push_str(&props.join(" "));
                self.end_line(line_comment(node));
            }
            self.block(inner, 0);
        } else if let NodeKind::Literal(text) = &inner.kind {
            self.literal(&props, text, line_comment(node), 0);
        } else {
            let text = self.inline(node, false);
            self.out.push_str(&text);
            self.end_line(line_comment(node));
        }
    }

    /// Write a block collection. The first line may continue after a `- `
    /// already on the current line.
    fn block(&mut self, inner: &Node, col: usize) {
        match &inner.kind {
            NodeKind::Mapping(m) => self.block_mapping(m, col),
            NodeKind::Sequence(s) => self.block_sequence(s, col),
            _ => {
                self.pad(col);
                let text = self.inline(inner, false);
                self.out.push_str(&text);
                self.end_line(line_comment(inner));
            }
        }
    }

    /// Write a literal block; the cursor sits where the header goes.
    fn literal(&mut self, props: &[String], text: &str, comment: Option<&CommentGroup>, col: usize) {
        for prop in props {
            self.out.push_str(prop);
            self.out.push(' ');
        }
        self.out.push_str(literal_header(text));
        if text.starts_with(' ') {
            self.out.push_str(&self.options.indent.to_string());
        }
        self.end_line(comment);
        let body = match text.strip_suffix('\n') {
            Some(rest) => rest,
            None => text,
        };
        let content_col = col + self.options.indent;
        for line in body.split('\n') {
            if !line.is_empty() {
                self.pad(content_col);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    fn block_mapping(&mut self, mapping: &Mapping, col: usize) {
        for entry in &mapping.entries {
            self.comment_lines(entry.head_comment.as_ref(), col);
            self.pad(col);
            let key = self.key(&entry.key);
            self.out.push_str(&key);
            self.out.push(':');

            let value = &entry.value;
            let (props, inner) = split_props(value);
            if value.is_block_collection() {
                for prop in &props {
                    self.out.push(' ');
                    self.out.push_str(prop);
                }
                let comment = entry.key.comment.as_ref().or_else(|| line_comment(value));
                self.end_line(comment);
                let child_col = match inner.kind {
                    NodeKind::Sequence(_) if !self.options.indent_sequence => col,
                    _ => col + self.options.indent,
                };
                self.block(inner, child_col);
            } else if let NodeKind::Literal(text) = &inner.kind {
                self.out.push(' ');
                let comment = line_comment(value).or(entry.key.comment.as_ref());
                self.literal(&props, text, comment, col);
            } else {
                self.out.push(' ');
                let text = self.inline(value, false);
                self.out.push_str(&text);
                self.end_line(line_comment(value).or(entry.key.comment.as_ref()));
            }
            self.comment_lines(entry.foot_comment.as_ref(), col);
        }
    }

    fn block_sequence(&mut self, sequence: &Sequence, col: usize) {
        for (i, item) in sequence.items.iter().enumerate() {
            self.comment_lines(sequence.item_comments.get(&i), col);
            self.pad(col);
            self.out.push_str("- ");

            let (props, inner) = split_props(item);
            if item.is_block_collection() {
                if !props.is_empty() {
                    self.out.push_str(&props.join(" "));
                    self.end_line(line_comment(item));
                }
                self.block(inner, col + 2);
            } else if let NodeKind::Literal(text) = &inner.kind {
                self.literal(&props, text, line_comment(item), col);
            } else {
                let text = self.inline(item, false);
                self.out.push_str(&text);
                self.end_line(line_comment(item));
            }
        }
        self.comment_lines(sequence.foot_comment.as_ref(), col);
    }

    fn key(&self, key: &Node) -> String {
        self.inline(key, false)
    }

    /// Single-line rendering; `in_flow` is set inside `{}`/`[]`.
    fn inline(&self, node: &Node, in_flow: bool) -> String {
        match &node.kind {
            NodeKind::Null => "null".to_string(),
            NodeKind::Bool(b) => b.to_string(),
            NodeKind::Int(i) => i.to_string(),
            NodeKind::Uint(u) => u.to_string(),
            NodeKind::Float(f) => format_float(*f),
            NodeKind::String(s) => self.string(s, node.style, in_flow),
            NodeKind::Literal(s) => double_quote(s),
            NodeKind::MergeKey => "<<".to_string(),
            NodeKind::Alias { name } => format!("*{}", name),
            NodeKind::Anchor { name, value } => {
                format!("&{} {}", name, self.inline(value, in_flow))
            }
            NodeKind::Tag { tag, value } => format!("{} {}", tag, self.inline(value, in_flow)),
            NodeKind::Mapping(m) => {
                let entries: Vec<String> = m
                    .entries
                    .iter()
                    .map(|e| format!("{}: {}", self.inline(&e.key, true), self.inline(&e.value, true)))
                    .collect();
                if entries.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{{}}}", entries.join(", "))
                }
            }
            NodeKind::Sequence(s) => {
                let items: Vec<String> = s.items.iter().map(|n| self.inline(n, true)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }

    fn string(&self, text: &str, style: ScalarStyle, in_flow: bool) -> String {
        match style {
            ScalarStyle::DoubleQuoted => double_quote(text),
            ScalarStyle::SingleQuoted => single_quote(text).unwrap_or_else(|| double_quote(text)),
            ScalarStyle::Plain if needs_quotes(text, in_flow) => double_quote(text),
            ScalarStyle::Plain => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MappingEntry, parse};
    use pretty_assertions::assert_eq;

    fn roundtrip(src: &str) -> String {
        emit(&parse(src).unwrap(), &EmitOptions::default())
    }

    #[test]
    fn test_block_mapping_and_sequence() {
        let src = "name: app\nports:\n- 80\n- 443\nnested:\n  deep:\n    x: 1\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn test_sequence_of_mappings() {
        let src = "- name: a\n  value: 1\n- name: b\n  value: 2\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn test_flow_and_empty() {
        assert_eq!(roundtrip("a: {x: 1, y: [1, 2]}\nb: []\nc: {}\n"), "a: {x: 1, y: [1, 2]}\nb: []\nc: {}\n");
    }

    #[test]
    fn test_quoting() {
        let doc = Node::mapping(vec![
            MappingEntry::new(Node::string("a"), Node::string("true")),
            MappingEntry::new(Node::string("b"), Node::string("x: y")),
            MappingEntry::new(Node::string("c"), Node::string("it's").with_style(ScalarStyle::SingleQuoted)),
            MappingEntry::new(Node::string("d"), Node::string("plain text")),
        ]);
        insta::assert_snapshot!(emit(&doc, &EmitOptions::default()), @r#"
        a: "true"
        b: "x: y"
        c: 'it''s'
        d: plain text
        "#);
    }

    #[test]
    fn test_anchor_alias_and_tags() {
        let src = "base: &b\n  x: 1\nother: *b\nbin: !!binary aGk=\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn test_literal() {
        assert_eq!(roundtrip("text: |\n  one\n  two\n"), "text: |\n  one\n  two\n");
        assert_eq!(roundtrip("text: |-\n  one\n  two\n"), "text: |-\n  one\n  two\n");
    }

    #[test]
    fn test_indent_options() {
        let doc = parse("a:\n  b:\n  - 1\n").unwrap();
        let options = EmitOptions {
            indent: 4,
            indent_sequence: true,
        };
        assert_eq!(emit(&doc, &options), "a:\n    b:\n        - 1\n");
    }

    #[test]
    fn test_documents() {
        let docs = vec![Node::string("a"), Node::string("b")];
        assert_eq!(emit_documents(&docs, &EmitOptions::default()), "a\n---\nb\n");
    }

    #[test]
    fn test_comments() {
        let mut doc = parse("a: 1\nlist:\n- x\n- y\n").unwrap();
        if let NodeKind::Mapping(m) = &mut doc.kind {
            m.entries[0].head_comment = Some(CommentGroup::new([" head"]));
            m.entries[0].value.comment = Some(CommentGroup::new([" line"]));
            m.entries[1].foot_comment = Some(CommentGroup::new([" foot"]));
            if let NodeKind::Sequence(s) = &mut m.entries[1].value.kind {
                s.item_comments.insert(1, CommentGroup::new([" item"]));
            }
        }
        insta::assert_snapshot!(emit(&doc, &EmitOptions::default()), @r"
        # head
        a: 1 # line
        list:
        - x
        # item
        - y
        # foot
        ");
    }
}
