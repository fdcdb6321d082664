//! Paths that select nodes in a tree, used to place comments.
//!
//! Syntax: `$` is the root, `.key` selects a mapping value, `.'a.b'`
//! quotes a key containing dots, `[n]` selects a sequence item, `[*]`
//! every item, and `..key` every value under `key` at any depth.

use crate::{Error, Node, NodeKind, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Child(String),
    Index(usize),
    AllItems,
    Recursive(String),
}

/// One concrete step from a node to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Value of the n-th mapping entry.
    Entry(usize),
    /// n-th sequence item.
    Item(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: String,
    selectors: Vec<Selector>,
}

impl Path {
    pub fn parse(path: &str) -> Result<Self> {
        let err = |message: &str| Error::Path {
            path: path.to_string(),
            message: message.to_string(),
        };
        let chars: Vec<char> = path.chars().collect();
        if chars.first() != Some(&'$') {
            return Err(err("path must start with '$'"));
        }
        let mut selectors = Vec::new();
        let mut i = 1;
        while i < chars.len() {
            match chars[i] {
                '.' if chars.get(i + 1) == Some(&'.') => {
                    let (name, next) = read_name(&chars, i + 2).map_err(|m| err(m))?;
                    selectors.push(Selector::Recursive(name));
                    i = next;
                }
                '.' => {
                    let (name, next) = read_name(&chars, i + 1).map_err(|m| err(m))?;
                    selectors.push(Selector::Child(name));
                    i = next;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|c| *c == ']')
                        .ok_or_else(|| err("unterminated '['"))?;
                    let inner: String = chars[i + 1..i + close].iter().collect();
                    if inner == "*" {
                        selectors.push(Selector::AllItems);
                    } else {
                        let index = inner
                            .parse::<usize>()
                            .map_err(|_| err("index must be a number or '*'"))?;
                        selectors.push(Selector::Index(index));
                    }
                    i += close + 1;
                }
                c => return Err(err(&format!("unexpected character '{}'", c))),
            }
        }
        Ok(Self {
            source: path.to_string(),
            selectors,
        })
    }

    /// Every node the path selects, as step lists from the root.
    pub fn resolve(&self, root: &Node) -> Vec<Vec<Step>> {
        let mut current: Vec<(&Node, Vec<Step>)> = vec![(root, Vec::new())];
        for selector in &self.selectors {
            let mut next = Vec::new();
            for (node, steps) in current {
                select(node, &steps, selector, &mut next);
            }
            current = next;
        }
        current.into_iter().map(|(_, steps)| steps).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn read_name(chars: &[char], start: usize) -> std::result::Result<(String, usize), &'static str> {
    let mut name = String::new();
    let mut i = start;
    if chars.get(i) == Some(&'\'') {
        i += 1;
        loop {
            match chars.get(i) {
                None => return Err("unterminated quoted key"),
                Some('\\') => {
                    let escaped = chars.get(i + 1).ok_or("dangling escape")?;
                    name.push(*escaped);
                    i += 2;
                }
                Some('\'') => return Ok((name, i + 1)),
                Some(c) => {
                    name.push(*c);
                    i += 1;
                }
            }
        }
    }
    while let Some(c) = chars.get(i) {
        if *c == '.' || *c == '[' {
            break;
        }
        name.push(*c);
        i += 1;
    }
    if name.is_empty() {
        return Err("empty key");
    }
    Ok((name, i))
}

fn with_step(steps: &[Step], step: Step) -> Vec<Step> {
    let mut out = steps.to_vec();
    out.push(step);
    out
}

fn select<'a>(
    node: &'a Node,
    steps: &[Step],
    selector: &Selector,
    out: &mut Vec<(&'a Node, Vec<Step>)>,
) {
    let node = node.unwrap_wrappers();
    match (selector, &node.kind) {
        (Selector::Child(name), NodeKind::Mapping(m)) => {
            for (i, entry) in m.entries.iter().enumerate() {
                if entry.key.scalar_text().as_deref() == Some(name.as_str()) {
                    out.push((&entry.value, with_step(steps, Step::Entry(i))));
                }
            }
        }
        (Selector::Index(n), NodeKind::Sequence(s)) => {
            if let Some(item) = s.items.get(*n) {
                out.push((item, with_step(steps, Step::Item(*n))));
            }
        }
        (Selector::AllItems, NodeKind::Sequence(s)) => {
            for (i, item) in s.items.iter().enumerate() {
                out.push((item, with_step(steps, Step::Item(i))));
            }
        }
        (Selector::Recursive(name), _) => {
            select(node, steps, &Selector::Child(name.clone()), out);
            match &node.kind {
                NodeKind::Mapping(m) => {
                    for (i, entry) in m.entries.iter().enumerate() {
                        select(&entry.value, &with_step(steps, Step::Entry(i)), selector, out);
                    }
                }
                NodeKind::Sequence(s) => {
                    for (i, item) in s.items.iter().enumerate() {
                        select(item, &with_step(steps, Step::Item(i)), selector, out);
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}

/// Follow steps from the root, looking through anchor and tag wrappers.
pub fn node_at_mut<'a>(root: &'a mut Node, steps: &[Step]) -> Option<&'a mut Node> {
    let mut current = root;
    for step in steps {
        current = match (step, &mut current.unwrap_wrappers_mut().kind) {
            (Step::Entry(i), NodeKind::Mapping(m)) => &mut m.entries.get_mut(*i)?.value,
            (Step::Item(i), NodeKind::Sequence(s)) => s.items.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_errors() {
        assert!(Path::parse("a.b").is_err());
        assert!(Path::parse("$.").is_err());
        assert!(Path::parse("$[x]").is_err());
        assert!(Path::parse("$.'open").is_err());
    }

    #[test]
    fn test_resolve_child_and_index() {
        let doc = parse("a:\n  b: [1, 2]\n").unwrap();
        let path = Path::parse("$.a.b[1]").unwrap();
        assert_eq!(
            path.resolve(&doc),
            vec![vec![Step::Entry(0), Step::Entry(0), Step::Item(1)]]
        );
        assert!(Path::parse("$.a.c").unwrap().resolve(&doc).is_empty());
        assert_eq!(Path::parse("$").unwrap().resolve(&doc), vec![Vec::<Step>::new()]);
    }

    #[test]
    fn test_resolve_quoted_and_recursive() {
        let doc = parse("'x.y': 1\nlist:\n  - name: a\n  - name: b\n").unwrap();
        assert_eq!(Path::parse("$.'x.y'").unwrap().resolve(&doc).len(), 1);
        assert_eq!(Path::parse("$..name").unwrap().resolve(&doc).len(), 2);
        assert_eq!(Path::parse("$.list[*]").unwrap().resolve(&doc).len(), 2);
    }

    #[test]
    fn test_node_at_mut() {
        let mut doc = parse("a: [1, 2]\n").unwrap();
        let node = node_at_mut(&mut doc, &[Step::Entry(0), Step::Item(1)]).unwrap();
        assert_eq!(node.kind, NodeKind::Int(2));
        assert!(node_at_mut(&mut doc, &[Step::Item(0)]).is_none());
    }
}
