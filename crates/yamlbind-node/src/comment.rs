//! Comments supplied by path and attached to a finished tree.

use crate::path::{Path, Step, node_at_mut};
use crate::{CommentGroup, Error, Node, NodeKind, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentPosition {
    /// Lines above the node.
    Head,
    /// End of the node's line.
    Line,
    /// Lines after the node's container entry.
    Foot,
}

impl fmt::Display for CommentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommentPosition::Head => "head",
            CommentPosition::Line => "line",
            CommentPosition::Foot => "foot",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub texts: Vec<String>,
    pub position: CommentPosition,
}

impl Comment {
    pub fn new<I, S>(position: CommentPosition, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            position,
        }
    }

    pub fn head<I: IntoIterator<Item = S>, S: Into<String>>(texts: I) -> Self {
        Self::new(CommentPosition::Head, texts)
    }

    pub fn line(text: impl Into<String>) -> Self {
        Self::new(CommentPosition::Line, [text])
    }

    pub fn foot<I: IntoIterator<Item = S>, S: Into<String>>(texts: I) -> Self {
        Self::new(CommentPosition::Foot, texts)
    }
}

/// Comments keyed by the path of the node they belong to.
pub type CommentMap = IndexMap<String, Vec<Comment>>;

/// Attach every comment in `comments` to `root`.
///
/// A path that selects no node, or more than one, is skipped. A syntax
/// error in a path, or a position the selected node cannot carry, is an
/// error.
pub fn attach_comments(root: &mut Node, comments: &CommentMap) -> Result<()> {
    for (path_text, list) in comments {
        let path = Path::parse(path_text)?;
        let mut targets = path.resolve(root);
        if targets.len() != 1 {
            tracing::debug!(
                path = %path_text,
                matches = targets.len(),
                "comment path does not select a single node; skipped"
            );
            continue;
        }
        let steps = targets.remove(0);
        for comment in list {
            attach_one(root, &steps, comment, path_text)?;
        }
    }
    Ok(())
}

fn attach_one(root: &mut Node, steps: &[Step], comment: &Comment, path: &str) -> Result<()> {
    let unsupported = || Error::UnsupportedCommentPosition {
        path: path.to_string(),
        position: comment.position,
    };
    let group = CommentGroup::new(comment.texts.iter().cloned());
    let Some((last, parent_steps)) = steps.split_last() else {
        return Err(unsupported());
    };

    if comment.position == CommentPosition::Line {
        let target = node_at_mut(root, steps).ok_or_else(unsupported)?;
        let compound = matches!(
            target.unwrap_wrappers().kind,
            NodeKind::Mapping(_) | NodeKind::Sequence(_)
        );
        if !compound {
            target.comment = Some(group);
            return Ok(());
        }
    }

    let parent = node_at_mut(root, parent_steps)
        .ok_or_else(unsupported)?
        .unwrap_wrappers_mut();
    match (comment.position, *last, &mut parent.kind) {
        (CommentPosition::Head, Step::Entry(i), NodeKind::Mapping(m)) => {
            m.entries.get_mut(i).ok_or_else(unsupported)?.head_comment = Some(group);
        }
        (CommentPosition::Head, Step::Item(i), NodeKind::Sequence(s)) => {
            s.item_comments.insert(i, group);
        }
        (CommentPosition::Line, Step::Entry(i), NodeKind::Mapping(m)) => {
            m.entries.get_mut(i).ok_or_else(unsupported)?.key.comment = Some(group);
        }
        (CommentPosition::Foot, Step::Entry(i), NodeKind::Mapping(m)) => {
            m.entries.get_mut(i).ok_or_else(unsupported)?.foot_comment = Some(group);
        }
        (CommentPosition::Foot, Step::Item(_), NodeKind::Sequence(s)) => {
            s.foot_comment = Some(group);
        }
        _ => return Err(unsupported()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn map(entries: &[(&str, Comment)]) -> CommentMap {
        let mut map = CommentMap::new();
        for (path, comment) in entries {
            map.entry(path.to_string()).or_default().push(comment.clone());
        }
        map
    }

    #[test]
    fn test_head_comment_on_entry() {
        let mut doc = parse("a: 1\nb: 2\n").unwrap();
        attach_comments(&mut doc, &map(&[("$.b", Comment::head([" about b"]))])).unwrap();
        let entry = &doc.as_mapping().unwrap().entries[1];
        assert_eq!(entry.head_comment, Some(CommentGroup::new([" about b"])));
    }

    #[test]
    fn test_line_comment_moves_to_key_for_compound() {
        let mut doc = parse("a:\n  x: 1\nb: 2\n").unwrap();
        let comments = map(&[("$.a", Comment::line(" block")), ("$.b", Comment::line(" scalar"))]);
        attach_comments(&mut doc, &comments).unwrap();
        let entries = &doc.as_mapping().unwrap().entries;
        assert_eq!(entries[0].key.comment, Some(CommentGroup::new([" block"])));
        assert_eq!(entries[1].value.comment, Some(CommentGroup::new([" scalar"])));
    }

    #[test]
    fn test_sequence_item_comments() {
        let mut doc = parse("list:\n  - a\n  - b\n").unwrap();
        let comments = map(&[
            ("$.list[1]", Comment::head([" second"])),
            ("$.list[0]", Comment::foot([" end"])),
        ]);
        attach_comments(&mut doc, &comments).unwrap();
        let seq = doc.get("list").unwrap().as_sequence().unwrap();
        assert_eq!(seq.item_comments.get(&1), Some(&CommentGroup::new([" second"])));
        assert_eq!(seq.foot_comment, Some(CommentGroup::new([" end"])));
    }

    #[test]
    fn test_unresolved_path_is_skipped() {
        let mut doc = parse("a: 1\n").unwrap();
        let before = doc.clone();
        attach_comments(&mut doc, &map(&[("$.missing", Comment::head([" x"]))])).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_root_head_is_unsupported() {
        let mut doc = parse("a: 1\n").unwrap();
        let err = attach_comments(&mut doc, &map(&[("$", Comment::head([" x"]))])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCommentPosition { .. }));
    }
}
