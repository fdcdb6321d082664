//! Anchor and alias tokens in document order.
//!
//! The parser reports anchors by numeric id only. Names are recovered by a
//! light pass over the source that finds `&name` and `*name` tokens,
//! skipping quoted text, comments, plain scalar text and block scalar
//! bodies. The n-th anchor found belongs to the n-th anchored node the
//! parser reports.

/// One `&name` or `*name` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub name: String,
    /// Char range of the whole token, indicator included.
    pub start: usize,
    pub end: usize,
    /// Index of the document the token sits in.
    pub doc: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Tokens {
    pub anchors: Vec<Token>,
    pub aliases: Vec<Token>,
}

pub(crate) fn collect_anchor_names(chars: &[char]) -> Vec<String> {
    scan_tokens(chars)
        .anchors
        .into_iter()
        .map(|token| token.name)
        .collect()
}

pub(crate) fn scan_tokens(chars: &[char]) -> Tokens {
    let mut scan = AnchorScan {
        chars,
        pos: 0,
        tokens: Tokens::default(),
        doc: 0,
        flow_depth: 0,
        node_col: 0,
        block_scalar_parent: None,
        line_start: 0,
        scanned: 0,
    };
    scan.run();
    scan.tokens
}

struct AnchorScan<'a> {
    chars: &'a [char],
    pos: usize,
    tokens: Tokens,
    doc: usize,
    flow_depth: usize,
    /// Column of the most recent key or `-` indicator on the current line.
    node_col: usize,
    /// Set while inside a block scalar: lines indented deeper than this
    /// column belong to it.
    block_scalar_parent: Option<usize>,
    /// Start of the line holding `scanned`, advanced lazily by `column`.
    line_start: usize,
    scanned: usize,
}

impl AnchorScan<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(&mut self) {
        while self.pos < self.chars.len() {
            self.line();
        }
    }

    fn line_indent(&self) -> usize {
        self.chars[self.pos..]
            .iter()
            .take_while(|c| **c == ' ')
            .count()
    }

    fn skip_to_eol(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn line(&mut self) {
        let indent = self.line_indent();
        let blank = matches!(self.chars.get(self.pos + indent), None | Some('\n' | '\r'));
        if let Some(parent) = self.block_scalar_parent {
            if blank || indent > parent {
                self.skip_to_eol();
                self.pos += 1;
                return;
            }
            self.block_scalar_parent = None;
        }
        if self.flow_depth == 0 {
            self.node_col = indent;
            if indent == 0 && (self.starts_with("---") || self.starts_with("...")) {
                self.doc += 1;
                self.pos += 3;
            } else if indent == 0 && self.peek(0) == Some('%') {
                self.skip_to_eol();
            }
        }
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    self.pos += 1;
                    return;
                }
                ' ' | '\t' | '\r' => self.pos += 1,
                '#' => self.skip_to_eol(),
                '\'' => self.single_quoted(),
                '"' => self.double_quoted(),
                '&' | '*' => {
                    let start = self.pos;
                    self.pos += 1;
                    let name = self.token();
                    if !name.is_empty() {
                        let token = Token {
                            name,
                            start,
                            end: self.pos,
                            doc: self.doc,
                        };
                        if c == '&' {
                            self.tokens.anchors.push(token);
                        } else {
                            self.tokens.aliases.push(token);
                        }
                    }
                }
                '!' => {
                    self.pos += 1;
                    self.token();
                }
                '[' | '{' => {
                    self.flow_depth += 1;
                    self.pos += 1;
                }
                ']' | '}' => {
                    self.flow_depth = self.flow_depth.saturating_sub(1);
                    self.pos += 1;
                }
                ',' if self.flow_depth > 0 => self.pos += 1,
                '-' | '?' | ':' if self.is_indicator() => {
                    if c == '-' {
                        self.node_col = self.column();
                    }
                    self.pos += 1;
                }
                '|' | '>' if self.flow_depth == 0 => {
                    self.block_scalar_parent = Some(self.node_col);
                    self.skip_to_eol();
                }
                _ => self.plain(),
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c))
            && matches!(self.peek(3), None | Some(' ' | '\n' | '\r'))
    }

    fn column(&mut self) -> usize {
        while self.scanned < self.pos {
            if self.chars.get(self.scanned) == Some(&'\n') {
                self.line_start = self.scanned + 1;
            }
            self.scanned += 1;
        }
        self.pos - self.line_start
    }

    fn is_indicator(&self) -> bool {
        match self.peek(1) {
            None | Some(' ' | '\t' | '\n' | '\r') => true,
            Some(',' | ']' | '}') => self.flow_depth > 0,
            _ => false,
        }
    }

    fn token(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}') {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name
    }

    fn single_quoted(&mut self) {
        let start_col = self.column();
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            self.pos += 1;
            if c == '\'' {
                if self.peek(0) == Some('\'') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.after_scalar(start_col);
    }

    fn double_quoted(&mut self) {
        let start_col = self.column();
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            self.pos += 1;
            match c {
                '\\' => self.pos += 1,
                '"' => break,
                _ => {}
            }
        }
        self.after_scalar(start_col);
    }

    /// Plain scalar text runs to the end of the line, a `: ` indicator or
    /// a ` #` comment (and flow punctuation inside flow collections).
    fn plain(&mut self) {
        let start_col = self.column();
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => break,
                ':' if self.is_indicator() => break,
                ' ' | '\t' if self.peek(1) == Some('#') => break,
                ',' | '[' | ']' | '{' | '}' if self.flow_depth > 0 => break,
                _ => self.pos += 1,
            }
        }
        self.after_scalar(start_col);
    }

    fn after_scalar(&mut self, start_col: usize) {
        let mut look = self.pos;
        while matches!(self.chars.get(look), Some(' ' | '\t')) {
            look += 1;
        }
        if self.chars.get(look) == Some(&':') && self.flow_depth == 0 {
            self.node_col = start_col;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(src: &str) -> Vec<String> {
        let chars: Vec<char> = src.chars().collect();
        collect_anchor_names(&chars)
    }

    #[test]
    fn test_simple_anchors() {
        assert_eq!(names("a: &x 1\nb: *x\nc: &y\n  d: 2\n"), vec!["x", "y"]);
    }

    #[test]
    fn test_ignores_scalar_text_and_comments() {
        let src = "a: 'q &no'\nb: \"&no\"\nc: plain &no\n# &no\nd: &yes [1, &z 2]\n";
        assert_eq!(names(src), vec!["yes", "z"]);
    }

    #[test]
    fn test_skips_block_scalars() {
        let src = "a: |\n  &no\n  text\nb: &yes 1\nlist:\n  - key: >\n      &no\n    other: &also 2\n";
        assert_eq!(names(src), vec!["yes", "also"]);
    }

    #[test]
    fn test_single_line_flow_document() {
        let entries: Vec<String> = (0..5000).map(|i| format!("\"k{i}\": &a{i} v{i}")).collect();
        let src = format!("{{{}}}", entries.join(", "));
        let found = names(&src);
        assert_eq!(found.len(), 5000);
        assert_eq!(found[4999], "a4999");
    }

    #[test]
    fn test_columns_reset_per_line() {
        let src = "first: {a: 1}\nlist:\n  - key: |\n      &no\n    other: &yes 2\n";
        assert_eq!(names(src), vec!["yes"]);
    }

    #[test]
    fn test_alias_tokens_and_documents() {
        let chars: Vec<char> = "a: &x 1\nb: *x\n---\nc: [*x, *y]\n".chars().collect();
        let tokens = scan_tokens(&chars);
        assert_eq!(tokens.anchors.len(), 1);
        assert_eq!(tokens.anchors[0].doc, tokens.aliases[0].doc);
        let later: Vec<(&str, usize)> = tokens.aliases[1..]
            .iter()
            .map(|t| (t.name.as_str(), t.end - t.start))
            .collect();
        assert_eq!(later, vec![("x", 2), ("y", 2)]);
        assert!(tokens.aliases[1].doc > tokens.anchors[0].doc);
    }

    #[test]
    fn test_sequence_items() {
        assert_eq!(names("- &a 1\n- &b\n  k: v\n- *a\n"), vec!["a", "b"]);
    }
}
