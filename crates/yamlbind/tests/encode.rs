//! Encoding structs to YAML text.

use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::rc::Rc;
use yamlbind::{
    Comment, CommentMap, Decode, DecodeOptions, Encode, EncodeOptions, ErrorKind, Node, Value,
};

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Server {
    host: String,
    port: u16,
}

#[derive(Debug, Default, Encode)]
struct Shared {
    #[yaml("primary,anchor")]
    primary: Rc<Server>,
    #[yaml("backup,alias")]
    backup: Rc<Server>,
    mirror: Rc<Server>,
}

#[derive(Debug, Default, Encode)]
struct Sparse {
    name: String,
    #[yaml(",omitempty")]
    tags: Vec<String>,
    #[yaml("max_count,omitempty")]
    count: u32,
    #[yaml(",omitempty")]
    server: Option<Server>,
    #[yaml(",omitempty")]
    label: String,
    #[yaml("-")]
    cache: Vec<u8>,
}

#[derive(Debug, Default, Encode)]
#[yaml(is_zero = "is_unset")]
struct Window {
    start: u32,
    end: u32,
}

impl Window {
    fn is_unset(&self) -> bool {
        self.end == 0
    }
}

#[derive(Debug, Default, Encode)]
struct Span {
    start: u32,
    end: u32,
}

#[derive(Debug, Default, Encode)]
struct Schedule {
    #[yaml(",omitempty")]
    window: Window,
    #[yaml(",omitempty")]
    span: Span,
}

#[derive(Debug, Default, Encode)]
struct Listener {
    name: String,
    #[yaml(",flow")]
    ports: Vec<u16>,
    #[yaml(",inline")]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, PartialEq, Encode, Decode)]
struct Temperature {
    degrees: f64,
}

fn server(host: &str, port: u16) -> Server {
    Server {
        host: host.to_string(),
        port,
    }
}

/// A shared value is written once with an anchor and aliased afterwards.
#[test]
fn shared_values_become_aliases() {
    let server = Rc::new(server("a", 1));
    let shared = Shared {
        primary: Rc::clone(&server),
        backup: Rc::clone(&server),
        mirror: server,
    };
    insta::assert_snapshot!(yamlbind::to_string(&shared).unwrap(), @r"
    primary: &primary
      host: a
      port: 1
    backup: *primary
    mirror: *primary
    ");

    let renamed = yamlbind::to_string_with(
        &shared,
        EncodeOptions::new().anchor_callback(|name| format!("{name}_1")),
    )
    .unwrap();
    assert!(renamed.contains("&primary_1"), "{renamed}");
    assert!(renamed.contains("backup: *primary_1"), "{renamed}");
}

/// An alias field whose value was never anchored is an error.
#[test]
fn alias_without_anchor() {
    #[derive(Debug, Default, Encode)]
    struct Dangling {
        #[yaml("other,alias")]
        other: Rc<Server>,
    }

    let err = yamlbind::to_string(&Dangling::default()).unwrap_err();
    match err.kind() {
        ErrorKind::AnchorNotFound { field } => assert_eq!(field, "other"),
        other => panic!("unexpected error: {other}"),
    }
}

/// A misspelled tag option is an error rather than a silently ignored flag.
#[test]
fn misspelled_tag_option() {
    #[derive(Debug, Default, Encode)]
    struct Counter {
        #[yaml("n,omitemtpy")]
        n: u32,
    }

    let err = yamlbind::to_string(&Counter::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidStructTag { .. }));
    assert_eq!(err.error_code(), "Y-1-7");
}

/// Empty `omitempty` fields are left out and `-` fields are never written.
#[test]
fn omitempty_skips_zero_values() {
    let sparse = Sparse {
        name: "x".to_string(),
        cache: vec![1, 2, 3],
        ..Sparse::default()
    };
    assert_eq!(yamlbind::to_string(&sparse).unwrap(), "name: x\n");

    let full = Sparse {
        name: "x".to_string(),
        tags: vec!["a".to_string()],
        count: 2,
        server: Some(server("h", 3)),
        label: "l".to_string(),
        cache: Vec::new(),
    };
    insta::assert_snapshot!(yamlbind::to_string(&full).unwrap(), @r"
    name: x
    tags:
    - a
    max_count: 2
    server:
      host: h
      port: 3
    label: l
    ");
}

/// A container `is_zero` method replaces the per-field check.
#[test]
fn container_is_zero_method() {
    let schedule = Schedule {
        window: Window { start: 5, end: 0 },
        span: Span { start: 0, end: 0 },
    };
    assert_eq!(yamlbind::to_string(&schedule).unwrap(), "{}\n");

    let schedule = Schedule {
        window: Window { start: 0, end: 9 },
        span: Span { start: 1, end: 0 },
    };
    insta::assert_snapshot!(yamlbind::to_string(&schedule).unwrap(), @r"
    window:
      start: 0
      end: 9
    span:
      start: 1
      end: 0
    ");
}

/// Flow fields stay on one line; inline maps lift their keys into the parent.
#[test]
fn flow_and_inline_fields() {
    let mut extra = BTreeMap::new();
    extra.insert("region".to_string(), Value::from("eu"));
    extra.insert("name".to_string(), Value::from("shadowed"));
    let listener = Listener {
        name: "web".to_string(),
        ports: vec![80, 443],
        extra,
    };
    insta::assert_snapshot!(yamlbind::to_string(&listener).unwrap(), @r"
    name: web
    ports: [80, 443]
    region: eu
    ");
}

/// Comments are attached by path after encoding.
#[test]
fn comments_by_path() {
    let mut comments = CommentMap::new();
    comments.insert("$.host".to_string(), vec![Comment::head([" primary host"])]);
    comments.insert("$.port".to_string(), vec![Comment::line(" default port")]);
    let text = yamlbind::to_string_with(
        &server("a", 80),
        EncodeOptions::new().with_comments(comments),
    )
    .unwrap();
    insta::assert_snapshot!(text, @r"
    # primary host
    host: a
    port: 80 # default port
    ");
}

/// JSON mode writes flow collections with double-quoted strings.
#[test]
fn json_mode() {
    let text = yamlbind::to_string_with(&server("a", 1), EncodeOptions::new().json(true)).unwrap();
    assert_eq!(text, "{\"host\": \"a\", \"port\": 1}\n");
}

/// Codecs passed in the options take precedence over the process-wide ones.
#[test]
fn per_call_codec_wins_over_global() {
    yamlbind::register_encoder::<Temperature, _>(|t| Ok(Node::string(format!("{}C", t.degrees))));
    yamlbind::register_decoder::<Temperature, _>(|node| {
        let text = node.as_str().ok_or("expected a string")?;
        let degrees = text.trim_end_matches('C').parse::<f64>()?;
        Ok(Temperature { degrees })
    });

    let warm = Temperature { degrees: 21.5 };
    assert_eq!(yamlbind::to_string(&warm).unwrap(), "21.5C\n");
    assert_eq!(yamlbind::from_str::<Temperature>("21.5C").unwrap(), warm);

    let options = EncodeOptions::new()
        .custom_encoder::<Temperature, _>(|t| Ok(Node::string(format!("{:.1}F", t.degrees * 1.8 + 32.0))));
    assert_eq!(yamlbind::to_string_with(&warm, options).unwrap(), "70.7F\n");

    let options = DecodeOptions::new().custom_decoder::<Temperature, _>(|node| {
        let text = node.as_str().ok_or("expected a string")?;
        let fahrenheit = text.trim_end_matches('F').parse::<f64>()?;
        Ok(Temperature {
            degrees: (fahrenheit - 32.0) / 1.8,
        })
    });
    let decoded: Temperature = yamlbind::from_str_with("212F", options).unwrap();
    assert!((decoded.degrees - 100.0).abs() < 1e-9);
}

/// Codec failures surface as codec errors at the node.
#[test]
fn codec_error_is_reported() {
    #[derive(Debug, Default, Decode)]
    struct Version {
        major: u32,
    }

    let options = DecodeOptions::new()
        .custom_decoder::<Version, _>(|_| Err("unsupported version syntax".into()));
    let err = yamlbind::from_str_with::<Version>("v1", options).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Codec(_)));
    assert_eq!(err.to_string(), "1:1: unsupported version syntax");
}

/// Each document of a stream gets its own anchors.
#[test]
fn document_stream() {
    let text = yamlbind::to_string_documents(&[server("a", 1), server("b", 2)], EncodeOptions::new())
        .unwrap();
    assert_eq!(text, "host: a\nport: 1\n---\nhost: b\nport: 2\n");
}
