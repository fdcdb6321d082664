//! Anchors supplied by reference documents.

use pretty_assertions::assert_eq;
use std::fs;
use yamlbind::{Decode, DecodeOptions, Decoder, ErrorKind, Node, NodeKind};
use yamlbind_node::MappingEntry;

#[derive(Debug, Default, PartialEq, Decode)]
struct Server {
    host: String,
    port: u16,
}

/// `<<: *name` followed by explicit entries, built by hand since the parser
/// rejects aliases to anchors it has not seen.
fn merged(anchor: &str, entries: Vec<MappingEntry>) -> Node {
    let mut all = vec![MappingEntry::new(
        Node::new(NodeKind::MergeKey),
        Node::alias(anchor),
    )];
    all.extend(entries);
    Node::mapping(all)
}

fn port(value: i64) -> MappingEntry {
    MappingEntry::new(Node::string("port"), Node::new(NodeKind::Int(value)))
}

/// Reference text provides anchors to a tree decoded later.
#[test]
fn reference_text() {
    let options = DecodeOptions::new().reference_str("defaults: &defaults\n  host: shared\n  port: 1\n");
    let mut decoder = Decoder::new(options).unwrap();
    let server: Server = decoder.decode_node(&merged("defaults", vec![port(10)])).unwrap();
    assert_eq!(
        server,
        Server {
            host: "shared".to_string(),
            port: 10,
        }
    );
}

/// Text input may alias anchors that only a reference document defines.
#[test]
fn reference_anchors_in_text() {
    let options = DecodeOptions::new().reference_str("defaults: &defaults\n  host: shared\n  port: 1\n");
    let server: Server = yamlbind::from_str_with("<<: *defaults\nport: 10\n", options).unwrap();
    assert_eq!(
        server,
        Server {
            host: "shared".to_string(),
            port: 10,
        }
    );

    let options = DecodeOptions::new().reference_str("port: &port 7\n");
    let servers: Vec<Server> =
        yamlbind::from_str_with("- {host: a, port: *port}\n- host: '*port'\n  port: 1\n", options)
            .unwrap();
    assert_eq!(servers[0].port, 7);
    assert_eq!(servers[1].host, "*port");
}

/// An alias to an anchor defined nowhere still fails.
#[test]
fn unknown_alias_in_text() {
    let options = DecodeOptions::new().reference_str("defaults: &defaults {host: x}\n");
    let err = yamlbind::from_str_with::<Server>("<<: *missing\n", options).unwrap_err();
    assert_eq!(err.error_code(), "Y-2-2");
}

/// Directories load every `.yml` and `.yaml` file, descending only when recursive.
#[test]
fn reference_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("base.yaml"), "base: &base\n  host: top\n  port: 1\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored: &ignored {host: x}\n").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("nested/deep.yml"),
        "deep: &deep {host: below, port: 2}\n",
    )
    .unwrap();

    let mut flat = Decoder::new(DecodeOptions::new().reference_dir(dir.path(), false)).unwrap();
    let server: Server = flat.decode_node(&merged("base", vec![])).unwrap();
    assert_eq!(server.host, "top");
    let err = flat
        .decode_node::<Server>(&merged("deep", vec![]))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnresolvedAlias { .. }));
    let err = flat
        .decode_node::<Server>(&merged("ignored", vec![]))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnresolvedAlias { .. }));

    let mut recursive = Decoder::new(DecodeOptions::new().reference_dir(dir.path(), true)).unwrap();
    let server: Server = recursive.decode_node(&merged("deep", vec![port(3)])).unwrap();
    assert_eq!(
        server,
        Server {
            host: "below".to_string(),
            port: 3,
        }
    );
}

/// A missing reference file fails when the decoder is built.
#[test]
fn missing_reference_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Decoder::new(DecodeOptions::new().reference_file(dir.path().join("absent.yaml")))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    assert_eq!(err.error_code(), "Y-2-1");
}

/// Parse errors in a reference file name the file.
#[test]
fn reference_file_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "a: [1, 2\n").unwrap();
    let err = Decoder::new(DecodeOptions::new().reference_file(&path)).unwrap_err();
    assert_eq!(err.error_code(), "Y-2-2");
    assert!(err.to_string().contains("broken.yaml"), "{err}");
}
