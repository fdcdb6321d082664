//! Conversion between YAML and JSON text through [`Value`].
//!
//! Both directions decode into an ordered map so keys keep their document
//! order. JSON output is the encoder's JSON mode: flow style with every
//! string and key double-quoted.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::value::Value;

/// Convert the first document of `text` to JSON.
pub fn yaml_to_json(text: &str) -> Result<String> {
    yaml_to_json_with(text, DecodeOptions::new())
}

pub fn yaml_to_json_with(text: &str, options: DecodeOptions) -> Result<String> {
    let mut decoder = Decoder::new(options.use_ordered_map())?;
    let value: Value = decoder.decode_str(text)?;
    Encoder::new(EncodeOptions::new().json(true)).to_string(&value)
}

/// Convert JSON text to block-style YAML.
pub fn json_to_yaml(text: &str) -> Result<String> {
    json_to_yaml_with(text, EncodeOptions::new())
}

pub fn json_to_yaml_with(text: &str, options: EncodeOptions) -> Result<String> {
    let mut decoder = Decoder::new(DecodeOptions::new().use_ordered_map())?;
    let value: Value = decoder.decode_str(text)?;
    Encoder::new(options).to_string(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_to_json() {
        let json = yaml_to_json("name: app\nports: [80, 443]\ntls: true\nnote: ~\n").unwrap();
        insta::assert_snapshot!(json, @r#"{"name": "app", "ports": [80, 443], "tls": true, "note": null}"#);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["ports"][1], 443);
    }

    #[test]
    fn test_json_to_yaml() {
        let yaml = json_to_yaml(r#"{"b": {"c": [1, "two"]}, "a": "yes"}"#).unwrap();
        insta::assert_snapshot!(yaml, @r#"
        b:
          c:
          - 1
          - two
        a: "yes"
        "#);
    }

    #[test]
    fn test_merge_keys_resolve_before_output() {
        let json = yaml_to_json("base: &b {a: 1, b: 2}\nv:\n  <<: *b\n  b: 3\n").unwrap();
        assert_eq!(
            json.trim_end(),
            r#"{"base": {"a": 1, "b": 2}, "v": {"a": 1, "b": 3}}"#
        );
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["v"]["b"], 3);
    }

    #[test]
    fn test_numeric_keys_become_strings() {
        let json = yaml_to_json("1: one\ntrue: yes\n").unwrap();
        assert_eq!(json.trim_end(), r#"{"1": "one", "true": "yes"}"#);
    }
}
