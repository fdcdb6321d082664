use anyhow::{Context, Result};
use yamlbind::{DecodeOptions, Decoder, EncodeOptions, Value};

fn decode_options(strict: bool) -> DecodeOptions {
    let options = DecodeOptions::new().use_ordered_map();
    if strict { options.strict() } else { options }
}

/// YAML to JSON. `pretty` re-indents the single-line output.
pub fn to_json(text: &str, strict: bool, pretty: bool) -> Result<String> {
    let json = yamlbind::yaml_to_json_with(text, decode_options(strict))?;
    if !pretty {
        return Ok(json);
    }
    let value: serde_json::Value =
        serde_json::from_str(&json).context("converted document is not valid JSON")?;
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}

pub fn to_yaml(text: &str, options: EncodeOptions) -> Result<String> {
    Ok(yamlbind::json_to_yaml_with(text, options)?)
}

/// Reformat every document of a stream. Aliases are expanded and
/// comments are dropped.
pub fn fmt(text: &str, strict: bool, options: EncodeOptions) -> Result<String> {
    let mut decoder = Decoder::new(decode_options(strict))?;
    decoder.load_stream(text)?;
    let mut documents: Vec<Value> = Vec::new();
    while let Some(document) = decoder.decode_next::<Value>() {
        documents.push(document?);
    }
    tracing::debug!(documents = documents.len(), "reformatting stream");
    Ok(yamlbind::to_string_documents(&documents, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_json_pretty() {
        let out = to_json("b: 1\na: [x, y]\n", false, true).unwrap();
        insta::assert_snapshot!(out, @r#"
        {
          "b": 1,
          "a": [
            "x",
            "y"
          ]
        }
        "#);
    }

    #[test]
    fn test_strict_duplicate_key() {
        let err = to_json("a: 1\na: 2\n", true, false).unwrap_err();
        let err = err.downcast_ref::<yamlbind::Error>().unwrap();
        assert_eq!(err.error_code(), "Y-1-4");
        assert_eq!(to_json("a: 1\na: 2\n", false, false).unwrap().trim_end(), r#"{"a": 2}"#);
    }

    #[test]
    fn test_fmt_stream() {
        let out = fmt("a:   1\nlist: [1,2]\n---\nb: &x {c: 1}\nd: *x\n", false, EncodeOptions::new())
            .unwrap();
        insta::assert_snapshot!(out, @r"
        a: 1
        list:
        - 1
        - 2
        ---
        b:
          c: 1
        d:
          c: 1
        ");
    }

    #[test]
    fn test_to_yaml_flow() {
        let out = to_yaml(r#"{"a": [1, 2]}"#, EncodeOptions::new().flow(true)).unwrap();
        assert_eq!(out, "{a: [1, 2]}\n");
    }
}
