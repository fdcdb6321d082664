//! Rendering library errors against the source text they came from.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use yamlbind::{Error, ErrorKind};

/// Render `err` as a source snippet with the error code in the title.
///
/// Errors without a position, or whose position lies outside `source`,
/// fall back to a single line.
pub fn format_error(err: &Error, source: &str, filename: &str, colored: bool) -> String {
    let title = if err.path().is_empty() {
        err.kind().to_string()
    } else {
        format!("field {}: {}", err.path(), err.kind())
    };
    let fallback = || format!("Error [{}]: {}", err.error_code(), title);

    let Some(location) = err.location() else {
        return fallback();
    };
    let chars = source.chars().count();
    if location.offset > chars {
        return fallback();
    }
    let span = location.offset..location.end_offset().min(chars);
    let name = location
        .file
        .clone()
        .unwrap_or_else(|| filename.to_string());

    let mut report = Report::build(ReportKind::Error, name.clone(), location.offset)
        .with_config(Config::default().with_color(colored))
        .with_message(format!("[{}] {}", err.error_code(), title))
        .with_label(
            Label::new((name.clone(), span))
                .with_message(err.kind().to_string())
                .with_color(Color::Red),
        );
    if let ErrorKind::DuplicateKey { first, .. } = err.kind() {
        if first.offset <= chars {
            report = report.with_label(
                Label::new((name.clone(), first.offset..first.end_offset().min(chars)))
                    .with_message("first defined here")
                    .with_color(Color::Cyan),
            );
        }
    }

    let mut output = Vec::new();
    match report
        .finish()
        .write((name, Source::from(source)), &mut output)
    {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| fallback()),
        Err(_) => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamlbind::DecodeOptions;

    #[test]
    fn test_report_names_code_and_message() {
        let source = "a: 1\na: 2\n";
        let err = yamlbind::from_str_with::<yamlbind::Value>(source, DecodeOptions::new().strict())
            .unwrap_err();
        let text = format_error(&err, source, "input.yaml", false);
        assert!(text.contains("[Y-1-4]"), "{text}");
        assert!(text.contains("mapping key \"a\" already defined"), "{text}");
        assert!(text.contains("input.yaml"), "{text}");
    }

    #[test]
    fn test_report_without_location() {
        let err = Error::new(ErrorKind::UnresolvedAlias {
            name: "missing".to_string(),
        });
        let text = format_error(&err, "", "input.yaml", false);
        assert_eq!(
            text,
            "Error [Y-1-5]: cannot find anchor by alias name missing"
        );
    }
}
