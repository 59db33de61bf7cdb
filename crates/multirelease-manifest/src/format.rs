/// Formatting conventions detected in an existing manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFormat {
    pub indent: String,
    pub trailing_whitespace: String,
}

impl Default for FileFormat {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            trailing_whitespace: String::new(),
        }
    }
}

/// Detects the indentation of the first nested line and the whitespace after the
/// closing brace.
#[must_use]
pub fn recognize_format(contents: &str) -> FileFormat {
    let indent = contents
        .split_once('\n')
        .map(|(_, rest)| rest.split('"').next().unwrap_or_default())
        .filter(|indent| {
            !indent.is_empty() && indent.chars().all(|c| c == ' ' || c == '\t')
        })
        .map_or_else(|| FileFormat::default().indent, str::to_string);

    let trailing_whitespace = contents
        .rfind('}')
        .map(|index| &contents[index + 1..])
        .filter(|rest| rest.chars().all(char::is_whitespace))
        .unwrap_or_default()
        .to_string();

    FileFormat {
        indent,
        trailing_whitespace,
    }
}
