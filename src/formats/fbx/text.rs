//! Line-oriented discovery of sections, nodes, and child blocks inside the
//! ASCII scene text. The locator recognizes only what the baker mutates and
//! leaves every other line untouched.

/// A brace-delimited block of lines. `header` carries the `Name:` token,
/// `open` the opening brace (possibly the same line), and `last` the matching
/// closing brace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub header: usize,
    pub open: usize,
    pub last: usize,
}

impl Block {
    /// The first line of the block body, i.e. the line after the opening
    /// brace.
    pub fn body_start(&self) -> usize {
        self.open + 1
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with(';')
}

/// Finds the first top-level section whose leading text is `<name>:`.
pub fn find_section(lines: &[String], name: &str) -> Option<Block> {
    let prefix = format!("{}:", name);
    next_block(lines, 0, lines.len().saturating_sub(1), |header| {
        header.starts_with(&prefix)
    })
}

/// Finds the first block between `from` and `to` (inclusive) whose trimmed
/// header line satisfies `matches`. A header whose opening brace never
/// materializes is abandoned and the scan resumes on the following line.
pub fn next_block(
    lines: &[String],
    from: usize,
    to: usize,
    matches: impl Fn(&str) -> bool,
) -> Option<Block> {
    let mut index = from;
    while index <= to && index < lines.len() {
        if matches(lines[index].trim_start()) {
            if let Some(block) = match_braces(lines, index, to) {
                return Some(block);
            }
        }
        index += 1;
    }
    None
}

/// Tracks brace balance from a header line to the matching closing brace.
/// Braces inside double-quoted runs do not count. The opening brace may sit
/// on the header line or on a later line by itself; any other content before
/// it cancels the match.
fn match_braces(lines: &[String], header: usize, limit: usize) -> Option<Block> {
    let mut depth = 0usize;
    let mut open = None;

    let mut index = header;
    while index <= limit && index < lines.len() {
        let line = &lines[index];

        if open.is_none() && index != header {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                index += 1;
                continue;
            }
            if !trimmed.starts_with('{') {
                return None;
            }
        }

        let mut in_quote = false;
        for character in line.chars() {
            match character {
                '"' => in_quote = !in_quote,
                '{' if !in_quote => {
                    depth += 1;
                    if open.is_none() {
                        open = Some(index);
                    }
                }
                '}' if !in_quote => {
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return Some(Block {
                            header,
                            open: open?,
                            last: index,
                        });
                    }
                }
                _ => {}
            }
        }

        index += 1;
    }
    None
}

/// Extracts the node identifier: the first integer literal after the first
/// colon, with an optional trailing `L` suffix. A minus sign is honored only
/// at the start of the literal.
pub fn node_id(header: &str) -> Option<i64> {
    let tail = &header[header.find(':')? + 1..];

    let bytes = tail.as_bytes();
    let mut start = None;
    for (position, &byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            start = Some(position);
            break;
        }
        if byte == b'-' && bytes.get(position + 1).is_some_and(u8::is_ascii_digit) {
            start = Some(position);
            break;
        }
    }

    let start = start?;
    let mut end = start + 1;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    tail[start..end].parse().ok()
}

/// Extracts the display name of a model header: the text between `Model::`
/// and the closing quote when present, otherwise the first double-quoted run
/// on the line, otherwise `?`.
pub fn node_name(header: &str) -> String {
    if let Some(position) = header.find("Model::") {
        let tail = &header[position + "Model::".len()..];
        if let Some(end) = tail.find('"') {
            return tail[..end].to_string();
        }
    }
    quoted(header).unwrap_or("?").to_string()
}

/// The content of the first double-quoted run on the line.
pub fn quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let end = start + line[start..].find('"')?;
    Some(&line[start..end])
}

/// Reads the quoted value of a `<key>: "<value>"` line inside a block, e.g.
/// `MappingInformationType: "ByPolygonVertex"`.
pub fn quoted_value(lines: &[String], block: &Block, key: &str) -> Option<String> {
    let prefix = format!("{}:", key);
    lines
        .get(block.body_start()..block.last)?
        .iter()
        .map(|line| line.trim_start())
        .find(|trimmed| trimmed.starts_with(&prefix))
        .and_then(quoted)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn buffer(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn finds_section_with_brace_on_header_line() {
        let lines = buffer(
            "; comment\n\
             Objects:  {\n\
             \tModel: 1, \"Model::a\", \"Mesh\" {\n\
             \t}\n\
             }\n\
             Connections:  {\n\
             }",
        );

        let objects = find_section(&lines, "Objects").unwrap();
        assert_eq!(Block { header: 1, open: 1, last: 4 }, objects);

        let connections = find_section(&lines, "Connections").unwrap();
        assert_eq!(Block { header: 5, open: 5, last: 6 }, connections);
    }

    #[test]
    fn finds_section_with_brace_on_later_line() {
        let lines = buffer(
            "Objects:\n\
             ; a comment may sit between the header and the brace\n\
             {\n\
             }",
        );

        assert_eq!(
            Some(Block { header: 0, open: 2, last: 3 }),
            find_section(&lines, "Objects")
        );
    }

    #[test]
    fn content_before_brace_cancels_discovery() {
        let lines = buffer(
            "Objects:\n\
             Creator: \"nothing to see\"\n\
             Objects:  {\n\
             }",
        );

        assert_eq!(
            Some(Block { header: 2, open: 2, last: 3 }),
            find_section(&lines, "Objects")
        );
    }

    #[test]
    fn braces_inside_quotes_are_ignored() {
        let lines = buffer(
            "Objects:  {\n\
             \tModel: 1, \"Model::curly {\", \"Mesh\" {\n\
             \t}\n\
             }",
        );

        let objects = find_section(&lines, "Objects").unwrap();
        assert_eq!(3, objects.last);
    }

    #[test]
    fn extracts_identifiers() {
        assert_eq!(Some(140234), node_id("\tModel: 140234, \"Model::a\" {"));
        assert_eq!(Some(123), node_id("Model: 123L, \"Model::b\" {"));
        assert_eq!(Some(-7), node_id("Geometry: -7, \"\" {"));
        assert_eq!(None, node_id("Model: \"no id here\""));
    }

    #[test]
    fn extracts_names() {
        assert_eq!("pCube1", node_name("Model: 1, \"Model::pCube1\", \"Mesh\" {"));
        assert_eq!("plain", node_name("Model: 1, \"plain\" {"));
        assert_eq!("?", node_name("Model: 1 {"));
    }

    #[test]
    fn reads_quoted_values() {
        let lines = buffer(
            "LayerElementNormal: 0 {\n\
             \tMappingInformationType: \"ByPolygonVertex\"\n\
             }",
        );
        let block = Block { header: 0, open: 0, last: 2 };

        assert_eq!(
            Some(String::from("ByPolygonVertex")),
            quoted_value(&lines, &block, "MappingInformationType")
        );
        assert_eq!(None, quoted_value(&lines, &block, "ReferenceInformationType"));
    }
}
