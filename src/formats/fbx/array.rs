//! Reading and rewriting of `*`-length numeric array blocks. A rewritten
//! array re-emits the exact line partitioning of the original: same per-line
//! prefix, same value count per line, same trailing-comma continuation.

use crate::error::Error;

use super::{
    number,
    text::{self, Block},
};

/// One line of an array body as it appeared in the source.
#[derive(Debug, Clone, PartialEq)]
struct LineInfo {
    line: usize,
    prefix: String,
    count: usize,
    continued: bool,
}

/// The source partitioning of an array body, captured on read and replayed
/// on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    lines: Vec<LineInfo>,
}

/// A double array (`Vertices`, layer data) with its source layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleArray {
    pub values: Vec<f64>,
    layout: Layout,
}

/// An integer array (`PolygonVertexIndex`, layer index arrays) with its
/// source layout.
#[derive(Debug, Clone, PartialEq)]
pub struct IntArray {
    pub values: Vec<i64>,
    layout: Layout,
}

/// Finds a named array block: a header of shape `<name>: *<len>` followed by
/// a brace-delimited body.
pub fn find_array(lines: &[String], from: usize, to: usize, name: &str) -> Option<Block> {
    let prefix = format!("{}:", name);
    text::next_block(lines, from, to, |header| {
        header.starts_with(&prefix) && header.contains('*')
    })
}

fn read_tokens<'a>(lines: &'a [String], block: &Block) -> Result<(Layout, Vec<&'a str>), Error> {
    let body_start = (block.body_start()..block.last)
        .find(|&index| lines[index].trim_start().starts_with("a:"))
        .ok_or_else(|| Error::Parse(String::from("array block has no a: line")))?;

    let mut layout = Layout { lines: Vec::new() };
    let mut tokens = Vec::new();
    for index in body_start..block.last {
        let line = &lines[index];
        let indent = line.len() - line.trim_start().len();

        // The first body line keeps its `a:` marker in the prefix; later
        // lines keep only their leading whitespace.
        let prefix_end = if index == body_start { indent + 2 } else { indent };
        let remainder = &line[prefix_end..];

        let mut count = 0;
        for token in remainder.split(',') {
            let token = token.trim();
            if !token.is_empty() {
                tokens.push(token);
                count += 1;
            }
        }

        layout.lines.push(LineInfo {
            line: index,
            prefix: line[..prefix_end].to_string(),
            count,
            continued: remainder.trim_end().ends_with(','),
        });
    }

    Ok((layout, tokens))
}

fn write_formatted(lines: &mut [String], layout: &Layout, formatted: &[String]) -> Result<(), Error> {
    let total: usize = layout.lines.iter().map(|info| info.count).sum();
    if total != formatted.len() {
        return Err(Error::Unexpected(format!(
            "array value count changed from {} to {}",
            total,
            formatted.len()
        )));
    }

    let mut cursor = 0;
    for (slot, info) in layout.lines.iter().enumerate() {
        let mut rebuilt = info.prefix.clone();
        if slot == 0 {
            rebuilt.push(' ');
        }
        rebuilt.push_str(&formatted[cursor..cursor + info.count].join(","));
        if info.continued {
            rebuilt.push(',');
        }
        lines[info.line] = rebuilt;
        cursor += info.count;
    }
    Ok(())
}

impl DoubleArray {
    pub fn read(lines: &[String], block: &Block) -> Result<Self, Error> {
        let (layout, tokens) = read_tokens(lines, block)?;
        let values = tokens
            .into_iter()
            .map(|token| {
                number::parse_f64(token)
                    .ok_or_else(|| Error::Parse(format!("invalid double \"{}\"", token)))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { values, layout })
    }

    pub fn write(&self, lines: &mut [String]) -> Result<(), Error> {
        let formatted: Vec<String> = self.values.iter().copied().map(number::format_f64).collect();
        write_formatted(lines, &self.layout, &formatted)
    }
}

impl IntArray {
    pub fn read(lines: &[String], block: &Block) -> Result<Self, Error> {
        let (layout, tokens) = read_tokens(lines, block)?;
        let values = tokens
            .into_iter()
            .map(|token| {
                number::parse_i64(token)
                    .ok_or_else(|| Error::Parse(format!("invalid integer \"{}\"", token)))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { values, layout })
    }

    pub fn write(&self, lines: &mut [String]) -> Result<(), Error> {
        let formatted: Vec<String> = self.values.iter().copied().map(number::format_i64).collect();
        write_formatted(lines, &self.layout, &formatted)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn buffer() -> Vec<String> {
        [
            "\tGeometry: 10, \"Geometry::\", \"Mesh\" {",
            "\t\tVertices: *6 {",
            "\t\t\ta: 1,0,0,0.5,",
            "1,2",
            "\t\t}",
            "\t\tPolygonVertexIndex: *3 {",
            "\t\t\ta: 0,1,-3",
            "\t\t}",
            "\t}",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    #[test]
    fn reads_values_across_continuation_lines() {
        let lines = buffer();
        let block = find_array(&lines, 0, 8, "Vertices").unwrap();
        let array = DoubleArray::read(&lines, &block).unwrap();

        assert_eq!(vec![1., 0., 0., 0.5, 1., 2.], array.values);
    }

    #[test]
    fn unmodified_array_round_trips_byte_identically() {
        let mut lines = buffer();
        let expected = lines.clone();

        let block = find_array(&lines, 0, 8, "Vertices").unwrap();
        DoubleArray::read(&lines, &block)
            .unwrap()
            .write(&mut lines)
            .unwrap();

        let block = find_array(&lines, 0, 8, "PolygonVertexIndex").unwrap();
        IntArray::read(&lines, &block)
            .unwrap()
            .write(&mut lines)
            .unwrap();

        assert_eq!(expected, lines);
    }

    #[test]
    fn rewrite_preserves_line_partitioning() {
        let mut lines = buffer();
        let block = find_array(&lines, 0, 8, "Vertices").unwrap();
        let mut array = DoubleArray::read(&lines, &block).unwrap();

        for value in &mut array.values {
            *value = -*value;
        }
        array.write(&mut lines).unwrap();

        assert_eq!("\t\t\ta: -1,0,0,-0.5,", lines[2]);
        assert_eq!("-1,-2", lines[3]);
    }

    #[test]
    fn value_count_must_not_change() {
        let mut lines = buffer();
        let block = find_array(&lines, 0, 8, "Vertices").unwrap();
        let mut array = DoubleArray::read(&lines, &block).unwrap();

        array.values.pop();
        assert!(array.write(&mut lines).is_err());
    }

    #[test]
    fn missing_array_is_not_found() {
        let lines = buffer();
        assert_eq!(None, find_array(&lines, 0, 8, "Normals"));
    }
}
