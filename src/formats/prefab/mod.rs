//! Rewrites the local-transform values of a scene descriptor (`.prefab`)
//! document to identity. Only the values of the named keys change; the
//! surrounding document, including each mapping's inline or block style, is
//! preserved line for line.

/// A transform key with its identity value in both mapping styles.
struct TransformKey {
    name: &'static str,
    inline: &'static str,
    components: &'static [(&'static str, &'static str)],
}

static KEYS: [TransformKey; 3] = [
    TransformKey {
        name: "m_LocalRotation",
        inline: "{x: 0, y: 0, z: 0, w: 1}",
        components: &[("x", "0"), ("y", "0"), ("z", "0"), ("w", "1")],
    },
    TransformKey {
        name: "m_LocalScale",
        inline: "{x: 1, y: 1, z: 1}",
        components: &[("x", "1"), ("y", "1"), ("z", "1")],
    },
    TransformKey {
        name: "m_LocalEulerAnglesHint",
        inline: "{x: 0, y: 0, z: 0}",
        components: &[("x", "0"), ("y", "0"), ("z", "0")],
    },
];

/// Overwrites every occurrence of the local-transform keys with identity
/// values. Returns the number of rewritten occurrences.
pub fn rewrite_buffer(lines: &mut [String]) -> usize {
    let mut rewritten = 0;

    let mut index = 0;
    while index < lines.len() {
        let Some(key) = matching_key(&lines[index]) else {
            index += 1;
            continue;
        };

        let line = &lines[index];
        let indent = line.len() - line.trim_start().len();
        let colon = key_colon(line, indent, key);

        if line[colon + 1..].contains('{') {
            // Inline mapping: replace the whole flow value.
            lines[index] = format!("{} {}", &line[..=colon], key.inline);
            index += 1;
        } else {
            // Block mapping: rewrite the indented component lines below.
            index += 1;
            while index < lines.len() {
                let Some(updated) = rewrite_component(&lines[index], indent, key) else {
                    break;
                };
                lines[index] = updated;
                index += 1;
            }
        }
        rewritten += 1;
    }
    rewritten
}

fn matching_key(line: &str) -> Option<&'static TransformKey> {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("- ").unwrap_or(trimmed);
    KEYS.iter().find(|key| {
        trimmed
            .strip_prefix(key.name)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// The byte position of the colon closing a matched key.
fn key_colon(line: &str, indent: usize, key: &TransformKey) -> usize {
    let mut start = indent;
    if line[start..].starts_with("- ") {
        start += 2;
    }
    start + key.name.len()
}

/// Rewrites one component line of a block mapping, or `None` when the line
/// leaves the block (dedents) or is not a known component of the key.
fn rewrite_component(line: &str, parent_indent: usize, key: &TransformKey) -> Option<String> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    if trimmed.is_empty() || indent <= parent_indent {
        return None;
    }

    let (_, value) = key.components.iter().find(|(component, _)| {
        trimmed
            .strip_prefix(component)
            .is_some_and(|rest| rest.starts_with(':'))
    })?;

    let colon = indent + 1;
    Some(format!("{} {}", &line[..=colon], value))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn buffer(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn inline_values_are_replaced() {
        let mut lines = buffer(
            "Transform:\n\
             \x20 m_LocalRotation: {x: -0.3826834, y: 0, z: 0, w: 0.9238796}\n\
             \x20 m_LocalPosition: {x: 1, y: 2, z: 3}\n\
             \x20 m_LocalScale: {x: 2, y: 2, z: 2}\n\
             \x20 m_LocalEulerAnglesHint: {x: -45, y: 0, z: 0}",
        );

        assert_eq!(3, rewrite_buffer(&mut lines));
        assert_eq!("  m_LocalRotation: {x: 0, y: 0, z: 0, w: 1}", lines[1]);
        assert_eq!("  m_LocalPosition: {x: 1, y: 2, z: 3}", lines[2]);
        assert_eq!("  m_LocalScale: {x: 1, y: 1, z: 1}", lines[3]);
        assert_eq!("  m_LocalEulerAnglesHint: {x: 0, y: 0, z: 0}", lines[4]);
    }

    #[test]
    fn block_values_are_replaced_per_component() {
        let mut lines = buffer(
            "\x20 m_LocalRotation:\n\
             \x20   x: 0.123\n\
             \x20   y: 0\n\
             \x20   z: 0\n\
             \x20   w: 0.992\n\
             \x20 m_LocalScale:\n\
             \x20   x: 3\n\
             \x20   y: 3\n\
             \x20   z: 3",
        );
        let count = lines.len();

        assert_eq!(2, rewrite_buffer(&mut lines));
        assert_eq!(count, lines.len());
        assert_eq!("    x: 0", lines[1]);
        assert_eq!("    y: 0", lines[2]);
        assert_eq!("    z: 0", lines[3]);
        assert_eq!("    w: 1", lines[4]);
        assert_eq!("    x: 1", lines[6]);
        assert_eq!("    z: 1", lines[8]);
    }

    #[test]
    fn unrelated_documents_are_untouched() {
        let mut lines = buffer(
            "GameObject:\n\
             \x20 m_Name: baked\n\
             \x20 m_Layer: 0",
        );
        let before = lines.clone();

        assert_eq!(0, rewrite_buffer(&mut lines));
        assert_eq!(before, lines);
    }
}
