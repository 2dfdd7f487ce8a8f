//! Reading and in-place rewriting of `P:`/`Property:` lines. Writers
//! overwrite only the trailing numeric fields; everything before them is
//! byte-preserved.

use glam::DVec3;

use super::number;

/// Finds the line of a named property within a property block: a `P:` or
/// `Property:` line that carries the double-quoted name.
fn find_property(lines: &[String], start: usize, end: usize, name: &str) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let quoted = format!("\"{}\"", name);
    (start..=end.min(lines.len() - 1)).find(|&index| {
        let trimmed = lines[index].trim_start();
        (trimmed.starts_with("P:") || trimmed.starts_with("Property:"))
            && trimmed.contains(&quoted)
    })
}

/// Reads the 3-vector stored in the last three comma-separated fields of a
/// property line, or `default` when the property is absent or malformed.
pub fn read_vec3(lines: &[String], start: usize, end: usize, name: &str, default: DVec3) -> DVec3 {
    let Some(index) = find_property(lines, start, end, name) else {
        return default;
    };

    let fields: Vec<&str> = lines[index].split(',').collect();
    if fields.len() < 4 {
        return default;
    }
    let tail = &fields[fields.len() - 3..];
    match (
        number::parse_f64(tail[0]),
        number::parse_f64(tail[1]),
        number::parse_f64(tail[2]),
    ) {
        (Some(x), Some(y), Some(z)) => DVec3::new(x, y, z),
        _ => {
            log::debug!("unparseable value fields for property \"{}\"", name);
            default
        }
    }
}

/// Reads a scalar integer property (e.g. `RotationOrder`) from the last
/// comma-separated field of its line.
pub fn read_index(lines: &[String], start: usize, end: usize, name: &str, default: i64) -> i64 {
    let Some(index) = find_property(lines, start, end, name) else {
        return default;
    };

    lines[index]
        .rsplit(',')
        .next()
        .and_then(number::parse_i64)
        .unwrap_or(default)
}

/// Overwrites the last three comma-separated fields of a property line in
/// place, keeping each field's leading whitespace. Absent properties are
/// left alone.
pub fn write_vec3(lines: &mut [String], start: usize, end: usize, name: &str, value: DVec3) {
    let Some(index) = find_property(lines, start, end, name) else {
        return;
    };
    if let Some(rewritten) = replace_tail(&lines[index], [value.x, value.y, value.z]) {
        lines[index] = rewritten;
    }
}

fn replace_tail(line: &str, values: [f64; 3]) -> Option<String> {
    let commas: Vec<usize> = line
        .bytes()
        .enumerate()
        .filter(|&(_, byte)| byte == b',')
        .map(|(position, _)| position)
        .collect();
    if commas.len() < 3 {
        return None;
    }

    let count = commas.len();
    let bounds = [
        (commas[count - 3] + 1, commas[count - 2]),
        (commas[count - 2] + 1, commas[count - 1]),
        (commas[count - 1] + 1, line.len()),
    ];

    let mut rewritten = String::from(&line[..=commas[count - 3]]);
    for (slot, ((field_start, field_end), value)) in bounds.iter().zip(values).enumerate() {
        if slot > 0 {
            rewritten.push(',');
        }
        let field = &line[*field_start..*field_end];
        let whitespace = &field[..field.len() - field.trim_start().len()];
        rewritten.push_str(whitespace);
        rewritten.push_str(&number::format_f64(value));
    }
    Some(rewritten)
}
