//! Walks an input directory, bakes each ASCII FBX, rewrites each scene
//! descriptor, and writes the results under a `baked` subdirectory of the
//! input. Files under `baked` are never read back as input.

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{
    error::Error,
    formats::{fbx, prefab},
};

/// The aggregate outcome of one directory run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub baked_meshes: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

enum Outcome {
    Fbx(usize),
    Prefab(usize),
}

/// Processes every `.fbx` and `.prefab` file of `dir`, in file-name order.
/// Per-file failures are reported and counted; they never abort the run.
pub fn process_dir(dir: &Path) -> Result<Summary> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read the input directory \"{}\"", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, &["fbx", "prefab"]) {
            paths.push(path);
        }
    }
    paths.sort();

    let out_dir = dir.join("baked");
    if !paths.is_empty() {
        fs::create_dir_all(&out_dir).with_context(|| {
            format!("Failed to create the output directory \"{}\"", out_dir.display())
        })?;
    }

    let mut summary = Summary::default();
    for path in &paths {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("<INVALID NAME>");

        eprint!("Baking \"{}\"... ", name);
        match process_file(path, &out_dir) {
            Ok(Outcome::Fbx(meshes)) => {
                eprintln!("Success! ({} meshes)", meshes);
                summary.processed += 1;
                summary.baked_meshes += meshes;
            }
            Ok(Outcome::Prefab(values)) => {
                eprintln!("Success! ({} transform values)", values);
                summary.processed += 1;
            }
            Err(Error::BinarySkipped(_)) => {
                eprintln!("Skipped: binary FBX files are not supported");
                summary.skipped += 1;
            }
            Err(error) => {
                eprintln!("Failure: {}", error);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn process_file(path: &Path, out_dir: &Path) -> Result<Outcome, Error> {
    let extension = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    if extension.eq_ignore_ascii_case("fbx") {
        bake_fbx(path, out_dir).map(Outcome::Fbx)
    } else {
        rewrite_prefab(path, out_dir).map(Outcome::Prefab)
    }
}

fn bake_fbx(path: &Path, out_dir: &Path) -> Result<usize, Error> {
    let bytes = read_file(path)?;
    if fbx::is_binary(&bytes) {
        return Err(Error::BinarySkipped(path.to_path_buf()));
    }

    let mut buffer = TextBuffer::parse(decode(bytes, path));
    let baked = fbx::bake_buffer(&mut buffer.lines)?;
    write_file(&output_path(path, out_dir)?, buffer.render())?;
    Ok(baked)
}

fn rewrite_prefab(path: &Path, out_dir: &Path) -> Result<usize, Error> {
    let bytes = read_file(path)?;

    let mut buffer = TextBuffer::parse(decode(bytes, path));
    let rewritten = prefab::rewrite_buffer(&mut buffer.lines);
    write_file(&output_path(path, out_dir)?, buffer.render())?;
    Ok(rewritten)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| {
            extensions
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        })
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: String) -> Result<(), Error> {
    fs::write(path, contents).map_err(|source| Error::Io {
        action: "write",
        path: path.to_path_buf(),
        source,
    })
}

fn output_path(path: &Path, out_dir: &Path) -> Result<PathBuf, Error> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::Unexpected(format!("\"{}\" has no file name", path.display())))?;
    Ok(out_dir.join(name))
}

fn decode(bytes: Vec<u8>, path: &Path) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(error) => {
            log::warn!("replacing non-UTF-8 bytes in \"{}\"", path.display());
            String::from_utf8_lossy(error.as_bytes()).into_owned()
        }
    }
}

/// A file's lines plus the newline flavor needed to render unchanged lines
/// back byte-identically.
struct TextBuffer {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl TextBuffer {
    fn parse(text: String) -> Self {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = text.ends_with('\n');

        let mut lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        if trailing_newline {
            lines.pop();
        }

        Self {
            lines,
            newline,
            trailing_newline,
        }
    }

    fn render(&self) -> String {
        let mut text = self.lines.join(self.newline);
        if self.trailing_newline {
            text.push_str(self.newline);
        }
        text
    }
}
