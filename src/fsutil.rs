//! Trace discovery under a benchmark output directory.

use globset::{Glob, GlobSet, GlobSetBuilder};

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{WasmperfError, WasmperfResult};

/// Lists `*.txt` trace files directly under `dir`, sorted. `select`
/// patterns (matched against file names) narrow the set; empty means all.
pub fn find_trace_files(dir: &Path, select: &[String]) -> WasmperfResult<Vec<PathBuf>> {
    let set = if select.is_empty() {
        None
    } else {
        Some(compile_globset(select)?)
    };
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let msg = e.to_string();
            WasmperfError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(msg)),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
            continue;
        }
        if let Some(set) = &set {
            let name = entry.file_name().to_string_lossy();
            if !set.is_match(name.as_ref()) {
                continue;
            }
        }
        out.push(path.to_path_buf());
    }
    out.sort();
    Ok(out)
}

fn compile_globset(patterns: &[String]) -> WasmperfResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            WasmperfError::InvalidArgument(format!("invalid glob {pattern:?}: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| WasmperfError::InvalidArgument(format!("invalid globset: {e}")))
}

/// Splits a trace file stem `<profile>_<environment>` on its last
/// underscore, so profile names may themselves contain underscores.
pub fn split_trace_stem(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_str()?;
    let (profile, environment) = stem.rsplit_once('_')?;
    if profile.is_empty() || environment.is_empty() {
        return None;
    }
    Some((profile.to_string(), environment.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wasmperf-fsutil-{name}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    #[test]
    fn finds_only_txt_files_sorted() {
        let root = temp_dir("discover");
        for name in ["runs_native.txt", "runs_d8.txt", "report.json", "notes.md"] {
            std::fs::write(root.join(name), b"x").expect("write");
        }
        std::fs::create_dir_all(root.join("nested")).expect("mkdir");
        std::fs::write(root.join("nested/runs_node.txt"), b"x").expect("write");

        let found = find_trace_files(&root, &[]).expect("discover");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["runs_d8.txt", "runs_native.txt"]);
    }

    #[test]
    fn select_patterns_narrow_the_set() {
        let root = temp_dir("select");
        for name in ["runs_native.txt", "runs_d8.txt", "large_native.txt"] {
            std::fs::write(root.join(name), b"x").expect("write");
        }
        let found = find_trace_files(&root, &["*_native.txt".to_string()]).expect("discover");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["large_native.txt", "runs_native.txt"]);
    }

    #[test]
    fn invalid_select_pattern_is_rejected() {
        let root = temp_dir("badglob");
        assert!(matches!(
            find_trace_files(&root, &["runs[".to_string()]),
            Err(WasmperfError::InvalidArgument(_))
        ));
    }

    #[test]
    fn stems_split_on_the_last_underscore() {
        assert_eq!(
            split_trace_stem(Path::new("out/zlib/runs_native.txt")),
            Some(("runs".to_string(), "native".to_string()))
        );
        assert_eq!(
            split_trace_stem(Path::new("big_input_d8.txt")),
            Some(("big_input".to_string(), "d8".to_string()))
        );
        assert_eq!(split_trace_stem(Path::new("overview.txt")), None);
        assert_eq!(split_trace_stem(Path::new("_native.txt")), None);
    }
}
