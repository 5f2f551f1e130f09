// Copyright 2024 The Regents of the University of California
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@berkeley.edu>
//
// GTKWave save files (`.gtkw`) record the dump and save file with their full path.
// We strip the folders so that save files can be checked in next to their dumps.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const GTKW_EXTENSION: &str = "gtkw";

#[derive(Debug, thiserror::Error)]
pub enum MangleError {
    #[error("{0:?} is neither file nor folder")]
    NotFound(PathBuf),
    #[error("io error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MangleError>;

/// Commands that reference files by path.
fn path_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\[(dumpfile|savefile)\] "([/a-zA-Z0-9.\-_ ]*)""#)
            .expect("path command regex is valid")
    })
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
}

/// Replaces `[dumpfile] "/some/folder/wave.vcd"` with `[dumpfile] "wave.vcd"`, same for `[savefile]`.
/// All other lines are copied unchanged. Returns `None` if nothing needed to change.
pub fn mangle_str(content: &str) -> Option<String> {
    let re = path_command();
    let mut changed = false;
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| match re.captures(line) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let new_line = format!("[{}] \"{}\"{}", &caps[1], file_name(&caps[2]), &line[whole..]);
                changed |= new_line != line;
                new_line
            }
            None => line.to_string(),
        })
        .collect();
    changed.then(|| lines.join("\n"))
}

/// Rewrites a single save file in place. Returns whether the file changed.
pub fn mangle_file<P: AsRef<Path>>(filename: P) -> Result<bool> {
    let filename = filename.as_ref();
    let content = std::fs::read_to_string(filename)?;
    match mangle_str(&content) {
        Some(new_content) => {
            std::fs::write(filename, new_content)?;
            log::info!("Changed.");
            Ok(true)
        }
        None => {
            log::info!("No change.");
            Ok(false)
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MangleStats {
    /// number of `.gtkw` files that were processed
    pub files: usize,
    pub changed: usize,
}

fn is_save_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(GTKW_EXTENSION))
        .unwrap_or(false)
}

/// Processes `path` if it is a save file, or all save files found below it if it is a folder.
pub fn mangle_recursive<P: AsRef<Path>>(path: P) -> Result<MangleStats> {
    let mut stats = MangleStats::default();
    mangle_recursive_inner(path.as_ref(), &mut stats)?;
    Ok(stats)
}

fn mangle_recursive_inner(path: &Path, stats: &mut MangleStats) -> Result<()> {
    if path.is_dir() {
        log::info!("{path:?} is a folder. Recursing...");
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // visit files in a reproducible order
        entries.sort();
        for entry in entries {
            mangle_recursive_inner(&entry, stats)?;
        }
        Ok(())
    } else if path.is_file() {
        if !is_save_file(path) {
            log::debug!("Skipping unsupported file {path:?}");
            return Ok(());
        }
        log::info!("Processing {path:?} ...");
        stats.files += 1;
        if mangle_file(path)? {
            stats.changed += 1;
        }
        Ok(())
    } else {
        Err(MangleError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVE_FILE: &str = r#"[*]
[*] GTKWave Analyzer v3.3.104 (w)1999-2020 BSI
[*]
[dumpfile] "/home/user/project/build/tb.vcd"
[dumpfile_mtime] "Fri Oct 17 10:00:00 2026"
[savefile] "/home/user/project/sim/tb.gtkw"
[timestart] 0
[size] 1000 600
@28
tb.clk
"#;

    #[test]
    fn test_mangle_str() {
        let out = mangle_str(SAVE_FILE).unwrap();
        assert!(out.contains("[dumpfile] \"tb.vcd\"\n"));
        assert!(out.contains("[savefile] \"tb.gtkw\"\n"));
        // lines that are not paths stay as they are
        assert!(out.contains("[dumpfile_mtime] \"Fri Oct 17 10:00:00 2026\"\n"));
        assert!(out.contains("[size] 1000 600\n@28\ntb.clk\n"));
        assert_eq!(out.lines().count(), SAVE_FILE.lines().count());
    }

    #[test]
    fn test_already_mangled() {
        let once = mangle_str(SAVE_FILE).unwrap();
        assert_eq!(mangle_str(&once), None);
        assert_eq!(mangle_str("[timestart] 0\n"), None);
    }

    #[test]
    fn test_keeps_line_ending() {
        let out = mangle_str("[dumpfile] \"/a/b/c.vcd\"\r\n[timestart] 0\r\n").unwrap();
        assert_eq!(out, "[dumpfile] \"c.vcd\"\r\n[timestart] 0\r\n");
    }

    #[test]
    fn test_mangle_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sim");
        std::fs::create_dir(&sub).unwrap();
        let a = dir.path().join("a.gtkw");
        let b = sub.join("b.GTKW");
        let other = sub.join("notes.txt");
        std::fs::write(&a, SAVE_FILE).unwrap();
        std::fs::write(&b, "[timestart] 0\n").unwrap();
        std::fs::write(&other, "[dumpfile] \"/x/y.vcd\"\n").unwrap();

        let stats = mangle_recursive(dir.path()).unwrap();
        assert_eq!(stats, MangleStats { files: 2, changed: 1 });
        assert!(std::fs::read_to_string(&a).unwrap().contains("[dumpfile] \"tb.vcd\""));
        // only save files are touched
        assert_eq!(
            std::fs::read_to_string(&other).unwrap(),
            "[dumpfile] \"/x/y.vcd\"\n"
        );
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let r = mangle_recursive(dir.path().join("missing"));
        assert!(matches!(r, Err(MangleError::NotFound(_))));
    }
}
