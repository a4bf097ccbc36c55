//! Stored-name resolution for new folders and uploaded files.

use super::disk;
use std::path::Path;

/// Characters replaced by `_` before a name touches the disk.
const UNSAFE_CHARS: [char; 8] = ['\\', '/', '／', '?', '？', '!', '！', ' '];

/// Replace filesystem-unsafe characters with underscores.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Split a file name at its last dot.
///
/// A name without a dot has no extension. A leading dot counts like any
/// other (`.bashrc` has an empty base and extension `bashrc`), and a trailing
/// dot yields no extension.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((base, "")) => (base, None),
        Some((base, ext)) => (base, Some(ext)),
        None => (file_name, None),
    }
}

/// Pick the name under which `name` (plus optional extension, given without
/// the dot) is stored in `dir`.
///
/// If the sanitized `name.ext` already exists, `_1`, `_2`, ... is appended to
/// the base, taking the first suffix that is free on disk right now.
pub fn resolve_store_name(dir: &Path, name: &str, ext: Option<&str>) -> String {
    let base = sanitize_name(name);
    let ext = ext
        .map(|ext| format!(".{}", sanitize_name(ext)))
        .unwrap_or_default();

    let candidate = format!("{}{}", base, ext);
    if !disk::exists(&dir.join(&candidate)) {
        return candidate;
    }

    let mut suffix = 1u64;
    loop {
        let candidate = format!("{}_{}{}", base, suffix, ext);
        if !disk::exists(&dir.join(&candidate)) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_name("a/b c"), "a_b_c");
        assert_eq!(sanitize_name("why?not!"), "why_not_");
        assert_eq!(sanitize_name("全角／？！"), "全角___");
        assert_eq!(sanitize_name(r"back\slash"), "back_slash");
        assert_eq!(sanitize_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.jpg"), ("photo", Some("jpg")));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension(".bashrc"), ("", Some("bashrc")));
        assert_eq!(split_extension("trailing."), ("trailing", None));
    }

    #[test]
    fn test_resolve_free_name_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_store_name(dir.path(), "notes", Some("txt")), "notes.txt");
        assert_eq!(resolve_store_name(dir.path(), "a/b c", None), "a_b_c");
    }

    #[test]
    fn test_resolve_appends_suffix_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(
            resolve_store_name(dir.path(), "notes", Some("txt")),
            "notes_1.txt"
        );

        fs::write(dir.path().join("notes_1.txt"), "x").unwrap();
        assert_eq!(
            resolve_store_name(dir.path(), "notes", Some("txt")),
            "notes_2.txt"
        );
    }

    #[test]
    fn test_resolve_dotfile_collision_suffixes_empty_base() {
        let dir = tempfile::tempdir().unwrap();
        let (base, ext) = split_extension(".bashrc");
        assert_eq!(resolve_store_name(dir.path(), base, ext), ".bashrc");

        fs::write(dir.path().join(".bashrc"), "x").unwrap();
        assert_eq!(resolve_store_name(dir.path(), base, ext), "_1.bashrc");
    }

    #[test]
    fn test_resolve_takes_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dup")).unwrap();
        fs::create_dir(dir.path().join("dup_2")).unwrap();
        assert_eq!(resolve_store_name(dir.path(), "dup", None), "dup_1");
    }
}
