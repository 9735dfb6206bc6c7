//! Mutating filesystem operations behind the browser's context actions:
//! create, rename, delete, and the copy/move drops between panels.
//!
//! Everything here works on local paths only; package and category nodes are
//! read-only and never reach these functions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Create an empty asset file.
pub fn create_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(AppError::InvalidName(format!(
            "{} already exists",
            path.display()
        )));
    }
    fs::File::create(path)?;
    Ok(())
}

/// Create a new folder.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)?;
    Ok(())
}

/// Validate a rename typed into the dialog and resolve the target path.
///
/// The new name must be non-empty after trimming, differ from the current
/// name, and contain no path separators (renames stay within the parent).
pub fn validate_new_name(original: &Path, new_name: &str) -> Result<PathBuf> {
    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidName("name cannot be empty".to_string()));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::InvalidName(
            "name cannot contain path separators".to_string(),
        ));
    }
    let current = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if trimmed == current {
        return Err(AppError::InvalidName(
            "name is unchanged".to_string(),
        ));
    }
    let parent = original
        .parent()
        .ok_or_else(|| AppError::InvalidPath(original.display().to_string()))?;
    let target = parent.join(trimmed);
    if target.exists() {
        return Err(AppError::InvalidName(format!("{trimmed} already exists")));
    }
    Ok(target)
}

/// Rename a file or folder in place. Single `fs::rename`, never a copy.
pub fn rename_path(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to)?;
    Ok(())
}

/// Delete a file or folder. Folders are removed recursively.
pub fn delete(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Resolve a destination name collision by appending `_copy`, `_copy2`, ...
/// before the extension. Returns a path that does not exist yet.
pub fn resolve_collision(dest: &Path) -> PathBuf {
    if !dest.exists() {
        return dest.to_path_buf();
    }

    let parent = dest.parent().unwrap_or(Path::new("."));
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = dest.extension().map(|e| e.to_string_lossy().into_owned());

    for i in 1..=1000 {
        let suffix = if i == 1 {
            "_copy".to_string()
        } else {
            format!("_copy{i}")
        };
        let candidate_name = match &ext {
            Some(e) => format!("{stem}{suffix}.{e}"),
            None => format!("{stem}{suffix}"),
        };
        let candidate = parent.join(&candidate_name);
        if !candidate.exists() {
            return candidate;
        }
    }
    dest.to_path_buf()
}

/// Copy a file or folder into `dest_dir`, resolving name collisions.
/// Returns the final path of the copy.
pub fn copy_recursive(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| AppError::InvalidPath(src.display().to_string()))?;
    let dest = resolve_collision(&dest_dir.join(name));

    if src.is_dir() {
        copy_dir_recursive(src, &dest)?;
    } else {
        fs::copy(src, &dest)?;
    }
    Ok(dest)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Move a file or folder into `dest_dir`. Tries `fs::rename` first; falls
/// back to copy-then-delete across devices. Returns the final path.
pub fn move_item(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| AppError::InvalidPath(src.display().to_string()))?;
    let dest = resolve_collision(&dest_dir.join(name));

    match fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(_) => {
            if src.is_dir() {
                copy_dir_recursive(src, &dest)?;
                fs::remove_dir_all(src)?;
            } else {
                fs::copy(src, &dest)?;
                fs::remove_file(src)?;
            }
            Ok(dest)
        }
    }
}

// ── Drops ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    Move,
    Copy,
}

/// One source item of a pending drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEntry {
    pub path: PathBuf,
    pub action: DropAction,
}

/// A classified drop: entries safe to run now, and entries that need a
/// confirmation dialog first.
#[derive(Debug, Default)]
pub struct DropPlan {
    pub immediate: Vec<DropEntry>,
    pub needs_confirm: Vec<DropEntry>,
}

/// Split a drop into immediate and confirm-first entries. Moving a folder
/// relocates a whole subtree, so it is gated behind confirmation; file moves
/// and all copies run immediately.
pub fn classify_drop(entries: Vec<DropEntry>) -> DropPlan {
    let mut plan = DropPlan::default();
    for entry in entries {
        if entry.action == DropAction::Move && entry.path.is_dir() {
            plan.needs_confirm.push(entry);
        } else {
            plan.immediate.push(entry);
        }
    }
    plan
}

/// Execute drop entries against `dest_dir`. Failures are collected per entry
/// and never abort the batch. Returns the success count and error messages.
pub fn apply_drop(entries: &[DropEntry], dest_dir: &Path) -> (usize, Vec<String>) {
    let mut done = 0;
    let mut errors = Vec::new();
    for entry in entries {
        let result = match entry.action {
            DropAction::Copy => copy_recursive(&entry.path, dest_dir),
            DropAction::Move => move_item(&entry.path, dest_dir),
        };
        match result {
            Ok(_) => done += 1,
            Err(err) => errors.push(format!("{}: {}", entry.path.display(), err)),
        }
    }
    (done, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn create_file_refuses_existing_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("asset.mdl");
        create_file(&path).unwrap();
        assert!(matches!(create_file(&path), Err(AppError::InvalidName(_))));
    }

    #[test]
    fn validate_new_name_rules() {
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("old.txt");
        fs::write(&original, "").unwrap();

        assert!(validate_new_name(&original, "  ").is_err());
        assert!(validate_new_name(&original, "old.txt").is_err());
        assert!(validate_new_name(&original, "sub/new.txt").is_err());
        assert!(validate_new_name(&original, "sub\\new.txt").is_err());

        let target = validate_new_name(&original, "new.txt").unwrap();
        assert_eq!(target, tmp.path().join("new.txt"));
    }

    #[test]
    fn validate_new_name_refuses_existing_target() {
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("a.txt");
        fs::write(&original, "").unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();

        assert!(validate_new_name(&original, "b.txt").is_err());
    }

    #[test]
    fn rename_is_a_single_rename() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("before.txt");
        fs::write(&from, "content").unwrap();

        let to = validate_new_name(&from, "after.txt").unwrap();
        rename_path(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "content");
    }

    #[test]
    fn delete_removes_folders_recursively() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("parent");
        fs::create_dir_all(dir.join("child")).unwrap();
        fs::write(dir.join("child").join("f.txt"), "x").unwrap();

        delete(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn collision_appends_copy_suffix_before_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("tex.png"), "").unwrap();
        fs::write(tmp.path().join("tex_copy.png"), "").unwrap();

        let resolved = resolve_collision(&tmp.path().join("tex.png"));
        assert_eq!(resolved, tmp.path().join("tex_copy2.png"));
    }

    #[test]
    fn collision_without_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("LICENSE"), "").unwrap();
        let resolved = resolve_collision(&tmp.path().join("LICENSE"));
        assert_eq!(resolved, tmp.path().join("LICENSE_copy"));
    }

    #[test]
    fn copy_preserves_source_and_subtree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("props");
        fs::create_dir_all(src.join("wood")).unwrap();
        fs::write(src.join("wood").join("crate.mdl"), "mdl").unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let copied = copy_recursive(&src, &dest).unwrap();
        assert_eq!(copied, dest.join("props"));
        assert!(copied.join("wood").join("crate.mdl").exists());
        assert!(src.join("wood").join("crate.mdl").exists());
    }

    #[test]
    fn move_relocates_and_resolves_collision() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("tex.png");
        fs::write(&src, "new").unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("tex.png"), "existing").unwrap();

        let moved = move_item(&src, &dest).unwrap();
        assert_eq!(moved, dest.join("tex_copy.png"));
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dest.join("tex.png")).unwrap(), "existing");
    }

    #[test]
    fn folder_moves_need_confirmation_file_moves_do_not() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("subtree");
        fs::create_dir(&dir).unwrap();
        let file = tmp.path().join("single.txt");
        fs::write(&file, "").unwrap();

        let plan = classify_drop(vec![
            DropEntry {
                path: dir.clone(),
                action: DropAction::Move,
            },
            DropEntry {
                path: dir.clone(),
                action: DropAction::Copy,
            },
            DropEntry {
                path: file.clone(),
                action: DropAction::Move,
            },
        ]);

        assert_eq!(plan.needs_confirm.len(), 1);
        assert_eq!(plan.needs_confirm[0].path, dir);
        assert_eq!(plan.immediate.len(), 2);
    }

    #[test]
    fn apply_drop_collects_errors_without_aborting() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.txt");
        fs::write(&good, "ok").unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let entries = vec![
            DropEntry {
                path: tmp.path().join("missing.txt"),
                action: DropAction::Copy,
            },
            DropEntry {
                path: good.clone(),
                action: DropAction::Copy,
            },
        ];
        let (done, errors) = apply_drop(&entries, &dest);
        assert_eq!(done, 1);
        assert_eq!(errors.len(), 1);
        assert!(dest.join("good.txt").exists());
    }
}
