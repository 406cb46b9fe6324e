//! Source-tree staging
//!
//! Assembles the meta tree an external packaging step consumes (kernel
//! library, ISA blobs, host sources) and renames host `.cpp` translation
//! units into `.cu` files inside the build directory so the downstream
//! extension compiler treats them as device sources.

use crate::error::{GemmForgeError, IoResultExt, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Subtrees staged into the meta tree, relative to the project root
pub const META_SUBTREES: &[&str] = &["3rdparty", "hsa", "csrc"];

/// Name of the blob subdirectory inside the build dir
pub const BLOB_DIR: &str = "blob";

/// Outcome of a staging pass
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StagingStats {
    /// Files copied into the meta tree
    pub files_staged: usize,
    /// Bytes copied
    pub bytes_staged: u64,
    /// Translation units renamed into the build dir
    pub sources_renamed: usize,
}

/// Create the build directory and its blob subdirectory
pub fn ensure_build_dirs(build_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(build_dir).with_path(build_dir)?;
    let blob_dir = build_dir.join(BLOB_DIR);
    std::fs::create_dir_all(&blob_dir).with_path(&blob_dir)?;
    Ok(())
}

/// Stage the meta tree: remove a stale destination, copy the known
/// subtrees of `root` under `dest` preserving relative layout, and open
/// the destination up for the packaging step that runs after us.
///
/// Missing subtrees are an error: a checkout without them cannot produce
/// a usable package.
pub fn stage_meta_tree(root: &Path, dest: &Path) -> Result<StagingStats> {
    if dest.exists() {
        std::fs::remove_dir_all(dest).with_path(dest)?;
    }

    let mut stats = StagingStats::default();

    for subtree in META_SUBTREES {
        let src = root.join(subtree);
        if !src.is_dir() {
            return Err(GemmForgeError::NotFound(src));
        }
        let copied = copy_tree(&src, &dest.join(subtree))?;
        stats.files_staged += copied.0;
        stats.bytes_staged += copied.1;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o777))
            .with_path(dest)?;
    }

    info!(
        files = stats.files_staged,
        bytes = stats.bytes_staged,
        dest = %dest.display(),
        "staged meta tree"
    );
    Ok(stats)
}

/// Copy a directory tree, fanning the file copies out over the rayon pool.
/// Returns (files, bytes).
fn copy_tree(src: &Path, dest: &Path) -> Result<(usize, u64)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            GemmForgeError::staging(src, format!("walk failed: {}", e))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .unwrap_or(entry.path())
            .to_path_buf();
        if entry.file_type().is_dir() {
            dirs.push(relative);
        } else {
            files.push(relative);
        }
    }

    // Directories first, sequentially; files in parallel once the layout
    // exists
    for dir in &dirs {
        let target = dest.join(dir);
        std::fs::create_dir_all(&target).with_path(target)?;
    }

    let bytes: Vec<u64> = files
        .par_iter()
        .map(|relative| {
            let from = src.join(relative);
            let to = dest.join(relative);
            std::fs::copy(&from, &to).with_path(from)
        })
        .collect::<Result<_>>()?;

    debug!(src = %src.display(), files = files.len(), "copied subtree");
    Ok((files.len(), bytes.iter().sum()))
}

/// Copy every `.cpp` file found under the given source dirs into the
/// build dir with a `.cu` extension, returning the new paths. A flat
/// destination means colliding stems overwrite each other; the last
/// source dir wins, matching how the downstream compiler has always
/// resolved them.
pub fn rename_cpp_to_cu(sources: &[PathBuf], build_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(build_dir).with_path(build_dir)?;

    let mut renamed = Vec::new();
    for source in sources {
        if !source.exists() {
            return Err(GemmForgeError::NotFound(source.clone()));
        }
        for entry in WalkDir::new(source).follow_links(false) {
            let entry = entry.map_err(|e| {
                GemmForgeError::staging(source, format!("walk failed: {}", e))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().map_or(false, |ext| ext == "cpp") {
                let file_name = path.with_extension("cu");
                let target = build_dir.join(
                    file_name
                        .file_name()
                        .ok_or_else(|| GemmForgeError::staging(path, "nameless source file"))?,
                );
                std::fs::copy(path, &target).with_path(path)?;
                renamed.push(target);
            }
        }
    }

    debug!(count = renamed.len(), "renamed translation units");
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_ensure_build_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let build = tmp.path().join("build");
        ensure_build_dirs(&build).unwrap();
        assert!(build.is_dir());
        assert!(build.join(BLOB_DIR).is_dir());
    }

    #[test]
    fn test_stage_meta_tree_copies_known_subtrees() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(&root.join("3rdparty/kernellib/README"), "kernels");
        write(&root.join("hsa/gfx942/solver.co"), "blob");
        write(&root.join("csrc/binding.cpp"), "int main(){}");

        let dest = root.join("meta");
        let stats = stage_meta_tree(root, &dest).unwrap();

        assert_eq!(stats.files_staged, 3);
        assert!(dest.join("3rdparty/kernellib/README").is_file());
        assert!(dest.join("hsa/gfx942/solver.co").is_file());
        assert!(dest.join("csrc/binding.cpp").is_file());
    }

    #[test]
    fn test_stage_meta_tree_replaces_stale_dest() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for subtree in META_SUBTREES {
            write(&root.join(subtree).join("f"), "x");
        }

        let dest = root.join("meta");
        write(&dest.join("leftover"), "stale");

        stage_meta_tree(root, &dest).unwrap();
        assert!(!dest.join("leftover").exists());
    }

    #[test]
    fn test_stage_meta_tree_requires_all_subtrees() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(&root.join("3rdparty/f"), "x");
        // hsa and csrc missing

        let err = stage_meta_tree(root, &root.join("meta")).unwrap_err();
        assert!(matches!(err, GemmForgeError::NotFound(_)));
    }

    #[test]
    fn test_rename_cpp_to_cu() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("gradlib");
        write(&src.join("rocsolgemm.cpp"), "// solver");
        write(&src.join("hipbsolgemm.cpp"), "// solver");
        write(&src.join("notes.txt"), "skip me");

        let build = tmp.path().join("build");
        let renamed = rename_cpp_to_cu(&[src], &build).unwrap();

        assert_eq!(renamed.len(), 2);
        assert!(build.join("rocsolgemm.cu").is_file());
        assert!(build.join("hipbsolgemm.cu").is_file());
        assert!(!build.join("notes.txt").exists());
        assert_eq!(
            fs::read_to_string(build.join("rocsolgemm.cu")).unwrap(),
            "// solver"
        );
    }

    #[test]
    fn test_rename_missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = rename_cpp_to_cu(&[missing], &tmp.path().join("build")).unwrap_err();
        assert!(matches!(err, GemmForgeError::NotFound(_)));
    }
}
