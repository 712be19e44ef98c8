// ABOUTME: Loads one skill directory's SKILL.md into a SkillMetadata record.
// ABOUTME: Enforces a size cap and refuses descriptors that resolve outside their tier root.

use std::fs;
use std::path::{Path, PathBuf};

use skillgate_core::descriptor::{DESCRIPTOR_FILE_NAME, DescriptorError, parse_descriptor};
use skillgate_core::skill::{SkillMetadata, SkillSource};
use thiserror::Error;

/// Descriptors larger than this are not read.
pub const MAX_DESCRIPTOR_BYTES: u64 = 10 * 1024 * 1024;

/// Reasons a skill directory could not be turned into a record.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no SKILL.md found in {}", .0.display())]
    NoDescriptor(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, larger than the {max} byte limit", .path.display(), max = MAX_DESCRIPTOR_BYTES)]
    TooLarge { path: PathBuf, size: u64 },

    #[error("{} resolves outside the skills root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("invalid descriptor {}: {source}", .path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
}

/// Load the skill in `dir`, which must be a direct child of the tier `root`.
///
/// The returned record's `path` is the canonical absolute path of the
/// descriptor file.
pub fn load_skill(dir: &Path, root: &Path, source: SkillSource) -> Result<SkillMetadata, LoadError> {
    let descriptor_path = dir.join(DESCRIPTOR_FILE_NAME);
    if !descriptor_path.is_file() {
        return Err(LoadError::NoDescriptor(dir.to_path_buf()));
    }

    let canonical_root = root.canonicalize().map_err(|e| io_error(root, e))?;
    let canonical_path = descriptor_path
        .canonicalize()
        .map_err(|e| io_error(&descriptor_path, e))?;
    if !canonical_path.starts_with(&canonical_root) {
        return Err(LoadError::OutsideRoot {
            path: canonical_path,
            root: canonical_root,
        });
    }

    let size = fs::metadata(&canonical_path)
        .map_err(|e| io_error(&canonical_path, e))?
        .len();
    if size > MAX_DESCRIPTOR_BYTES {
        return Err(LoadError::TooLarge {
            path: canonical_path,
            size,
        });
    }

    let content = fs::read_to_string(&canonical_path).map_err(|e| io_error(&canonical_path, e))?;
    let descriptor = parse_descriptor(&content).map_err(|source| LoadError::Descriptor {
        path: canonical_path.clone(),
        source,
    })?;

    Ok(SkillMetadata {
        name: descriptor.name,
        description: descriptor.description,
        path: canonical_path,
        source,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}
