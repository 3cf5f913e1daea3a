//! 产物落盘

use std::fs;
use std::path::Path;

use crate::codegen::Artifact;
use crate::error::{MjError, MjResult};

/// 把生成的文件写入目标目录, 目录不存在则创建
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> MjResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        MjError::Io(format!("Failed to create output directory '{}': {}", dir.display(), e))
    })?;
    for artifact in artifacts {
        let path = dir.join(&artifact.filename);
        fs::write(&path, &artifact.contents).map_err(|e| {
            MjError::Io(format!("Failed to write '{}': {}", path.display(), e))
        })?;
    }
    Ok(())
}
