//! Output filename generation
//!
//! Produces collision-free paths for downloaded media and, when asked,
//! appends a content-sniffed extension once the file has been written.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use crate::error::Result;

/// Build a non-colliding output path from a base name.
///
/// With `detailed`, `-{detail}` is appended to the stem, falling back to
/// a random 4-digit number when no detail is supplied. While the
/// candidate exists on disk, a `-{counter}` suffix is inserted before the
/// extension, counting up from 1. The returned path does not exist at
/// call time; the check-then-create gap is left to the writer, which
/// opens with `create_new`.
pub fn make_output_path(base: &str, detailed: bool, detail: Option<&str>) -> PathBuf {
    let path = Path::new(base);
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let stem = if detailed {
        match detail {
            Some(detail) => format!("{}-{}", stem, detail),
            None => format!("{}-{}", stem, rand::thread_rng().gen_range(1000..10000)),
        }
    } else {
        stem
    };

    let mut counter = 0u32;
    loop {
        let name = if counter == 0 {
            format!("{}{}", stem, ext)
        } else {
            format!("{}-{}{}", stem, counter, ext)
        };

        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Sniff a written file's content and, when the type is recognized,
/// rename the file to carry the detected extension. Returns the possibly
/// renamed path; an unrecognized file is left untouched.
pub fn infer_extension(path: &Path) -> Result<PathBuf> {
    match infer::get_from_path(path)? {
        Some(kind) => {
            let mut renamed = path.as_os_str().to_os_string();
            renamed.push(format!(".{}", kind.extension()));
            let renamed = PathBuf::from(renamed);

            std::fs::rename(path, &renamed)?;
            debug!("Renamed {} -> {}", path.display(), renamed.display());
            Ok(renamed)
        }
        None => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const JPEG_MAGIC: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00,
    ];
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn base_in(dir: &Path, name: &str) -> String {
        dir.join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn fresh_base_is_returned_unchanged() {
        let temp = tempdir().expect("tempdir");
        let base = base_in(temp.path(), "file.jpg");

        let path = make_output_path(&base, false, None);
        assert_eq!(path, temp.path().join("file.jpg"));
    }

    #[test]
    fn existing_file_gets_counter_before_extension() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("file.jpg"), b"x").unwrap();

        let base = base_in(temp.path(), "file.jpg");
        let path = make_output_path(&base, false, None);
        assert_eq!(path, temp.path().join("file-1.jpg"));

        std::fs::write(&path, b"x").unwrap();
        let next = make_output_path(&base, false, None);
        assert_eq!(next, temp.path().join("file-2.jpg"));
    }

    #[test]
    fn counter_works_without_extension() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("file"), b"x").unwrap();

        let base = base_in(temp.path(), "file");
        let path = make_output_path(&base, false, None);
        assert_eq!(path, temp.path().join("file-1"));
    }

    #[test]
    fn detailed_name_embeds_detail_in_stem() {
        let temp = tempdir().expect("tempdir");
        let base = base_in(temp.path(), "file.jpg");

        let path = make_output_path(&base, true, Some("1001-42"));
        assert_eq!(path, temp.path().join("file-1001-42.jpg"));
    }

    #[test]
    fn detailed_name_without_detail_uses_four_digits() {
        let temp = tempdir().expect("tempdir");
        let base = base_in(temp.path(), "file.bin");

        let path = make_output_path(&base, true, None);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        let digits = name
            .strip_prefix("file-")
            .and_then(|rest| rest.strip_suffix(".bin"))
            .expect("name should be file-NNNN.bin");
        assert_eq!(digits.len(), 4);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn detailed_name_still_gets_counter_on_collision() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("file-detail.jpg"), b"x").unwrap();

        let base = base_in(temp.path(), "file.jpg");
        let path = make_output_path(&base, true, Some("detail"));
        assert_eq!(path, temp.path().join("file-detail-1.jpg"));
    }

    #[test]
    fn infer_renames_jpeg_payload() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("download");
        std::fs::write(&path, JPEG_MAGIC).unwrap();

        let renamed = infer_extension(&path).expect("infer");
        assert_eq!(renamed, temp.path().join("download.jpg"));
        assert!(renamed.exists());
        assert!(!path.exists());
    }

    #[test]
    fn infer_renames_png_payload() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("download");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let renamed = infer_extension(&path).expect("infer");
        assert_eq!(renamed, temp.path().join("download.png"));
    }

    #[test]
    fn infer_leaves_unknown_content_alone() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("notes");
        std::fs::write(&path, b"just some text").unwrap();

        let result = infer_extension(&path).expect("infer");
        assert_eq!(result, path);
        assert!(path.exists());
    }

    #[test]
    fn infer_missing_file_is_io_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("never-written");

        let err = infer_extension(&path).unwrap_err();
        assert!(matches!(err, crate::error::Error::IoError(_)));
    }
}
