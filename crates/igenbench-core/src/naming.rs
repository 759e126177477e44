//! File naming and path resolution under the output directory.
//!
//! Layout: `<out>/<item_id>/<item_id>.json` for state and
//! `<out>/<item_id>/<item_id>_<normalized model>.<ext>` for images.

use std::path::{Path, PathBuf};

/// Image extensions recognised when looking up images on disk.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Source images next to an info file are looked up in this order.
const SOURCE_IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp"];

/// `openai/gpt-4` -> `gpt_4`, `gemini-2.5-pro` -> `gemini_2_5_pro`.
///
/// With several slashes only the second segment is kept, so the result never
/// contains a path separator.
pub fn normalize_model_name(name: &str) -> String {
    let replaced = name.replace(['-', '.'], "_");
    if replaced.contains('/') {
        replaced.split('/').nth(1).unwrap_or_default().to_string()
    } else {
        replaced
    }
}

pub fn image_file_name(item_id: &str, model: &str, ext: &str) -> String {
    format!("{}_{}.{}", item_id, normalize_model_name(model), ext)
}

pub fn item_dir(item_id: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(item_id)
}

pub fn resolve_image_path(item_id: &str, model: &str, output_dir: &Path, ext: &str) -> PathBuf {
    item_dir(item_id, output_dir).join(image_file_name(item_id, model, ext))
}

pub fn resolve_item_json_path(item_id: &str, output_dir: &Path) -> PathBuf {
    item_dir(item_id, output_dir).join(format!("{}.json", item_id))
}

/// First existing `base.<ext>` in `extensions` order.
pub fn find_image_with_extensions(base: &Path, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| base.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Image for `(item_id, model)` with any supported extension.
pub fn find_generated_image(item_id: &str, model: &str, output_dir: &Path) -> Option<PathBuf> {
    let base = item_dir(item_id, output_dir).join(format!(
        "{}_{}",
        item_id,
        normalize_model_name(model)
    ));
    find_image_with_extensions(&base, SUPPORTED_IMAGE_EXTENSIONS)
}

/// Sibling image of an info file: `tmp/0.json` -> `tmp/0.{jpeg,jpg,png,webp}`.
pub fn find_source_image(info_path: &Path) -> Option<PathBuf> {
    find_image_with_extensions(info_path, SOURCE_IMAGE_EXTENSIONS)
}

/// Any image in `<out>/<item_id>/`, in file name order.
pub fn find_output_image(item_id: &str, output_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(item_dir(item_id, output_dir)).ok()?;
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    images.sort();
    images.into_iter().next()
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}
