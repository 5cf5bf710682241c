/// Host-side path helpers for ATR files
///
/// Players address a file inside an image as `<image>.atr#<inner path>`,
/// e.g. `music.atr#SONGS/INTRO.SAP`.

use std::path::Path;

/// Separator between the image path and the path inside the image
pub const INNER_PATH_SEPARATOR: char = '#';

/// Check if a file is likely an ATR image based on extension
pub fn is_atr_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("atr"))
        .unwrap_or(false)
}

/// Split `disk.atr#DIR/FILE.EXT` into the image path and the inner path
///
/// Returns `None` unless the part before the last `#` names an ATR file and
/// the inner path is non-empty.
pub fn split_inner_path(path: &str) -> Option<(&str, &str)> {
    let (image, inner) = path.rsplit_once(INNER_PATH_SEPARATOR)?;
    if inner.is_empty() || !is_atr_file(image) {
        return None;
    }
    Some((image, inner))
}
