//! Naming convention for dual-camera recordings: a rear clip ends in
//! `_r.mp4` (any case) and its front counterpart differs only in that
//! suffix letter.

const REAR_SUFFIX: &str = "_r.mp4";

/// Whether a file name follows the rear-camera convention (`*_r.mp4`,
/// case-insensitive).
pub fn is_rear_video(file_name: &str) -> bool {
    let bytes = file_name.as_bytes();
    bytes.len() >= REAR_SUFFIX.len()
        && bytes[bytes.len() - REAR_SUFFIX.len()..].eq_ignore_ascii_case(REAR_SUFFIX.as_bytes())
}

/// Derive the front-camera file name from a rear-camera file name.
///
/// The `r` of the trailing suffix becomes an `f` of matching case; every
/// other character, including the extension's case, is left untouched.
/// Returns `None` when the name does not follow the rear convention.
pub fn front_name(rear_name: &str) -> Option<String> {
    if !is_rear_video(rear_name) {
        return None;
    }
    let mut bytes = rear_name.as_bytes().to_vec();
    // The suffix is pure ASCII, so editing one of its bytes cannot break
    // a UTF-8 boundary.
    let r_at = bytes.len() - REAR_SUFFIX.len() + 1;
    bytes[r_at] = if bytes[r_at] == b'R' { b'F' } else { b'f' };
    String::from_utf8(bytes).ok()
}
