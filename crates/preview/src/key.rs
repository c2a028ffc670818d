//! Cache key derivation.

use photomark_common::{sha256_hex, PhotomarkResult};
use photomark_model::{FrameSettings, OverlaySettings, SourceFile};

/// Stable key over the file identity and both settings objects.
///
/// The file is identified by name, size and modification time rather than
/// its bytes, so keying a large photo stays cheap. Fields are separated by
/// a NUL so adjacent values cannot run together.
pub fn cache_key(
    file: &SourceFile,
    overlay: &OverlaySettings,
    frame: &FrameSettings,
) -> PhotomarkResult<String> {
    let overlay_json = serde_json::to_vec(overlay)?;
    let frame_json = serde_json::to_vec(frame)?;

    let size = file.size.to_le_bytes();
    let mtime = file.last_modified_ms.to_le_bytes();
    let parts: [&[u8]; 7] = [
        file.file_name.as_bytes(),
        &[0],
        &size,
        &mtime,
        &overlay_json,
        &[0],
        &frame_json,
    ];
    Ok(sha256_hex(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomark_model::{FrameStyle, OverlayPosition};
    use proptest::prelude::*;

    fn file(name: &str, size: usize, mtime: i64) -> SourceFile {
        SourceFile::from_bytes(name, vec![0u8; size], mtime)
    }

    #[test]
    fn test_key_is_stable() {
        let f = file("a.jpg", 10, 1_700_000_000_000);
        let o = OverlaySettings::default();
        let fr = FrameSettings::default();
        let k1 = cache_key(&f, &o, &fr).unwrap();
        let k2 = cache_key(&f, &o, &fr).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 64);
    }

    #[test]
    fn test_key_ignores_bytes_with_same_identity() {
        let a = SourceFile::from_bytes("a.jpg", vec![1u8; 4], 5);
        let b = SourceFile::from_bytes("a.jpg", vec![2u8; 4], 5);
        let o = OverlaySettings::default();
        let fr = FrameSettings::default();
        assert_eq!(cache_key(&a, &o, &fr).unwrap(), cache_key(&b, &o, &fr).unwrap());
    }

    #[test]
    fn test_every_input_changes_the_key() {
        let base_file = file("a.jpg", 10, 1);
        let o = OverlaySettings::default();
        let fr = FrameSettings::default();
        let base = cache_key(&base_file, &o, &fr).unwrap();

        assert_ne!(base, cache_key(&file("b.jpg", 10, 1), &o, &fr).unwrap());
        assert_ne!(base, cache_key(&file("a.jpg", 11, 1), &o, &fr).unwrap());
        assert_ne!(base, cache_key(&file("a.jpg", 10, 2), &o, &fr).unwrap());

        let mut moved = o.clone();
        moved.position = OverlayPosition::TopLeft;
        assert_ne!(base, cache_key(&base_file, &moved, &fr).unwrap());

        let mut framed = fr.clone();
        framed.style = FrameStyle::Film;
        assert_ne!(base, cache_key(&base_file, &o, &framed).unwrap());
    }

    proptest! {
        #[test]
        fn font_size_change_changes_key(a in 8u32..=72, b in 8u32..=72) {
            prop_assume!(a != b);
            let f = file("p.jpg", 3, 0);
            let fr = FrameSettings::default();
            let mut oa = OverlaySettings::default();
            oa.font.size = a as f32;
            let mut ob = oa.clone();
            ob.font.size = b as f32;
            prop_assert_ne!(cache_key(&f, &oa, &fr).unwrap(), cache_key(&f, &ob, &fr).unwrap());
        }
    }
}
