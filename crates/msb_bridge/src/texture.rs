//! Character texture atlas export.

use std::path::Path;

use image::RgbaImage;
use msb_native::TextureAtlas;

use crate::error::{BridgeError, Result};

pub fn atlas_to_image(atlas: &TextureAtlas) -> Result<RgbaImage> {
    let expected = atlas.width as usize * atlas.height as usize * 4;
    if atlas.rgba.len() != expected {
        return Err(BridgeError::Texture(format!(
            "atlas is {}x{} but holds {} bytes, expected {}",
            atlas.width,
            atlas.height,
            atlas.rgba.len(),
            expected
        )));
    }
    RgbaImage::from_raw(atlas.width, atlas.height, atlas.rgba.clone())
        .ok_or_else(|| BridgeError::Texture("atlas buffer rejected".to_string()))
}

pub fn save_texture_png(atlas: &TextureAtlas, path: &Path) -> Result<()> {
    let image = atlas_to_image(atlas)?;
    image
        .save(path)
        .map_err(|e| BridgeError::Texture(format!("failed to write {}: {e}", path.display())))?;
    log::info!(
        "Wrote {}x{} texture atlas to {}",
        atlas.width,
        atlas.height,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "msb_texture_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn atlas() -> TextureAtlas {
        let mut rgba = vec![0u8; 4 * 3 * 2];
        rgba[0..4].copy_from_slice(&[10, 20, 30, 255]);
        TextureAtlas {
            width: 3,
            height: 2,
            rgba,
        }
    }

    #[test]
    fn converts_atlas_pixels() {
        let image = atlas_to_image(&atlas()).expect("valid atlas");
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn rejects_short_buffer() {
        let mut bad = atlas();
        bad.rgba.pop();
        assert!(matches!(atlas_to_image(&bad), Err(BridgeError::Texture(_))));
    }

    #[test]
    fn saves_png_that_reloads() {
        let path = temp_file_path("atlas");
        save_texture_png(&atlas(), &path).expect("save png");
        let loaded = image::open(&path).expect("reload png").to_rgba8();
        assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30, 255]);
        let _ = std::fs::remove_file(path);
    }
}
