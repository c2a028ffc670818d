//! Show file and EXIF information.

use std::path::PathBuf;

use photomark_io::{load_source, ExifExtractor};

pub fn run(image: PathBuf) -> anyhow::Result<()> {
    let (_, metadata) = load_source(&image, &ExifExtractor)
        .map_err(|e| anyhow::anyhow!("Failed to load photo: {e}"))?;

    println!("Photo: {}", metadata.file_name);
    println!("  Path: {}", metadata.file_path);
    println!("  Size: {} bytes", metadata.file_size);
    println!("  Type: {}", metadata.mime_type);
    println!(
        "  Dimensions: {}x{}",
        metadata.dimensions.width, metadata.dimensions.height
    );
    println!("  Modified: {}", metadata.modified_at);
    println!("  Hash: {}", metadata.hash);
    println!();

    let exif = &metadata.exif;
    if exif.is_empty() {
        println!("EXIF: none");
        return Ok(());
    }

    let show = |label: &str, value: Option<String>| {
        if let Some(v) = value {
            println!("  {label}: {v}");
        }
    };
    println!("EXIF:");
    show("Make", exif.make.clone());
    show("Model", exif.model.clone());
    show("Lens", exif.lens_model.clone());
    show("Aperture", exif.f_number.map(|f| format!("f/{f}")));
    show("Exposure", exif.exposure_time.map(|t| format!("{t}s")));
    show("ISO", exif.iso.map(|i| i.to_string()));
    show("Focal length", exif.focal_length.map(|f| format!("{f}mm")));
    show("Taken", exif.date_time_original.clone());
    if let Some(gps) = &exif.gps {
        let altitude = gps
            .altitude
            .map(|a| format!(", {a:.0}m"))
            .unwrap_or_default();
        println!(
            "  GPS: {:.5}, {:.5}{altitude}",
            gps.latitude, gps.longitude
        );
    }

    Ok(())
}
