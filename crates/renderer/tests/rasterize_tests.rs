//! Rasterization behaviour on decoded inundation grids.

use fim_common::DecodedRaster;
use renderer::{rasterize, rasterize_with_style, OverlayStyle, RenderMode};
use test_utils::{create_binary_mask, create_depth_grid, extent};

fn raster(rows: &[Vec<f32>], no_data: Option<f32>) -> DecodedRaster {
    DecodedRaster::from_rows(rows, no_data, extent::unit()).unwrap()
}

#[test]
fn test_binary_two_by_two_scenario() {
    let r = raster(&[vec![1.0, 0.0], vec![f32::NAN, -9999.0]], Some(-9999.0));
    let img = rasterize(&r, RenderMode::Binary);

    assert_eq!(img.width, 2);
    assert_eq!(img.height, 2);
    assert_eq!(img.pixels.len(), 16);
    assert_eq!(img.alpha(), vec![180, 0, 0, 0]);
    assert_eq!(img.pixel(0, 0), Some([0, 100, 255, 180]));
}

#[test]
fn test_auto_matches_binary_for_flag_rasters() {
    let r = raster(&[vec![1.0, 0.0], vec![f32::NAN, -9999.0]], Some(-9999.0));
    assert_eq!(rasterize(&r, RenderMode::Auto), rasterize(&r, RenderMode::Binary));
}

#[test]
fn test_nodata_always_transparent() {
    for mode in [RenderMode::Binary, RenderMode::Normalized, RenderMode::Auto] {
        let r = raster(&[vec![-9999.0, 1.0, 4.0]], Some(-9999.0));
        let img = rasterize(&r, mode);
        assert_eq!(img.pixel(0, 0).unwrap()[3], 0, "mode {}", mode);
    }
}

#[test]
fn test_nan_transparent_without_sentinel() {
    let r = raster(&[vec![f32::NAN, 2.0, 3.0]], None);
    let img = rasterize(&r, RenderMode::Normalized);
    assert_eq!(img.alpha(), vec![0, 55, 255]);
}

#[test]
fn test_all_missing_is_empty_overlay() {
    let r = raster(&[vec![f32::NAN, -1.0]], Some(-1.0));
    let img = rasterize(&r, RenderMode::Normalized);
    assert_eq!(img.visible_pixels(), 0);
}

#[test]
fn test_rasterize_is_deterministic() {
    let r = DecodedRaster::new(300, 200, vec![create_depth_grid(300, 200, 4.0)], None, extent::reference())
        .unwrap();
    let first = rasterize(&r, RenderMode::Normalized);
    let second = rasterize(&r, RenderMode::Normalized);
    assert_eq!(first.pixels, second.pixels);
}

#[test]
fn test_binary_mask_large_grid() {
    // Tall enough to span several parallel row blocks
    let (w, h) = (30, 200);
    let r = DecodedRaster::new(w, h, vec![create_binary_mask(w, h)], Some(0.0), extent::reference())
        .unwrap();
    let img = rasterize(&r, RenderMode::Binary);
    assert_eq!(img.visible_pixels(), 10 * h);
    assert_eq!(img.pixel(15, 199), Some([0, 100, 255, 180]));
    assert_eq!(img.pixel(0, 199).unwrap()[3], 0);
}

#[test]
fn test_custom_style() {
    let style = OverlayStyle {
        color: [255, 0, 0],
        binary_alpha: 90,
        ..OverlayStyle::default()
    };
    let r = raster(&[vec![1.0]], None);
    let img = rasterize_with_style(&r, RenderMode::Binary, &style);
    assert_eq!(img.pixel(0, 0), Some([255, 0, 0, 90]));
}
