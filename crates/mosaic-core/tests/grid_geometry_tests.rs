//! Tests cell metric derivation over even-division geometries.

use mosaic_core::{GridGeometry, cell_metrics, sample_rect};

#[test]
fn even_division_covers_surface_without_overlap() {
    for (cols, rows) in [(1, 1), (2, 2), (4, 2), (40, 25)] {
        let geometry = GridGeometry::new(cols, rows).expect("geometry should be valid");
        let metrics = cell_metrics(cols * 10, rows * 10, geometry);
        assert_eq!(metrics.cell_width, 10.0);
        assert_eq!(metrics.cell_height, 10.0);

        for row in 0..rows {
            for col in 0..cols {
                let rect = sample_rect(metrics, col, row);
                assert_eq!(rect.x, col * 10);
                assert_eq!(rect.y, row * 10);
                assert_eq!(rect.width, 10);
                assert_eq!(rect.height, 10);
            }
        }
    }
}

#[test]
fn uneven_division_floors_size_and_never_exceeds_surface() {
    let geometry = GridGeometry::new(3, 3).expect("geometry should be valid");
    let metrics = cell_metrics(100, 70, geometry);

    for row in 0..3 {
        for col in 0..3 {
            let rect = sample_rect(metrics, col, row);
            assert!(rect.x + rect.width <= 100);
            assert!(rect.y + rect.height <= 70);
        }
    }
}

#[test]
fn sub_pixel_cells_floor_to_zero_width() {
    let geometry = GridGeometry::new(16, 1).expect("geometry should be valid");
    let metrics = cell_metrics(8, 8, geometry);
    let rect = sample_rect(metrics, 0, 0);
    assert_eq!(rect.width, 0);
}
