//! Tests single-claim discipline on the grid index.

use mosaic_core::{GridCell, GridGeometry, GridIndex, Rgb};

fn fixture_index(cols: u32, rows: u32) -> GridIndex {
    let geometry = GridGeometry::new(cols, rows).expect("geometry should be valid");
    let mut cells = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            cells.push(GridCell {
                col,
                row,
                mean_color: Rgb::new((col * 10) as u8, (row * 10) as u8, 0),
                used: false,
            });
        }
    }
    GridIndex::from_cells(geometry, cells).expect("index should build")
}

#[test]
fn unused_count_decrements_per_claim() {
    let mut index = fixture_index(3, 2);
    assert_eq!(index.unused_remaining(), 6);

    index.claim(0).expect("first claim should succeed");
    index.claim(5).expect("second claim should succeed");
    assert_eq!(index.unused_remaining(), 4);
}

#[test]
fn used_flag_never_reverts() {
    let mut index = fixture_index(2, 1);
    index.claim(1).expect("claim should succeed");

    assert!(index.claim(1).is_err());
    assert!(index.cells()[1].used, "flag must stay set after failed reclaim");
}

#[test]
fn out_of_range_claim_is_rejected() {
    let mut index = fixture_index(2, 2);
    assert!(index.claim(4).is_err());
    assert_eq!(index.unused_remaining(), 4, "failed claim must not mutate");
}
