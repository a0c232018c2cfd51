//! Bed reference grid geometry.

use gcodepreview_core::PrinterBed;

/// Distance between adjacent grid lines, bed units.
pub const GRID_SPACING: f32 = 10.0;

/// Line-list vertices (x, y, z triples) for the bed grid.
///
/// Lines run the full bed extent in both axes at [`GRID_SPACING`]
/// intervals, plus an X-shaped marker in the origin cell so the bed origin
/// is identifiable from any view. Everything sits at z = 0.
pub fn grid_vertices(bed: &PrinterBed) -> Vec<f32> {
    grid_vertices_with_spacing(bed, GRID_SPACING)
}

pub fn grid_vertices_with_spacing(bed: &PrinterBed, spacing: f32) -> Vec<f32> {
    let mut vertices = Vec::new();
    let mut line = |x0: f32, y0: f32, x1: f32, y1: f32| {
        vertices.extend_from_slice(&[x0, y0, 0.0, x1, y1, 0.0]);
    };

    let mut x = bed.min_x;
    while x <= bed.max_x {
        line(x, bed.min_y, x, bed.max_y);
        x += spacing;
    }
    let mut y = bed.min_y;
    while y <= bed.max_y {
        line(bed.min_x, y, bed.max_x, y);
        y += spacing;
    }

    // Origin marker: an X across the first grid cell.
    line(0.0, 0.0, spacing, spacing);
    line(0.0, spacing, spacing, 0.0);

    vertices
}
