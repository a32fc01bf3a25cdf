/// Cells of a horizontal bar, floor(value / max * width)
pub fn bar_cells(value: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    let cells = u128::from(value.min(max)) * width as u128 / u128::from(max);
    cells as usize
}

/// Horizontal bar of full blocks
pub fn bar(value: u64, max: u64, width: usize) -> String {
    "█".repeat(bar_cells(value, max, width))
}

/// Heat level for a heatmap cell: 0 for no traffic, otherwise 1..=`levels`
/// scaled against the busiest cell
pub fn heat_level(count: u64, peak: u64, levels: usize) -> usize {
    if count == 0 || peak == 0 || levels == 0 {
        return 0;
    }
    let scaled = (u128::from(count.min(peak)) * levels as u128).div_ceil(u128::from(peak));
    scaled as usize
}
