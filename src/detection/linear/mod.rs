//! Linear barcode decoding by scanning lines of a binarized bitmap.

pub mod code128;
pub mod code39;

use crate::detection::binarize::BinaryBitmap;
use crate::detection::hints::CodeFormat;

/// Lines scanned in each direction on a normal attempt
const SCAN_LINES: u32 = 15;
/// Lines scanned in each direction with `try_harder`
const SCAN_LINES_HARDER: u32 = 40;

/// Scan `bitmap` for a `format` symbol.
///
/// Rows are scanned left to right, evenly spread over the height. With
/// `try_harder` every row is also read right to left, and columns are scanned
/// the same way for symbols whose bars run across the image.
pub fn decode(bitmap: &BinaryBitmap, format: CodeFormat, try_harder: bool) -> Option<String> {
    let decode_row: fn(&[bool]) -> Option<String> = match format {
        CodeFormat::Code39 => code39::decode_row,
        CodeFormat::Code128 => code128::decode_row,
        CodeFormat::QrCode => return None,
    };

    let count = if try_harder { SCAN_LINES_HARDER } else { SCAN_LINES };
    let rows = sample(bitmap.height(), count).map(|y| bitmap.row(y).to_vec());
    let columns = sample(bitmap.width(), if try_harder { count } else { 0 })
        .map(|x| bitmap.column(x));

    for mut line in rows.chain(columns) {
        if let Some(text) = decode_row(&line) {
            return Some(text);
        }
        if try_harder {
            line.reverse();
            if let Some(text) = decode_row(&line) {
                return Some(text);
            }
        }
    }
    None
}

/// Up to `count` positions evenly spread over `0..extent`, both ends included
fn sample(extent: u32, count: u32) -> impl Iterator<Item = u32> {
    let count = count.min(extent);
    (0..count).map(move |i| match count {
        1 => extent / 2,
        _ => i * (extent - 1) / (count - 1),
    })
}

/// Widths of alternating bar and space runs, starting at the first bar
fn bar_runs(line: &[bool]) -> Vec<usize> {
    let Some(first) = line.iter().position(|&dark| dark) else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let mut current = true;
    let mut width = 0;
    for &dark in &line[first..] {
        if dark == current {
            width += 1;
        } else {
            runs.push(width);
            current = dark;
            width = 1;
        }
    }
    runs.push(width);
    runs
}

/// Scale run widths to whole modules so they sum to `modules`, each between
/// 1 and `max_width`
fn normalize_widths(runs: &[usize], modules: u32, max_width: u8) -> Vec<u8> {
    let total: usize = runs.iter().sum();
    let scale = total as f32 / modules as f32;
    let mut widths: Vec<u8> = runs
        .iter()
        .map(|&width| (width as f32 / scale).round().clamp(1.0, max_width as f32) as u8)
        .collect();

    let target = modules as i32;
    let mut sum: i32 = widths.iter().map(|&w| w as i32).sum();
    while sum != target {
        let candidate = if sum > target {
            widths
                .iter()
                .enumerate()
                .max_by_key(|&(_, &w)| w)
                .filter(|&(_, &w)| w > 1)
                .map(|(i, _)| (i, -1))
        } else {
            widths
                .iter()
                .enumerate()
                .min_by_key(|&(_, &w)| w)
                .filter(|&(_, &w)| w < max_width)
                .map(|(i, _)| (i, 1))
        };
        let Some((i, step)) = candidate else {
            break;
        };
        widths[i] = (widths[i] as i32 + step) as u8;
        sum += step;
    }
    widths
}
