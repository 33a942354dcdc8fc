//! Code 39 without check digit or full-ASCII extension.

use std::iter;

use super::bar_runs;

const ALPHABET: &[u8; 43] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Wide/narrow masks of `ALPHABET`, first element in the highest of nine bits
const ENCODINGS: [u16; 43] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064, // 0-9
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C, // A-J
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016, // K-T
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0, 0x085, 0x184, 0x0C4, // U-' '
    0x0A8, 0x0A2, 0x08A, 0x02A, // $ / + %
];

/// Start/stop character `*`
const ASTERISK: u16 = 0x094;

const ELEMENTS: usize = 9;
const WIDE: usize = 3;
const QUIET_ZONE: usize = 10;

/// Decode the first symbol found on one scan line, `true` marking a dark pixel
pub fn decode_row(line: &[bool]) -> Option<String> {
    let runs = bar_runs(line);
    (0..runs.len())
        .step_by(2)
        .find_map(|start| decode_from(&runs[start..]))
}

fn decode_from(runs: &[usize]) -> Option<String> {
    if wide_mask(runs.get(..ELEMENTS)?)? != ASTERISK {
        return None;
    }

    let mut text = String::new();
    // Characters are separated by one inter-character space
    let mut pos = ELEMENTS + 1;
    loop {
        let mask = wide_mask(runs.get(pos..pos + ELEMENTS)?)?;
        if mask == ASTERISK {
            break;
        }
        let index = ENCODINGS.iter().position(|&encoding| encoding == mask)?;
        text.push(char::from(ALPHABET[index]));
        pos += ELEMENTS + 1;
    }

    (!text.is_empty()).then_some(text)
}

/// Classify nine runs as narrow or wide. Exactly three must be wide, and
/// clearly wider than every narrow one.
fn wide_mask(runs: &[usize]) -> Option<u16> {
    let mut sorted = runs.to_vec();
    sorted.sort_unstable();
    let narrow_max = sorted[ELEMENTS - WIDE - 1];
    let wide_min = sorted[ELEMENTS - WIDE];
    if wide_min * 2 < narrow_max * 3 {
        return None;
    }

    Some(
        runs.iter()
            .fold(0, |mask, &width| (mask << 1) | u16::from(width >= wide_min)),
    )
}

/// Modules of `*text*` with narrow elements one module and wide ones three,
/// quiet zones included. `None` if `text` has characters outside the alphabet.
pub fn encode_modules(text: &str) -> Option<Vec<bool>> {
    let mut masks = vec![ASTERISK];
    for byte in text.bytes() {
        let index = ALPHABET.iter().position(|&c| c == byte)?;
        masks.push(ENCODINGS[index]);
    }
    masks.push(ASTERISK);

    let mut modules = vec![false; QUIET_ZONE];
    for (i, mask) in masks.into_iter().enumerate() {
        if i > 0 {
            modules.push(false);
        }
        for element in 0..ELEMENTS {
            let wide = mask & (1 << (ELEMENTS - 1 - element)) != 0;
            let width = if wide { WIDE } else { 1 };
            modules.extend(iter::repeat_n(element % 2 == 0, width));
        }
    }
    modules.extend(iter::repeat_n(false, QUIET_ZONE));
    Some(modules)
}
