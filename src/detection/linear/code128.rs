//! Code 128 (code sets A, B and C).

use std::iter;

use super::{bar_runs, normalize_widths};

/// Bar/space module widths of symbol values `0..=105`
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
];

const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const SHIFT: usize = 98;
const CODE_C: usize = 99;
const CODE_B: usize = 100;
const CODE_A: usize = 101;
const FNC1: usize = 102;
const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;

/// Light modules on each side of an encoded symbol
const QUIET_ZONE: usize = 10;

/// Group separator emitted for FNC1 after the first position
const GROUP_SEPARATOR: char = '\u{1d}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

impl CodeSet {
    /// Set used for the single character after SHIFT
    fn shifted(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::C => Self::C,
        }
    }
}

/// Decode the first symbol found on one scan line, `true` marking a dark pixel
pub fn decode_row(line: &[bool]) -> Option<String> {
    let runs = bar_runs(line);
    (0..runs.len())
        .step_by(2)
        .find_map(|start| decode_from(&runs[start..]))
}

/// Decode a symbol whose start code begins at the first run
fn decode_from(runs: &[usize]) -> Option<String> {
    let start = symbol_value(runs.get(..6)?)?;
    let set = match start {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };

    let mut values = Vec::new();
    let mut pos = 6;
    while !runs.get(pos..pos + 7).is_some_and(is_stop) {
        let value = symbol_value(runs.get(pos..pos + 6)?)?;
        if value >= START_A {
            return None;
        }
        values.push(value);
        pos += 6;
    }

    let (&check, data) = values.split_last()?;
    if data.is_empty() || checksum(start, data) != check {
        return None;
    }
    decode_values(data, set)
}

fn symbol_value(runs: &[usize]) -> Option<usize> {
    let widths = normalize_widths(runs, 11, 4);
    PATTERNS.iter().position(|pattern| pattern[..] == widths[..])
}

fn is_stop(runs: &[usize]) -> bool {
    normalize_widths(runs, 13, 4)[..] == STOP
}

fn checksum(start: usize, data: &[usize]) -> usize {
    data.iter()
        .enumerate()
        .fold(start, |sum, (i, &value)| (sum + value * (i + 1)) % 103)
}

fn decode_values(data: &[usize], mut set: CodeSet) -> Option<String> {
    let mut text = String::new();
    let mut shift = false;

    for (i, &value) in data.iter().enumerate() {
        let active = if shift { set.shifted() } else { set };
        shift = false;

        match (active, value) {
            (_, FNC1) => {
                if i > 0 {
                    text.push(GROUP_SEPARATOR);
                }
            }
            (CodeSet::C, 0..=99) => text.push_str(&format!("{value:02}")),
            (CodeSet::C, CODE_B) => set = CodeSet::B,
            (CodeSet::C, CODE_A) => set = CodeSet::A,
            (CodeSet::C, _) => return None,
            (CodeSet::A, 0..=63) | (CodeSet::B, 0..=95) => text.push(char::from(value as u8 + b' ')),
            (CodeSet::A, 64..=95) => text.push(char::from(value as u8 - 64)),
            (_, SHIFT) => shift = true,
            (_, CODE_C) => set = CodeSet::C,
            (CodeSet::A, CODE_B) => set = CodeSet::B,
            (CodeSet::B, CODE_A) => set = CodeSet::A,
            // FNC2, FNC3 and FNC4 carry no text
            _ => {}
        }
    }

    Some(text)
}

/// Modules of `text` encoded in code set B, quiet zones included, `true`
/// marking a dark module. `None` if `text` is not printable ASCII.
pub fn encode_modules(text: &str) -> Option<Vec<bool>> {
    let mut data = Vec::with_capacity(text.len());
    for c in text.chars() {
        if !(' '..='\u{7f}').contains(&c) {
            return None;
        }
        data.push(c as usize - 32);
    }

    let mut modules = vec![false; QUIET_ZONE];
    for value in iter::once(START_B)
        .chain(data.iter().copied())
        .chain(iter::once(checksum(START_B, &data)))
    {
        push_widths(&mut modules, &PATTERNS[value]);
    }
    push_widths(&mut modules, &STOP);
    modules.extend(iter::repeat_n(false, QUIET_ZONE));
    Some(modules)
}

fn push_widths(modules: &mut Vec<bool>, widths: &[u8]) {
    for (i, &width) in widths.iter().enumerate() {
        modules.extend(iter::repeat_n(i % 2 == 0, width as usize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scale modules to pixels
    fn scan_line(modules: &[bool], unit: usize) -> Vec<bool> {
        modules
            .iter()
            .flat_map(|&dark| iter::repeat_n(dark, unit))
            .collect()
    }

    fn line_from_values(values: &[usize]) -> Vec<bool> {
        let mut modules = vec![false; QUIET_ZONE];
        for &value in values {
            push_widths(&mut modules, &PATTERNS[value]);
        }
        push_widths(&mut modules, &STOP);
        modules.extend(iter::repeat_n(false, QUIET_ZONE));
        modules
    }

    #[test]
    fn test_patterns_are_eleven_modules() {
        for pattern in PATTERNS {
            assert_eq!(pattern.iter().map(|&w| w as u32).sum::<u32>(), 11);
        }
    }

    #[test]
    fn test_decode_set_b() {
        let modules = encode_modules("PKG-12345").unwrap();
        assert_eq!(decode_row(&modules).as_deref(), Some("PKG-12345"));
        assert_eq!(decode_row(&scan_line(&modules, 3)).as_deref(), Some("PKG-12345"));
    }

    #[test]
    fn test_decode_set_c_then_b() {
        // START C, "12", "34", CODE B, "A"
        let data = [12, 34, CODE_B, 33];
        let mut values = vec![START_C];
        values.extend(data);
        values.push(checksum(START_C, &data));
        assert_eq!(decode_row(&line_from_values(&values)).as_deref(), Some("1234A"));
    }

    #[test]
    fn test_decode_set_a_control_and_shift() {
        // START A, "A", TAB (73), SHIFT, "a" from set B (65)
        let data = [33, 73, SHIFT, 65];
        let mut values = vec![START_A];
        values.extend(data);
        values.push(checksum(START_A, &data));
        assert_eq!(decode_row(&line_from_values(&values)).as_deref(), Some("A\ta"));
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let data = [33, 34];
        let values = [START_B, 33, 34, (checksum(START_B, &data) + 1) % 103];
        assert_eq!(decode_row(&line_from_values(&values)), None);
    }

    #[test]
    fn test_reversed_line_is_not_read_forwards() {
        let mut modules = encode_modules("PKG-12345").unwrap();
        modules.reverse();
        assert_eq!(decode_row(&modules), None);
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let mut line = vec![true, false, true, true, false, false, false];
        line.extend(encode_modules("X1").unwrap());
        assert_eq!(decode_row(&line).as_deref(), Some("X1"));
    }

    #[test]
    fn test_encode_rejects_non_ascii() {
        assert_eq!(encode_modules("caf\u{e9}"), None);
    }
}
