//! Rule number codec.
//!
//! An elementary CA rule is an 8-bit number. Bit `i` (weight `2^i`) is the
//! output for the neighbourhood whose 3-bit binary spelling is `i`, and the
//! switch for that bit is keyed by the same spelling (`"000"`..`"111"`).

use crate::error::{SimError, SimResult};
use tracing::warn;

/// Slider widget key.
pub const RULE_KEY: &str = "Rule_nbr";
/// Binary label widget key.
pub const LABEL_KEY: &str = "bin_string";

/// Bit weight to switch key, in bit order. Being a constant table, the
/// iteration order cannot drift between encode and decode.
pub const POS_TO_SWITCH: [(u8, &str); 8] = [
    (1, "000"),
    (2, "001"),
    (4, "010"),
    (8, "011"),
    (16, "100"),
    (32, "101"),
    (64, "110"),
    (128, "111"),
];

/// Switch states, least significant bit first.
pub type SwitchVector = [bool; 8];

pub fn switch_key(bit: usize) -> Option<&'static str> {
    POS_TO_SWITCH.get(bit).map(|&(_, key)| key)
}

pub fn switch_bit(key: &str) -> Option<usize> {
    POS_TO_SWITCH.iter().position(|&(_, k)| k == key)
}

pub fn decode_switches(rule: u8) -> SwitchVector {
    let mut switches = [false; 8];
    for (slot, &(weight, _)) in switches.iter_mut().zip(POS_TO_SWITCH.iter()) {
        *slot = (rule & weight) != 0;
    }
    switches
}

/// `110` -> `"(01101110)"`.
pub fn decode_label(rule: u8) -> String {
    format!("({:08b})", rule)
}

/// Inverse of [`decode_switches`].
pub fn encode(switches: &SwitchVector) -> u8 {
    switches
        .iter()
        .zip(POS_TO_SWITCH.iter())
        .filter(|(on, _)| **on)
        .fold(0u8, |acc, (_, &(weight, _))| acc | weight)
}

/// Accepts the label with or without its parentheses.
pub fn parse_label(label: &str) -> SimResult<u8> {
    let trimmed = label.trim();
    let bits = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);
    if bits.len() != 8 || !bits.chars().all(|c| c == '0' || c == '1') {
        return Err(SimError::Validation(format!(
            "rule label must be 8 binary digits, got '{}'",
            label
        )));
    }
    u8::from_str_radix(bits, 2)
        .map_err(|e| SimError::Validation(format!("bad rule label '{}': {}", label, e)))
}

/// Brings a slider reading into `0..=255`.
pub fn clamp_rule(value: f64) -> u8 {
    if value.is_nan() {
        warn!("Rule number is NaN; using 0");
        return 0;
    }
    let rounded = value.round();
    if !(0.0..=255.0).contains(&rounded) {
        warn!("Rule number {} out of range; clamping to 0..=255", value);
    }
    rounded.clamp(0.0, 255.0) as u8
}

/// Neighbourhood patterns with their outputs, from `"111"` down to `"000"`.
pub fn transition_table(rule: u8) -> Vec<(&'static str, bool)> {
    let switches = decode_switches(rule);
    POS_TO_SWITCH
        .iter()
        .zip(switches)
        .rev()
        .map(|(&(_, key), on)| (key, on))
        .collect()
}
