//! Key names that may be written as `@name` literals, and the integer key
//! codes they stand for.
//!
//! The codes are SDL keycodes: printable keys use their ASCII value, the
//! rest have bit 30 set over their scancode.

use std::collections::HashMap;
use std::sync::LazyLock;

use itertools::Itertools;

const SCANCODE_MASK: i32 = 1 << 30;

const fn scancode(code: i32) -> i32 {
    code | SCANCODE_MASK
}

/// Every recognized key name, in table order. Names are case-sensitive.
pub static KEY_NAMES: &[(&str, i32)] = &[
    ("backspace", 8),
    ("tab", 9),
    ("return", 13),
    ("escape", 27),
    ("space", 32),
    ("quote", 39),
    ("comma", 44),
    ("minus", 45),
    ("period", 46),
    ("slash", 47),
    ("0", 48),
    ("1", 49),
    ("2", 50),
    ("3", 51),
    ("4", 52),
    ("5", 53),
    ("6", 54),
    ("7", 55),
    ("8", 56),
    ("9", 57),
    ("semicolon", 59),
    ("equals", 61),
    ("leftbracket", 91),
    ("backslash", 92),
    ("rightbracket", 93),
    ("backquote", 96),
    ("a", 97),
    ("b", 98),
    ("c", 99),
    ("d", 100),
    ("e", 101),
    ("f", 102),
    ("g", 103),
    ("h", 104),
    ("i", 105),
    ("j", 106),
    ("k", 107),
    ("l", 108),
    ("m", 109),
    ("n", 110),
    ("o", 111),
    ("p", 112),
    ("q", 113),
    ("r", 114),
    ("s", 115),
    ("t", 116),
    ("u", 117),
    ("v", 118),
    ("w", 119),
    ("x", 120),
    ("y", 121),
    ("z", 122),
    ("delete", 127),
    ("capslock", scancode(57)),
    ("f1", scancode(58)),
    ("f2", scancode(59)),
    ("f3", scancode(60)),
    ("f4", scancode(61)),
    ("f5", scancode(62)),
    ("f6", scancode(63)),
    ("f7", scancode(64)),
    ("f8", scancode(65)),
    ("f9", scancode(66)),
    ("f10", scancode(67)),
    ("f11", scancode(68)),
    ("f12", scancode(69)),
    ("printscreen", scancode(70)),
    ("scrolllock", scancode(71)),
    ("pause", scancode(72)),
    ("insert", scancode(73)),
    ("home", scancode(74)),
    ("pageup", scancode(75)),
    ("end", scancode(77)),
    ("pagedown", scancode(78)),
    ("right", scancode(79)),
    ("left", scancode(80)),
    ("down", scancode(81)),
    ("up", scancode(82)),
    ("numlock", scancode(83)),
    ("kpdivide", scancode(84)),
    ("kpmultiply", scancode(85)),
    ("kpminus", scancode(86)),
    ("kpplus", scancode(87)),
    ("kpenter", scancode(88)),
    ("kp1", scancode(89)),
    ("kp2", scancode(90)),
    ("kp3", scancode(91)),
    ("kp4", scancode(92)),
    ("kp5", scancode(93)),
    ("kp6", scancode(94)),
    ("kp7", scancode(95)),
    ("kp8", scancode(96)),
    ("kp9", scancode(97)),
    ("kp0", scancode(98)),
    ("kpperiod", scancode(99)),
    ("lctrl", scancode(224)),
    ("lshift", scancode(225)),
    ("lalt", scancode(226)),
    ("lgui", scancode(227)),
    ("rctrl", scancode(228)),
    ("rshift", scancode(229)),
    ("ralt", scancode(230)),
    ("rgui", scancode(231)),
];

static KEY_CODES: LazyLock<HashMap<&'static str, i32>> =
    LazyLock::new(|| KEY_NAMES.iter().copied().collect());

/// How far apart two names are. Smaller is closer.
pub trait StringDistance {
    fn distance(&self, a: &str, b: &str) -> usize;
}

/// Edit distance: single-character insertions, deletions and substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl StringDistance for Levenshtein {
    fn distance(&self, a: &str, b: &str) -> usize {
        strsim::levenshtein(a, b)
    }
}

/// Looks up the key code for `name`, which must match a table entry exactly.
pub fn resolve(name: &str) -> Option<i32> {
    KEY_CODES.get(name).copied()
}

/// The (at most two) known key names closest to `name`, nearest first.
pub fn suggest(name: &str) -> Vec<&'static str> {
    suggest_with(&Levenshtein, name)
}

/// Like [`suggest`], ranking names with `metric`. Names at equal distance
/// keep their table order.
pub fn suggest_with(metric: &impl StringDistance, name: &str) -> Vec<&'static str> {
    KEY_NAMES
        .iter()
        .map(|(key, _)| (metric.distance(name, key), *key))
        .sorted_by_key(|(distance, _)| *distance)
        .take(2)
        .map(|(_, key)| key)
        .collect()
}
