///! Plant name normalization for fuzzy matching
///!
///! Canonical form: lowercase, ASCII-folded, punctuation-free, with
///! abbreviations expanded and generic naming suffixes stripped, so that
///! "Colstrip Power Station" and "colstrip" compare equal.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Generic trailing phrases that carry no plant identity, longest first.
/// Matched whole-word at the end of a normalized name, repeatedly.
const GENERIC_SUFFIXES: &[&str] = &[
    "super thermal power project",
    "super thermal power station",
    "combined heat and power plant",
    "thermal power project",
    "thermal power station",
    "thermal power plant",
    "generating station",
    "generating plant",
    "power station",
    "power plant",
    "power project",
    "steam station",
    "steam plant",
    "station",
    "plant",
];

fn non_alnum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("invalid normalization pattern"))
}

/// Fold common Latin diacritics to their ASCII base letter
fn fold_char(c: char, out: &mut String) {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => out.push('a'),
        'ç' | 'ć' | 'č' => out.push('c'),
        'ď' | 'đ' => out.push('d'),
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => out.push('e'),
        'ğ' | 'ģ' => out.push('g'),
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => out.push('i'),
        'ł' | 'ļ' | 'ľ' => out.push('l'),
        'ñ' | 'ń' | 'ņ' | 'ň' => out.push('n'),
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => out.push('o'),
        'ř' | 'ŗ' => out.push('r'),
        'ś' | 'š' | 'ş' | 'ș' => out.push('s'),
        'ť' | 'ţ' | 'ț' => out.push('t'),
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => out.push('u'),
        'ý' | 'ÿ' => out.push('y'),
        'ź' | 'ż' | 'ž' => out.push('z'),
        'ß' => out.push_str("ss"),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        _ => out.push(c),
    }
}

/// Expand abbreviation tokens seen in source-system plant names
fn expand_token(token: &str) -> &str {
    match token {
        "stn" | "sta" => "station",
        "pwr" => "power",
        "gen" => "generating",
        "tpp" => "thermal power plant",
        "tps" => "thermal power station",
        _ => token,
    }
}

/// Strip one trailing generic suffix, whole-word only
fn strip_generic_suffix(name: &str) -> &str {
    for suffix in GENERIC_SUFFIXES {
        if name.len() > suffix.len() + 1
            && name.ends_with(suffix)
            && name.as_bytes()[name.len() - suffix.len() - 1] == b' '
        {
            return name[..name.len() - suffix.len()].trim_end();
        }
    }
    name
}

/// Normalize a plant name to its canonical matching form
///
/// A name consisting only of generic words (e.g. literally "Power Station")
/// is kept as-is rather than stripped to nothing.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let mut folded = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        fold_char(c, &mut folded);
    }

    let spaced = non_alnum_re().replace_all(&folded, " ");
    let expanded: Vec<&str> = spaced.split_whitespace().map(expand_token).collect();
    let joined = expanded.join(" ");

    let mut name = joined.as_str();
    loop {
        let stripped = strip_generic_suffix(name);
        if stripped == name {
            break;
        }
        name = stripped;
    }

    name.to_string()
}

/// Unique tokens of a normalized name
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized.split_whitespace().collect()
}
