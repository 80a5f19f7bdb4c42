//! Character-level normalization: itaiji folding, width folding, number
//! parsing, hyphen/particle folding.
//!
//! Ported verbatim (algorithm-for-algorithm) from
//! `examples/original_source/jageocoder/itaiji.py` (`Converter`) and
//! `examples/original_source/jageocoder/strlib.py` (`Strlib`). Normalization
//! never fails (spec.md §4.1); every function here returns a plain value,
//! never a `Result`.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Hyphen-like characters folded to ASCII `-`.
/// Ported verbatim from `strlib.py::Strlib.__init__`.
const HYPHENS: &str = "\u{002D}\u{FE63}\u{FF0D}\u{2010}\u{2011}\u{2043}\u{02D6}\
\u{2212}\u{2012}\u{2013}\u{2014}\u{2015}\u{FE58}\u{30FC}";

/// Kansuji digits, index = value.
const KANSUJI: &str = "〇一二三四五六七八九";

/// Full-width ASCII digits, index = value.
const ARABIC_FULLWIDTH: &str = "０１２３４５６７８９";

/// Particles elided when not sandwiched between hiragana/katakana.
const ELIDABLE_PARTICLES: &str = "ケヶガがツッつ";

lazy_static! {
    /// Itaiji (variant-kanji) fold table: source codepoint -> canonical
    /// codepoint. The real dictionary ships this as generated data from
    /// the builder (out of scope); this is a representative, non-exhaustive
    /// seed covering itaiji that commonly appear in Japanese place names.
    /// See DESIGN.md.
    static ref ITAIJI_MAP: HashMap<char, char> = {
        let mut m = HashMap::new();
        for (src, dst) in [
            ('髙', '高'),
            ('﨑', '崎'),
            ('槗', '橋'),
            ('德', '徳'),
            ('﨔', '桐'),
            ('栁', '柳'),
            ('賴', '頼'),
            ('邊', '辺'),
            ('邉', '辺'),
            ('齋', '斎'),
            ('齊', '斉'),
            ('櫻', '桜'),
            ('濵', '浜'),
            ('埁', '垣'),
            ('瀨', '瀬'),
            ('眞', '真'),
        ] {
            m.insert(src, dst);
        }
        m
    };
}

/// Character classification, mirroring `strlib.py::get_ctype`'s integer
/// codes (kept as an enum here rather than raw ints).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharType {
    /// Half-width ASCII punctuation/digit (`!`-`~`), code 0.
    Ascii,
    /// CJK ideograph, code 1.
    Kanji,
    /// Kansuji or full-width digit that survived translation, code 2.
    Digit,
    /// Hiragana, code 4.
    Hiragana,
    /// Katakana, code 5.
    Katakana,
    /// Half-width Latin letter, code 6.
    Latin,
    /// Anything else, code -1.
    Other,
}

impl CharType {
    /// Returns whether this type is one of the "hyphenizable neighbor"
    /// classes `{Ascii, Digit, Latin}` (python codes `0, 2, 6`), used by
    /// the ノ/の-as-hyphen rule.
    fn is_hyphenizable_neighbor(self) -> bool {
        matches!(self, CharType::Ascii | CharType::Digit | CharType::Latin)
    }

    /// Returns whether this type is a kana class, used by the
    /// particle-elision rule's "not sandwiched between kana" guard.
    fn is_kana(self) -> bool {
        matches!(self, CharType::Hiragana | CharType::Katakana)
    }
}

/// Classifies a single character. Ported from `strlib.py::get_ctype`.
///
/// Classification order matters: ASCII range is checked before the
/// digit/kansuji branch, so half-width digits classify as `Ascii`, not
/// `Digit` -- `Digit` is reserved for kansuji (full-width digits are
/// always folded to ASCII before classification runs, see [`fold_width`]).
pub fn classify(c: char) -> CharType {
    if ('\u{3041}'..='\u{309F}').contains(&c) {
        CharType::Hiragana
    } else if ('\u{30A1}'..='\u{30FF}').contains(&c) {
        CharType::Katakana
    } else if c.is_ascii_alphabetic() {
        CharType::Latin
    } else if ('\u{0021}'..='\u{007E}').contains(&c) {
        CharType::Ascii
    } else if ARABIC_FULLWIDTH.contains(c) || KANSUJI.contains(c) {
        CharType::Digit
    } else if ('\u{4E00}'..='\u{9FFF}').contains(&c) {
        CharType::Kanji
    } else {
        CharType::Other
    }
}

/// Returns true if `c` is one of the hyphen-like characters.
pub fn is_hyphen(c: char) -> bool {
    HYPHENS.contains(c)
}

/// Returns true if `c` is a kansuji digit.
pub fn is_kansuji(c: char) -> bool {
    KANSUJI.contains(c)
}

/// Returns the numeric value of a single character, if it is a digit
/// (ASCII or full-width), a kansuji digit, or one of the multipliers
/// `十百千万`. Ported from `strlib.py::get_numeric_char`.
pub fn numeric_char_value(c: char) -> Option<u64> {
    if let Some(pos) = c.to_digit(10) {
        if c.is_ascii_digit() {
            return Some(pos as u64);
        }
    }
    if let Some(pos) = KANSUJI.find(c) {
        return Some(KANSUJI[..pos].chars().count() as u64);
    }
    if let Some(pos) = ARABIC_FULLWIDTH.find(c) {
        return Some(ARABIC_FULLWIDTH[..pos].chars().count() as u64);
    }
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        '万' => Some(10000),
        _ => None,
    }
}

/// Result of parsing the longest numeric prefix of a character slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberParse {
    /// The parsed decimal value.
    pub value: u64,
    /// Number of characters consumed.
    pub consumed: usize,
    /// True if the consumed run was pure ASCII/full-width digits with no
    /// kansuji digit or multiplier -- the case where "raw glyph" output
    /// is meaningful for `keep_numbers` mode.
    pub pure_digits: bool,
}

/// Parses the longest numeric prefix of `chars`, combining ASCII/kansuji
/// digit accumulation with `十百千万` multipliers.
///
/// Ported verbatim from `strlib.py::Strlib.get_number`.
pub fn parse_number(chars: &[char]) -> NumberParse {
    let mut total: u64 = 0;
    let mut curval: u64 = 0;
    // -1: unset, 0: parsing arabic digits, 1: parsing kansuji/multiplier
    let mut mode: i8 = -1;
    let mut pos = 0usize;
    let mut pure_digits = true;

    for &c in chars {
        if c.is_ascii_digit() || ARABIC_FULLWIDTH.contains(c) {
            let k = numeric_char_value(c).unwrap();
            curval = curval * 10 + k;
            mode = 0;
            pos += 1;
        } else if mode == 0 {
            break;
        } else if is_kansuji(c) {
            let k = numeric_char_value(c).unwrap();
            if total + curval == 0 && k == 0 {
                break;
            }
            curval = curval * 10 + k;
            mode = 1;
            pos += 1;
            pure_digits = false;
        } else if "十百千万".contains(c) {
            let k = numeric_char_value(c).unwrap();
            curval = if curval == 0 { 1 } else { curval };
            if total % k > 0 {
                total *= k;
            }
            total += curval * k;
            curval = 0;
            mode = 1;
            pos += 1;
            pure_digits = false;
        } else {
            break;
        }
    }
    total += curval;
    NumberParse {
        value: total,
        consumed: pos,
        pure_digits,
    }
}

/// Folds full-width ASCII-range characters (`！`-`～`) to their
/// half-width equivalents. Ported from `itaiji.py`'s `trans_z2h` table.
fn fold_width(c: char) -> char {
    let cp = c as u32;
    if (0xFF01..=0xFF5E).contains(&cp) {
        char::from_u32(cp - 0xFF01 + 0x21).unwrap_or(c)
    } else {
        c
    }
}

/// Applies the itaiji fold table to a single character.
fn fold_itaiji(c: char) -> char {
    ITAIJI_MAP.get(&c).copied().unwrap_or(c)
}

/// Returns the length (in characters) of the longest optional prefix
/// (`字`, `大字`, `小字`) that `notation` starts with, or 0.
///
/// Ported from `itaiji.py::check_optional_prefixes`. Per spec.md §4.1
/// this is a detection predicate only -- the normalizer itself never
/// strips the prefix; only the walker does, explicitly, per rule (1).
pub fn check_optional_prefixes(notation: &str) -> usize {
    const PREFIXES: [&str; 3] = ["字", "大字", "小字"];
    for p in PREFIXES {
        if notation.starts_with(p) {
            return p.chars().count();
        }
    }
    0
}

/// Returns the length (in characters) of the longest optional postfix
/// (`条`, `線`, `丁`, `丁目`, `番`, `番地`, `号`) that `notation` ends
/// with, or 0. Ported from `itaiji.py::check_optional_postfixes`.
pub fn check_optional_postfixes(notation: &str) -> usize {
    const POSTFIXES: [&str; 7] = ["条", "線", "丁", "丁目", "番", "番地", "号"];
    let mut best = 0;
    for p in POSTFIXES {
        if notation.ends_with(p) {
            best = best.max(p.chars().count());
        }
    }
    best
}

/// Standardizes an address notation into its canonical index form.
///
/// `keep_numbers = false` (the default, used to build TRIE keys and node
/// `name_index` values) collapses each numeric run into its decimal value
/// plus a trailing `.` sentinel. `keep_numbers = true` (used by the
/// de-standardizer's probe, spec.md §4.5) instead keeps the raw,
/// width-folded digit glyphs of a *pure* ASCII/full-width run, still
/// followed by `.`; a run that involves kansuji or a `十百千万`
/// multiplier has no literal glyph form to preserve, so it falls back to
/// the same decimal-value form in both modes.
///
/// Ported from `itaiji.py::Converter.standardize`. Normalization never
/// fails.
pub fn standardize(notation: &str, keep_numbers: bool) -> String {
    if notation.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = notation
        .chars()
        .map(fold_itaiji)
        .map(fold_width)
        .collect();

    let mut out = String::new();
    let mut ctype = CharType::Ascii;
    let mut nctype = if chars.is_empty() {
        CharType::Ascii
    } else {
        classify(chars[0])
    };
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let prectype = ctype;
        ctype = nctype;
        nctype = if i == chars.len() - 1 {
            CharType::Ascii
        } else {
            classify(chars[i + 1])
        };

        if ELIDABLE_PARTICLES.contains(c) && !prectype.is_kana() && !nctype.is_kana() {
            ctype = prectype;
            i += 1;
            continue;
        }

        if (c == 'ノ' || c == 'の')
            && prectype.is_hyphenizable_neighbor()
            && nctype.is_hyphenizable_neighbor()
        {
            out.push('-');
            ctype = CharType::Ascii;
            i += 1;
            continue;
        }

        if is_hyphen(c) {
            out.push('-');
            ctype = CharType::Ascii;
            i += 1;
            continue;
        }

        if numeric_char_value(c).is_some() {
            let ninfo = parse_number(&chars[i..]);
            if keep_numbers && ninfo.pure_digits {
                for &nc in &chars[i..i + ninfo.consumed] {
                    out.push(nc);
                }
            } else {
                out.push_str(&ninfo.value.to_string());
            }
            out.push('.');
            i += ninfo.consumed;
            if i < chars.len() && chars[i] == '.' {
                i += 1;
            }
            ctype = CharType::Ascii;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Computes the byte offset into `index` (a `keep_numbers = true`
/// canonicalization) up to which it corresponds to a `key` of the same
/// address that was canonicalized with `keep_numbers = false` (as TRIE
/// keys and `name_index` values are), so callers can slice `index`
/// directly with `&index[..offset]`.
///
/// Both strings are produced by the same character-level algorithm and
/// differ only in how numeric runs are rendered, so every non-numeral
/// character lines up 1:1; a numeral run in one lines up with exactly
/// one numeral run in the other, whatever its digit count. `key` is
/// always built from whole `name_index` values (never an arbitrary
/// substring), so it never ends inside a numeral run.
pub fn match_len(index: &str, key: &str) -> usize {
    let idx: Vec<(usize, char)> = index.char_indices().collect();
    let key: Vec<char> = key.chars().collect();
    let mut ii = 0usize;
    let mut ki = 0usize;

    while ki < key.len() && ii < idx.len() {
        if idx[ii].1.is_ascii_digit() && key[ki].is_ascii_digit() {
            ii = skip_numeral_token_pos(&idx, ii);
            ki = skip_numeral_token(&key, ki);
        } else {
            ii += 1;
            ki += 1;
        }
    }
    if ii < idx.len() { idx[ii].0 } else { index.len() }
}

fn skip_numeral_token(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '.' {
        pos += 1;
    }
    pos
}

fn skip_numeral_token_pos(chars: &[(usize, char)], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].1.is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos].1 == '.' {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_idempotent() {
        let s = standardize("多摩市落合1-15-2", false);
        assert_eq!(standardize(&s, false), s);
    }

    #[test]
    fn test_number_canonicalization() {
        assert_eq!(standardize("1番地", false), "1.番地");
        assert_eq!(standardize("十五番地", false), "15.番地");
        assert_eq!(standardize("二千四十五万円", false), "20450000.円");
    }

    #[test]
    fn test_keep_numbers_preserves_leading_zero() {
        assert_eq!(standardize("007番地", true), "007.番地");
        assert_eq!(standardize("007番地", false), "7.番地");
    }

    #[test]
    fn test_hyphen_fold() {
        assert_eq!(standardize("1−15−2", false), "1.-15.-2.");
    }

    #[test]
    fn test_particle_elision_between_kanji() {
        // 龍ケ崎 -> 龍 and 崎 are both kanji, ケ is elided in the index.
        assert_eq!(standardize("龍ケ崎市", false), "龍崎市");
    }

    #[test]
    fn test_no_hyphenize_between_katakana() {
        // ノ between katakana (ト..and..ノ..町) is NOT folded to a hyphen.
        assert_eq!(standardize("トノ町", false), "トノ町");
    }

    #[test]
    fn test_hyphenize_no_between_numbers() {
        assert_eq!(standardize("1の2", false), "1.-2.");
    }

    #[test]
    fn test_optional_prefix_not_stripped_by_normalizer() {
        let out = standardize("大字道仏", false);
        assert!(out.starts_with('大'));
        assert_eq!(check_optional_prefixes("大字道仏"), 2);
    }

    #[test]
    fn test_optional_postfix_predicate() {
        assert_eq!(check_optional_postfixes("1番地"), 2);
        assert_eq!(check_optional_postfixes("15号"), 1);
        assert_eq!(check_optional_postfixes("落合"), 0);
    }

    #[test]
    fn test_parse_number_leading_zero_terminator() {
        // A bare '0' followed by a kansuji digit is not a number.
        let p = parse_number(&['0', '二'].iter().copied().collect::<Vec<_>>());
        assert_eq!(p.consumed, 1);
        assert_eq!(p.value, 0);
    }

    #[test]
    fn test_match_len_aligns_across_modes() {
        let index = standardize("落合007番地", true);
        let key = standardize("落合007番地", false);
        let len = match_len(&index, &key);
        assert_eq!(&index[..len], index.as_str());
    }

    proptest::proptest! {
        /// Standardizing an already-standardized string is a no-op,
        /// for both `keep_numbers` modes, over any run of characters
        /// this module actually transforms.
        #[test]
        fn prop_standardize_is_idempotent(
            s in "[一二三四五六七八九〇0-9０-９落合多摩市区丁目番地条西新宿ノの字大小ケヶ\\-]{0,16}"
        ) {
            for keep_numbers in [false, true] {
                let once = standardize(&s, keep_numbers);
                let twice = standardize(&once, keep_numbers);
                proptest::prop_assert_eq!(once, twice);
            }
        }

        /// `match_len` always returns a valid char boundary into `index`,
        /// whatever numeral shape the generated key happens to take.
        #[test]
        fn prop_match_len_is_char_boundary(
            s in "[一二三四五六七八九〇0-9０-９落合多摩市区丁目番地\\-]{1,16}"
        ) {
            let index = standardize(&s, true);
            let key = standardize(&s, false);
            let offset = match_len(&index, &key);
            proptest::prop_assert!(index.is_char_boundary(offset));
        }
    }
}
