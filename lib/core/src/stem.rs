//! Stemming
//!
//! Tags and query keywords must go through the same stemmer, otherwise query
//! terms miss the fitted vocabulary. [`PorterStemmer`] is the classic
//! Porter (1980) suffix stripper; it is pure and allocation-light.

use std::fmt;

/// Reduces a word to an approximate root form.
pub trait Stemmer: Send + Sync + fmt::Debug {
    /// Stem a single token. Input case is folded to lowercase.
    fn stem(&self, word: &str) -> String;
}

/// Classic Porter stemmer.
///
/// ```
/// use tastematch_core::stem::{PorterStemmer, Stemmer};
///
/// let stemmer = PorterStemmer;
/// assert_eq!(stemmer.stem("restaurants"), "restaur");
/// assert_eq!(stemmer.stem("Hopping"), "hop");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        let b: Vec<char> = lower.chars().collect();
        if b.len() <= 2 {
            return lower;
        }

        let k = b.len() as isize - 1;
        let mut w = Word { b, k, j: 0 };
        w.step1ab();
        if w.k > 0 {
            w.step1c();
            w.step2();
            w.step3();
            w.step4();
            w.step5();
        }
        w.b[..=w.k as usize].iter().collect()
    }
}

// Working buffer. `b[0..=k]` is the live word; `j` marks the end of the stem
// left by the last successful `ends` call.
struct Word {
    b: Vec<char>,
    k: isize,
    j: isize,
}

impl Word {
    #[inline]
    fn at(&self, i: isize) -> char {
        self.b[i as usize]
    }

    fn cons(&self, i: isize) -> bool {
        match self.at(i) {
            'a' | 'e' | 'i' | 'o' | 'u' => false,
            'y' => i == 0 || !self.cons(i - 1),
            _ => true,
        }
    }

    /// Number of VC sequences in `b[0..=j]`
    fn m(&self) -> usize {
        let mut n = 0;
        let mut i = 0isize;
        loop {
            if i > self.j {
                return n;
            }
            if !self.cons(i) {
                break;
            }
            i += 1;
        }
        i += 1;
        loop {
            loop {
                if i > self.j {
                    return n;
                }
                if self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
            n += 1;
            loop {
                if i > self.j {
                    return n;
                }
                if !self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..=self.j).any(|i| !self.cons(i))
    }

    fn double_consonant(&self, j: isize) -> bool {
        j >= 1 && self.at(j) == self.at(j - 1) && self.cons(j)
    }

    fn cvc(&self, i: isize) -> bool {
        if i < 2 || !self.cons(i) || self.cons(i - 1) || !self.cons(i - 2) {
            return false;
        }
        !matches!(self.at(i), 'w' | 'x' | 'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        let len = suffix.len() as isize;
        if len > self.k + 1 {
            return false;
        }
        let start = self.k - len + 1;
        let matched = suffix
            .chars()
            .enumerate()
            .all(|(offset, c)| self.at(start + offset as isize) == c);
        if matched {
            self.j = self.k - len;
        }
        matched
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate((self.j + 1) as usize);
        self.b.extend(replacement.chars());
        self.k = self.j + replacement.len() as isize;
    }

    fn replace_if_measured(&mut self, replacement: &str) {
        if self.m() > 0 {
            self.set_to(replacement);
        }
    }

    // plurals, -ed, -ing
    fn step1ab(&mut self) {
        if self.at(self.k) == 's' {
            if self.ends("sses") {
                self.k -= 2;
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.at(self.k - 1) != 's' {
                self.k -= 1;
            }
        }
        if self.ends("eed") {
            if self.m() > 0 {
                self.k -= 1;
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.k = self.j;
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.k) {
                self.k -= 1;
                if matches!(self.at(self.k), 'l' | 's' | 'z') {
                    self.k += 1;
                }
            } else if self.m() == 1 && self.cvc(self.k) {
                self.set_to("e");
            }
        }
    }

    // terminal y -> i when the stem has a vowel
    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let k = self.k as usize;
            self.b[k] = 'i';
        }
    }

    fn step2(&mut self) {
        const RULES: &[(char, &[(&str, &str)])] = &[
            ('a', &[("ational", "ate"), ("tional", "tion")]),
            ('c', &[("enci", "ence"), ("anci", "ance")]),
            ('e', &[("izer", "ize")]),
            (
                'l',
                &[
                    ("bli", "ble"),
                    ("alli", "al"),
                    ("entli", "ent"),
                    ("eli", "e"),
                    ("ousli", "ous"),
                ],
            ),
            ('o', &[("ization", "ize"), ("ation", "ate"), ("ator", "ate")]),
            (
                's',
                &[
                    ("alism", "al"),
                    ("iveness", "ive"),
                    ("fulness", "ful"),
                    ("ousness", "ous"),
                ],
            ),
            ('t', &[("aliti", "al"), ("iviti", "ive"), ("biliti", "ble")]),
            ('g', &[("logi", "log")]),
        ];
        let key = self.at(self.k - 1);
        self.apply_rules(RULES, key);
    }

    fn step3(&mut self) {
        const RULES: &[(char, &[(&str, &str)])] = &[
            ('e', &[("icate", "ic"), ("ative", ""), ("alize", "al")]),
            ('i', &[("iciti", "ic")]),
            ('l', &[("ical", "ic"), ("ful", "")]),
            ('s', &[("ness", "")]),
        ];
        let key = self.at(self.k);
        self.apply_rules(RULES, key);
    }

    fn apply_rules(&mut self, rules: &[(char, &[(&str, &str)])], key: char) {
        let Some((_, suffixes)) = rules.iter().find(|(c, _)| *c == key) else {
            return;
        };
        for (suffix, replacement) in suffixes.iter() {
            if self.ends(suffix) {
                self.replace_if_measured(replacement);
                return;
            }
        }
    }

    // strip -ant, -ence etc. in context <c>vcvc<v>
    fn step4(&mut self) {
        let found = match self.at(self.k - 1) {
            'a' => self.ends("al"),
            'c' => self.ends("ance") || self.ends("ence"),
            'e' => self.ends("er"),
            'i' => self.ends("ic"),
            'l' => self.ends("able") || self.ends("ible"),
            'n' => {
                self.ends("ant") || self.ends("ement") || self.ends("ment") || self.ends("ent")
            }
            'o' => {
                (self.ends("ion") && self.j >= 0 && matches!(self.at(self.j), 's' | 't'))
                    || self.ends("ou")
            }
            's' => self.ends("ism"),
            't' => self.ends("ate") || self.ends("iti"),
            'u' => self.ends("ous"),
            'v' => self.ends("ive"),
            'z' => self.ends("ize"),
            _ => false,
        };
        if found && self.m() > 1 {
            self.k = self.j;
        }
    }

    // final -e and -ll
    fn step5(&mut self) {
        self.j = self.k;
        if self.at(self.k) == 'e' {
            let a = self.m();
            if a > 1 || (a == 1 && !self.cvc(self.k - 1)) {
                self.k -= 1;
            }
        }
        if self.at(self.k) == 'l' && self.double_consonant(self.k) && self.m() > 1 {
            self.k -= 1;
        }
    }
}
