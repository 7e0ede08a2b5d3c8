use std::sync::Arc;

use crate::config::{strip_chars, StripSets};
use crate::pronunciation::{carries_stress, PronouncingDictionary};

pub const VOWELS: &str = "aeiouy";

fn is_vowel(c: char) -> bool {
  VOWELS.contains(c.to_ascii_lowercase())
}

/// Counts maximal runs of vowels. Any other character, punctuation included, ends a run.
pub fn fallback_estimate(word: &str) -> usize {
  let mut count = 0;
  let mut in_vowel = false;

  for c in word.chars() {
    if is_vowel(c) {
      if !in_vowel {
        count += 1;
        in_vowel = true;
      }
    }
    else {
      in_vowel = false;
    }
  }

  count
}

/// One syllable count per pronunciation variant, in dictionary order.
pub fn count_phonetically(dictionary: &PronouncingDictionary, word: &str) -> Vec<usize> {
  dictionary.lookup(word).iter().map(|pronunciation| {
    pronunciation.iter().filter(|p| carries_stress(p)).count()
  }).collect()
}

/// An apostrophe with a vowel on both sides, as in "o'er" or "ne'er".
fn is_elision(lower: &str) -> bool {
  match lower.split_once('\'') {
    Some((before, after)) => {
      let vowel_before = before.chars().last().map_or(false, is_vowel);
      let vowel_after = after.chars().next().map_or(false, is_vowel);
      vowel_before && vowel_after
    },
    None => false
  }
}

/// Turns word tokens into candidate syllable counts.
///
/// Cheap to clone; every clone shares the same dictionary.
#[derive(Clone)]
pub struct SyllableEstimator {
  dictionary: Arc<PronouncingDictionary>,
  strip: StripSets,
}

impl SyllableEstimator {
  pub fn new(dictionary: Arc<PronouncingDictionary>, strip: StripSets) -> Self {
    SyllableEstimator { dictionary, strip }
  }

  pub fn dictionary(&self) -> &PronouncingDictionary {
    &self.dictionary
  }

  pub fn strip_sets(&self) -> &StripSets {
    &self.strip
  }

  /// Candidate syllable counts for `token`, never empty.
  ///
  /// Tries, in order: the token as written, the lower-cased token, elision,
  /// the token with punctuation trimmed, and finally vowel-group counting.
  pub fn estimate(&self, token: &str) -> Vec<usize> {
    let counts = count_phonetically(&self.dictionary, token);
    if !counts.is_empty() {
      return counts;
    }

    let lower = token.to_lowercase();
    let counts = count_phonetically(&self.dictionary, &lower);
    if !counts.is_empty() {
      return counts;
    }

    if is_elision(&lower) {
      return vec![fallback_estimate(&lower).saturating_sub(1)];
    }

    let stripped = strip_chars(&lower, &self.strip.word);
    let counts = count_phonetically(&self.dictionary, stripped);
    if !counts.is_empty() {
      return counts;
    }

    vec![fallback_estimate(stripped)]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pronunciation::tests::fixture;

  fn estimator() -> SyllableEstimator {
    SyllableEstimator::new(Arc::new(fixture()), StripSets::default())
  }

  #[test]
  fn test_count_phonetically() {
    let d = fixture();
    assert_eq!(count_phonetically(&d, "hello"), vec![2, 2]);
    assert_eq!(count_phonetically(&d, "world"), vec![1]);
    assert_eq!(count_phonetically(&d, "syllable"), vec![3]);
    assert_eq!(count_phonetically(&d, "test"), vec![1]);
    assert_eq!(count_phonetically(&d, "fire"), vec![2, 1]);
    assert_eq!(count_phonetically(&d, "our"), vec![2, 1, 1]);
    assert_eq!(count_phonetically(&d, "zzyzx"), Vec::<usize>::new());
  }

  #[test]
  fn test_fallback_estimate() {
    assert_eq!(fallback_estimate("illusion"), 3);
    assert_eq!(fallback_estimate("abyss"), 2);
    assert_eq!(fallback_estimate("flesh"), 1);
    assert_eq!(fallback_estimate("o'er"), 2);
    assert_eq!(fallback_estimate("watchful"), 2);
    assert_eq!(fallback_estimate("maw"), 1);
    assert_eq!(fallback_estimate("rhythm"), 1);
    assert_eq!(fallback_estimate("QUEUE"), 1);
    assert_eq!(fallback_estimate(""), 0);
    assert_eq!(fallback_estimate("a1e"), 2);
  }

  #[test]
  fn test_estimate() {
    let e = estimator();
    for (word, expected) in [
      ("illusion", 3), ("abyss'", 2), ("flesh", 1), ("o'er", 1), ("watchful", 2), ("maw", 1),
      ("you're", 1), ("make", 1), ("sheltered", 2), ("rhythm", 2), ("jumped", 1)
    ] {
      assert_eq!(e.estimate(word)[0], expected, "{}", word);
    }
  }

  #[test]
  fn test_exact_case_before_lower_case() {
    let e = estimator();
    assert_eq!(e.estimate("NASA"), vec![2]);
    assert_eq!(e.estimate("Fire"), vec![2, 1]);
  }

  #[test]
  fn test_elision() {
    let e = estimator();
    assert_eq!(e.estimate("O'er"), vec![1]);
    assert_eq!(e.estimate("ne'er"), vec![1]);
    assert_eq!(e.estimate("a'a"), vec![1]);
  }

  #[test]
  fn test_elision_never_exceeds_vowel_groups() {
    use more_asserts::assert_lt;
    let e = estimator();
    for word in ["o'er", "ne'er", "e'en", "see'est"] {
      assert_lt!(e.estimate(word)[0], fallback_estimate(word));
    }
  }

  #[test]
  fn test_possessive_is_not_elision() {
    assert!(!is_elision("abyss'"));
    assert!(!is_elision("'tis"));
    assert!(is_elision("o'er"));
  }

  #[test]
  fn test_stripped_lookup() {
    let e = estimator();
    assert_eq!(e.estimate("\"Fire!\""), vec![2, 1]);
    assert_eq!(e.estimate("(maw),"), vec![1]);
  }

  #[test]
  fn test_never_empty() {
    let e = estimator();
    for word in ["", "!!!", "'", "--", "brrr", "12", "o'", "'er"] {
      let counts = e.estimate(word);
      assert!(!counts.is_empty(), "{:?}", word);
    }
    assert_eq!(e.estimate("?!"), vec![0]);
    assert_eq!(e.estimate(""), vec![0]);
  }

  #[test]
  fn test_repeatable() {
    let e = estimator();
    assert_eq!(e.estimate("our"), e.estimate("our"));
    assert_eq!(e.estimate("o'er"), e.estimate("o'er"));
  }
}
