//! Alignment helpers.
//!
//! The allocator only ever aligns to the machine word size `W`, so a single
//! macro covers every rounding site in the crate.

/// Rounds `value` up to the next multiple of `multiple`, which must be a
/// power of two.
///
/// # Examples
///
/// ```rust
/// use blockheap::round_up;
///
/// assert_eq!(round_up!(1, 8), 8);
/// assert_eq!(round_up!(8, 8), 8);
/// assert_eq!(round_up!(9, 8), 16);
/// ```
#[macro_export]
macro_rules! round_up {
  ($value:expr, $multiple:expr) => {
    (($value) + ($multiple) - 1) & !(($multiple) - 1)
  };
}

#[cfg(test)]
mod tests {
  #[test]
  fn rounds_up_to_word_multiples() {
    for i in 0..10usize {
      let sizes = (8 * i + 1)..=(8 * (i + 1));
      let expected = 8 * (i + 1);
      for size in sizes {
        assert_eq!(expected, round_up!(size, 8));
      }
    }
  }

  #[test]
  fn exact_multiples_are_unchanged() {
    assert_eq!(round_up!(0, 8), 0);
    assert_eq!(round_up!(8, 8), 8);
    assert_eq!(round_up!(128, 8), 128);
  }
}
