//! Code for working with planning periods.
use anyhow::{Result, ensure};

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().collect::<Vec<_>>().windows(2).all(|w| w[0] < w[1])
}

/// Check that a list of planning periods is non-empty, ascending and unique
pub fn check_periods(periods: &[u32]) -> Result<()> {
    ensure!(!periods.is_empty(), "`periods` is empty");
    ensure!(
        is_sorted_and_unique(periods),
        "`periods` must be composed of unique values in order"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    #[rstest]
    #[case(&[2020], true)]
    #[case(&[2020, 2030], true)]
    #[case(&[2020, 2030, 2050], true)]
    #[case(&[2020, 2020], false)]
    #[case(&[2030, 2020], false)]
    fn test_is_sorted_and_unique(#[case] values: &[u32], #[case] expected: bool) {
        assert_eq!(is_sorted_and_unique(values), expected);
    }

    #[test]
    fn test_check_periods() {
        assert!(check_periods(&[2020]).is_ok());
        assert!(check_periods(&[2020, 2030]).is_ok());
        assert_error!(check_periods(&[]), "`periods` is empty");
        assert_error!(
            check_periods(&[2030, 2020]),
            "`periods` must be composed of unique values in order"
        );
    }
}
