pub struct StatsHelper;

impl StatsHelper {
    /// Minimum and maximum over the finite values, `None` when there are none.
    pub fn finite_range<I>(values: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_range_of_empty_sequence_is_none() {
        assert_eq!(StatsHelper::finite_range(Vec::new()), None);
        assert_eq!(
            StatsHelper::finite_range(vec![f64::NEG_INFINITY, f64::NAN]),
            None
        );
    }

    #[test]
    fn finite_range_skips_infinities() {
        let range = StatsHelper::finite_range(vec![f64::NEG_INFINITY, 3.0, -1.5, 2.0]);
        assert_eq!(range, Some((-1.5, 3.0)));
    }
}
