/// Smallest even integer greater than or equal to `x`
///
/// Values beyond the `usize` range saturate to the largest even `usize`
///
/// ```
/// use coronagraph_config::utilities::ceil_even;
/// assert_eq!(ceil_even(181.), 182);
/// assert_eq!(ceil_even(182.), 182);
/// assert_eq!(ceil_even(0.5), 2);
/// ```
pub fn ceil_even(x: f64) -> usize {
    let n = (x.ceil().max(0.) as usize).min(usize::MAX - 1);
    n + n % 2
}

/// Smallest power of two greater than or equal to `n`
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// `n` evenly spaced values from `start` to `stop`, both included
///
/// A single value is `start`
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_ceiling() {
        assert_eq!(ceil_even(1. + 3. * 2. * 30.), 182);
        assert_eq!(ceil_even(4.), 4);
        assert_eq!(ceil_even(4.2), 6);
        assert_eq!(ceil_even(0.), 0);
        assert_eq!(ceil_even(f64::INFINITY), usize::MAX - 1);
        assert_eq!(ceil_even(1e300), usize::MAX - 1);
    }

    #[test]
    fn power_of_two() {
        assert_eq!(next_pow2(434), 512);
        assert_eq!(next_pow2(512), 512);
        assert_eq!(next_pow2(513), 1024);
        assert_eq!(next_pow2(1), 1);
    }

    #[test]
    fn evenly_spaced() {
        assert_eq!(linspace(-1., 1., 5), vec![-1., -0.5, 0., 0.5, 1.]);
        assert_eq!(linspace(2., 3., 1), vec![2.]);
        assert!(linspace(0., 1., 0).is_empty());
    }
}
