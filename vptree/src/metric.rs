/// A distance function over elements of type `T`.
///
/// Implementations must be:
/// - Non-negative: d(x, y) >= 0
/// - Symmetric:    d(x, y) = d(y, x)
/// - Triangular:   d(x, z) <= d(x, y) + d(y, z)
///
/// None of this is checked. A function that breaks the triangle inequality
/// makes pruning unsound and query results unspecified.
///
/// Any `Fn(&T, &T) -> f64` closure is a metric.
pub trait Metric<T: ?Sized> {
    fn distance(&self, a: &T, b: &T) -> f64;
}

impl<T: ?Sized, F> Metric<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    #[inline]
    fn distance(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// Straight-line (L2) distance between coordinate vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl<const N: usize> Metric<[f64; N]> for Euclidean {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        squared_l2(a, b).sqrt()
    }
}

impl Metric<[f64]> for Euclidean {
    /// Extra trailing coordinates of the longer slice are ignored.
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        squared_l2(a, b).sqrt()
    }
}

impl Metric<Vec<f64>> for Euclidean {
    #[inline]
    fn distance(&self, a: &Vec<f64>, b: &Vec<f64>) -> f64 {
        squared_l2(a, b).sqrt()
    }
}

impl<const N: usize> Metric<[i32; N]> for Euclidean {
    #[inline]
    fn distance(&self, a: &[i32; N], b: &[i32; N]) -> f64 {
        let mut sum = 0.0;
        for (x, y) in a.iter().zip(b.iter()) {
            let d = (*x as f64) - (*y as f64);
            sum += d * d;
        }
        sum.sqrt()
    }
}

fn squared_l2(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = x - y;
        sum += d * d;
    }
    sum
}
