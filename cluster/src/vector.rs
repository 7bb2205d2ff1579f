use hotspot_vptree::Euclidean;

/// Vector operations mean-shift needs to form weighted centroids.
///
/// `add` must be commutative and associative and `scale` linear; neither is
/// checked.
///
/// A pair of closures `(add, scale)` is a vector space, and so is
/// [`Euclidean`] over fixed-size float arrays and `Vec<f64>`.
pub trait VectorSpace<T> {
    fn add(&self, a: &T, b: &T) -> T;
    fn scale(&self, a: &T, factor: f64) -> T;
}

impl<T, A, S> VectorSpace<T> for (A, S)
where
    A: Fn(&T, &T) -> T,
    S: Fn(&T, f64) -> T,
{
    fn add(&self, a: &T, b: &T) -> T {
        (self.0)(a, b)
    }

    fn scale(&self, a: &T, factor: f64) -> T {
        (self.1)(a, factor)
    }
}

impl<const N: usize> VectorSpace<[f64; N]> for Euclidean {
    fn add(&self, a: &[f64; N], b: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] + b[i])
    }

    fn scale(&self, a: &[f64; N], factor: f64) -> [f64; N] {
        a.map(|x| x * factor)
    }
}

impl VectorSpace<Vec<f64>> for Euclidean {
    fn add(&self, a: &Vec<f64>, b: &Vec<f64>) -> Vec<f64> {
        a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
    }

    fn scale(&self, a: &Vec<f64>, factor: f64) -> Vec<f64> {
        a.iter().map(|x| x * factor).collect()
    }
}
