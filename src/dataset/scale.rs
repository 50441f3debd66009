use ndarray::{Array2, ArrayView2, Axis};

/// Standardizes every column to zero mean and unit variance.
///
/// Columns with no variance become all zeros.
pub fn scale(features: ArrayView2<f32>) -> Array2<f32> {
    let Some(mean) = features.mean_axis(Axis(0)) else {
        return features.to_owned();
    };

    let std = features.std_axis(Axis(0), 0.);
    let mut scaled = &features - &mean;

    for (mut column, &std) in scaled.columns_mut().into_iter().zip(&std) {
        if std > 0. {
            column.mapv_inplace(|x| x / std);
        } else {
            column.fill(0.);
        }
    }

    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_are_standardized() {
        let features = array![[1., 10., 3.], [3., 10., 3.], [5., 10., 3.]];
        let scaled = scale(features.view());

        let spread = (1.5f32).sqrt();
        let expected = array![[-spread, 0., 0.], [0., 0., 0.], [spread, 0., 0.]];

        for (got, want) in scaled.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-6, "{scaled}");
        }
    }

    #[test]
    fn input_is_left_alone() {
        let features = array![[0., 1.], [2., 5.]];
        let copy = features.clone();

        let _ = scale(features.view());
        assert_eq!(features, copy);
    }

    #[test]
    fn empty() {
        let features = Array2::<f32>::zeros((0, 3));
        assert_eq!(scale(features.view()).dim(), (0, 3));
    }
}
