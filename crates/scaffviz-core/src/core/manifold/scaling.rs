use nalgebra::DMatrix;

/// Standardizes features to zero mean and unit variance.
///
/// Constant features have zero variance and are only centered.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn fit_transform(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        let n = data.nrows() as f64;
        let mut scaled = data.clone();
        if data.nrows() == 0 {
            return scaled;
        }
        for mut column in scaled.column_iter_mut() {
            let mean = column.sum() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let scale = if variance > 0.0 { variance.sqrt() } else { 1.0 };
            for value in column.iter_mut() {
                *value = (*value - mean) / scale;
            }
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_have_zero_mean_and_unit_variance() {
        let data = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0, 4.0, 5.0]);
        let scaled = StandardScaler.fit_transform(&data);
        let first = scaled.column(0);
        assert!(first.sum().abs() < 1e-12);
        let variance = first.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!((variance - 1.0).abs() < 1e-12);
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }
}
