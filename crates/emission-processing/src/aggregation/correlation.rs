use super::ensure_non_empty;
use crate::error::Result;
use crate::types::{CorrelationMatrix, ImputedRecord, NumericField};

/// Pearson correlation of two equally long samples.
///
/// Returns 0.0 when either sample has zero variance. The result is clamped
/// to [-1, 1] against rounding.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

pub(super) fn matrix(records: &[ImputedRecord]) -> Result<CorrelationMatrix> {
    ensure_non_empty(records, "correlation matrix")?;

    let columns: Vec<Vec<f64>> = NumericField::ALL
        .iter()
        .map(|&field| records.iter().map(|r| r.value(field)).collect())
        .collect();

    let k = columns.len();
    let mut values = vec![vec![0.0; k]; k];
    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        fields: NumericField::ALL.to_vec(),
        values,
    })
}
