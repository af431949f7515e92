//! Helpers shared by the host backend kernels

use crate::scalar::{Index, Value};

/// Division with breakdown protection
///
/// Returns zero when the denominator is exactly zero or vanishes relative
/// to the numerator, so a near-breakdown step contributes nothing instead
/// of flooding the column with non-finite values. Converged columns are
/// already masked out before any of these ratios are formed.
pub(crate) fn guarded_div<V: Value>(num: V, den: V) -> V {
    if den == V::zero() || den.abs() < V::epsilon() * num.abs() {
        V::zero()
    } else {
        num / den
    }
}

/// Gather the dense local system for one approximate-inverse row
///
/// `pattern` is the row's sparsity pattern (sorted column indices). The
/// result is the k-by-k submatrix `mtx[pattern, pattern]` stored transposed
/// in column-major order, which saves an explicit transpose before the
/// substitution pass. Entries absent from `mtx` stay zero.
pub(crate) fn gather_trisystem<V: Value, I: Index>(
    pattern: &[I],
    m_row_ptrs: &[I],
    m_col_idxs: &[I],
    m_values: &[V],
) -> Vec<V> {
    let k = pattern.len();
    let mut tri = vec![V::zero(); k * k];
    for (i, &col) in pattern.iter().enumerate() {
        let mut m_ptr = m_row_ptrs[col.as_usize()].as_usize();
        let m_end = m_row_ptrs[col.as_usize() + 1].as_usize();
        let mut p_ptr = 0;
        let mut idx = i * k;
        // Merge-walk the matrix row against the pattern
        while m_ptr < m_end && p_ptr < k {
            let sparsity_col = pattern[p_ptr];
            let m_col = m_col_idxs[m_ptr];
            if sparsity_col == m_col {
                tri[idx] = m_values[m_ptr];
                m_ptr += 1;
                p_ptr += 1;
                idx += 1;
            } else if m_col < sparsity_col {
                m_ptr += 1;
            } else {
                p_ptr += 1;
                idx += 1;
            }
        }
    }
    tri
}

/// Solve the transposed lower-factor system for one inverse row
///
/// The gathered system is upper triangular in its column-major storage;
/// the unit right-hand side sits in the last entry. Back substitution.
pub(crate) fn solve_lower_trisystem<V: Value>(k: usize, tri: &[V]) -> Vec<V> {
    let mut rhs = vec![V::zero(); k];
    if k == 0 {
        return rhs;
    }
    rhs[k - 1] = V::one();
    for d_col in (0..k).rev() {
        let diag = tri[d_col * k + d_col];
        let bot = rhs[d_col] / diag;
        rhs[d_col] = bot;
        for d_row in (0..d_col).rev() {
            rhs[d_row] = rhs[d_row] - bot * tri[d_col * k + d_row];
        }
    }
    rhs
}

/// Solve the transposed upper-factor system for one inverse row
///
/// The gathered system is lower triangular in its column-major storage;
/// the unit right-hand side sits in the first entry. Forward substitution.
pub(crate) fn solve_upper_trisystem<V: Value>(k: usize, tri: &[V]) -> Vec<V> {
    let mut rhs = vec![V::zero(); k];
    if k == 0 {
        return rhs;
    }
    rhs[0] = V::one();
    for d_col in 0..k {
        let diag = tri[d_col * k + d_col];
        let top = rhs[d_col] / diag;
        rhs[d_col] = top;
        for d_row in (d_col + 1)..k {
            rhs[d_row] = rhs[d_row] - top * tri[d_col * k + d_row];
        }
    }
    rhs
}
