//! Shared CSV fixtures for integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

/// Rows in [`seasonal_sales_csv`].
pub const SALES_ROWS: usize = 100;

/// Positions of the blank `sales` cells in [`seasonal_sales_csv`].
pub const MISSING_SALES: [usize; 5] = [7, 19, 42, 63, 88];

/// Daily-period sales with a trend, a 24-step cycle and five gaps.
///
/// Columns: `hour` (integer), `sales` (float), `store` (text), `promo` (bool).
pub fn seasonal_sales_csv() -> Vec<u8> {
    let mut csv = String::from("hour,sales,store,promo\n");
    for i in 0..SALES_ROWS {
        let store = ["A", "B", "C"][i % 3];
        let promo = i % 4 == 0;
        if MISSING_SALES.contains(&i) {
            csv.push_str(&format!("{},,{},{}\n", i, store, promo));
        } else {
            csv.push_str(&format!("{},{:.4},{},{}\n", i, sales_at(i), store, promo));
        }
    }
    csv.into_bytes()
}

/// Noise-free value of the `sales` column at position `i`.
pub fn sales_at(i: usize) -> f64 {
    let phase = 2.0 * PI * i as f64 / 24.0;
    200.0 + 0.5 * i as f64 + 20.0 * phase.sin() + ((i * 13) % 7) as f64
}

/// A tiny table with no missing values.
pub fn small_csv() -> Vec<u8> {
    b"a,b,label\n1,2.5,x\n2,3.5,y\n3,4.5,x\n4,5.5,y\n5,6.5,x\n6,7.5,z\n".to_vec()
}
