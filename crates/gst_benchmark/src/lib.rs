//! Criterion benchmarks for the resource limits manager live under
//! `benches/`.
