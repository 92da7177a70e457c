use anyhow::Error;
use nalgebra::{Matrix3, Vector3};

use crate::interfaces::{IndexSource, MillerIndex};
use crate::reeke::model::{RRanges, ReekeModel};

/// Lazy generator of the Miller indices that can diffract between two
/// crystal orientations.
///
/// The walk is a three-level nest: `p` over the model's overall limits,
/// `q` over `q_limits(p)`, and `r` through up to two disjoint intervals from
/// `r_limits(p, q)`, with each permuted triple mapped back to `(h, k, l)`.
/// The cursors live in the struct, so a consumer can pull one index at a
/// time; `(0, 0, 0)` is never produced. A generator is single-use: build a
/// new one for a fresh traversal.
#[derive(Debug, Clone)]
pub struct ReekeIndexGenerator {
    model: ReekeModel,
    p: i32,
    p_end: i32,
    q: i32,
    q_end: i32,
    r_ranges: RRanges,
    r_idx: usize,
    done: bool,
}

impl ReekeIndexGenerator {
    /// Prepare generation for one scan step bracketed by `ub_beg` and
    /// `ub_end`. `s0` is the incident beam vector; the model works with the
    /// reversed source direction internally.
    pub fn new(
        ub_beg: &Matrix3<f64>,
        ub_end: &Matrix3<f64>,
        axis: &Vector3<f64>,
        s0: &Vector3<f64>,
        dmin: f64,
        margin: i32,
    ) -> Result<Self, Error> {
        let model = ReekeModel::new(ub_beg, ub_end, axis, &-s0, dmin, margin)?;
        Ok(Self::from_model(model))
    }

    /// Wrap an existing limit model in fresh iteration state.
    pub fn from_model(model: ReekeModel) -> Self {
        let (p_begin, p_end) = model.p_limits();
        ReekeIndexGenerator {
            model,
            // One before the first plane; the first advance moves onto it
            p: p_begin - 1,
            p_end,
            q: 0,
            q_end: 0,
            r_ranges: RRanges::new(),
            r_idx: 0,
            done: false,
        }
    }

    /// The underlying limit model.
    pub fn model(&self) -> &ReekeModel {
        &self.model
    }

    /// Collect every remaining index.
    pub fn to_vec(&mut self) -> Vec<MillerIndex> {
        let mut result = Vec::new();
        while let Some(h) = self.next() {
            result.push(h);
        }
        result
    }
}

impl Iterator for ReekeIndexGenerator {
    type Item = MillerIndex;

    fn next(&mut self) -> Option<MillerIndex> {
        if self.done {
            return None;
        }
        loop {
            // Drain the active r interval
            while self.r_idx < self.r_ranges.len() {
                let range = &mut self.r_ranges[self.r_idx];
                if range.0 < range.1 {
                    let r = range.0;
                    range.0 += 1;
                    let hkl = self
                        .model
                        .permutation()
                        .to_hkl(Vector3::new(self.p, self.q, r));
                    if hkl != MillerIndex::zeros() {
                        return Some(hkl);
                    }
                } else {
                    self.r_idx += 1;
                }
            }

            // Advance to the next non-empty line of constant (p, q)
            self.q += 1;
            while self.q >= self.q_end {
                self.p += 1;
                if self.p >= self.p_end {
                    self.done = true;
                    return None;
                }
                let (q_begin, q_end) = self.model.q_limits(self.p);
                self.q = q_begin;
                self.q_end = q_end;
            }
            self.r_ranges = self.model.r_limits(self.p, self.q);
            self.r_idx = 0;
        }
    }
}

impl IndexSource for ReekeIndexGenerator {
    fn next_index(&mut self) -> Option<MillerIndex> {
        self.next()
    }
}
