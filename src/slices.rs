//! Contiguous work partitioning
//!
//! Both parallel phases split their input into one contiguous slice per
//! worker: the first `workers - 1` slices get `len / workers` elements
//! each and the last takes the remainder. Workers own disjoint ranges,
//! so the partial maps they produce never collide on merge.

use std::ops::Range;

/// A contiguous span of an input list, owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slice {
    pub start: usize,
    pub len: usize,
}

impl Slice {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Split `len` elements across up to `workers` slices.
///
/// Zero elements yield no slices; fewer elements than workers yield one
/// single-element slice per element.
pub(crate) fn spread_across_workers(len: usize, workers: usize) -> Vec<Slice> {
    if len == 0 {
        return Vec::new();
    }

    if workers <= 1 {
        return vec![Slice { start: 0, len }];
    }

    if workers >= len {
        return (0..len).map(|start| Slice { start, len: 1 }).collect();
    }

    let per_worker = len / workers;
    let mut slices = Vec::with_capacity(workers);
    let mut start = 0;
    for _ in 0..workers - 1 {
        slices.push(Slice {
            start,
            len: per_worker,
        });
        start += per_worker;
    }
    slices.push(Slice {
        start,
        len: len - start,
    });

    slices
}
