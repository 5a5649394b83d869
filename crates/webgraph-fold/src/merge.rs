//! Counting k-way merge of sorted sequences.
//!
//! Merges sequences which are each non-decreasing into one strictly
//! increasing sequence. After every value, [`CountingMerge::current_count`]
//! tells how often the value occurred over all inputs, repeats within one
//! input included. Counts select the union (count >= 1), the intersection
//! (count == k) or values shared by exactly j of k adjacency lists.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub struct CountingMerge<I: Iterator> {
    sources: Vec<I>,
    /// (current value, index into `sources`)
    heap: BinaryHeap<Reverse<(I::Item, usize)>>,
    current_count: usize,
}

impl<I> CountingMerge<I>
where
    I: Iterator,
    I::Item: Ord + Copy,
{
    /// Pull the first value of every input; exhausted inputs are dropped.
    pub fn new<S>(sources: S) -> Self
    where
        S: IntoIterator,
        S::Item: IntoIterator<IntoIter = I>,
    {
        let mut sources: Vec<I> = sources.into_iter().map(IntoIterator::into_iter).collect();
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (index, source) in sources.iter_mut().enumerate() {
            if let Some(value) = source.next() {
                heap.push(Reverse((value, index)));
            }
        }
        Self {
            sources,
            heap,
            current_count: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.heap.is_empty()
    }

    /// Occurrences of the value returned last by `next()`.
    pub fn current_count(&self) -> usize {
        self.current_count
    }

    /// Next value together with its count.
    pub fn next_with_count(&mut self) -> Option<(I::Item, usize)> {
        self.next().map(|value| (value, self.current_count))
    }

    /// Skip up to `n` output values, returns the number of values skipped.
    pub fn skip_values(&mut self, n: usize) -> usize {
        let mut skipped = 0;
        while skipped < n && self.next().is_some() {
            skipped += 1;
        }
        skipped
    }

    /// Consume `value` from the input at `index` as long as it repeats, then
    /// queue the input again with its next value.
    fn drain(&mut self, index: usize, value: I::Item) -> usize {
        let mut count = 1;
        loop {
            match self.sources[index].next() {
                Some(next) if next == value => count += 1,
                Some(next) => {
                    self.heap.push(Reverse((next, index)));
                    break;
                }
                None => break,
            }
        }
        count
    }
}

impl<I> Iterator for CountingMerge<I>
where
    I: Iterator,
    I::Item: Ord + Copy,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((value, index)) = self.heap.pop()?;
        let mut count = self.drain(index, value);
        while let Some(&Reverse((head, index))) = self.heap.peek() {
            if head != value {
                break;
            }
            self.heap.pop();
            count += self.drain(index, value);
        }
        self.current_count = count;
        Some(value)
    }
}

/// Values occurring between `min_shared` and `max_shared` times (inclusive)
/// over all `sources`.
pub fn shared_values<I, S>(sources: S, min_shared: usize, max_shared: usize) -> Vec<I::Item>
where
    I: Iterator,
    I::Item: Ord + Copy,
    S: IntoIterator,
    S::Item: IntoIterator<IntoIter = I>,
{
    let mut merge = CountingMerge::new(sources);
    let mut shared = Vec::new();
    while let Some((value, count)) = merge.next_with_count() {
        if (min_shared..=max_shared).contains(&count) {
            shared.push(value);
        }
    }
    shared
}
