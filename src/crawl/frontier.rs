//! Pending-page queues for the three traversal orders.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// A page waiting to be crawled.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPage {
    pub url: String,
    pub depth: usize,
    pub score: f64,
}

#[derive(Debug)]
pub(crate) struct Ranked {
    page: PendingPage,
    seq: u64,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    // Highest score first; among equal scores, earliest pushed first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.page
            .score
            .total_cmp(&other.page.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub(crate) enum Frontier {
    Breadth(VecDeque<PendingPage>),
    Depth(Vec<PendingPage>),
    BestFirst { heap: BinaryHeap<Ranked>, seq: u64 },
}

impl Frontier {
    pub fn breadth() -> Self {
        Frontier::Breadth(VecDeque::new())
    }

    pub fn depth() -> Self {
        Frontier::Depth(Vec::new())
    }

    pub fn best_first() -> Self {
        Frontier::BestFirst {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Queue the links of one page, given in document order.
    ///
    /// Depth-first pushes them reversed so the first link is visited first.
    pub fn extend(&mut self, pages: Vec<PendingPage>) {
        match self {
            Frontier::Breadth(queue) => queue.extend(pages),
            Frontier::Depth(stack) => stack.extend(pages.into_iter().rev()),
            Frontier::BestFirst { heap, seq } => {
                for page in pages {
                    heap.push(Ranked { page, seq: *seq });
                    *seq += 1;
                }
            }
        }
    }

    pub fn pop(&mut self) -> Option<PendingPage> {
        match self {
            Frontier::Breadth(queue) => queue.pop_front(),
            Frontier::Depth(stack) => stack.pop(),
            Frontier::BestFirst { heap, .. } => heap.pop().map(|ranked| ranked.page),
        }
    }
}
