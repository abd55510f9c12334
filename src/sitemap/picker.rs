//! Sample-page selection over sitemap URLs.
//!
//! The picker draws an untried URL at random and waits for a verdict. A
//! verdict classifying the candidate confirms it; anything else marks it as
//! tried and draws again until no untried URL is left.
//!
//! | state        | event                              | next state                     |
//! |--------------|------------------------------------|--------------------------------|
//! | `Selecting`  | `Classify(kind)`                   | `Confirmed { candidate, kind }`|
//! | `Selecting`  | `Redo` / `FetchFailed` / `Invalid` | `Selecting` or `Exhausted`     |
//! | `Confirmed`  | any                                | unchanged                      |
//! | `Exhausted`  | any                                | unchanged                      |

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use crate::selectors::PageKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerState {
    /// `candidate` is awaiting a verdict.
    Selecting { candidate: String },
    /// `url` was accepted as a sample of `kind`.
    Confirmed { url: String, kind: PageKind },
    /// Every URL has been tried.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    /// Skip this candidate.
    Redo,
    /// Use this candidate as a sample of the given kind.
    Classify(PageKind),
    /// The candidate could not be fetched.
    FetchFailed,
    /// The verdict was not understood.
    Invalid,
}

pub struct SamplePicker<R: Rng> {
    urls: Vec<String>,
    tried: HashSet<String>,
    state: PickerState,
    rng: R,
}

impl<R: Rng> SamplePicker<R> {
    /// Start picking from `urls`; duplicates count once.
    pub fn new(urls: Vec<String>, rng: R) -> Self {
        let mut seen = HashSet::new();
        let urls = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();
        let mut picker = Self {
            urls,
            tried: HashSet::new(),
            state: PickerState::Exhausted,
            rng,
        };
        picker.state = picker.draw();
        picker
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    /// Number of URLs drawn so far.
    pub fn tried(&self) -> usize {
        self.tried.len()
    }

    pub fn apply(&mut self, event: PickerEvent) -> &PickerState {
        let next = match (&self.state, event) {
            (PickerState::Selecting { candidate }, PickerEvent::Classify(kind)) => {
                PickerState::Confirmed {
                    url: candidate.clone(),
                    kind,
                }
            }
            (PickerState::Selecting { candidate }, _) => {
                debug!("Dropping sample candidate {} ({:?})", candidate, event);
                self.draw()
            }
            (terminal, _) => terminal.clone(),
        };
        self.state = next;
        &self.state
    }

    fn draw(&mut self) -> PickerState {
        let remaining: Vec<&String> = self
            .urls
            .iter()
            .filter(|url| !self.tried.contains(*url))
            .collect();
        match remaining.choose(&mut self.rng) {
            Some(candidate) => {
                let candidate = (*candidate).clone();
                self.tried.insert(candidate.clone());
                PickerState::Selecting { candidate }
            }
            None => PickerState::Exhausted,
        }
    }
}
