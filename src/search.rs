//! Subword search: an explicit-stack walk over the packed cells that
//! spends letters from a rack and lines pattern tokens up as it descends.
//!
//! Dictionaries run to hundreds of thousands of words, so the walk keeps
//! its own LIFO of frames instead of recursing. Every push either spends a
//! rack letter or advances the pattern, which bounds the stack.

use std::collections::HashSet;

use crate::dawg::{Cell, Dawg, NodeIndex, ROOT};
use crate::pattern::{self, Target, Token};

const WILDCARD: u8 = b'?';
const ALPHA_LEN: usize = 26;

/// One accepted word, plus the positions at which a `?` from the rack was
/// spent to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subword {
    pub word: String,
    pub wildcard_positions: Vec<usize>,
}

// the available letters as a count table; Copy, so every frame snapshots
// it without touching the heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rack {
    counts: [u8; ALPHA_LEN],
    wildcards: u8,
}

impl Rack {
    /// At least two symbols, letters and `?` only.
    fn parse(letters: &str) -> Option<Self> {
        if letters.len() < 2 {
            return None;
        }

        let mut rack = Self {
            counts: [0; ALPHA_LEN],
            wildcards: 0,
        };
        for symbol in letters.to_ascii_uppercase().bytes() {
            match symbol {
                WILDCARD => rack.wildcards += 1,
                b'A'..=b'Z' => rack.counts[usize::from(symbol - b'A')] += 1,
                _ => return None,
            }
        }
        Some(rack)
    }

    fn has(&self, letter: u8) -> bool {
        self.counts[usize::from(letter - b'A')] > 0
    }

    fn has_wildcard(&self) -> bool {
        self.wildcards > 0
    }

    fn take(&mut self, letter: u8) -> bool {
        let slot = &mut self.counts[usize::from(letter - b'A')];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    fn take_wildcard(&mut self) -> bool {
        if self.wildcards == 0 {
            return false;
        }
        self.wildcards -= 1;
        true
    }
}

// a point in the walk: the cell whose letter was just accepted, what is
// left on the rack, the letters spelled so far and the next pattern token
#[derive(Debug, Clone)]
struct Frame {
    node: NodeIndex,
    rack: Rack,
    subword: String,
    wildcard_positions: Option<Vec<usize>>,
    token_index: usize,
}

pub(crate) fn subwords(dawg: &Dawg, letters: &str, pattern: Option<&str>) -> Option<Vec<Subword>> {
    let rack = Rack::parse(letters)?;
    let tokens = pattern::compile(pattern)?;

    let mut walk = Walk {
        dawg,
        tokens,
        stack: vec![Frame {
            node: ROOT,
            rack,
            subword: String::new(),
            wildcard_positions: None,
            token_index: 0,
        }],
        seen: HashSet::new(),
        results: Vec::new(),
    };
    while let Some(frame) = walk.stack.pop() {
        walk.step(frame);
    }
    Some(walk.results)
}

struct Walk<'dawg> {
    dawg: &'dawg Dawg,
    tokens: Vec<Token>,
    stack: Vec<Frame>,
    seen: HashSet<String>,
    results: Vec<Subword>,
}

impl Walk<'_> {
    fn step(&mut self, frame: Frame) {
        let cell = self.dawg.cell(frame.node);
        match self.tokens.get(frame.token_index).copied() {
            None => self.step_unconstrained(frame, cell),
            Some(token) if token.required => self.step_required(frame, cell, token),
            Some(token) => self.step_optional(frame, cell, token),
        }
    }

    // no pattern token left: the rack alone decides what is acceptable
    fn step_unconstrained(&mut self, mut frame: Frame, cell: Cell) {
        if frame.node != ROOT {
            if !consume(&mut frame, cell.letter()) {
                return;
            }
            frame.subword.push(char::from(cell.letter()));
            if cell.is_terminal() {
                self.emit(&frame);
            }
        }
        self.push_rack_children(&frame);
    }

    fn step_required(&mut self, mut frame: Frame, cell: Cell, token: Token) {
        match token.target {
            Target::Root => {
                if frame.node != ROOT {
                    return;
                }
                frame.token_index += 1;
                self.push_candidates(&frame);
            }
            Target::Terminal => {
                // the anchor admits nothing beyond itself
                if cell.is_terminal() {
                    self.emit(&frame);
                }
            }
            Target::Any => {
                if !consume(&mut frame, cell.letter()) {
                    return;
                }
                frame.subword.push(char::from(cell.letter()));
                frame.token_index += 1;
                if frame.token_index == self.tokens.len() && cell.is_terminal() {
                    self.emit(&frame);
                }
                self.push_candidates(&frame);
            }
            Target::Letter(letter) => {
                if cell.letter() != letter {
                    return;
                }
                // a letter the pattern dictates costs nothing from the rack
                frame.subword.push(char::from(cell.letter()));
                frame.token_index += 1;
                if frame.token_index == self.tokens.len() && cell.is_terminal() {
                    self.emit(&frame);
                }
                self.push_candidates(&frame);
            }
        }
    }

    // only the first token can be optional: it floats until it matches,
    // letting any rack letters in front of it form an open prefix
    fn step_optional(&mut self, mut frame: Frame, cell: Cell, token: Token) {
        if frame.node == ROOT {
            // the root accepts no letter itself; the token stays pending
            // for whatever lies below
            self.push_candidates(&frame);
            return;
        }

        match token.target {
            Target::Any => {
                if !consume(&mut frame, cell.letter()) {
                    return;
                }
                frame.subword.push(char::from(cell.letter()));

                // the wildcard may bind here, or to a later letter
                let mut matched = frame.clone();
                matched.token_index += 1;
                if matched.token_index == self.tokens.len() && cell.is_terminal() {
                    self.emit(&matched);
                }
                self.push_candidates(&matched);
                self.push_candidates(&frame);
            }
            Target::Letter(letter) => {
                if cell.letter() == letter {
                    // pattern satisfied by this letter, no tile spent
                    let mut matched = frame.clone();
                    matched.subword.push(char::from(cell.letter()));
                    matched.token_index += 1;
                    if matched.token_index == self.tokens.len() && cell.is_terminal() {
                        self.emit(&matched);
                    }
                    self.push_candidates(&matched);
                }
                if !consume(&mut frame, cell.letter()) {
                    return;
                }
                frame.subword.push(char::from(cell.letter()));
                self.push_candidates(&frame);
            }
            // anchors always compile as required
            Target::Root | Target::Terminal => {}
        }
    }

    /// Lookahead expansion: pushes the frames that could satisfy the next
    /// token, or plain rack-driven descent when no token remains.
    fn push_candidates(&mut self, frame: &Frame) {
        match self.tokens.get(frame.token_index).copied() {
            Some(token) if token.required => match token.target {
                Target::Any => self.push_rack_children(frame),
                Target::Terminal => {
                    // re-enter the same node so the anchor can check it
                    self.stack.push(frame.clone());
                }
                Target::Letter(letter) => {
                    if let Some(child) = self.child_with(frame.node, letter) {
                        self.push_child(frame, child);
                    }
                }
                Target::Root => {}
            },
            Some(token) => {
                // an optional letter can match without a tile on the rack,
                // so its child descends even when the rack sweep below
                // would pass it over
                if let Target::Letter(letter) = token.target {
                    if !frame.rack.has_wildcard() && !frame.rack.has(letter) {
                        if let Some(child) = self.child_with(frame.node, letter) {
                            self.push_child(frame, child);
                        }
                    }
                }
                self.push_rack_children(frame);
            }
            None => self.push_rack_children(frame),
        }
    }

    // one frame per child the rack can still pay for; a wildcard on the
    // rack pays for anything
    fn push_rack_children(&mut self, frame: &Frame) {
        let dawg = self.dawg;
        let with_wildcard = frame.rack.has_wildcard();
        for (index, cell) in dawg.children(frame.node) {
            if with_wildcard || frame.rack.has(cell.letter()) {
                self.push_child(frame, index);
            }
        }
    }

    fn child_with(&self, node: NodeIndex, letter: u8) -> Option<NodeIndex> {
        self.dawg
            .children(node)
            .find(|&(_, cell)| cell.letter() == letter)
            .map(|(index, _)| index)
    }

    fn push_child(&mut self, frame: &Frame, child: NodeIndex) {
        self.stack.push(Frame {
            node: child,
            rack: frame.rack,
            subword: frame.subword.clone(),
            wildcard_positions: frame.wildcard_positions.clone(),
            token_index: frame.token_index,
        });
    }

    // first word in wins; a second spelling of the same word is dropped
    fn emit(&mut self, frame: &Frame) {
        if self.seen.insert(frame.subword.clone()) {
            self.results.push(Subword {
                word: frame.subword.clone(),
                wildcard_positions: frame.wildcard_positions.clone().unwrap_or_default(),
            });
        }
    }
}

// spend the node's letter from the rack: an exact tile first, then a
// wildcard, recording where the wildcard went
fn consume(frame: &mut Frame, letter: u8) -> bool {
    if frame.rack.take(letter) {
        return true;
    }
    if frame.rack.take_wildcard() {
        frame
            .wildcard_positions
            .get_or_insert_with(Vec::new)
            .push(frame.subword.len());
        return true;
    }
    false
}
