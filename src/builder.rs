use std::collections::VecDeque;

use crate::dawg::{Cell, Dawg};

type NodeIndex = usize;

const ROOT: NodeIndex = 0;
const UNSET: usize = usize::MAX;

// arena-allocated trie node; lives only until build() packs the graph
#[derive(Debug)]
struct Node {
    letter: u8,
    terminal: bool,
    parent: Option<NodeIndex>,
    first_child: Option<NodeIndex>,
    next_sibling: Option<NodeIndex>,
    // minimization scratch
    index: usize,
    child_depth: i32,
    is_first_child: bool,
    last_sibling: bool,
    sibling_count: usize,
    replacement: Option<NodeIndex>,
}

impl Node {
    fn new(letter: u8, parent: Option<NodeIndex>) -> Self {
        Self {
            letter,
            terminal: false,
            parent,
            first_child: None,
            next_sibling: None,
            index: UNSET,
            child_depth: -1,
            is_first_child: false,
            last_sibling: true,
            sibling_count: 0,
            replacement: None,
        }
    }
}

/// Write-once accumulator for the dictionary. Words go into an
/// uncompressed trie; [`build`](Builder::build) fuses equivalent subtrees
/// and packs what is left into the cell array a [`Dawg`] runs on.
pub struct Builder {
    nodes: Vec<Node>,
    word_count: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(0, None)],
            word_count: 0,
        }
    }

    /// Inserts a word. Words shorter than two letters, or containing
    /// anything outside the alphabet, are dropped silently.
    pub fn add(&mut self, word: &str) {
        if word.len() < 2 {
            return;
        }
        let word = word.to_ascii_uppercase();
        if !word.bytes().all(|letter| letter.is_ascii_uppercase()) {
            return;
        }

        let mut node = ROOT;
        for letter in word.bytes() {
            node = match self.child_with(node, letter) {
                Some(child) => child,
                None => self.add_child(node, letter),
            };
        }
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.word_count += 1;
        }
    }

    /// Trie walk; usable before `build` to check what has gone in so far.
    pub fn contains(&self, word: &str) -> bool {
        if word.len() < 2 {
            return false;
        }

        let mut node = ROOT;
        for letter in word.to_ascii_uppercase().bytes() {
            match self.child_with(node, letter) {
                Some(child) => node = child,
                None => return false,
            }
        }
        self.nodes[node].terminal
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Full traversal count of the nodes reachable from the root,
    /// revisiting none.
    pub fn node_count(&self) -> usize {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([ROOT]);
        seen[ROOT] = true;
        let mut count = 0;
        while let Some(node) = queue.pop_front() {
            count += 1;
            let mut child = self.nodes[node].first_child;
            while let Some(index) = child {
                if !seen[index] {
                    seen[index] = true;
                    queue.push_back(index);
                }
                child = self.nodes[index].next_sibling;
            }
        }
        count
    }

    /// Minimizes the trie and packs it. Consumes the builder; the arena
    /// and its scratch state are dropped with it.
    pub fn build(mut self) -> Dawg {
        log::debug!(
            "building dawg from {} words, {} trie nodes",
            self.word_count,
            self.node_count()
        );
        self.minimize();
        let dawg = self.pack();
        log::debug!("packed {} dawg cells", dawg.node_count());
        dawg
    }

    fn child_with(&self, parent: NodeIndex, letter: u8) -> Option<NodeIndex> {
        let mut child = self.nodes[parent].first_child;
        while let Some(index) = child {
            if self.nodes[index].letter == letter {
                return Some(index);
            }
            child = self.nodes[index].next_sibling;
        }
        None
    }

    // appends a new child at the end of the parent's sibling run
    fn add_child(&mut self, parent: NodeIndex, letter: u8) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Node::new(letter, Some(parent)));

        match self.nodes[parent].first_child {
            None => {
                self.nodes[parent].first_child = Some(index);
                self.nodes[index].is_first_child = true;
            }
            Some(head) => {
                let mut last = head;
                while let Some(next) = self.nodes[last].next_sibling {
                    last = next;
                }
                self.nodes[last].next_sibling = Some(index);
                self.nodes[last].last_sibling = false;
            }
        }
        index
    }

    /// Fuses subtree-isomorphic nodes. Candidates are binned by their
    /// longest distance to a terminal descendant and processed leaves
    /// first, so a node's children are already in canonical form by the
    /// time the node itself is compared.
    fn minimize(&mut self) {
        let order = self.number_breadth_first();
        self.mark_child_depths();

        let max_depth = self
            .nodes
            .iter()
            .map(|node| node.child_depth)
            .max()
            .unwrap_or(-1);
        if max_depth < 0 {
            return;
        }

        let mut bins: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_depth as usize + 1];
        for &index in &order {
            let depth = self.nodes[index].child_depth;
            if depth >= 0 {
                bins[depth as usize].push(index);
            }
        }

        for bin in &bins {
            for (i, &keeper) in bin.iter().enumerate() {
                if !self.mergeable(keeper) {
                    continue;
                }
                for &candidate in &bin[i + 1..] {
                    if !self.mergeable(candidate) || !self.subtree_eq(keeper, candidate) {
                        continue;
                    }
                    // the candidate's parent has this single child, so it
                    // can be redirected without renumbering a sibling run
                    if let Some(parent) = self.nodes[candidate].parent {
                        self.nodes[parent].first_child = Some(keeper);
                        self.nodes[candidate].replacement = Some(keeper);
                    }
                }
            }
        }
    }

    // only an unreplaced sole head of a sibling run may be redirected to
    fn mergeable(&self, index: NodeIndex) -> bool {
        let node = &self.nodes[index];
        node.replacement.is_none() && node.is_first_child && node.sibling_count == 0
    }

    /// Numbers every node in breadth-first order and records each node's
    /// sibling count and first-child standing along the way.
    fn number_breadth_first(&mut self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([ROOT]);
        while let Some(node) = queue.pop_front() {
            self.nodes[node].index = order.len();
            order.push(node);

            let mut count = 0;
            let mut first = true;
            let mut child = self.nodes[node].first_child;
            while let Some(index) = child {
                self.nodes[index].is_first_child = first;
                first = false;
                count += 1;
                queue.push_back(index);
                child = self.nodes[index].next_sibling;
            }

            let mut child = self.nodes[node].first_child;
            while let Some(index) = child {
                self.nodes[index].sibling_count = count - 1;
                child = self.nodes[index].next_sibling;
            }
        }
        order
    }

    /// Sets every node's longest distance to a terminal descendant by
    /// climbing from each terminal towards the root. A climb stops as
    /// soon as a step would not raise the ancestor's depth; everything
    /// above is already dominated by an earlier climb. Nodes no climb
    /// reaches keep -1 and take no part in merging.
    fn mark_child_depths(&mut self) {
        for node in 0..self.nodes.len() {
            if !self.nodes[node].terminal {
                continue;
            }
            if self.nodes[node].child_depth < 0 {
                self.nodes[node].child_depth = 0;
            }

            let mut distance = 0;
            let mut current = node;
            while let Some(parent) = self.nodes[current].parent {
                distance += 1;
                if self.nodes[parent].child_depth >= distance {
                    break;
                }
                self.nodes[parent].child_depth = distance;
                current = parent;
            }
        }
    }

    // structural equality over the current (possibly partly fused) graph:
    // same letter, same terminal flag, positionally equal child runs
    fn subtree_eq(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b {
            return true;
        }
        if self.nodes[a].letter != self.nodes[b].letter
            || self.nodes[a].terminal != self.nodes[b].terminal
        {
            return false;
        }

        let mut left = self.nodes[a].first_child;
        let mut right = self.nodes[b].first_child;
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if !self.subtree_eq(x, y) {
                        return false;
                    }
                    left = self.nodes[x].next_sibling;
                    right = self.nodes[y].next_sibling;
                }
                _ => return false,
            }
        }
    }

    /// Renumbers the surviving graph breadth-first and emits one cell per
    /// node. A sibling run is numbered in one piece the first time its
    /// head is seen, which keeps every child block contiguous; a run
    /// reached again through a fused parent is simply pointed at.
    fn pack(&mut self) -> Dawg {
        for node in &mut self.nodes {
            node.index = UNSET;
        }

        let mut order = vec![ROOT];
        self.nodes[ROOT].index = 0;
        let mut queue = VecDeque::from([ROOT]);
        while let Some(node) = queue.pop_front() {
            let head = match self.nodes[node].first_child {
                Some(head) => head,
                None => continue,
            };
            if self.nodes[head].index != UNSET {
                // shared run, already numbered through another parent
                continue;
            }
            let mut child = Some(head);
            while let Some(index) = child {
                self.nodes[index].index = order.len();
                order.push(index);
                queue.push_back(index);
                child = self.nodes[index].next_sibling;
            }
        }

        let mut cells = Vec::with_capacity(order.len());
        for &index in &order {
            let node = &self.nodes[index];
            let first_child = node.first_child.map(|child| self.nodes[child].index);
            cells.push(Cell::pack(
                node.letter,
                node.terminal,
                node.last_sibling,
                first_child,
            ));
        }
        Dawg::from_cells(cells)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;
    use std::collections::HashSet;

    fn build(words: &[&str]) -> Dawg {
        let mut builder = Builder::new();
        for word in words {
            builder.add(word);
        }
        builder.build()
    }

    #[test]
    fn contain_finds_contained() {
        let mut builder = Builder::new();
        builder.add("test");
        builder.add("tests");

        assert!(builder.contains("test"));
        assert!(builder.contains("tests"));
    }

    #[test]
    fn contain_doesnt_find_not_contained() {
        let mut builder = Builder::new();
        builder.add("tests");

        assert!(!builder.contains("test"));
    }

    #[test]
    fn add_folds_case() {
        let mut builder = Builder::new();
        builder.add("MiXeD");

        assert!(builder.contains("mixed"));
        assert!(builder.contains("MIXED"));
    }

    #[test]
    fn short_words_are_dropped() {
        let mut builder = Builder::new();
        builder.add("");
        builder.add("j");

        assert_eq!(builder.word_count(), 0);
        assert!(!builder.contains("j"));
        assert_eq!(builder.node_count(), 1);
    }

    #[test]
    fn non_letters_are_dropped() {
        let mut builder = Builder::new();
        builder.add("CAT'S");
        builder.add("NAÏVE");

        assert_eq!(builder.word_count(), 0);
    }

    #[test]
    fn adding_twice_counts_once() {
        let mut builder = Builder::new();
        builder.add("twice");
        builder.add("twice");

        assert_eq!(builder.word_count(), 1);
    }

    #[test]
    fn prefix_words_count_separately() {
        let mut builder = Builder::new();
        builder.add("searching");
        builder.add("search");

        assert_eq!(builder.word_count(), 2);
        assert!(builder.contains("search"));
        assert!(!builder.contains("searchin"));
    }

    #[test]
    fn built_dawg_accepts_the_same_language() {
        let words = ["SEARCH", "SEARCHED", "SEARCHING"];
        let dawg = build(&words);

        for word in words {
            assert!(dawg.contains(word));
        }
        assert!(!dawg.contains("searches"));
        assert!(!dawg.contains("j"));
    }

    #[test]
    fn shared_suffixes_share_cells() {
        let dawg = build(&["CARS", "BARS"]);

        // the A->R->S tails of both words must run through the same cells
        let tail_from = |head: u8| {
            let (mut node, _) = dawg
                .children(crate::dawg::ROOT)
                .find(|&(_, cell)| cell.letter() == head)
                .unwrap();
            let mut tail = Vec::new();
            for letter in [b'A', b'R', b'S'] {
                let (next, _) = dawg
                    .children(node)
                    .find(|&(_, cell)| cell.letter() == letter)
                    .unwrap();
                tail.push(next);
                node = next;
            }
            tail
        };
        assert_eq!(tail_from(b'C'), tail_from(b'B'));
    }

    #[test]
    fn minimization_shrinks_the_trie() {
        let mut builder = Builder::new();
        for word in ["CARS", "BARS", "MARS", "CARTS", "BARTS"] {
            builder.add(word);
        }
        let before = builder.node_count();
        let dawg = builder.build();

        assert!(dawg.node_count() < before);
    }

    #[test]
    fn packing_is_deterministic() {
        let words = ["CARS", "BARS", "CART", "CARTS", "STAR", "STARS"];
        assert_eq!(build(&words), build(&words));
    }

    #[test]
    fn random_dictionary_round_trips() {
        let mut rng = rand::thread_rng();
        let mut words = HashSet::new();
        while words.len() < 200 {
            let len = rng.gen_range(2..9);
            let word: String = (0..len)
                .map(|_| char::from(b'A' + rng.gen_range(0..26)))
                .collect();
            words.insert(word);
        }

        let mut builder = Builder::new();
        for word in &words {
            builder.add(word);
        }
        assert_eq!(builder.word_count(), words.len());
        let dawg = builder.build();

        for word in &words {
            assert!(dawg.contains(word));
        }
        for _ in 0..200 {
            let len = rng.gen_range(2..9);
            let probe: String = (0..len)
                .map(|_| char::from(b'A' + rng.gen_range(0..26)))
                .collect();
            assert_eq!(dawg.contains(&probe), words.contains(&probe));
        }
    }
}
