use std::io::{self, Read, Write};

use itertools::Itertools;

use crate::error::DawgError;
use crate::search::{self, Subword};

pub type NodeIndex = usize;

/// Cell 0 is always the root of the graph.
pub const ROOT: NodeIndex = 0;

// field layout of a packed cell
const LETTER_MASK: u32 = 0xFF;
const TERMINAL_BIT: u32 = 1 << 8;
const LAST_SIBLING_BIT: u32 = 1 << 9;
const CHILD_SHIFT: u32 = 10;
/// all-ones in the first-child field means "no children"
const NO_CHILD: u32 = 0x3F_FFFF;

/// One packed automaton node: the letter in bits 0-7, the terminal flag in
/// bit 8, the last-sibling flag in bit 9 and the index of the first child
/// in bits 10-31. A node's children occupy a contiguous run of cells ending
/// at the one with the last-sibling bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell(u32);

impl Cell {
    pub(crate) fn pack(
        letter: u8,
        terminal: bool,
        last_sibling: bool,
        first_child: Option<NodeIndex>,
    ) -> Self {
        let child = match first_child {
            Some(index) => {
                assert!(
                    (index as u32) < NO_CHILD,
                    "dawg exceeds the 22-bit node index space"
                );
                index as u32
            }
            None => NO_CHILD,
        };
        let mut bits = u32::from(letter) | child << CHILD_SHIFT;
        if terminal {
            bits |= TERMINAL_BIT;
        }
        if last_sibling {
            bits |= LAST_SIBLING_BIT;
        }
        Cell(bits)
    }

    pub fn letter(self) -> u8 {
        (self.0 & LETTER_MASK) as u8
    }

    pub fn is_terminal(self) -> bool {
        self.0 & TERMINAL_BIT != 0
    }

    pub fn is_last_sibling(self) -> bool {
        self.0 & LAST_SIBLING_BIT != 0
    }

    pub fn first_child(self) -> Option<NodeIndex> {
        match self.0 >> CHILD_SHIFT {
            NO_CHILD => None,
            index => Some(index as NodeIndex),
        }
    }

    fn bits(self) -> u32 {
        self.0
    }
}

/// The minimized word graph. Immutable once built, so any number of
/// threads may run queries against it without coordination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dawg {
    cells: Vec<Cell>,
}

impl Dawg {
    pub(crate) fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn node_count(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn cell(&self, node: NodeIndex) -> Cell {
        self.cells[node]
    }

    /// Walks the graph letter by letter and checks the final cell's
    /// terminal flag. Words shorter than two letters are never present.
    pub fn contains(&self, word: &str) -> bool {
        if word.len() < 2 {
            return false;
        }

        let mut node = ROOT;
        for letter in word.to_ascii_uppercase().bytes() {
            match self
                .children(node)
                .find(|&(_, cell)| cell.letter() == letter)
            {
                Some((index, _)) => node = index,
                None => return false,
            }
        }
        self.cell(node).is_terminal()
    }

    /// Every dictionary word constructible from `letters` (`?` is a
    /// one-shot wildcard), optionally constrained by `pattern`. Returns
    /// `None` when either input is rejected, which is distinct from a
    /// clean search with no matches.
    pub fn subwords(&self, letters: &str, pattern: Option<&str>) -> Option<Vec<Subword>> {
        search::subwords(self, letters, pattern)
    }

    /// The distinct words of a result set, in first-seen order.
    pub fn extract_words(results: &[Subword]) -> Vec<String> {
        results
            .iter()
            .map(|result| result.word.clone())
            .unique()
            .collect()
    }

    pub fn children(&self, node: NodeIndex) -> Children {
        Children {
            dawg: self,
            current: self.cell(node).first_child(),
        }
    }

    /// Writes the cell array as a big-endian length-prefixed blob.
    pub fn store<W: Write>(&self, writer: &mut W) -> Result<(), DawgError> {
        writer.write_all(&(self.cells.len() as u32).to_be_bytes())?;
        for cell in &self.cells {
            writer.write_all(&cell.bits().to_be_bytes())?;
        }
        log::debug!("stored {} dawg cells", self.cells.len());
        Ok(())
    }

    /// Reads a blob written by [`store`](Self::store) and checks that it
    /// is a well-formed cell array before handing it out.
    pub fn load<R: Read>(reader: &mut R) -> Result<Self, DawgError> {
        let count = read_u32(reader)? as usize;
        if count == 0 {
            return Err(DawgError::Format("no cells (missing root)".into()));
        }
        if count > NO_CHILD as usize {
            return Err(DawgError::Format(format!(
                "cell count {count} exceeds the node index space"
            )));
        }

        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(Cell(read_u32(reader)?));
        }

        for (index, cell) in cells.iter().enumerate() {
            if index != ROOT && !cell.letter().is_ascii_uppercase() {
                return Err(DawgError::Format(format!(
                    "cell {index} holds byte {:#04x}, not a letter",
                    cell.letter()
                )));
            }
            if let Some(child) = cell.first_child() {
                if child >= cells.len() {
                    return Err(DawgError::Format(format!(
                        "cell {index} points at child {child}, past the {} stored cells",
                        cells.len()
                    )));
                }
            }
        }

        log::debug!("loaded {} dawg cells", cells.len());
        Ok(Self { cells })
    }
}

/// Iterator over one node's child run. Stops after yielding the cell with
/// the last-sibling bit; a node without children yields nothing.
pub struct Children<'dawg> {
    dawg: &'dawg Dawg,
    current: Option<NodeIndex>,
}

impl<'dawg> Iterator for Children<'dawg> {
    type Item = (NodeIndex, Cell);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let cell = self.dawg.cell(index);
        self.current = if cell.is_last_sibling() {
            None
        } else {
            Some(index + 1)
        };
        Some((index, cell))
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, DawgError> {
    let mut buf = [0; 4];
    reader.read_exact(&mut buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DawgError::Truncated(err)
        } else {
            DawgError::Io(err)
        }
    })?;
    Ok(u32::from_be_bytes(buf))
}
