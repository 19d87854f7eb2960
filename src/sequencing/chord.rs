use super::notes::{Pitch, PitchClass};

/// Three-note chord, root first.
pub type Chord = [Pitch; 3];

/// Fixed chord progression with an independently advanced cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTable {
    chords: Vec<Chord>,
    index: usize,
}

impl ChordTable {
    /// `chords` must be non-empty; config validation guarantees this.
    pub fn new(chords: Vec<Chord>) -> Self {
        Self { chords, index: 0 }
    }

    /// Cm, Am, Dm, Gm triads around the bass register.
    pub fn minor_progression() -> Self {
        use PitchClass as P;
        let a = P::from_index(9);
        let e = P::from_index(4);
        let f = P::F;
        Self::new(vec![
            [P::C.at(3), P::DS.at(3), P::G.at(3)],
            [a.at(2), P::C.at(3), e.at(3)],
            [P::D.at(3), f.at(3), a.at(3)],
            [P::G.at(2), P::AS.at(2), P::D.at(3)],
        ])
    }

    /// Chord under the cursor (`chordIndex mod len`).
    pub fn current(&self) -> &Chord {
        &self.chords[self.index % self.chords.len()]
    }

    /// Full triad when `seed mod 3 == 0`, otherwise root and fifth only.
    pub fn voicing(&self, seed: u32) -> Vec<Pitch> {
        let chord = self.current();
        if seed % 3 == 0 {
            chord.to_vec()
        } else {
            vec![chord[0], chord[2]]
        }
    }

    /// Move the cursor to the next chord, wrapping at the end.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.chords.len();
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        Self::minor_progression()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pitches: &[Pitch]) -> Vec<String> {
        pitches.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn voicing_size_follows_mod_three() {
        let table = ChordTable::default();
        for size in 0..300u32 {
            let expected = if size % 3 == 0 { 3 } else { 2 };
            assert_eq!(table.voicing(size).len(), expected, "size {size}");
        }
    }

    #[test]
    fn reduced_voicing_is_root_and_fifth() {
        let table = ChordTable::default();
        assert_eq!(names(&table.voicing(4)), ["C3", "G3"]);
        assert_eq!(names(&table.voicing(6)), ["C3", "D#3", "G3"]);
    }

    #[test]
    fn cursor_stays_at_first_chord_until_advanced() {
        let mut table = ChordTable::default();
        assert_eq!(table.current()[0].to_string(), "C3");

        table.advance();
        assert_eq!(table.current()[0].to_string(), "A2");

        for _ in 0..3 {
            table.advance();
        }
        assert_eq!(table.index(), 0, "cursor wraps after the last chord");
    }
}
