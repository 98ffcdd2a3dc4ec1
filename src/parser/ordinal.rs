use crate::error::LabelError;

const LETTERS: usize = 26;
const CAPACITY: usize = LETTERS * LETTERS;

/// Hands out "aa", "ab", ..., "zz" in order. Never resets; fails past "zz".
#[derive(Debug, Default)]
pub struct OrdinalCursor {
    issued: usize,
}

impl OrdinalCursor {
    pub fn next_label(&mut self) -> Result<String, LabelError> {
        if self.issued >= CAPACITY {
            return Err(LabelError::Exhausted(CAPACITY));
        }
        let hi = (b'a' + (self.issued / LETTERS) as u8) as char;
        let lo = (b'a' + (self.issued % LETTERS) as u8) as char;
        self.issued += 1;
        Ok(format!("{}{}", hi, lo))
    }
}

/// Prefixes entries of the sequential (guide-style) category with an ordinal
/// so that tutorial sections keep their reading order and stay distinct.
#[derive(Debug)]
pub struct Labeler {
    sequential: String,
    cursor: OrdinalCursor,
}

impl Labeler {
    pub fn new(sequential: impl Into<String>) -> Self {
        Self {
            sequential: sequential.into(),
            cursor: OrdinalCursor::default(),
        }
    }

    pub fn apply(&mut self, category: &str, name: String) -> Result<String, LabelError> {
        if category != self.sequential {
            return Ok(name);
        }
        let ordinal = self.cursor.next_label()?;
        Ok(format!("{}: {}", ordinal, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_run_aa_to_zz() {
        let mut c = OrdinalCursor::default();
        let all: Vec<String> = (0..CAPACITY).map(|_| c.next_label().unwrap()).collect();
        assert_eq!(all[0], "aa");
        assert_eq!(all[1], "ab");
        assert_eq!(all[25], "az");
        assert_eq!(all[26], "ba");
        assert_eq!(all[CAPACITY - 1], "zz");
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut c = OrdinalCursor::default();
        for _ in 0..CAPACITY {
            c.next_label().unwrap();
        }
        assert!(matches!(c.next_label(), Err(LabelError::Exhausted(676))));
        assert!(c.next_label().is_err());
    }

    #[test]
    fn only_sequential_category_is_labeled() {
        let mut l = Labeler::new("Guide");
        assert_eq!(l.apply("func", "torch.abs".into()).unwrap(), "torch.abs");
        assert_eq!(l.apply("Guide", "Intro".into()).unwrap(), "aa: Intro");
        assert_eq!(l.apply("func", "torch.add".into()).unwrap(), "torch.add");
        assert_eq!(l.apply("Guide", "Intro".into()).unwrap(), "ab: Intro");
    }
}
