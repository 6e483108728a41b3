use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cannot push back: nothing has been consumed yet")]
    #[diagnostic(code(cursor::nothing_consumed))]
    NothingConsumed,

    #[error("cannot push back an element that was not the last one consumed")]
    #[diagnostic(code(cursor::mismatch))]
    Mismatch,
}

/// What a [`Cursor`] hands out: a real element, or one of the two markers
/// around the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit<T> {
    Begin,
    Element(T),
    End,
}

impl<T> Unit<T> {
    pub fn element(self) -> Option<T> {
        match self {
            Unit::Element(element) => Some(element),
            Unit::Begin | Unit::End => None,
        }
    }
}

/// Bidirectional stream over an indexable buffer.
///
/// The cursor starts *before* the first element. `position` is the index of
/// the element most recently returned by [`Cursor::advance`], or
/// `buffer.len()` once the end marker has been handed out.
#[derive(Debug, Clone)]
pub struct Cursor<T> {
    buffer: Vec<T>,
    position: Option<usize>,
}

impl<T: Clone + PartialEq> Cursor<T> {
    pub fn new(buffer: impl IntoIterator<Item = T>) -> Self {
        Cursor {
            buffer: buffer.into_iter().collect(),
            position: None,
        }
    }

    pub fn advance(&mut self) -> Unit<T> {
        let index = self.next_index();
        self.position = Some(index);
        self.unit_at(index)
    }

    pub fn peek(&self) -> Unit<T> {
        self.unit_at(self.next_index())
    }

    /// Undo exactly one `advance`. `unit` must be what that `advance` returned.
    pub fn push_back(&mut self, unit: Unit<T>) -> Result<(), CursorError> {
        let Some(index) = self.position else {
            return Err(CursorError::NothingConsumed);
        };
        match unit {
            Unit::Begin => return Err(CursorError::Mismatch),
            Unit::Element(element) => {
                if self.buffer.get(index) != Some(&element) {
                    return Err(CursorError::Mismatch);
                }
            }
            Unit::End => {
                if index < self.buffer.len() {
                    return Err(CursorError::Mismatch);
                }
            }
        }
        self.position = index.checked_sub(1);
        Ok(())
    }

    /// The unit most recently returned by `advance`.
    pub fn unit(&self) -> Unit<T> {
        match self.position {
            None => Unit::Begin,
            Some(index) => self.unit_at(index),
        }
    }

    /// Index of the element most recently consumed.
    pub fn offset(&self) -> Option<usize> {
        self.position
    }

    pub fn has_more(&self) -> bool {
        self.next_index() < self.buffer.len()
    }

    pub fn is_end(&self) -> bool {
        self.position == Some(self.buffer.len())
    }

    pub fn reset(&mut self) {
        self.position = None;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn next_index(&self) -> usize {
        match self.position {
            None => 0,
            Some(index) => (index + 1).min(self.buffer.len()),
        }
    }

    fn unit_at(&self, index: usize) -> Unit<T> {
        match self.buffer.get(index) {
            Some(element) => Unit::Element(element.clone()),
            None => Unit::End,
        }
    }
}
