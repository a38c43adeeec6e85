use crate::{Error, Result, TreeList};

/// A positional cursor over a [`TreeList`].
///
/// The cursor sits between two elements of the range it was created over. Moving it returns the
/// element it passes over.
pub struct Cursor<'list, V> {
    list: &'list TreeList<V>,
    lo: usize,
    hi: usize,
    index: usize,
}

impl<'list, V> Cursor<'list, V> {
    pub(crate) fn new(list: &'list TreeList<V>, lo: usize, hi: usize) -> Cursor<'list, V> {
        Cursor {
            list,
            lo,
            hi,
            index: lo,
        }
    }

    /// Returns `true` if there is an element after the cursor.
    pub fn has_next(&self) -> bool {
        self.index < self.hi
    }

    /// Returns `true` if there is an element before the cursor.
    pub fn has_prev(&self) -> bool {
        self.index > self.lo
    }

    /// Returns the position of the element after the cursor.
    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Returns the position of the element before the cursor, if the cursor is not at the front.
    pub fn prev_index(&self) -> Option<usize> {
        self.has_prev().then(|| self.index - 1)
    }

    /// Moves the cursor forward, returning the element it passed over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if the cursor is at the back.
    pub fn move_next(&mut self) -> Result<&'list V> {
        if !self.has_next() {
            return Err(out_of_range(self.index, self.hi));
        }

        let value = self.list.get(self.index)?;
        self.index += 1;
        Ok(value)
    }

    /// Moves the cursor backward, returning the element it passed over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if the cursor is at the front.
    pub fn move_prev(&mut self) -> Result<&'list V> {
        if !self.has_prev() {
            return Err(out_of_range(self.index, self.hi));
        }

        let value = self.list.get(self.index - 1)?;
        self.index -= 1;
        Ok(value)
    }
}

/// A positional cursor over a [`TreeList`] which can remove the element it last passed over.
///
/// Removing an element invalidates the cursor for good: every later call fails with
/// [`Error::InvalidIterator`].
pub struct CursorMut<'list, V> {
    list: &'list mut TreeList<V>,
    lo: usize,
    hi: usize,
    index: usize,
    last: Option<usize>,
    valid: bool,
}

impl<'list, V> CursorMut<'list, V> {
    pub(crate) fn new(list: &'list mut TreeList<V>, lo: usize, hi: usize) -> CursorMut<'list, V> {
        CursorMut {
            list,
            lo,
            hi,
            index: lo,
            last: None,
            valid: true,
        }
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if an element was removed through this cursor.
    pub fn as_cursor(&self) -> Result<Cursor<'_, V>> {
        self.check_valid()?;

        Ok(Cursor {
            list: &*self.list,
            lo: self.lo,
            hi: self.hi,
            index: self.index,
        })
    }

    /// Returns `true` if the cursor is still valid and there is an element after it.
    pub fn has_next(&self) -> bool {
        self.valid && self.index < self.hi
    }

    /// Returns `true` if the cursor is still valid and there is an element before it.
    pub fn has_prev(&self) -> bool {
        self.valid && self.index > self.lo
    }

    /// Returns the position of the element after the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if an element was removed through this cursor.
    pub fn next_index(&self) -> Result<usize> {
        self.check_valid()?;
        Ok(self.index)
    }

    /// Returns the position of the element before the cursor, if the cursor is not at the front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if an element was removed through this cursor.
    pub fn prev_index(&self) -> Result<Option<usize>> {
        self.check_valid()?;
        Ok((self.index > self.lo).then(|| self.index - 1))
    }

    /// Moves the cursor forward, returning the element it passed over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if an element was removed through this cursor, or
    /// [`Error::IndexOutOfRange`] if the cursor is at the back.
    pub fn move_next(&mut self) -> Result<&V> {
        self.check_valid()?;

        if self.index >= self.hi {
            return Err(out_of_range(self.index, self.hi));
        }

        let index = self.index;
        self.index += 1;
        self.last = Some(index);

        self.list.get(index)
    }

    /// Moves the cursor backward, returning the element it passed over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if an element was removed through this cursor, or
    /// [`Error::IndexOutOfRange`] if the cursor is at the front.
    pub fn move_prev(&mut self) -> Result<&V> {
        self.check_valid()?;

        if self.index <= self.lo {
            return Err(out_of_range(self.index, self.hi));
        }

        self.index -= 1;
        self.last = Some(self.index);

        self.list.get(self.index)
    }

    /// Removes the element the cursor last passed over and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] if the cursor has not passed over an element yet, or
    /// if an element was already removed through it.
    pub fn remove(&mut self) -> Result<V> {
        self.check_valid()?;

        let index = self.last.ok_or(Error::InvalidIterator)?;
        let value = self
            .list
            .remove(index)
            .ok_or_else(|| out_of_range(index, self.list.len()))?;

        self.valid = false;
        Ok(value)
    }

    /// Replacing elements is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn set(&mut self, _value: V) -> Result<()> {
        Err(Error::Unsupported("CursorMut::set"))
    }

    /// Inserting elements is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn insert(&mut self, _value: V) -> Result<()> {
        Err(Error::Unsupported("CursorMut::insert"))
    }

    fn check_valid(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::InvalidIterator)
        }
    }
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::IndexOutOfRange { index, len }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_both_ways() {
        let list: TreeList<u32> = (10..15).collect();
        let mut cursor = list.cursor();

        assert!(!cursor.has_prev());
        assert_eq!(cursor.prev_index(), None);
        assert!(matches!(
            cursor.move_prev(),
            Err(Error::IndexOutOfRange { .. })
        ));

        let forward: Vec<u32> = core::iter::from_fn(|| cursor.move_next().ok().copied()).collect();
        assert_eq!(forward, [10, 11, 12, 13, 14]);
        assert!(!cursor.has_next());
        assert_eq!(cursor.next_index(), 5);

        assert_eq!(cursor.move_prev(), Ok(&14));
        assert_eq!(cursor.move_prev(), Ok(&13));
        assert_eq!(cursor.prev_index(), Some(2));
    }

    #[test]
    fn remove_invalidates() {
        let mut list: TreeList<char> = "abcd".chars().collect();

        {
            let mut cursor = list.cursor_mut();
            assert_eq!(cursor.remove(), Err(Error::InvalidIterator));

            assert_eq!(cursor.move_next(), Ok(&'a'));
            assert_eq!(cursor.move_next(), Ok(&'b'));
            assert_eq!(cursor.next_index(), Ok(2));
            assert_eq!(cursor.prev_index(), Ok(Some(1)));
            assert_eq!(cursor.remove(), Ok('b'));

            assert!(!cursor.has_next());
            assert!(!cursor.has_prev());
            assert_eq!(cursor.next_index(), Err(Error::InvalidIterator));
            assert_eq!(cursor.prev_index(), Err(Error::InvalidIterator));
            assert_eq!(cursor.move_next(), Err(Error::InvalidIterator));
            assert_eq!(cursor.move_prev(), Err(Error::InvalidIterator));
            assert_eq!(cursor.remove(), Err(Error::InvalidIterator));
            assert!(cursor.as_cursor().is_err());
        }

        list.assert_invariants();
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().collect::<String>(), "acd");
    }

    #[test]
    fn remove_after_move_prev() {
        let mut list: TreeList<char> = "abc".chars().collect();

        let mut cursor = list.cursor_mut();
        cursor.move_next().unwrap();
        cursor.move_next().unwrap();
        assert_eq!(cursor.move_prev(), Ok(&'b'));
        assert_eq!(cursor.as_cursor().unwrap().next_index(), 1);
        assert_eq!(cursor.remove(), Ok('b'));

        assert_eq!(list.iter().collect::<String>(), "ac");
    }

    #[test]
    fn unsupported_edits() {
        let mut list: TreeList<char> = "ab".chars().collect();
        let mut cursor = list.cursor_mut();

        assert_eq!(cursor.set('z'), Err(Error::Unsupported("CursorMut::set")));
        assert_eq!(
            cursor.insert('z'),
            Err(Error::Unsupported("CursorMut::insert"))
        );
        assert!(cursor.has_next());
    }
}
