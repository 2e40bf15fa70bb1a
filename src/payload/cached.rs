use std::fmt;

use once_cell::sync::OnceCell;

/// Memoization cell for a derived field.
///
/// The value is computed on first access and returned from the cell on every
/// access after that. A derivation that fails leaves the cell empty.
pub struct Cached<T> {
    cell: OnceCell<T>,
}

impl<T> Cached<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn get_or_init<F>(&self, derive: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(derive)
    }

    pub fn get_or_try_init<F, E>(&self, derive: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.cell.get_or_try_init(derive)
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Cached").field(value).finish(),
            None => f.write_str("Cached(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_derivation_runs_once() {
        let calls = AtomicUsize::new(0);
        let cell: Cached<String> = Cached::new();

        for _ in 0..5 {
            let value = cell.get_or_init(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                "derived".to_string()
            });
            assert_eq!(value, "derived");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_derivation_is_not_stored() {
        let cell: Cached<u32> = Cached::new();

        let first: Result<&u32, &str> = cell.get_or_try_init(|| Err("boom"));
        assert!(first.is_err());
        assert!(cell.get().is_none());

        let second: Result<&u32, &str> = cell.get_or_try_init(|| Ok(7));
        assert_eq!(*second.unwrap(), 7);

        let third: Result<&u32, &str> = cell.get_or_try_init(|| Ok(99));
        assert_eq!(*third.unwrap(), 7);
    }

    #[test]
    fn test_concurrent_access_derives_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cell = Arc::new(Cached::<usize>::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let calls = Arc::clone(&calls);
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    *cell.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        42
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_keeps_computed_value() {
        let cell: Cached<u8> = Cached::new();
        cell.get_or_init(|| 3);
        let copy = cell.clone();
        assert_eq!(copy.get(), Some(&3));
    }
}
