//! Symbols the dashboard currently streams, and which one is focused.

use crate::{Result, TormentusError};

/// Outcome of [`SubscriptionRegistry::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The symbol was dropped. `refocused` names the new focus when the
    /// removed symbol had it.
    Removed { refocused: Option<String> },
    /// The symbol is the only one left and stays subscribed. Focus is
    /// reassigned to it when `refocused` is set.
    KeptLast { refocused: Option<String> },
    /// The symbol was not tracked.
    NotTracked,
}

/// Ordered set of subscribed symbols with a focused member.
///
/// Never empty: the last remaining symbol cannot be removed.
#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    symbols: Vec<String>,
    focused: usize,
}

impl SubscriptionRegistry {
    /// Creates a registry tracking `symbols` (duplicates dropped), focused
    /// on the first one.
    ///
    /// # Errors
    ///
    /// Returns [`TormentusError::Config`] if `symbols` is empty.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self> {
        let mut registry = Self {
            symbols: Vec::with_capacity(symbols.len()),
            focused: 0,
        };
        for symbol in symbols {
            registry.add(symbol.as_ref());
        }
        if registry.symbols.is_empty() {
            return Err(TormentusError::Config(
                "at least one symbol must be subscribed".to_string(),
            ));
        }
        Ok(registry)
    }

    /// All tracked symbols in tab order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The focused symbol.
    pub fn focused(&self) -> &str {
        &self.symbols[self.focused]
    }

    /// Index of the focused symbol in tab order.
    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Tracks `symbol`. Returns `true` if it was new, meaning a subscribe
    /// command must go out.
    pub fn add(&mut self, symbol: &str) -> bool {
        if self.contains(symbol) {
            return false;
        }
        self.symbols.push(symbol.to_string());
        true
    }

    /// Moves focus to a tracked symbol. The previous focus stays
    /// subscribed. Returns `false` if `symbol` is not tracked.
    pub fn focus(&mut self, symbol: &str) -> bool {
        match self.symbols.iter().position(|s| s == symbol) {
            Some(index) => {
                self.focused = index;
                true
            }
            None => false,
        }
    }

    /// Focuses the next tab, wrapping around. Returns the new focus.
    pub fn focus_next(&mut self) -> &str {
        self.focused = (self.focused + 1) % self.symbols.len();
        self.focused()
    }

    /// Focuses the previous tab, wrapping around. Returns the new focus.
    pub fn focus_previous(&mut self) -> &str {
        self.focused = self
            .focused
            .checked_sub(1)
            .unwrap_or(self.symbols.len() - 1);
        self.focused()
    }

    /// Stops tracking `symbol`.
    ///
    /// Removing the focused symbol moves focus to the first remaining
    /// symbol before the caller unsubscribes. The last symbol is never
    /// removed, but attempting it on the focus still reassigns focus.
    pub fn remove(&mut self, symbol: &str) -> Removal {
        let Some(index) = self.symbols.iter().position(|s| s == symbol) else {
            return Removal::NotTracked;
        };
        let was_focused = index == self.focused;

        if self.symbols.len() == 1 {
            self.focused = 0;
            return Removal::KeptLast {
                refocused: was_focused.then(|| self.symbols[0].clone()),
            };
        }

        self.symbols.remove(index);
        if was_focused {
            self.focused = 0;
            Removal::Removed {
                refocused: Some(self.symbols[0].clone()),
            }
        } else {
            if index < self.focused {
                self.focused -= 1;
            }
            Removal::Removed { refocused: None }
        }
    }
}
