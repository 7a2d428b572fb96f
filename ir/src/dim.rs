//! Symbolic dimensions - sizes that can be either concrete or symbolic.
//!
//! A `Dim` represents one dimension of a tensor shape or stride. Concrete
//! dimensions are known at compile time; symbolic dimensions are unknown but
//! may carry a representative *hint* value recorded during tracing. All
//! planning arithmetic operates on the hint; transforms that would change
//! observable semantics (such as padding) never touch a symbolic dimension.

/// One dimension of a shape or stride.
///
/// # Examples
///
/// ```rust
/// # use zarya_ir::Dim;
/// let fixed = Dim::from(32);
/// assert!(fixed.is_concrete());
/// assert_eq!(fixed.hint(), Some(32));
///
/// let batch = Dim::symbolic(16);
/// assert!(batch.is_symbolic());
/// assert_eq!(batch.as_concrete(), None);
/// assert_eq!(batch.hint(), Some(16));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Concrete compile-time constant.
    Concrete(usize),

    /// Symbolic runtime dimension, optionally carrying a planning hint.
    Symbolic { hint: Option<usize> },
}

impl Dim {
    /// Symbolic dimension with a representative hint value.
    pub const fn symbolic(hint: usize) -> Self {
        Self::Symbolic { hint: Some(hint) }
    }

    /// Symbolic dimension with no hint (never pad-eligible).
    pub const fn unhinted() -> Self {
        Self::Symbolic { hint: None }
    }

    pub const fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete(_))
    }

    pub const fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic { .. })
    }

    /// Concrete value if known at compile time, `None` otherwise.
    pub const fn as_concrete(&self) -> Option<usize> {
        match self {
            Self::Concrete(v) => Some(*v),
            Self::Symbolic { .. } => None,
        }
    }

    /// Representative value for planning: the concrete value, or the hint.
    pub const fn hint(&self) -> Option<usize> {
        match self {
            Self::Concrete(v) => Some(*v),
            Self::Symbolic { hint } => *hint,
        }
    }

    /// Whether planning arithmetic can use this dimension at all.
    pub const fn has_hint(&self) -> bool {
        self.hint().is_some()
    }

    /// Add a concrete amount, preserving symbolic-ness.
    ///
    /// A symbolic dimension is returned unchanged: growth of an unknown
    /// dimension is not representable and callers never pad one.
    pub fn grow(&self, amount: usize) -> Self {
        match self {
            Self::Concrete(v) => Self::Concrete(v + amount),
            Self::Symbolic { .. } => *self,
        }
    }
}

impl From<usize> for Dim {
    fn from(value: usize) -> Self {
        Self::Concrete(value)
    }
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concrete(v) => write!(f, "{v}"),
            Self::Symbolic { hint: Some(h) } => write!(f, "s[{h}]"),
            Self::Symbolic { hint: None } => write!(f, "s[?]"),
        }
    }
}
