//! Provenance sources and their combination
//!
//! Every source answers one question for a [`ProvenanceQuery`]: did this
//! session read the target? The answer is tri-state so that an unavailable
//! source is visible instead of silently reading as "no".

use crate::path::CanonicalPath;
use crate::session::SessionId;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Answer from one provenance source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evidence {
    /// The source holds a read of the target
    Found,
    /// The source was consulted and holds no read of the target
    Absent,
    /// The source could not be consulted (missing, unreadable, no session)
    Unavailable,
}

impl Evidence {
    /// True only for [`Evidence::Found`]
    #[inline]
    #[must_use]
    pub fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }

    /// Label for logs and metrics
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Absent => "absent",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a provenance source is asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceQuery {
    /// Validated session, `None` when the request carried no usable id
    pub session: Option<SessionId>,
    /// Locator of the session's interaction history, if any
    pub history: Option<PathBuf>,
    /// Normalized mutation target
    pub target: CanonicalPath,
}

impl ProvenanceQuery {
    /// Query for `target` with no session and no history
    #[inline]
    #[must_use]
    pub fn new(target: CanonicalPath) -> Self {
        Self {
            session: None,
            history: None,
            target,
        }
    }

    /// With session
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session: Option<SessionId>) -> Self {
        self.session = session;
        self
    }

    /// With history locator
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: Option<PathBuf>) -> Self {
        self.history = history;
        self
    }
}

/// One independent source of read evidence
pub trait ProvenanceSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look the query up; must not panic or block beyond a short read
    fn lookup(&self, query: &ProvenanceQuery) -> Evidence;
}

/// Ordered list of provenance sources combined by logical OR
///
/// Sources are consulted in insertion order and evaluation stops at the
/// first [`Evidence::Found`]. If no source finds evidence the chain reports
/// [`Evidence::Absent`] when at least one source answered, and
/// [`Evidence::Unavailable`] when none could.
#[derive(Clone, Default)]
pub struct ProvenanceChain {
    sources: Vec<Arc<dyn ProvenanceSource>>,
}

impl ProvenanceChain {
    /// Empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source, returning the chain
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ProvenanceSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of sources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when no source is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|source| source.name())
    }

    /// Combine every source's answer for `query`
    #[must_use]
    pub fn lookup(&self, query: &ProvenanceQuery) -> Evidence {
        let mut answered = false;

        for source in &self.sources {
            let evidence = source.lookup(query);
            tracing::debug!(
                source = source.name(),
                path = %query.target,
                evidence = %evidence,
                "provenance lookup"
            );
            match evidence {
                Evidence::Found => return Evidence::Found,
                Evidence::Absent => answered = true,
                Evidence::Unavailable => {}
            }
        }

        if answered {
            Evidence::Absent
        } else {
            Evidence::Unavailable
        }
    }
}

impl fmt::Debug for ProvenanceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        evidence: Evidence,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, evidence: Evidence) -> Arc<Self> {
            Arc::new(Self {
                name,
                evidence,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ProvenanceSource for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn lookup(&self, _query: &ProvenanceQuery) -> Evidence {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.evidence
        }
    }

    fn query() -> ProvenanceQuery {
        ProvenanceQuery::new(CanonicalPath::from_canonical("/vault/a.md"))
    }

    #[test]
    fn empty_chain_is_unavailable() {
        assert_eq!(ProvenanceChain::new().lookup(&query()), Evidence::Unavailable);
    }

    #[test]
    fn any_found_wins() {
        let chain = ProvenanceChain::new()
            .with_source(Fixed::new("history", Evidence::Unavailable))
            .with_source(Fixed::new("store", Evidence::Found));
        assert_eq!(chain.lookup(&query()), Evidence::Found);
    }

    #[test]
    fn found_short_circuits() {
        let first = Fixed::new("history", Evidence::Found);
        let second = Fixed::new("store", Evidence::Absent);
        let chain = ProvenanceChain::new()
            .with_source(first.clone())
            .with_source(second.clone());

        assert_eq!(chain.lookup(&query()), Evidence::Found);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn absent_beats_unavailable() {
        let chain = ProvenanceChain::new()
            .with_source(Fixed::new("history", Evidence::Unavailable))
            .with_source(Fixed::new("store", Evidence::Absent));
        assert_eq!(chain.lookup(&query()), Evidence::Absent);
    }

    #[test]
    fn all_unavailable_is_unavailable() {
        let chain = ProvenanceChain::new()
            .with_source(Fixed::new("history", Evidence::Unavailable))
            .with_source(Fixed::new("store", Evidence::Unavailable));
        assert_eq!(chain.lookup(&query()), Evidence::Unavailable);
        assert!(!chain.lookup(&query()).is_found());
    }

    #[test]
    fn debug_lists_names_in_order() {
        let chain = ProvenanceChain::new()
            .with_source(Fixed::new("history", Evidence::Absent))
            .with_source(Fixed::new("store", Evidence::Absent));
        assert_eq!(format!("{chain:?}"), r#"["history", "store"]"#);
    }
}
