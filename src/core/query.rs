//! Result limiting and ranking for close approach queries

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::core::model::Approach;

/// Iterator adapter returned by [`limit`]
#[derive(Debug, Clone)]
pub struct Limit<I> {
    inner: I,
    remaining: Option<usize>,
}

impl<I: Iterator> Iterator for Limit<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.remaining {
            None => self.inner.next(),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                self.inner.next()
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.inner.size_hint();
        match self.remaining {
            None => (lower, upper),
            Some(n) => (
                lower.min(n),
                Some(upper.map_or(n, |upper| upper.min(n))),
            ),
        }
    }
}

/// Yield at most `n` items from `iter`, preserving order
///
/// `None` and `Some(0)` both mean "no limit". The upstream iterator is never
/// pulled past the last item yielded.
pub fn limit<I: IntoIterator>(iter: I, n: Option<usize>) -> Limit<I::IntoIter> {
    Limit {
        inner: iter.into_iter(),
        remaining: n.filter(|&n| n > 0),
    }
}

/// Orderings for the ranked views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Smallest approach distance first
    Closest,
    /// Highest relative velocity first
    Fastest,
    /// Latest approach time first
    Recent,
}

impl RankOrder {
    fn compare(&self, a: &Approach<'_>, b: &Approach<'_>) -> Ordering {
        let primary = match self {
            RankOrder::Closest => a.distance().total_cmp(&b.distance()),
            RankOrder::Fastest => b.velocity().total_cmp(&a.velocity()),
            RankOrder::Recent => b.time().cmp(&a.time()),
        };
        primary.then_with(|| a.designation().cmp(b.designation()))
    }
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankOrder::Closest => write!(f, "closest"),
            RankOrder::Fastest => write!(f, "fastest"),
            RankOrder::Recent => write!(f, "recent"),
        }
    }
}

impl FromStr for RankOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "closest" => Ok(RankOrder::Closest),
            "fastest" => Ok(RankOrder::Fastest),
            "recent" => Ok(RankOrder::Recent),
            _ => Err(format!("Unknown ranking: {}", s)),
        }
    }
}

/// Sort approaches for a ranked view and keep the first `n`
///
/// The sort is stable and ties are broken by designation, so the output is
/// deterministic for a given input.
pub fn rank<'a, I>(approaches: I, order: RankOrder, n: Option<usize>) -> Vec<Approach<'a>>
where
    I: IntoIterator<Item = Approach<'a>>,
{
    let mut sorted: Vec<Approach<'a>> = approaches.into_iter().collect();
    sorted.sort_by(|a, b| order.compare(a, b));
    limit(sorted, n).collect()
}
