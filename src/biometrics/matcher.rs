use crate::biometrics::codec::BiometricVector;
use crate::core::error::MatchError;
use std::borrow::Borrow;

/// Closest enrolled candidate and its squared distance to the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestMatch<K> {
    pub candidate: K,
    pub distance: u64,
}

/// Sum of squared component differences.
///
/// The worst case is 128 * 65535^2 (about 2^39), so a u64 accumulator cannot
/// overflow.
pub fn squared_distance(a: &BiometricVector, b: &BiometricVector) -> u64 {
    a.components()
        .iter()
        .zip(b.components().iter())
        .map(|(&x, &y)| {
            let diff = i64::from(x) - i64::from(y);
            (diff * diff) as u64
        })
        .sum()
}

/// Brute-force nearest neighbour over the whole population.
///
/// Candidates are scanned in the order the iterator yields them and the
/// running best is only replaced by a strictly smaller distance, so on an
/// exact tie the first-seen candidate wins. Callers that need a stable
/// outcome must hand over a stably ordered population.
pub fn nearest<K, V, I>(query: &BiometricVector, population: I) -> Result<NearestMatch<K>, MatchError>
where
    V: Borrow<BiometricVector>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut best: Option<NearestMatch<K>> = None;

    for (candidate, vector) in population {
        let distance = squared_distance(query, vector.borrow());
        let replace = match &best {
            Some(current) => distance < current.distance,
            None => true,
        };
        if replace {
            best = Some(NearestMatch {
                candidate,
                distance,
            });
        }
    }

    best.ok_or(MatchError::EmptyPopulation)
}
