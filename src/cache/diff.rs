use crate::models::Match;

/// Order-insensitive deep equality between two match lists.
///
/// Both sides are sorted by `matchId` before a field-by-field comparison, so
/// a provider reshuffling its array does not count as a change.
pub fn same_matches(a: &[Match], b: &[Match]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    sorted(a) == sorted(b)
}

fn sorted(matches: &[Match]) -> Vec<&Match> {
    let mut refs: Vec<&Match> = matches.iter().collect();
    refs.sort_by(|x, y| x.match_id.cmp(&y.match_id));
    refs
}
