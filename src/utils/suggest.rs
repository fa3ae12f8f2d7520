fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut curr = Vec::with_capacity(prev.len());
        curr.push(i + 1);
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr.push((prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost));
        }
        prev = curr;
    }
    prev[b_chars.len()]
}

/// Close matches for `input`, best first. Used for did-you-mean hints.
pub fn suggest(input: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    let needle = normalize_token(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let allowed = (needle.len() / 3).max(1);
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let hay = normalize_token(candidate);
            if hay.is_empty() {
                return None;
            }
            let score = if hay == needle {
                0
            } else if hay.contains(&needle) || needle.contains(&hay) {
                1
            } else {
                edit_distance(&needle, &hay)
            };
            (score <= allowed).then_some((score, *candidate))
        })
        .collect();
    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
