fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn distance(input: &str, candidate: &str) -> Option<usize> {
    let a = normalize_token(input);
    let b = normalize_token(candidate);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    Some(levenshtein(&a, &b))
}

fn max_allowed_distance(input: &str) -> usize {
    match normalize_token(input).len() {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        len => ((len as f32) * 0.35).floor().max(3.0) as usize,
    }
}

/// Closest candidates to `input`, best first, for "did you mean" hints.
pub fn suggest(input: &str, candidates: &[String], limit: usize) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let allowed = max_allowed_distance(input);
    let mut scored: Vec<(&String, usize)> = candidates
        .iter()
        .filter_map(|candidate| {
            distance(input, candidate)
                .filter(|score| *score <= allowed)
                .map(|score| (candidate, score))
        })
        .collect();
    scored.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then_with(|| a.0.len().cmp(&b.0.len()))
            .then_with(|| a.0.cmp(b.0))
    });
    let mut out: Vec<String> = Vec::new();
    for (candidate, _) in scored {
        if !out.contains(candidate) {
            out.push(candidate.clone());
        }
        if out.len() >= limit.max(1) {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::suggest;

    fn tools() -> Vec<String> {
        ["get_cluster", "get_clusters", "get_cluster_addons", "whoami"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn suggest_finds_close_tool_names() {
        let out = suggest("get_clustr", &tools(), 3);
        assert_eq!(out.first().map(String::as_str), Some("get_cluster"));
    }

    #[test]
    fn suggest_ignores_unrelated_input() {
        assert!(suggest("delete_everything", &tools(), 3).is_empty());
        assert!(suggest("  ", &tools(), 3).is_empty());
    }
}
