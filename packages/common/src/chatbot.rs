//! Keyword and typo matching for the chatbot rule table.

/// Largest edit distance still treated as a typo of a keyword token.
pub const TYPO_THRESHOLD: usize = 3;

/// Tokens shorter than this, on either side, are never typo-matched; with a
/// threshold of 3 they would match almost any short word.
pub const MIN_TYPO_TOKEN_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    /// The keyword occurs verbatim (case-insensitive) in the message.
    Keyword,
    /// A message token is within [`TYPO_THRESHOLD`] edits of a keyword token.
    Typo { distance: usize },
}

/// The rule that answered a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordMatch {
    /// Index into the keyword slice passed to [`find_match`].
    pub index: usize,
    pub kind: MatchKind,
}

/// Find the rule answering `message`.
///
/// The first keyword contained in the message wins. Failing that, the
/// keyword with the closest token (by Levenshtein distance, at most
/// [`TYPO_THRESHOLD`]) wins, earlier rules breaking ties.
pub fn find_match<K: AsRef<str>>(message: &str, keywords: &[K]) -> Option<KeywordMatch> {
    let message = message.trim().to_lowercase();
    if message.is_empty() {
        return None;
    }

    for (index, keyword) in keywords.iter().enumerate() {
        let keyword = keyword.as_ref().trim().to_lowercase();
        if !keyword.is_empty() && message.contains(&keyword) {
            return Some(KeywordMatch {
                index,
                kind: MatchKind::Keyword,
            });
        }
    }

    let message_tokens: Vec<&str> = tokens(&message)
        .filter(|t| t.chars().count() >= MIN_TYPO_TOKEN_LEN)
        .collect();
    let mut best: Option<KeywordMatch> = None;

    for (index, keyword) in keywords.iter().enumerate() {
        let keyword = keyword.as_ref().to_lowercase();
        for keyword_token in tokens(&keyword) {
            if keyword_token.chars().count() < MIN_TYPO_TOKEN_LEN {
                continue;
            }
            for message_token in &message_tokens {
                let distance = levenshtein(message_token, keyword_token);
                if distance > TYPO_THRESHOLD {
                    continue;
                }
                let better = match best {
                    Some(KeywordMatch {
                        kind: MatchKind::Typo { distance: current },
                        ..
                    }) => distance < current,
                    _ => true,
                };
                if better {
                    best = Some(KeywordMatch {
                        index,
                        kind: MatchKind::Typo { distance },
                    });
                }
            }
        }
    }

    best
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty())
}

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
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
