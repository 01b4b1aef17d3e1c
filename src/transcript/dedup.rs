use crate::ocr::TextCandidate;
use crate::transcript::Transcript;

/// Normalized similarity `2 * LCS(a, b) / (|a| + |b|)`, measured in chars.
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Single rolling row over b.
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// Builds the transcript for one video from candidates in frame order.
#[derive(Debug)]
pub struct Deduplicator {
    threshold: f64,
    accepted: Vec<String>,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            accepted: Vec::new(),
        }
    }

    /// Returns true if the candidate was appended to the transcript.
    pub fn offer(&mut self, candidate: &str) -> bool {
        let text = candidate.trim();
        if text.is_empty() {
            return false;
        }
        if self.accepted.last().map(String::as_str) == Some(text) {
            return false;
        }
        if self
            .accepted
            .iter()
            .any(|seen| similarity(text, seen) > self.threshold)
        {
            return false;
        }
        self.accepted.push(text.to_string());
        true
    }

    pub fn offer_all<'a>(&mut self, candidates: impl IntoIterator<Item = &'a TextCandidate>) {
        for candidate in candidates {
            if self.offer(&candidate.text) {
                tracing::trace!("accepted line from frame {}", candidate.frame_index);
            }
        }
    }

    pub fn finish(self) -> Transcript {
        Transcript {
            lines: self.accepted,
        }
    }
}
