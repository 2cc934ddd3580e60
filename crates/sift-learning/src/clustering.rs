//! Greedy skeleton clustering.
//!
//! Lines with the same token count are compared position by position. A line
//! joins the most similar cluster whose template agrees on at least
//! `min_similarity` of the positions; positions where members disagree widen
//! to wildcards. Input order decides ties, so the result is deterministic.

use crate::masking::Token;

/// One position of a cluster template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    /// Every member has this masked token here.
    Fixed(Token),
    /// Members disagree here.
    Wildcard,
}

impl TemplateToken {
    fn accepts(&self, token: &Token) -> bool {
        match self {
            Self::Fixed(fixed) => fixed == token,
            Self::Wildcard => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub template: Vec<TemplateToken>,
    /// Indices into the clustered input, in input order.
    pub members: Vec<usize>,
}

impl Cluster {
    fn new(index: usize, tokens: &[Token]) -> Self {
        Self {
            template: tokens.iter().cloned().map(TemplateToken::Fixed).collect(),
            members: vec![index],
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Fraction of positions whose token agrees with the template.
    fn similarity(&self, tokens: &[Token]) -> f64 {
        if tokens.len() != self.template.len() || tokens.is_empty() {
            return 0.0;
        }
        let agreeing = self
            .template
            .iter()
            .zip(tokens)
            .filter(|(slot, token)| slot.accepts(token))
            .count();
        agreeing as f64 / tokens.len() as f64
    }

    fn absorb(&mut self, index: usize, tokens: &[Token]) {
        for (slot, token) in self.template.iter_mut().zip(tokens) {
            if !slot.accepts(token) {
                *slot = TemplateToken::Wildcard;
            }
        }
        self.members.push(index);
    }

    /// Share of template positions that are plain literal text: no wildcard,
    /// no masked slot. The consistency measure of the cluster.
    pub fn literal_ratio(&self) -> f64 {
        if self.template.is_empty() {
            return 0.0;
        }
        let literal = self
            .template
            .iter()
            .filter(|t| matches!(t, TemplateToken::Fixed(token) if token.is_literal()))
            .count();
        literal as f64 / self.template.len() as f64
    }
}

/// Cluster masked lines. Empty lines are left out of every cluster.
pub fn cluster(lines: &[Vec<Token>], min_similarity: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for (index, tokens) in lines.iter().enumerate() {
        if tokens.is_empty() {
            continue;
        }
        let mut best: Option<(usize, f64)> = None;
        for (ci, c) in clusters.iter().enumerate() {
            let score = c.similarity(tokens);
            if score >= min_similarity && best.map_or(true, |(_, b)| score > b) {
                best = Some((ci, score));
            }
        }
        match best {
            Some((ci, _)) => clusters[ci].absorb(index, tokens),
            None => clusters.push(Cluster::new(index, tokens)),
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::mask_line;

    fn masked(lines: &[&str]) -> Vec<Vec<Token>> {
        lines.iter().map(|l| mask_line(l)).collect()
    }

    #[test]
    fn differing_word_becomes_wildcard() {
        let input = masked(&[
            "Downloaded crate serde v1.0.200 (84 KB) in 120ms",
            "Downloaded crate regex v1.10.4 (250 KB) in 310ms",
            "Downloaded crate tokio v1.37.0 (740 KB) in 95ms",
        ]);
        let clusters = cluster(&input, 0.5);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1, 2]);
        assert_eq!(clusters[0].template[2], TemplateToken::Wildcard);
        assert_eq!(clusters[0].literal_ratio(), 0.5);
    }

    #[test]
    fn different_lengths_never_mix() {
        let input = masked(&["retry 1 failed", "retry 2 failed hard"]);
        assert_eq!(cluster(&input, 0.5).len(), 2);
    }

    #[test]
    fn dissimilar_lines_stay_apart() {
        let input = masked(&["alpha beta gamma", "one two three"]);
        assert_eq!(cluster(&input, 0.5).len(), 2);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let input = vec![Vec::new(), mask_line("x y")];
        let clusters = cluster(&input, 0.5);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![1]);
    }
}
