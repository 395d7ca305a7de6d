//! Leaf-wise regression trees fitted to gradient/hessian statistics
//!
//! Growth is best-first: the leaf whose best split gains the most is split
//! next, until the leaf budget is spent or no split has positive gain.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_leaves: usize,
    pub min_samples_leaf: usize,
    pub l2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-backed binary tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Largest feature index referenced by a split
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Fit one tree to the per-row `gradients` and `hessians`
    pub fn fit(x: &Array2<f64>, gradients: &[f64], hessians: &[f64], params: &TreeParams) -> Self {
        let all: Vec<usize> = (0..x.nrows()).collect();
        let builder = Builder { x, gradients, hessians, params };
        builder.grow(all)
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    gradients: &'a [f64],
    hessians: &'a [f64],
    params: &'a TreeParams,
}

fn leaf_score(g: f64, h: f64, l2: f64) -> f64 {
    g * g / (h + l2)
}

impl<'a> Builder<'a> {
    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + self.gradients[i], h + self.hessians[i])
        })
    }

    /// Newton step for the rows in a leaf
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (g, h) = self.sums(indices);
        let denom = h + self.params.l2;
        if denom <= 0.0 {
            0.0
        } else {
            -g / denom
        }
    }

    fn best_split_for_feature(&self, indices: &[usize], feature: usize) -> Option<SplitCandidate> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        if indices.len() < 2 * min_leaf {
            return None;
        }

        let mut sorted: Vec<(usize, f64)> = indices.iter().map(|&i| (i, self.x[[i, feature]])).collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (total_g, total_h) = self.sums(indices);
        let parent = leaf_score(total_g, total_h, self.params.l2);

        let mut left_g = 0.0;
        let mut left_h = 0.0;
        let mut best: Option<(f64, f64, usize)> = None;

        for pos in 0..sorted.len() - 1 {
            let row = sorted[pos].0;
            left_g += self.gradients[row];
            left_h += self.hessians[row];

            let n_left = pos + 1;
            if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                continue;
            }
            // only cut between distinct values
            if sorted[pos].1 == sorted[pos + 1].1 {
                continue;
            }

            let gain = leaf_score(left_g, left_h, self.params.l2)
                + leaf_score(total_g - left_g, total_h - left_h, self.params.l2)
                - parent;
            if best.map_or(true, |(g, _, _)| gain > g) {
                let threshold = (sorted[pos].1 + sorted[pos + 1].1) / 2.0;
                best = Some((gain, threshold, n_left));
            }
        }

        let (gain, threshold, n_left) = best?;
        if !(gain > 0.0) {
            return None;
        }

        let mut left: Vec<usize> = sorted[..n_left].iter().map(|&(i, _)| i).collect();
        let mut right: Vec<usize> = sorted[n_left..].iter().map(|&(i, _)| i).collect();
        left.sort_unstable();
        right.sort_unstable();

        Some(SplitCandidate { feature, threshold, gain, left, right })
    }

    /// Best split over all features; equal gains go to the lower feature index
    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = (0..self.x.ncols())
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(indices, feature))
            .collect();

        per_feature.into_iter().flatten().fold(None, |acc: Option<SplitCandidate>, cand| match acc {
            Some(best) if best.gain >= cand.gain => Some(best),
            _ => Some(cand),
        })
    }

    fn grow(&self, root: Vec<usize>) -> RegressionTree {
        enum Slot {
            Open(Vec<usize>),
            Split { feature: usize, threshold: f64, left: usize, right: usize },
        }

        let mut slots = vec![Slot::Open(root.clone())];
        let mut pending: Vec<(usize, SplitCandidate)> = Vec::new();
        if let Some(c) = self.best_split(&root) {
            pending.push((0, c));
        }

        let mut n_leaves = 1;
        while n_leaves < self.params.max_leaves.max(1) {
            // highest gain first, earliest leaf on ties
            let pick = pending
                .iter()
                .enumerate()
                .fold(None, |acc: Option<(usize, f64)>, (i, (_, c))| match acc {
                    Some((_, g)) if g >= c.gain => acc,
                    _ => Some((i, c.gain)),
                });
            let Some((pick, _)) = pick else { break };
            let (node, cand) = pending.remove(pick);

            let left_id = slots.len();
            let right_id = left_id + 1;
            slots.push(Slot::Open(cand.left.clone()));
            slots.push(Slot::Open(cand.right.clone()));
            slots[node] = Slot::Split {
                feature: cand.feature,
                threshold: cand.threshold,
                left: left_id,
                right: right_id,
            };
            n_leaves += 1;

            for (id, rows) in [(left_id, &cand.left), (right_id, &cand.right)] {
                if let Some(c) = self.best_split(rows) {
                    pending.push((id, c));
                }
            }
        }

        let nodes = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Open(rows) => TreeNode::Leaf { value: self.leaf_value(&rows) },
                Slot::Split { feature, threshold, left, right } => TreeNode::Split { feature, threshold, left, right },
            })
            .collect();

        RegressionTree { nodes }
    }
}
