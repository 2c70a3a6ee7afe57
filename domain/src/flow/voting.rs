//! Majority voting over ensemble samples
//!
//! Samples are grouped into clusters of near-identical answers; the largest
//! cluster wins. Ties go to the cluster formed first, so a given list of
//! samples always produces the same winner.

use crate::flow::parsing::similarity;
use serde::{Deserialize, Serialize};

/// Answers considered equivalent for voting purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCluster {
    /// Index of the first sample in this cluster (its representative)
    pub representative: usize,
    /// Indices of every sample in this cluster, in sample order
    pub members: Vec<usize>,
}

impl VoteCluster {
    pub fn votes(&self) -> usize {
        self.members.len()
    }
}

/// Result of tallying ensemble samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleTally {
    pub clusters: Vec<VoteCluster>,
    /// Index into `clusters` of the winning cluster
    pub winner: usize,
    pub total_votes: usize,
}

impl EnsembleTally {
    /// Cluster `samples` by [`similarity`] against each cluster's
    /// representative. Returns `None` for an empty sample list.
    pub fn from_samples<S: AsRef<str>>(samples: &[S], similarity_threshold: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut clusters: Vec<VoteCluster> = Vec::new();
        for (index, sample) in samples.iter().enumerate() {
            let existing = clusters.iter_mut().find(|c| {
                similarity(samples[c.representative].as_ref(), sample.as_ref())
                    >= similarity_threshold
            });
            match existing {
                Some(cluster) => cluster.members.push(index),
                None => clusters.push(VoteCluster {
                    representative: index,
                    members: vec![index],
                }),
            }
        }

        // max_by_key returns the last maximum; iterate reversed to keep the first
        let winner = clusters
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, c)| c.votes())
            .map(|(i, _)| i)
            .unwrap_or(0);

        Some(Self {
            clusters,
            winner,
            total_votes: samples.len(),
        })
    }

    pub fn winning_cluster(&self) -> &VoteCluster {
        &self.clusters[self.winner]
    }

    /// Sample index of the winning answer
    pub fn winning_sample(&self) -> usize {
        self.winning_cluster().representative
    }

    pub fn winning_votes(&self) -> usize {
        self.winning_cluster().votes()
    }

    /// A strict majority of samples agree with the winner
    pub fn has_majority(&self) -> bool {
        self.winning_votes() > self.total_votes / 2
    }

    pub fn is_unanimous(&self) -> bool {
        self.clusters.len() == 1
    }

    /// Share of samples in the winning cluster (0.0 to 1.0)
    pub fn agreement_ratio(&self) -> f64 {
        if self.total_votes == 0 {
            0.0
        } else {
            self.winning_votes() as f64 / self.total_votes as f64
        }
    }

    /// Visual summary, one mark per sample (e.g. "[●●○]")
    pub fn vote_summary(&self) -> String {
        let winners = &self.winning_cluster().members;
        let mut summary = String::from("[");
        for index in 0..self.total_votes {
            summary.push(if winners.contains(&index) { '●' } else { '○' });
        }
        summary.push(']');
        summary
    }
}
